//! Unified error hierarchy for trainload
//!
//! Provides a structured error type for the analytics engine and its
//! import/export collaborators, with severity levels that map onto the
//! tracing system.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all trainload operations
#[derive(Debug, Error)]
pub enum TrainLoadError {
    /// A collaborator handed over a record that breaks the input contract
    #[error("Invalid record #{index}: {reason}")]
    InvalidRecord { index: usize, reason: String },

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Import errors
    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    /// Export errors
    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    /// Calculation errors
    #[error("Calculation error: {0}")]
    Calculation(#[from] CalculationError),
}

/// Errors raised while reading activity files
#[derive(Debug, Error)]
pub enum ImportError {
    /// No importer recognises the file
    #[error("Unsupported format: {path}")]
    UnsupportedFormat { path: PathBuf },

    /// Format-specific parsing error
    #[error("Parse error in {format}: {reason}")]
    ParseError { format: String, reason: String },

    /// Top-level payload has the wrong shape
    #[error("Invalid data structure: {reason}")]
    InvalidStructure { reason: String },

    /// Directory import pointed at something else
    #[error("Not a directory: {path}")]
    NotADirectory { path: PathBuf },
}

/// Errors raised while writing the metrics series
#[derive(Debug, Error)]
pub enum ExportError {
    /// Unsupported export format
    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    /// Serialization failed
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Writing the output failed
    #[error("Export failed to {path}: {reason}")]
    WriteFailed { path: PathBuf, reason: String },
}

/// Calculation errors
#[derive(Debug, Error)]
pub enum CalculationError {
    /// Invalid model parameter
    #[error("Invalid parameter for {calculation}: {parameter}={value}")]
    InvalidParameter {
        calculation: String,
        parameter: String,
        value: String,
    },

    /// Date arithmetic left the representable range
    #[error("Date out of range in {calculation}")]
    DateOutOfRange { calculation: String },

    /// A running total or average left the decimal range
    #[error("Numeric overflow in {calculation} on {date}")]
    Overflow { calculation: String, date: String },
}

/// Result type alias for trainload operations
pub type Result<T> = std::result::Result<T, TrainLoadError>;

impl TrainLoadError {
    /// Shorthand for an invalid-record error
    pub fn invalid_record(index: usize, reason: impl Into<String>) -> Self {
        TrainLoadError::InvalidRecord {
            index,
            reason: reason.into(),
        }
    }

    /// Get error severity level
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            TrainLoadError::InvalidRecord { .. } => ErrorSeverity::Warning,
            TrainLoadError::Validation(_) => ErrorSeverity::Warning,
            TrainLoadError::Import(ImportError::UnsupportedFormat { .. }) => ErrorSeverity::Warning,
            TrainLoadError::Configuration(_) => ErrorSeverity::Error,
            TrainLoadError::Calculation(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Get user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            TrainLoadError::InvalidRecord { index, reason } => {
                format!(
                    "Activity #{} could not be used ({}). Check the export from your fitness platform.",
                    index, reason
                )
            }
            TrainLoadError::Import(ImportError::UnsupportedFormat { path }) => {
                format!("Don't know how to read {}", path.display())
            }
            TrainLoadError::Configuration(reason) => {
                format!("Configuration problem: {}. Run `trainload config --list` to inspect settings.", reason)
            }
            _ => self.to_string(),
        }
    }
}

/// Severity and message for a failure surfaced at the command line.
///
/// Context attached on the way up is kept as a prefix; the innermost
/// trainload error contributes its user-facing message.
pub fn describe_failure(err: &anyhow::Error) -> (ErrorSeverity, String) {
    let mut context = Vec::new();
    for cause in err.chain() {
        if let Some(inner) = cause.downcast_ref::<TrainLoadError>() {
            context.push(inner.user_message());
            return (inner.severity(), context.join(": "));
        }
        context.push(cause.to_string());
    }
    (ErrorSeverity::Error, format!("{:#}", err))
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Internal inconsistency requiring attention
    Critical,
    /// Error that prevents the operation
    Error,
    /// Caller-side problem that doesn't affect other work
    Warning,
}

impl ErrorSeverity {
    /// Convert to tracing level
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Critical => tracing::Level::ERROR,
            ErrorSeverity::Error => tracing::Level::ERROR,
            ErrorSeverity::Warning => tracing::Level::WARN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = TrainLoadError::invalid_record(3, "missing timestamp");
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = TrainLoadError::Calculation(CalculationError::DateOutOfRange {
            calculation: "aggregate".to_string(),
        });
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_invalid_record_display() {
        let err = TrainLoadError::invalid_record(7, "missing timestamp");
        assert_eq!(err.to_string(), "Invalid record #7: missing timestamp");
        assert!(err.user_message().contains("Activity #7"));
    }

    #[test]
    fn test_describe_failure_keeps_context() {
        let err = anyhow::Error::new(TrainLoadError::invalid_record(2, "negative duration -60"))
            .context("Failed to analyze rides.json");
        let (severity, message) = describe_failure(&err);
        assert_eq!(severity, ErrorSeverity::Warning);
        assert!(message.starts_with("Failed to analyze rides.json: Activity #2"));

        let err = anyhow::anyhow!("Expected key=value");
        let (severity, message) = describe_failure(&err);
        assert_eq!(severity, ErrorSeverity::Error);
        assert_eq!(message, "Expected key=value");
    }

    #[test]
    fn test_user_messages() {
        let err = TrainLoadError::Import(ImportError::UnsupportedFormat {
            path: PathBuf::from("ride.fit"),
        });
        assert!(err.user_message().contains("ride.fit"));
    }
}
