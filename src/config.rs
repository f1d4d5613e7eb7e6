use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::engine::EngineConfig;
use crate::load::EstimatorConfig;
use crate::logging::LogConfig;
use crate::pmc::PmcConfig;
use crate::status::StatusThresholds;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    /// Application metadata
    #[serde(default)]
    pub metadata: ConfigMetadata,

    /// Fitness/fatigue model settings
    #[serde(default)]
    pub pmc: PmcConfig,

    /// Readiness band edges
    #[serde(default)]
    pub status: StatusThresholds,

    /// Per-activity load estimation
    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Window handling
    #[serde(default)]
    pub engine: EngineSettings,

    /// Logging output
    #[serde(default)]
    pub logging: LogConfig,

    /// Data import preferences
    #[serde(default)]
    pub import: ImportSettings,
}

/// Configuration metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Configuration format version
    pub version: String,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last modification timestamp
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Zero-pad the daily series to the end of the requested window
    pub pad_to_window_end: bool,
}

/// Data import preferences
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ImportSettings {
    /// Default window length in days when no explicit range is given
    pub default_window_days: u32,

    /// File extensions scanned when importing a directory; an empty list
    /// scans every format the importers understand
    pub supported_formats: Vec<String>,
}

impl Default for ConfigMetadata {
    fn default() -> Self {
        let now = Utc::now();

        ConfigMetadata {
            version: "1.0".to_string(),
            created_at: now,
            updated_at: now,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            metadata: ConfigMetadata::default(),
            pmc: PmcConfig::default(),
            status: StatusThresholds::default(),
            estimator: EstimatorConfig::default(),
            engine: EngineSettings::default(),
            logging: LogConfig::default(),
            import: ImportSettings::default(),
        }
    }
}

impl Default for ImportSettings {
    fn default() -> Self {
        ImportSettings {
            default_window_days: 365,
            supported_formats: vec!["json".to_string(), "csv".to_string()],
        }
    }
}

/// Configuration management implementation
impl AppConfig {
    /// Load configuration from TOML file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: AppConfig = toml::from_str(&content)
            .with_context(|| "Failed to parse TOML configuration")?;

        Ok(config)
    }

    /// Save configuration to TOML file
    pub fn save_to_file<P: AsRef<Path>>(&mut self, path: P) -> Result<()> {
        self.metadata.updated_at = Utc::now();

        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let toml_content = toml::to_string_pretty(self)
            .with_context(|| "Failed to serialize configuration to TOML")?;

        fs::write(&path, toml_content)
            .with_context(|| format!("Failed to write config file: {}", path.as_ref().display()))?;

        Ok(())
    }

    /// Get default configuration file path
    pub fn default_config_path() -> PathBuf {
        dirs::home_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(".trainload")
            .join("config.toml")
    }

    /// Load configuration, falling back to defaults only when the file does
    /// not exist. A file that exists but cannot be read or parsed is an error,
    /// so a later save never overwrites the user's settings with defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .unwrap_or_else(Self::default_config_path);

        match fs::metadata(&config_path) {
            Ok(_) => Self::load_from_file(&config_path),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %config_path.display(), "No config file, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(e)
                .with_context(|| format!("Failed to access config file: {}", config_path.display())),
        }
    }

    /// Engine settings assembled from the individual sections
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            pmc: self.pmc.clone(),
            status: self.status.clone(),
            estimator: self.estimator.clone(),
            pad_to_window_end: self.engine.pad_to_window_end,
        }
    }

    /// Flattened `key = value` view of the tunable settings
    pub fn list(&self) -> Vec<(String, String)> {
        CONFIG_KEYS
            .iter()
            .filter_map(|key| self.get(key).map(|value| (key.to_string(), value)))
            .collect()
    }

    /// Read one dotted key
    pub fn get(&self, key: &str) -> Option<String> {
        let value = match key {
            "pmc.fitness_span" => self.pmc.fitness_span.to_string(),
            "pmc.fatigue_span" => self.pmc.fatigue_span.to_string(),
            "pmc.form_lag" => match self.pmc.form_lag {
                crate::pmc::FormLag::None => "none".to_string(),
                crate::pmc::FormLag::PreviousDay => "previous_day".to_string(),
            },
            "status.primed_above" => self.status.primed_above.to_string(),
            "status.fatigued_below" => self.status.fatigued_below.to_string(),
            "estimator.stress_per_hour" => self.estimator.stress_per_hour.to_string(),
            "engine.pad_to_window_end" => self.engine.pad_to_window_end.to_string(),
            "import.default_window_days" => self.import.default_window_days.to_string(),
            "logging.level" => self.logging.level.to_filter(),
            "logging.format" => format!("{:?}", self.logging.format).to_lowercase(),
            _ => return None,
        };
        Some(value)
    }

    /// Update one dotted key. The resulting engine settings are validated
    /// before the change is kept.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        let mut updated = self.clone();
        let value = value.trim();

        match key {
            "pmc.fitness_span" => updated.pmc.fitness_span = value.parse().context("expected a whole number of days")?,
            "pmc.fatigue_span" => updated.pmc.fatigue_span = value.parse().context("expected a whole number of days")?,
            "pmc.form_lag" => {
                updated.pmc.form_lag = match value {
                    "none" => crate::pmc::FormLag::None,
                    "previous_day" => crate::pmc::FormLag::PreviousDay,
                    other => anyhow::bail!("Invalid form lag: {} (expected none or previous_day)", other),
                }
            }
            "status.primed_above" => updated.status.primed_above = value.parse().context("expected a number")?,
            "status.fatigued_below" => updated.status.fatigued_below = value.parse().context("expected a number")?,
            "estimator.stress_per_hour" => {
                updated.estimator.stress_per_hour = value.parse().context("expected a number")?
            }
            "engine.pad_to_window_end" => {
                updated.engine.pad_to_window_end = value.parse().context("expected true or false")?
            }
            "import.default_window_days" => {
                updated.import.default_window_days = value.parse().context("expected a whole number of days")?
            }
            "logging.level" => updated.logging.level = value.parse().map_err(anyhow::Error::msg)?,
            "logging.format" => updated.logging.format = value.parse().map_err(anyhow::Error::msg)?,
            _ => anyhow::bail!("Unknown configuration key: {}", key),
        }

        updated
            .engine_config()
            .validate()
            .with_context(|| format!("Rejected value for {}", key))?;

        updated.metadata.updated_at = Utc::now();
        *self = updated;
        Ok(())
    }
}

/// Keys understood by [`AppConfig::get`] and [`AppConfig::set`]
pub const CONFIG_KEYS: &[&str] = &[
    "pmc.fitness_span",
    "pmc.fatigue_span",
    "pmc.form_lag",
    "status.primed_above",
    "status.fatigued_below",
    "estimator.stress_per_hour",
    "engine.pad_to_window_end",
    "import.default_window_days",
    "logging.level",
    "logging.format",
];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pmc::FormLag;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    #[test]
    fn test_config_serialization() {
        let config = AppConfig::default();
        let toml_str = toml::to_string(&config).unwrap();
        let deserialized: AppConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(config.metadata.version, deserialized.metadata.version);
        assert_eq!(config.pmc, deserialized.pmc);
        assert_eq!(config.status, deserialized.status);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let toml_str = r#"
            [metadata]
            version = "1.0"
            created_at = "2024-01-01T00:00:00Z"
            updated_at = "2024-01-01T00:00:00Z"

            [status]
            primed_above = "5"
            fatigued_below = "-5"
        "#;

        let config: AppConfig = toml::from_str(toml_str).unwrap();
        assert_eq!(config.status.primed_above, dec!(5));
        assert_eq!(config.pmc.fitness_span, 42);
        assert_eq!(config.pmc.form_lag, FormLag::None);
        assert_eq!(config.import.default_window_days, 365);
    }

    #[test]
    fn test_config_file_io() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("nested").join("config.toml");

        let mut original_config = AppConfig::default();
        original_config.set("pmc.fatigue_span", "5").unwrap();
        original_config.save_to_file(&config_path).unwrap();

        let loaded_config = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(loaded_config.pmc.fatigue_span, 5);
        assert_eq!(loaded_config.engine_config().pmc.fatigue_span, 5);
    }

    #[test]
    fn test_load_or_default_missing_file() {
        let temp_dir = tempdir().unwrap();
        let config = AppConfig::load_or_default(Some(&temp_dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.pmc, PmcConfig::default());
    }

    #[test]
    fn test_load_or_default_rejects_broken_file() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        let content = "[status]\nprimed_above = \"5\"\n\n[pmc]\nform_lag = previous_day\n";
        fs::write(&config_path, content).unwrap();

        let err = AppConfig::load_or_default(Some(&config_path)).unwrap_err();
        assert!(format!("{:#}", err).contains("Failed to parse TOML configuration"));

        // Nothing was written back over the user's file
        assert_eq!(fs::read_to_string(&config_path).unwrap(), content);
    }

    #[test]
    fn test_hand_written_file_without_metadata() {
        let temp_dir = tempdir().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(
            &config_path,
            "[status]\nprimed_above = \"5\"\nfatigued_below = \"-5\"\n\n[import]\ndefault_window_days = 90\n",
        )
        .unwrap();

        let mut config = AppConfig::load_or_default(Some(&config_path)).unwrap();
        assert_eq!(config.status.primed_above, dec!(5));
        assert_eq!(config.import.default_window_days, 90);
        assert_eq!(config.import.supported_formats, vec!["json", "csv"]);

        config.set("pmc.fatigue_span", "5").unwrap();
        config.save_to_file(&config_path).unwrap();
        let reloaded = AppConfig::load_from_file(&config_path).unwrap();
        assert_eq!(reloaded.status.primed_above, dec!(5));
        assert_eq!(reloaded.pmc.fatigue_span, 5);
    }

    #[test]
    fn test_get_and_set() {
        let mut config = AppConfig::default();

        assert_eq!(config.get("pmc.fitness_span").as_deref(), Some("42"));
        assert_eq!(config.get("nope"), None);

        config.set("status.primed_above", "7.5").unwrap();
        assert_eq!(config.status.primed_above, dec!(7.5));

        config.set("pmc.form_lag", "previous_day").unwrap();
        assert_eq!(config.pmc.form_lag, FormLag::PreviousDay);
        assert_eq!(config.get("pmc.form_lag").as_deref(), Some("previous_day"));

        assert_eq!(config.list().len(), CONFIG_KEYS.len());
    }

    #[test]
    fn test_invalid_set_is_rolled_back() {
        let mut config = AppConfig::default();

        assert!(config.set("pmc.fitness_span", "0").is_err());
        assert_eq!(config.pmc.fitness_span, 42);

        assert!(config.set("status.fatigued_below", "20").is_err());
        assert_eq!(config.status.fatigued_below, dec!(-10));

        assert!(config.set("pmc.fitness_span", "many").is_err());
        assert!(config.set("unknown.key", "1").is_err());
    }
}
