//! Writers for the daily metrics series consumed by charting tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::engine::EngineReport;
use crate::error::{ExportError, Result};
use crate::models::DailyMetricsPoint;
use crate::status::TrainingStatus;

pub mod csv;
pub mod json;

/// Export format types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Csv,
    Json,
}

impl ExportFormat {
    /// Guess the format from a file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| ext.parse().ok())
    }
}

impl std::str::FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            _ => Err(ExportError::UnsupportedFormat(s.to_string())),
        }
    }
}

/// JSON document handed to charting consumers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricsExport {
    pub generated_at: DateTime<Utc>,
    pub status: TrainingStatus,
    pub current: Option<DailyMetricsPoint>,
    pub series: Vec<DailyMetricsPoint>,
}

impl MetricsExport {
    pub fn from_report(report: &EngineReport) -> Self {
        MetricsExport {
            generated_at: Utc::now(),
            status: report.status,
            current: report.current.clone(),
            series: report.series.clone(),
        }
    }
}

/// Write a report in the given format to any writer
pub fn write_report<W: Write>(report: &EngineReport, format: ExportFormat, writer: W) -> Result<()> {
    match format {
        ExportFormat::Csv => csv::write_series(&report.series, writer),
        ExportFormat::Json => json::write_export(&MetricsExport::from_report(report), writer),
    }
}

/// Write a report to a file, creating parent directories as needed
pub fn export_report<P: AsRef<Path>>(report: &EngineReport, format: ExportFormat, output_path: P) -> Result<()> {
    let path = output_path.as_ref();
    let write_failed = |reason: String| ExportError::WriteFailed {
        path: path.to_path_buf(),
        reason,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| write_failed(e.to_string()))?;
    }

    let file = File::create(path).map_err(|e| write_failed(e.to_string()))?;
    let mut writer = BufWriter::new(file);
    write_report(report, format, &mut writer)?;
    writer.flush().map_err(|e| write_failed(e.to_string()))?;

    tracing::info!(
        path = %path.display(),
        format = ?format,
        points = report.series.len(),
        "Exported metrics series"
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TrainingLoadEngine;
    use crate::models::ActivityRecord;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;
    use tempfile::tempdir;

    fn report() -> EngineReport {
        let ts = |day: u32| {
            NaiveDate::from_ymd_opt(2024, 6, day)
                .unwrap()
                .and_hms_opt(6, 0, 0)
                .unwrap()
        };
        let records = vec![
            ActivityRecord::new(ts(1), "Run").with_explicit_load(dec!(50)),
            ActivityRecord::new(ts(3), "Ride").with_explicit_load(dec!(50)),
        ];
        TrainingLoadEngine::new().analyze(&records).unwrap()
    }

    #[test]
    fn test_export_format_parsing() {
        assert_eq!("CSV".parse::<ExportFormat>().unwrap(), ExportFormat::Csv);
        assert_eq!("json".parse::<ExportFormat>().unwrap(), ExportFormat::Json);
        assert!(matches!(
            "pdf".parse::<ExportFormat>(),
            Err(ExportError::UnsupportedFormat(_))
        ));
        assert_eq!(ExportFormat::from_path(Path::new("out/pmc.csv")), Some(ExportFormat::Csv));
        assert_eq!(ExportFormat::from_path(Path::new("pmc")), None);
    }

    #[test]
    fn test_export_report_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("charts").join("pmc.json");

        export_report(&report(), ExportFormat::Json, &path).unwrap();

        let parsed: MetricsExport =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed.series.len(), 3);
        assert_eq!(parsed.series[2].fatigue, dec!(40.625));
        assert_eq!(parsed.current, parsed.series.last().cloned());
    }
}
