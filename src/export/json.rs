use std::io::Write;

use super::MetricsExport;
use crate::error::{ExportError, Result};

/// Write the export document as pretty-printed JSON.
///
/// Decimals are serialized as strings so no precision is lost.
pub fn write_export<W: Write>(export: &MetricsExport, mut writer: W) -> Result<()> {
    serde_json::to_writer_pretty(&mut writer, export)
        .map_err(|e| ExportError::Serialization(e.to_string()))?;
    writeln!(writer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DailyMetricsPoint;
    use crate::status::{ReadinessBand, TrainingStatus};
    use chrono::{NaiveDate, Utc};
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_export() {
        let point = DailyMetricsPoint {
            date: NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(),
            load: dec!(60),
            fitness: dec!(60),
            fatigue: dec!(60),
            form: dec!(0),
        };
        let export = MetricsExport {
            generated_at: Utc::now(),
            status: TrainingStatus::Ready(ReadinessBand::Productive),
            current: Some(point.clone()),
            series: vec![point],
        };

        let mut buffer = Vec::new();
        write_export(&export, &mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();

        assert!(content.contains("\"date\": \"2024-09-01\""));
        assert!(content.contains("\"fitness\": \"60\""));
        assert!(content.contains("\"generated_at\""));
        assert!(content.ends_with("}\n"));
    }

    #[test]
    fn test_empty_export_keeps_status() {
        let export = MetricsExport {
            generated_at: Utc::now(),
            status: TrainingStatus::InsufficientData,
            current: None,
            series: Vec::new(),
        };

        let mut buffer = Vec::new();
        write_export(&export, &mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();

        assert!(content.contains("\"insufficient_data\""));
        assert!(content.contains("\"series\": []"));
    }
}
