use std::io::Write;

use crate::error::Result;
use crate::models::DailyMetricsPoint;

/// Decimal places written per value; the model keeps full precision internally
pub const CSV_DECIMAL_PLACES: u32 = 4;

/// Write the metrics series as CSV (suitable for spreadsheet plotting)
pub fn write_series<W: Write>(series: &[DailyMetricsPoint], mut writer: W) -> Result<()> {
    writeln!(writer, "Date,Load,Fitness,Fatigue,Form")?;

    for point in series {
        writeln!(
            writer,
            "{},{},{},{},{}",
            point.date.format("%Y-%m-%d"),
            point.load.round_dp(CSV_DECIMAL_PLACES).normalize(),
            point.fitness.round_dp(CSV_DECIMAL_PLACES).normalize(),
            point.fatigue.round_dp(CSV_DECIMAL_PLACES).normalize(),
            point.form.round_dp(CSV_DECIMAL_PLACES).normalize(),
        )?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    #[test]
    fn test_write_series() {
        let series = vec![
            DailyMetricsPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                load: dec!(50),
                fitness: dec!(50),
                fatigue: dec!(50),
                form: dec!(0),
            },
            DailyMetricsPoint {
                date: NaiveDate::from_ymd_opt(2024, 1, 3).unwrap(),
                load: dec!(50),
                fitness: dec!(47.782585181179016),
                fatigue: dec!(40.625),
                form: dec!(7.157585181179016),
            },
        ];

        let mut buffer = Vec::new();
        write_series(&series, &mut buffer).unwrap();
        let content = String::from_utf8(buffer).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "Date,Load,Fitness,Fatigue,Form");
        assert_eq!(lines[1], "2024-01-01,50,50,50,0");
        assert_eq!(lines[2], "2024-01-03,50,47.7826,40.625,7.1576");
    }

    #[test]
    fn test_empty_series_writes_header() {
        let mut buffer = Vec::new();
        write_series(&[], &mut buffer).unwrap();
        assert_eq!(String::from_utf8(buffer).unwrap(), "Date,Load,Fitness,Fatigue,Form\n");
    }
}
