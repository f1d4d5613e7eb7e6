use csv::{ReaderBuilder, StringRecord, Trim};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use crate::error::{ImportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::models::RawActivity;

/// Canonical columns an activity row can carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Id,
    Name,
    Timestamp,
    Kind,
    Duration,
    Load,
    Effort,
    Distance,
    Elevation,
}

/// CSV importer with flexible column mapping
pub struct CsvImporter {
    column_mapping: HashMap<String, Column>,
}

impl CsvImporter {
    pub fn new() -> Self {
        let mut column_mapping = HashMap::new();

        Self::add_mapping(&mut column_mapping, Column::Id, &["id", "activity_id"]);
        Self::add_mapping(&mut column_mapping, Column::Name, &["name", "title", "activity_name"]);
        Self::add_mapping(
            &mut column_mapping,
            Column::Timestamp,
            &["start_date_local", "start_date", "start_time", "date", "start", "timestamp"],
        );
        Self::add_mapping(
            &mut column_mapping,
            Column::Kind,
            &["type", "sport_type", "activity_type", "kind", "sport"],
        );
        Self::add_mapping(
            &mut column_mapping,
            Column::Duration,
            &["moving_time", "elapsed_time", "duration", "duration_seconds"],
        );
        Self::add_mapping(
            &mut column_mapping,
            Column::Load,
            &["icu_training_load", "training_load", "load", "tss"],
        );
        Self::add_mapping(
            &mut column_mapping,
            Column::Effort,
            &["suffer_score", "relative_effort", "perceived_effort", "rpe"],
        );
        Self::add_mapping(&mut column_mapping, Column::Distance, &["distance", "distance_meters"]);
        Self::add_mapping(
            &mut column_mapping,
            Column::Elevation,
            &["total_elevation_gain", "elevation_gain", "elevation"],
        );

        Self { column_mapping }
    }

    fn add_mapping(mapping: &mut HashMap<String, Column>, column: Column, variations: &[&str]) {
        for variation in variations {
            mapping.insert(variation.to_lowercase(), column);
        }
    }

    fn normalize_column_name(&self, name: &str) -> Option<Column> {
        let normalized = name.trim().to_lowercase().replace([' ', '-'], "_");
        self.column_mapping.get(&normalized).copied()
    }

    /// Map header positions to columns. When two headers land on the same
    /// column (e.g. `moving_time` and `elapsed_time`), the upstream primary
    /// field wins, otherwise the leftmost header.
    fn map_headers(&self, headers: &StringRecord) -> HashMap<Column, usize> {
        let mut positions: HashMap<Column, (usize, usize)> = HashMap::new();

        for (i, header) in headers.iter().enumerate() {
            let Some(column) = self.normalize_column_name(header) else {
                continue;
            };
            let rank = alias_rank(header);
            match positions.get(&column) {
                Some((_, existing)) if *existing <= rank => {}
                _ => {
                    positions.insert(column, (i, rank));
                }
            }
        }

        positions
            .into_iter()
            .map(|(column, (i, _))| (column, i))
            .collect()
    }

    /// Parse CSV text from any reader
    pub fn parse_reader<R: Read>(&self, reader: R) -> Result<Vec<RawActivity>> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .trim(Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers().map_err(csv_error)?.clone();
        let columns = self.map_headers(&headers);

        if !columns.contains_key(&Column::Timestamp) {
            return Err(ImportError::InvalidStructure {
                reason: "no start time column in CSV header".to_string(),
            }
            .into());
        }

        let mut activities = Vec::new();
        for (row, result) in reader.records().enumerate() {
            let record = result.map_err(csv_error)?;
            // Header is line 1
            let line = row + 2;

            let text = |column: Column| -> Option<String> {
                columns
                    .get(&column)
                    .and_then(|&i| record.get(i))
                    .filter(|value| !value.is_empty())
                    .map(str::to_string)
            };
            let number = |column: Column| -> Result<Option<Decimal>> {
                match text(column) {
                    None => Ok(None),
                    Some(value) => Decimal::from_str(&value)
                        .or_else(|_| Decimal::from_scientific(&value))
                        .map(Some)
                        .map_err(|_| {
                            ImportError::ParseError {
                                format: "CSV".to_string(),
                                reason: format!("line {}: '{}' is not a number", line, value),
                            }
                            .into()
                        }),
                }
            };

            activities.push(RawActivity {
                id: text(Column::Id),
                name: text(Column::Name),
                timestamp: text(Column::Timestamp),
                activity_kind: text(Column::Kind),
                duration_seconds: number(Column::Duration)?,
                explicit_load: number(Column::Load)?,
                perceived_effort: number(Column::Effort)?,
                distance_meters: number(Column::Distance)?,
                elevation_gain_meters: number(Column::Elevation)?,
            });
        }

        Ok(activities)
    }
}

impl Default for CsvImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for CsvImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "csv")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<RawActivity>> {
        let file = std::fs::File::open(file_path)?;
        self.parse_reader(file)
    }

    fn format_name(&self) -> &'static str {
        "CSV"
    }
}

/// Lower rank wins when two headers map to the same column
fn alias_rank(header: &str) -> usize {
    const PREFERRED: &[&str] = &["start_date_local", "moving_time", "type", "icu_training_load"];
    let normalized = header.trim().to_lowercase().replace([' ', '-'], "_");
    if PREFERRED.contains(&normalized.as_str()) {
        0
    } else {
        1
    }
}

fn csv_error(e: csv::Error) -> crate::error::TrainLoadError {
    ImportError::ParseError {
        format: "CSV".to_string(),
        reason: e.to_string(),
    }
    .into()
}
