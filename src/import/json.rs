use rust_decimal::prelude::*;
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::fs;
use std::path::Path;

use crate::error::{ImportError, Result};
use crate::import::{has_extension, ImportFormat};
use crate::models::RawActivity;

/// Start-time fields, most specific first
const TIMESTAMP_FIELDS: &[&str] = &["start_date_local", "start_date", "start_time", "date", "start"];
const DURATION_FIELDS: &[&str] = &["moving_time", "elapsed_time"];
const KIND_FIELDS: &[&str] = &["type", "sport_type"];

/// Importer for exported activity lists (intervals.icu / Strava JSON)
pub struct JsonImporter;

impl JsonImporter {
    pub fn new() -> Self {
        Self
    }

    /// Parse a JSON document holding an array of activity objects
    pub fn parse_str(&self, content: &str) -> Result<Vec<RawActivity>> {
        let document: Value = serde_json::from_str(content).map_err(|e| ImportError::ParseError {
            format: "JSON".to_string(),
            reason: e.to_string(),
        })?;

        let items = match document {
            Value::Array(items) => items,
            other => {
                return Err(ImportError::InvalidStructure {
                    reason: format!("expected an array of activities, found {}", value_kind(&other)),
                }
                .into())
            }
        };

        items
            .iter()
            .enumerate()
            .map(|(index, item)| match item {
                Value::Object(fields) => Ok(Self::activity_from_fields(fields)),
                other => Err(ImportError::InvalidStructure {
                    reason: format!("activity {} is {}, not an object", index, value_kind(other)),
                }
                .into()),
            })
            .collect()
    }

    fn activity_from_fields(fields: &Map<String, Value>) -> RawActivity {
        RawActivity {
            id: text_field(fields, "id"),
            name: text_field(fields, "name"),
            timestamp: TIMESTAMP_FIELDS.iter().find_map(|key| text_field(fields, key)),
            activity_kind: KIND_FIELDS.iter().find_map(|key| text_field(fields, key)),
            duration_seconds: DURATION_FIELDS.iter().find_map(|key| number_field(fields, key)),
            explicit_load: number_field(fields, "icu_training_load"),
            perceived_effort: number_field(fields, "suffer_score"),
            distance_meters: number_field(fields, "distance"),
            elevation_gain_meters: number_field(fields, "total_elevation_gain"),
        }
    }
}

impl Default for JsonImporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ImportFormat for JsonImporter {
    fn can_import(&self, file_path: &Path) -> bool {
        has_extension(file_path, "json")
    }

    fn import_file(&self, file_path: &Path) -> Result<Vec<RawActivity>> {
        let content = fs::read_to_string(file_path)?;
        self.parse_str(&content)
    }

    fn format_name(&self) -> &'static str {
        "JSON"
    }
}

/// Non-empty string or number rendered as text; ids come either way
fn text_field(fields: &Map<String, Value>, key: &str) -> Option<String> {
    match fields.get(key)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Number or numeric string; anything else counts as absent
fn number_field(fields: &Map<String, Value>, key: &str) -> Option<Decimal> {
    match fields.get(key)? {
        Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Decimal::from(i))
            } else {
                let text = n.to_string();
                Decimal::from_str(&text)
                    .or_else(|_| Decimal::from_scientific(&text))
                    .ok()
                    .or_else(|| n.as_f64().and_then(Decimal::from_f64))
            }
        }
        Value::String(s) => Decimal::from_str(s.trim()).ok(),
        _ => None,
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
