use chrono::{DateTime, Datelike, Days, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TrainLoadError};

/// Largest magnitude accepted for any numeric activity field. Keeps daily
/// sums and averages well inside the decimal range.
pub const MAX_FIELD_VALUE: Decimal = Decimal::from_parts(3_567_587_328, 232, 0, false, 0);

/// Coarse sport grouping derived from the upstream activity type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SportCategory {
    Cycling,
    Running,
    RunningWalking,
    Strength,
    Mobility,
    Other,
}

impl SportCategory {
    /// Map a free-form upstream activity type onto a category
    pub fn from_kind(kind: &str) -> Self {
        match kind {
            "Ride" | "GravelRide" | "VirtualRide" => SportCategory::Cycling,
            "Run" | "TrailRun" | "Treadmill" => SportCategory::Running,
            "Walk" | "Hike" => SportCategory::RunningWalking,
            "WeightTraining" => SportCategory::Strength,
            "Yoga" | "Pilates" => SportCategory::Mobility,
            _ => SportCategory::Other,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SportCategory::Cycling => "Cycling",
            SportCategory::Running => "Running",
            SportCategory::RunningWalking => "Running/Walking",
            SportCategory::Strength => "Strength",
            SportCategory::Mobility => "Mobility",
            SportCategory::Other => "Other",
        }
    }
}

impl fmt::Display for SportCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Activity as handed over by a collaborator, before validation.
///
/// Every field is optional because upstream exports are loosely shaped.
/// Use [`RawActivity::into_record`] to obtain a typed [`ActivityRecord`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawActivity {
    pub id: Option<String>,
    pub name: Option<String>,
    /// Local start time as text, already resolved from the source's field fallbacks
    pub timestamp: Option<String>,
    pub activity_kind: Option<String>,
    pub duration_seconds: Option<Decimal>,
    pub explicit_load: Option<Decimal>,
    pub perceived_effort: Option<Decimal>,
    pub distance_meters: Option<Decimal>,
    pub elevation_gain_meters: Option<Decimal>,
}

impl RawActivity {
    /// Validate into a typed record. `index` is the record's position in the
    /// collaborator's batch and is reported back on failure.
    pub fn into_record(self, index: usize) -> Result<ActivityRecord> {
        let raw_timestamp = self
            .timestamp
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or_else(|| TrainLoadError::invalid_record(index, "missing timestamp"))?;

        let timestamp = parse_local_timestamp(raw_timestamp).ok_or_else(|| {
            TrainLoadError::invalid_record(
                index,
                format!("unparseable timestamp '{}'", raw_timestamp),
            )
        })?;

        if let Some(d) = self.duration_seconds {
            if d.is_sign_negative() && !d.is_zero() {
                return Err(TrainLoadError::invalid_record(
                    index,
                    format!("negative duration {}", d),
                ));
            }
        }

        for (field, value) in [
            ("duration", self.duration_seconds),
            ("explicit load", self.explicit_load),
            ("perceived effort", self.perceived_effort),
            ("distance", self.distance_meters),
            ("elevation gain", self.elevation_gain_meters),
        ] {
            if let Some(value) = value {
                if value.abs() > MAX_FIELD_VALUE {
                    return Err(TrainLoadError::invalid_record(
                        index,
                        format!("{} {} out of range", field, value),
                    ));
                }
            }
        }

        Ok(ActivityRecord {
            id: self.id,
            name: self.name,
            timestamp,
            activity_kind: self.activity_kind.unwrap_or_default(),
            duration_seconds: self.duration_seconds,
            explicit_load: self.explicit_load,
            perceived_effort: self.perceived_effort,
            distance_meters: self.distance_meters,
            elevation_gain_meters: self.elevation_gain_meters,
        })
    }
}

/// Validate a whole batch, stopping at the first contract violation
pub fn validate_batch(raw: Vec<RawActivity>) -> Result<Vec<ActivityRecord>> {
    raw.into_iter()
        .enumerate()
        .map(|(index, activity)| activity.into_record(index))
        .collect()
}

/// Parse a local start time in any of the formats upstream exports use.
///
/// RFC 3339 strings keep their wall-clock time; the offset is dropped because
/// day bucketing happens in the athlete's local time.
pub fn parse_local_timestamp(value: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.naive_local());
    }

    let formats = [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M:%SZ",
        "%Y-%m-%dT%H:%M:%S%.fZ",
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%d %H:%M:%S%.f",
    ];

    for format in &formats {
        if let Ok(dt) = NaiveDateTime::parse_from_str(value, format) {
            return Some(dt);
        }
    }

    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
}

/// One completed workout
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityRecord {
    /// Upstream identifier, if any
    pub id: Option<String>,

    /// Display name given by the athlete
    pub name: Option<String>,

    /// Local start time
    pub timestamp: NaiveDateTime,

    /// Free-form upstream category (e.g. "Ride", "Run")
    pub activity_kind: String,

    /// Moving (or elapsed) time in seconds, fractions kept
    pub duration_seconds: Option<Decimal>,

    /// Platform-computed training stress score
    pub explicit_load: Option<Decimal>,

    /// Platform-computed subjective effort score
    pub perceived_effort: Option<Decimal>,

    /// Distance in meters
    pub distance_meters: Option<Decimal>,

    /// Elevation gain in meters
    pub elevation_gain_meters: Option<Decimal>,
}

impl ActivityRecord {
    pub fn new(timestamp: NaiveDateTime, activity_kind: impl Into<String>) -> Self {
        ActivityRecord {
            id: None,
            name: None,
            timestamp,
            activity_kind: activity_kind.into(),
            duration_seconds: None,
            explicit_load: None,
            perceived_effort: None,
            distance_meters: None,
            elevation_gain_meters: None,
        }
    }

    pub fn with_explicit_load(mut self, load: Decimal) -> Self {
        self.explicit_load = Some(load);
        self
    }

    pub fn with_perceived_effort(mut self, effort: Decimal) -> Self {
        self.perceived_effort = Some(effort);
        self
    }

    pub fn with_duration(mut self, seconds: u32) -> Self {
        self.duration_seconds = Some(Decimal::from(seconds));
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_distance(mut self, meters: Decimal) -> Self {
        self.distance_meters = Some(meters);
        self
    }

    /// Local calendar day the activity belongs to
    pub fn date(&self) -> NaiveDate {
        self.timestamp.date()
    }

    pub fn sport(&self) -> SportCategory {
        SportCategory::from_kind(&self.activity_kind)
    }
}

/// Total estimated stress for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyLoadPoint {
    pub date: NaiveDate,

    /// Sum of estimated stress, zero on rest days
    pub total_load: Decimal,

    /// Number of activities that contributed
    pub activity_count: u16,
}

/// Model output for one calendar day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyMetricsPoint {
    pub date: NaiveDate,

    /// Daily load the averages were fed with
    pub load: Decimal,

    /// Long-horizon average
    pub fitness: Decimal,

    /// Short-horizon average
    pub fatigue: Decimal,

    /// Fitness minus fatigue
    pub form: Decimal,
}

/// Inclusive date window chosen by the caller
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct DateRange {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Self {
        DateRange { start, end }
    }

    /// The `days` calendar days ending at `end`, inclusive
    pub fn trailing_days(end: NaiveDate, days: u32) -> Self {
        let span = u64::from(days.saturating_sub(1));
        let start = end.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN);
        DateRange::new(Some(start), Some(end))
    }

    /// January 1st of `today`'s year through `today`
    pub fn year_to_date(today: NaiveDate) -> Self {
        let start = today.with_ordinal(1).unwrap_or(today);
        DateRange::new(Some(start), Some(today))
    }

    /// Check if a date falls within this range
    pub fn contains(&self, date: &NaiveDate) -> bool {
        let after_start = self.start.map_or(true, |start| date >= &start);
        let before_end = self.end.map_or(true, |end| date <= &end);
        after_start && before_end
    }

    /// Filter records by date range
    pub fn filter_records<'a>(&self, records: &'a [ActivityRecord]) -> Vec<&'a ActivityRecord> {
        records.iter().filter(|r| self.contains(&r.date())).collect()
    }
}
