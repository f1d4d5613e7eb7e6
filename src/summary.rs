//! Volume summaries over a set of activities: monthly breakdown,
//! year-to-date totals, distance progression and primary sport.

use chrono::{Datelike, NaiveDate, NaiveDateTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::load::LoadEstimator;
use crate::models::{ActivityRecord, DateRange, SportCategory};

/// Label used when there are no activities at all
pub const GENERAL_FITNESS: &str = "General Fitness";

/// Totals for a set of activities
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VolumeTotals {
    pub activity_count: u32,
    pub distance_km: Decimal,
    pub moving_time_hours: Decimal,
    pub elevation_gain_m: Decimal,
    pub total_load: Decimal,
}

impl VolumeTotals {
    fn add(&mut self, record: &ActivityRecord, load: Decimal) {
        self.activity_count = self.activity_count.saturating_add(1);
        self.distance_km = self.distance_km.saturating_add(kilometers(record));
        self.moving_time_hours = self.moving_time_hours.saturating_add(
            record.duration_seconds.unwrap_or(Decimal::ZERO) / Decimal::from(3600),
        );
        self.elevation_gain_m = self
            .elevation_gain_m
            .saturating_add(record.elevation_gain_meters.unwrap_or(Decimal::ZERO));
        self.total_load = self.total_load.saturating_add(load);
    }
}

fn kilometers(record: &ActivityRecord) -> Decimal {
    record.distance_meters.unwrap_or(Decimal::ZERO) / Decimal::from(1000)
}

/// Monthly training summary
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySummary {
    pub year: i32,
    pub month: u32,
    pub month_name: String,
    pub totals: VolumeTotals,
}

/// One step of the cumulative distance curve
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistanceProgress {
    pub timestamp: NaiveDateTime,
    pub cumulative_km: Decimal,
}

pub struct SummaryCalculator {
    estimator: LoadEstimator,
}

impl SummaryCalculator {
    pub fn new(estimator: LoadEstimator) -> Self {
        SummaryCalculator { estimator }
    }

    /// Totals for every record given
    pub fn totals<'a, I>(&self, records: I) -> VolumeTotals
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        let mut totals = VolumeTotals::default();
        for record in records {
            totals.add(record, self.estimator.estimate_load(record));
        }
        totals
    }

    /// Per-month totals in chronological order
    pub fn monthly_summaries(&self, records: &[ActivityRecord]) -> Vec<MonthlySummary> {
        let mut months: BTreeMap<(i32, u32), VolumeTotals> = BTreeMap::new();

        for record in records {
            let date = record.date();
            months
                .entry((date.year(), date.month()))
                .or_default()
                .add(record, self.estimator.estimate_load(record));
        }

        months
            .into_iter()
            .map(|((year, month), totals)| MonthlySummary {
                year,
                month,
                month_name: month_name(year, month),
                totals,
            })
            .collect()
    }

    /// Totals from January 1st of `today`'s year through `today`
    pub fn year_to_date(&self, records: &[ActivityRecord], today: NaiveDate) -> VolumeTotals {
        let window = DateRange::year_to_date(today);
        self.totals(window.filter_records(records))
    }

    /// Running distance total, one entry per activity in time order
    pub fn cumulative_distance(&self, records: &[ActivityRecord]) -> Vec<DistanceProgress> {
        let mut ordered: Vec<&ActivityRecord> = records.iter().collect();
        ordered.sort_by_key(|r| r.timestamp);

        let mut running = Decimal::ZERO;
        ordered
            .into_iter()
            .map(|record| {
                running = running.saturating_add(kilometers(record));
                DistanceProgress {
                    timestamp: record.timestamp,
                    cumulative_km: running,
                }
            })
            .collect()
    }
}

impl Default for SummaryCalculator {
    fn default() -> Self {
        Self::new(LoadEstimator::default())
    }
}

/// Sport category with the largest platform-computed load.
///
/// Only `explicit_load` counts here; activities without it contribute zero.
/// Ties, including an all-zero batch, go to the category seen first in the
/// input. Returns `None` for an empty slice.
pub fn primary_sport(records: &[ActivityRecord]) -> Option<SportCategory> {
    // Insertion order doubles as the tie-break
    let mut load_by_sport: Vec<(SportCategory, Decimal)> = Vec::new();
    for record in records {
        let load = record.explicit_load.unwrap_or(Decimal::ZERO);
        match load_by_sport.iter_mut().find(|(sport, _)| *sport == record.sport()) {
            Some((_, total)) => *total = total.saturating_add(load),
            None => load_by_sport.push((record.sport(), load)),
        }
    }

    let mut best: Option<(SportCategory, Decimal)> = None;
    for (sport, load) in load_by_sport {
        if best.map_or(true, |(_, top)| load > top) {
            best = Some((sport, load));
        }
    }
    best.map(|(sport, _)| sport)
}

/// Display label for the primary sport, falling back to "General Fitness"
pub fn primary_sport_label(records: &[ActivityRecord]) -> String {
    primary_sport(records)
        .map(|sport| sport.label().to_string())
        .unwrap_or_else(|| GENERAL_FITNESS.to_string())
}

fn month_name(year: i32, month: u32) -> String {
    NaiveDate::from_ymd_opt(year, month, 1)
        .map(|d| d.format("%B %Y").to_string())
        .unwrap_or_else(|| format!("{}-{:02}", year, month))
}
