//! Daily bucketing of estimated stress into a contiguous series.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::collections::BTreeMap;

use crate::error::{CalculationError, Result};
use crate::load::LoadEstimator;
use crate::models::{ActivityRecord, DailyLoadPoint};

#[derive(Debug, Clone, Default)]
pub struct DailyAggregator {
    estimator: LoadEstimator,
}

impl DailyAggregator {
    pub fn new(estimator: LoadEstimator) -> Self {
        DailyAggregator { estimator }
    }

    /// Sum estimated stress per local calendar day. Only days with at least
    /// one activity are present in the map.
    pub fn bucket_by_day<'a, I>(&self, records: I) -> Result<BTreeMap<NaiveDate, DailyLoadPoint>>
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        let mut daily: BTreeMap<NaiveDate, DailyLoadPoint> = BTreeMap::new();

        for record in records {
            let date = record.date();
            let load = self.estimator.estimate_load(record);

            let day = daily.entry(date).or_insert(DailyLoadPoint {
                date,
                total_load: Decimal::ZERO,
                activity_count: 0,
            });
            day.total_load = day.total_load.checked_add(load).ok_or_else(|| {
                CalculationError::Overflow {
                    calculation: "daily aggregation".to_string(),
                    date: date.to_string(),
                }
            })?;
            day.activity_count = day.activity_count.saturating_add(1);
        }

        Ok(daily)
    }

    /// Contiguous series from the earliest to the latest activity day.
    /// Empty input yields an empty series.
    pub fn aggregate<'a, I>(&self, records: I) -> Result<Vec<DailyLoadPoint>>
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        self.aggregate_through(records, None)
    }

    /// Like [`aggregate`](Self::aggregate), but zero-pads the tail up to
    /// `extend_to` when that date lies after the last activity.
    pub fn aggregate_through<'a, I>(
        &self,
        records: I,
        extend_to: Option<NaiveDate>,
    ) -> Result<Vec<DailyLoadPoint>>
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        let daily = self.bucket_by_day(records)?;

        let (first, last) = match (daily.keys().next(), daily.keys().next_back()) {
            (Some(first), Some(last)) => (*first, *last),
            _ => return Ok(Vec::new()),
        };
        let last = extend_to.map_or(last, |end| end.max(last));

        let mut series = Vec::with_capacity((last - first).num_days() as usize + 1);
        let mut current = first;

        loop {
            let point = daily.get(&current).cloned().unwrap_or(DailyLoadPoint {
                date: current,
                total_load: Decimal::ZERO,
                activity_count: 0,
            });
            series.push(point);

            if current == last {
                break;
            }
            current = current.succ_opt().ok_or_else(|| CalculationError::DateOutOfRange {
                calculation: "daily aggregation".to_string(),
            })?;
        }

        tracing::debug!(
            days = series.len(),
            active_days = daily.len(),
            first = %first,
            last = %last,
            "Aggregated daily load"
        );

        Ok(series)
    }
}
