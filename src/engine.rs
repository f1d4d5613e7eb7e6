//! Training load analytics engine.
//!
//! Wires the pipeline together: load estimation, daily aggregation, the
//! fitness/fatigue model and status classification. Every call is a pure
//! function of its arguments; nothing is kept between invocations.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::aggregate::DailyAggregator;
use crate::error::{Result, TrainLoadError};
use crate::load::{EstimatorConfig, LoadEstimator};
use crate::models::{validate_batch, ActivityRecord, DailyMetricsPoint, DateRange, RawActivity};
use crate::pmc::{PmcCalculator, PmcConfig};
use crate::status::{StatusClassifier, StatusThresholds, TrainingStatus};

/// Everything the engine can be tuned with
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub pmc: PmcConfig,

    #[serde(default)]
    pub status: StatusThresholds,

    #[serde(default)]
    pub estimator: EstimatorConfig,

    /// Zero-pad the series to the window end so "current" means the window's
    /// last day rather than the last activity day
    #[serde(default)]
    pub pad_to_window_end: bool,
}

impl EngineConfig {
    pub fn validate(&self) -> Result<()> {
        self.pmc.validate()?;
        self.status.validate()?;
        if self.estimator.stress_per_hour.is_sign_negative() && !self.estimator.stress_per_hour.is_zero() {
            return Err(TrainLoadError::Configuration(format!(
                "stress_per_hour must be non-negative, got {}",
                self.estimator.stress_per_hour
            )));
        }
        Ok(())
    }
}

/// Result of one engine run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EngineReport {
    /// One point per calendar day of the aggregated window
    pub series: Vec<DailyMetricsPoint>,

    /// Classification of the last point
    pub status: TrainingStatus,

    /// Last point of the series, if any
    pub current: Option<DailyMetricsPoint>,
}

impl EngineReport {
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }

    pub fn current_form(&self) -> Option<Decimal> {
        self.current.as_ref().map(|point| point.form)
    }
}

pub struct TrainingLoadEngine {
    config: EngineConfig,
    aggregator: DailyAggregator,
    calculator: PmcCalculator,
    classifier: StatusClassifier,
}

impl TrainingLoadEngine {
    /// Create an engine with default settings
    pub fn new() -> Self {
        TrainingLoadEngine {
            config: EngineConfig::default(),
            aggregator: DailyAggregator::default(),
            calculator: PmcCalculator::new(),
            classifier: StatusClassifier::default(),
        }
    }

    /// Create an engine from validated settings
    pub fn with_config(config: EngineConfig) -> Result<Self> {
        config.validate()?;

        Ok(TrainingLoadEngine {
            aggregator: DailyAggregator::new(LoadEstimator::with_config(config.estimator.clone())),
            calculator: PmcCalculator::with_config(config.pmc.clone())?,
            classifier: StatusClassifier::new(config.status.clone())?,
            config,
        })
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run the full pipeline over every record given
    pub fn analyze(&self, records: &[ActivityRecord]) -> Result<EngineReport> {
        self.run(records.iter(), None)
    }

    /// Run the pipeline over the records that fall inside `window`
    pub fn analyze_window(
        &self,
        records: &[ActivityRecord],
        window: &DateRange,
    ) -> Result<EngineReport> {
        let in_window = window.filter_records(records);
        tracing::debug!(
            total = records.len(),
            in_window = in_window.len(),
            start = ?window.start,
            end = ?window.end,
            "Filtered records to window"
        );

        let extend_to = if self.config.pad_to_window_end {
            window.end
        } else {
            None
        };
        self.run(in_window, extend_to)
    }

    /// Validate collaborator records, then analyse them
    pub fn analyze_raw(
        &self,
        raw: Vec<RawActivity>,
        window: Option<&DateRange>,
    ) -> Result<EngineReport> {
        let records = validate_batch(raw)?;
        match window {
            Some(window) => self.analyze_window(&records, window),
            None => self.analyze(&records),
        }
    }

    fn run<'a, I>(&self, records: I, extend_to: Option<chrono::NaiveDate>) -> Result<EngineReport>
    where
        I: IntoIterator<Item = &'a ActivityRecord>,
    {
        let daily = self.aggregator.aggregate_through(records, extend_to)?;
        if daily.is_empty() {
            tracing::info!("No activities in window, status is insufficient data");
            return Ok(EngineReport {
                series: Vec::new(),
                status: TrainingStatus::InsufficientData,
                current: None,
            });
        }

        let series = self.calculator.calculate_series(&daily)?;
        let current = series.last().cloned();
        let status = self.classifier.status(current.as_ref().map(|p| p.form));

        if let Some(point) = &current {
            tracing::info!(
                date = %point.date,
                fitness = %point.fitness.round_dp(1),
                fatigue = %point.fatigue.round_dp(1),
                form = %point.form.round_dp(1),
                status = %status,
                "Training status computed"
            );
        }

        Ok(EngineReport {
            series,
            status,
            current,
        })
    }

    /// Stable key for memoising reports: SHA-256 over the engine settings
    /// and the records, hex encoded
    pub fn cache_key(&self, records: &[ActivityRecord]) -> Result<String> {
        let mut hasher = Sha256::new();

        let config = serde_json::to_vec(&self.config)
            .map_err(|e| TrainLoadError::Validation(format!("cannot hash configuration: {}", e)))?;
        hasher.update(&config);

        let payload = serde_json::to_vec(records)
            .map_err(|e| TrainLoadError::Validation(format!("cannot hash records: {}", e)))?;
        hasher.update(&payload);

        Ok(format!("{:x}", hasher.finalize()))
    }
}

impl Default for TrainingLoadEngine {
    fn default() -> Self {
        Self::new()
    }
}
