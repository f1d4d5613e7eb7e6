//! Per-activity training stress estimation.
//!
//! Platform-computed scores always win over the duration heuristic:
//! explicit load, then perceived effort, then time at a fixed intensity.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::models::ActivityRecord;

const SECONDS_PER_HOUR: u32 = 3600;

/// Which signal produced an estimate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoadSource {
    Explicit,
    PerceivedEffort,
    Duration,
    None,
}

/// Stress value together with the signal it came from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LoadEstimate {
    pub load: Decimal,
    pub source: LoadSource,
}

/// Estimator settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Stress points assigned per hour when only duration is known (default: 50)
    pub stress_per_hour: Decimal,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        EstimatorConfig {
            stress_per_hour: dec!(50),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoadEstimator {
    config: EstimatorConfig,
}

impl LoadEstimator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: EstimatorConfig) -> Self {
        LoadEstimator { config }
    }

    /// Estimate stress for one activity
    pub fn estimate(&self, record: &ActivityRecord) -> LoadEstimate {
        let estimate = match (
            record.explicit_load,
            record.perceived_effort,
            record.duration_seconds,
        ) {
            (Some(load), _, _) => LoadEstimate {
                load,
                source: LoadSource::Explicit,
            },
            (None, Some(effort), _) => LoadEstimate {
                load: effort,
                source: LoadSource::PerceivedEffort,
            },
            (None, None, Some(seconds)) => LoadEstimate {
                load: (seconds / Decimal::from(SECONDS_PER_HOUR))
                    .saturating_mul(self.config.stress_per_hour),
                source: LoadSource::Duration,
            },
            (None, None, None) => LoadEstimate {
                load: Decimal::ZERO,
                source: LoadSource::None,
            },
        };

        if estimate.load.is_sign_negative() && !estimate.load.is_zero() {
            tracing::warn!(
                load = %estimate.load,
                source = ?estimate.source,
                timestamp = %record.timestamp,
                "Negative upstream score clamped to zero"
            );
            return LoadEstimate {
                load: Decimal::ZERO,
                ..estimate
            };
        }

        estimate
    }

    /// Estimated stress value only
    pub fn estimate_load(&self, record: &ActivityRecord) -> Decimal {
        self.estimate(record).load
    }
}
