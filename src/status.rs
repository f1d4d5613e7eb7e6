//! Readiness classification from the current form value.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Result, TrainLoadError};

/// Readiness band for a form value
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ReadinessBand {
    /// Fresh, ready for high-intensity stress
    Primed,
    /// Balanced load, steady-state training
    Productive,
    /// Elevated short-horizon stress, recovery recommended
    Fatigued,
}

impl ReadinessBand {
    pub fn label(&self) -> &'static str {
        match self {
            ReadinessBand::Primed => "PRIME",
            ReadinessBand::Productive => "PRODUCTIVE",
            ReadinessBand::Fatigued => "FATIGUED",
        }
    }

    /// Hex colour hint for dashboards
    pub fn color(&self) -> &'static str {
        match self {
            ReadinessBand::Primed => "#4CAF50",
            ReadinessBand::Productive => "#FFC107",
            ReadinessBand::Fatigued => "#FF5252",
        }
    }

    /// Get training recommendation
    pub fn recommendation(&self) -> &'static str {
        match self {
            ReadinessBand::Primed => "Good time for high-intensity sessions or racing",
            ReadinessBand::Productive => "Continue steady training progression",
            ReadinessBand::Fatigued => "Reduce intensity and prioritise recovery",
        }
    }
}

/// Status reported for a window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrainingStatus {
    Ready(ReadinessBand),
    /// No activities in the window, nothing to classify
    InsufficientData,
}

impl TrainingStatus {
    pub fn band(&self) -> Option<ReadinessBand> {
        match self {
            TrainingStatus::Ready(band) => Some(*band),
            TrainingStatus::InsufficientData => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TrainingStatus::Ready(band) => band.label(),
            TrainingStatus::InsufficientData => "INSUFFICIENT DATA",
        }
    }
}

impl fmt::Display for TrainingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Band edges. Ties belong to the Productive band.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusThresholds {
    /// Form strictly above this is Primed (default: +10)
    pub primed_above: Decimal,

    /// Form strictly below this is Fatigued (default: -10)
    pub fatigued_below: Decimal,
}

impl Default for StatusThresholds {
    fn default() -> Self {
        StatusThresholds {
            primed_above: dec!(10),
            fatigued_below: dec!(-10),
        }
    }
}

impl StatusThresholds {
    /// Symmetric bands of `±width`
    pub fn symmetric(width: Decimal) -> Self {
        StatusThresholds {
            primed_above: width.abs(),
            fatigued_below: -width.abs(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.fatigued_below > self.primed_above {
            return Err(TrainLoadError::Configuration(format!(
                "fatigued_below ({}) must not exceed primed_above ({})",
                self.fatigued_below, self.primed_above
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatusClassifier {
    thresholds: StatusThresholds,
}

impl StatusClassifier {
    pub fn new(thresholds: StatusThresholds) -> Result<Self> {
        thresholds.validate()?;
        Ok(StatusClassifier { thresholds })
    }

    pub fn thresholds(&self) -> &StatusThresholds {
        &self.thresholds
    }

    pub fn classify(&self, form: Decimal) -> ReadinessBand {
        if form > self.thresholds.primed_above {
            ReadinessBand::Primed
        } else if form < self.thresholds.fatigued_below {
            ReadinessBand::Fatigued
        } else {
            ReadinessBand::Productive
        }
    }

    /// Classify the latest form of a window, if there is one
    pub fn status(&self, current_form: Option<Decimal>) -> TrainingStatus {
        current_form.map_or(TrainingStatus::InsufficientData, |form| {
            TrainingStatus::Ready(self.classify(form))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        let classifier = StatusClassifier::default();

        assert_eq!(classifier.classify(dec!(10.0)), ReadinessBand::Productive);
        assert_eq!(classifier.classify(dec!(10.0001)), ReadinessBand::Primed);
        assert_eq!(classifier.classify(dec!(-10.0)), ReadinessBand::Productive);
        assert_eq!(classifier.classify(dec!(-10.0001)), ReadinessBand::Fatigued);
        assert_eq!(classifier.classify(Decimal::ZERO), ReadinessBand::Productive);
    }

    #[test]
    fn test_tighter_bands() {
        let classifier = StatusClassifier::new(StatusThresholds::symmetric(dec!(5))).unwrap();

        assert_eq!(classifier.classify(dec!(7)), ReadinessBand::Primed);
        assert_eq!(classifier.classify(dec!(5)), ReadinessBand::Productive);
        assert_eq!(classifier.classify(dec!(-7)), ReadinessBand::Fatigued);
    }

    #[test]
    fn test_collapsed_band() {
        // Equal edges leave Productive as the single tie value
        let classifier = StatusClassifier::new(StatusThresholds::symmetric(Decimal::ZERO)).unwrap();
        assert_eq!(classifier.classify(Decimal::ZERO), ReadinessBand::Productive);
        assert_eq!(classifier.classify(dec!(0.1)), ReadinessBand::Primed);
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let result = StatusClassifier::new(StatusThresholds {
            primed_above: dec!(-5),
            fatigued_below: dec!(5),
        });
        assert!(matches!(result, Err(TrainLoadError::Configuration(_))));
    }

    #[test]
    fn test_insufficient_data_status() {
        let classifier = StatusClassifier::default();

        let status = classifier.status(None);
        assert_eq!(status, TrainingStatus::InsufficientData);
        assert_eq!(status.band(), None);
        assert_eq!(status.to_string(), "INSUFFICIENT DATA");

        let status = classifier.status(Some(dec!(25)));
        assert_eq!(status.band(), Some(ReadinessBand::Primed));
        assert_eq!(status.to_string(), "PRIME");
    }

    #[test]
    fn test_band_presentation() {
        assert_eq!(ReadinessBand::Fatigued.color(), "#FF5252");
        assert!(ReadinessBand::Primed.recommendation().contains("high-intensity"));
    }
}
