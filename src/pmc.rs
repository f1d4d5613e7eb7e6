use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CalculationError, Result, TrainLoadError};
use crate::models::{DailyLoadPoint, DailyMetricsPoint};

/// How form relates to the same day's averages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormLag {
    /// form[t] = fitness[t] - fatigue[t]
    #[default]
    None,
    /// form[t] = fitness[t-1] - fatigue[t-1], zero on the first day
    PreviousDay,
}

/// PMC configuration with customizable spans
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PmcConfig {
    /// Fitness (long-horizon) EWMA span in days (default: 42)
    pub fitness_span: u16,

    /// Fatigue (short-horizon) EWMA span in days (default: 7)
    pub fatigue_span: u16,

    /// Form lag variant (default: unlagged)
    pub form_lag: FormLag,
}

impl Default for PmcConfig {
    fn default() -> Self {
        PmcConfig {
            fitness_span: 42,
            fatigue_span: 7,
            form_lag: FormLag::None,
        }
    }
}

impl PmcConfig {
    pub fn validate(&self) -> Result<()> {
        for (parameter, span) in [
            ("fitness_span", self.fitness_span),
            ("fatigue_span", self.fatigue_span),
        ] {
            if span == 0 {
                return Err(CalculationError::InvalidParameter {
                    calculation: "fitness/fatigue model".to_string(),
                    parameter: parameter.to_string(),
                    value: span.to_string(),
                }
                .into());
            }
        }
        Ok(())
    }
}

/// Running state of both averages after some day
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ModelState {
    pub date: NaiveDate,
    pub fitness: Decimal,
    pub fatigue: Decimal,
}

impl ModelState {
    /// Both averages start at the first day's load
    pub fn seed(day: &DailyLoadPoint) -> Self {
        ModelState {
            date: day.date,
            fitness: day.total_load,
            fatigue: day.total_load,
        }
    }

    /// Pick up from a previously computed point
    pub fn from_point(point: &DailyMetricsPoint) -> Self {
        ModelState {
            date: point.date,
            fitness: point.fitness,
            fatigue: point.fatigue,
        }
    }

    pub fn form(&self) -> Decimal {
        self.fitness - self.fatigue
    }
}

/// Fitness/fatigue model: two EWMAs over a contiguous daily load series
pub struct PmcCalculator {
    config: PmcConfig,
    fitness_alpha: Decimal,
    fatigue_alpha: Decimal,
}

impl PmcCalculator {
    /// Create new PMC calculator with default configuration
    pub fn new() -> Self {
        Self::from_valid_config(PmcConfig::default())
    }

    /// Create new PMC calculator with custom configuration
    pub fn with_config(config: PmcConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::from_valid_config(config))
    }

    fn from_valid_config(config: PmcConfig) -> Self {
        PmcCalculator {
            fitness_alpha: Self::smoothing_factor(config.fitness_span),
            fatigue_alpha: Self::smoothing_factor(config.fatigue_span),
            config,
        }
    }

    pub fn config(&self) -> &PmcConfig {
        &self.config
    }

    /// α = 2 / (span + 1)
    pub fn smoothing_factor(span: u16) -> Decimal {
        Decimal::from(2) / Decimal::from(u32::from(span) + 1)
    }

    /// One EWMA step: α·load + (1 − α)·previous, `None` on overflow
    pub fn ewma_step(alpha: Decimal, load: Decimal, previous: Decimal) -> Option<Decimal> {
        let fresh = alpha.checked_mul(load)?;
        let carried = (Decimal::ONE - alpha).checked_mul(previous)?;
        fresh.checked_add(carried)
    }

    fn advance(&self, state: &ModelState, day: &DailyLoadPoint) -> Result<ModelState> {
        let step = |alpha, previous| {
            Self::ewma_step(alpha, day.total_load, previous).ok_or_else(|| {
                CalculationError::Overflow {
                    calculation: "fitness/fatigue model".to_string(),
                    date: day.date.to_string(),
                }
            })
        };

        Ok(ModelState {
            date: day.date,
            fitness: step(self.fitness_alpha, state.fitness)?,
            fatigue: step(self.fatigue_alpha, state.fatigue)?,
        })
    }

    fn point(&self, day: &DailyLoadPoint, state: &ModelState, previous: Option<&ModelState>) -> DailyMetricsPoint {
        let form = match self.config.form_lag {
            FormLag::None => state.form(),
            FormLag::PreviousDay => previous.map_or(Decimal::ZERO, ModelState::form),
        };

        DailyMetricsPoint {
            date: day.date,
            load: day.total_load,
            fitness: state.fitness,
            fatigue: state.fatigue,
            form,
        }
    }

    /// Calculate metrics for every day of a contiguous load series, in a
    /// single left-to-right pass
    pub fn calculate_series(&self, daily: &[DailyLoadPoint]) -> Result<Vec<DailyMetricsPoint>> {
        let mut series = Vec::with_capacity(daily.len());
        let Some(first) = daily.first() else {
            return Ok(series);
        };

        let mut state = ModelState::seed(first);
        series.push(self.point(first, &state, None));

        for day in &daily[1..] {
            let next = self.advance(&state, day)?;
            series.push(self.point(day, &next, Some(&state)));
            state = next;
        }

        tracing::debug!(
            days = series.len(),
            fitness_span = self.config.fitness_span,
            fatigue_span = self.config.fatigue_span,
            "Calculated fitness/fatigue series"
        );

        Ok(series)
    }

    /// Continue a series from its last computed point. `daily` must start on
    /// the day after `last`.
    pub fn resume(
        &self,
        last: &DailyMetricsPoint,
        daily: &[DailyLoadPoint],
    ) -> Result<Vec<DailyMetricsPoint>> {
        if let Some(first) = daily.first() {
            if last.date.succ_opt() != Some(first.date) {
                return Err(TrainLoadError::Validation(format!(
                    "resumed series must start on {}, got {}",
                    last.date.succ_opt().map_or_else(|| "-".to_string(), |d| d.to_string()),
                    first.date
                )));
            }
        }

        let mut state = ModelState::from_point(last);
        let mut series = Vec::with_capacity(daily.len());
        for day in daily {
            let next = self.advance(&state, day)?;
            series.push(self.point(day, &next, Some(&state)));
            state = next;
        }

        Ok(series)
    }
}

impl Default for PmcCalculator {
    fn default() -> Self {
        Self::new()
    }
}
