//! Context for the workout-suggestion prompt.
//!
//! Only the text handed to the language model is built here; sending it is
//! someone else's job.

use chrono::NaiveDate;
use rust_decimal::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::engine::EngineReport;
use crate::error::{Result, TrainLoadError};
use crate::models::ActivityRecord;
use crate::status::TrainingStatus;
use crate::summary::primary_sport_label;

pub const MIN_SESSION_MINUTES: u32 = 30;
pub const MAX_SESSION_MINUTES: u32 = 120;
const RECENT_ACTIVITY_COUNT: usize = 3;

/// Session goal requested by the athlete
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionGoal {
    Base,
    Threshold,
    Vo2,
    Recovery,
}

impl fmt::Display for SessionGoal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SessionGoal::Base => "Base",
            SessionGoal::Threshold => "Threshold",
            SessionGoal::Vo2 => "VO2",
            SessionGoal::Recovery => "Recovery",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for SessionGoal {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "base" => Ok(SessionGoal::Base),
            "threshold" => Ok(SessionGoal::Threshold),
            "vo2" | "vo2max" => Ok(SessionGoal::Vo2),
            "recovery" => Ok(SessionGoal::Recovery),
            _ => Err(format!("Invalid goal: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentActivity {
    pub date: NaiveDate,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoachingContext {
    pub sport: String,
    pub goal: SessionGoal,
    pub minutes: u32,
    /// Current form truncated towards zero, 0 without data
    pub form: i64,
    pub status: TrainingStatus,
    pub recent: Vec<RecentActivity>,
}

impl CoachingContext {
    pub fn build(
        records: &[ActivityRecord],
        report: &EngineReport,
        goal: SessionGoal,
        minutes: u32,
    ) -> Result<Self> {
        if !(MIN_SESSION_MINUTES..=MAX_SESSION_MINUTES).contains(&minutes) {
            return Err(TrainLoadError::Validation(format!(
                "session length must be between {} and {} minutes, got {}",
                MIN_SESSION_MINUTES, MAX_SESSION_MINUTES, minutes
            )));
        }

        let form = report
            .current_form()
            .and_then(|f| f.trunc().to_i64())
            .unwrap_or(0);

        let mut newest_first: Vec<&ActivityRecord> = records.iter().collect();
        newest_first.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        let recent = newest_first
            .into_iter()
            .take(RECENT_ACTIVITY_COUNT)
            .map(|record| RecentActivity {
                date: record.date(),
                name: sanitize_name(record.name.as_deref().unwrap_or("")),
            })
            .collect();

        Ok(CoachingContext {
            sport: primary_sport_label(records),
            goal,
            minutes,
            form,
            status: report.status,
            recent,
        })
    }

    /// Render the generation prompt
    pub fn to_prompt(&self) -> String {
        let history = self
            .recent
            .iter()
            .map(|a| format!("- {} {}", a.date.format("%Y-%m-%d"), a.name))
            .collect::<Vec<_>>()
            .join("\n");

        let form_line = match self.status {
            TrainingStatus::InsufficientData => format!("{} (no recent training data)", self.form),
            TrainingStatus::Ready(_) => self.form.to_string(),
        };

        format!(
            "Act as an elite {sport} coach.\n\
             \n\
             Sport: {sport}\n\
             Goal: {goal}\n\
             Time: {minutes} min\n\
             Form: {form}\n\
             \n\
             Recent Training:\n\
             {history}\n\
             \n\
             FORMAT STRICTLY:\n\
             **Workout Name**\n\
             **Warm Up**\n\
             **Main Set**\n\
             **Cool Down**\n\
             **Coach's Logic**\n",
            sport = self.sport,
            goal = self.goal,
            minutes = self.minutes,
            form = form_line,
            history = history,
        )
    }
}

/// Keep only alphanumerics, spaces, dashes and underscores
pub fn sanitize_name(name: &str) -> String {
    name.chars()
        .filter(|c| c.is_alphanumeric() || matches!(c, ' ' | '-' | '_'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::TrainingLoadEngine;
    use rust_decimal_macros::dec;

    fn records() -> Vec<ActivityRecord> {
        let at = |day: u32| {
            NaiveDate::from_ymd_opt(2024, 4, day)
                .unwrap()
                .and_hms_opt(7, 0, 0)
                .unwrap()
        };
        vec![
            ActivityRecord::new(at(1), "Ride")
                .with_explicit_load(dec!(90))
                .with_name("Long ride"),
            ActivityRecord::new(at(4), "Run")
                .with_explicit_load(dec!(40))
                .with_name("Tempo <run> 🏃"),
            ActivityRecord::new(at(2), "Ride")
                .with_explicit_load(dec!(60))
                .with_name("Hill repeats!"),
            ActivityRecord::new(at(3), "Yoga").with_name("Stretch_session"),
        ]
    }

    #[test]
    fn test_sanitize_name() {
        assert_eq!(sanitize_name("Tempo <run> 🏃"), "Tempo run ");
        assert_eq!(sanitize_name("Z2-ride_easy"), "Z2-ride_easy");
    }

    #[test]
    fn test_context_picks_recent_and_sport() {
        let records = records();
        let report = TrainingLoadEngine::new().analyze(&records).unwrap();

        let context = CoachingContext::build(&records, &report, SessionGoal::Threshold, 60).unwrap();
        assert_eq!(context.sport, "Cycling");
        assert_eq!(context.recent.len(), 3);
        assert_eq!(context.recent[0].name, "Tempo run ");
        assert_eq!(context.recent[1].name, "Stretch_session");
        assert_eq!(context.recent[2].name, "Hill repeats");
        assert_eq!(
            Some(Decimal::from(context.form)),
            report.current_form().map(|f| f.trunc())
        );

        let prompt = context.to_prompt();
        assert!(prompt.starts_with("Act as an elite Cycling coach."));
        assert!(prompt.contains("Goal: Threshold"));
        assert!(prompt.contains("Time: 60 min"));
        assert!(prompt.contains("- 2024-04-04 Tempo run"));
        assert!(prompt.contains("**Coach's Logic**"));
    }

    #[test]
    fn test_empty_history() {
        let report = TrainingLoadEngine::new().analyze(&[]).unwrap();
        let context = CoachingContext::build(&[], &report, SessionGoal::Recovery, 30).unwrap();

        assert_eq!(context.sport, "General Fitness");
        assert_eq!(context.form, 0);
        assert!(context.to_prompt().contains("Form: 0 (no recent training data)"));
    }

    #[test]
    fn test_session_length_bounds() {
        let report = TrainingLoadEngine::new().analyze(&[]).unwrap();
        assert!(CoachingContext::build(&[], &report, SessionGoal::Base, 15).is_err());
        assert!(CoachingContext::build(&[], &report, SessionGoal::Base, 121).is_err());
    }

    #[test]
    fn test_goal_parsing() {
        assert_eq!("vo2".parse::<SessionGoal>().unwrap(), SessionGoal::Vo2);
        assert_eq!("Base".parse::<SessionGoal>().unwrap(), SessionGoal::Base);
        assert!("sprint".parse::<SessionGoal>().is_err());
        assert_eq!(SessionGoal::Vo2.to_string(), "VO2");
    }
}
