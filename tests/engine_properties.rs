use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use trainload::{
    ActivityRecord, DailyAggregator, LoadEstimator, LoadSource, PmcCalculator,
    TrainingLoadEngine,
};

fn base_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
}

/// (day offset, load in tenths) pairs turned into records at staggered times
fn records_from(spec: &[(u32, u32)]) -> Vec<ActivityRecord> {
    spec.iter()
        .enumerate()
        .map(|(i, &(day, tenths))| {
            let ts = (base_date() + Duration::days(i64::from(day)))
                .and_hms_opt((i % 24) as u32, 0, 0)
                .unwrap();
            ActivityRecord::new(ts, "Run").with_explicit_load(Decimal::new(i64::from(tenths), 1))
        })
        .collect()
}

proptest! {
    #[test]
    fn test_aggregate_is_contiguous_and_preserves_load(
        spec in prop::collection::vec((0u32..120, 0u32..3000), 1..40)
    ) {
        let records = records_from(&spec);
        let daily = DailyAggregator::default().aggregate(&records).unwrap();

        let first = spec.iter().map(|(d, _)| *d).min().unwrap();
        let last = spec.iter().map(|(d, _)| *d).max().unwrap();
        prop_assert_eq!(daily.len() as u32, last - first + 1);

        for pair in daily.windows(2) {
            prop_assert_eq!(pair[0].date.succ_opt(), Some(pair[1].date));
        }

        let input: Decimal = records.iter().map(|r| r.explicit_load.unwrap()).sum();
        let output: Decimal = daily.iter().map(|d| d.total_load).sum();
        prop_assert_eq!(input, output);

        let count: u32 = daily.iter().map(|d| u32::from(d.activity_count)).sum();
        prop_assert_eq!(count as usize, records.len());
    }

    #[test]
    fn test_estimator_precedence(
        explicit in prop::option::of(0u32..500),
        effort in prop::option::of(0u32..300),
        seconds in prop::option::of(0u32..36_000),
    ) {
        let mut record = ActivityRecord::new(base_date().and_hms_opt(6, 0, 0).unwrap(), "Ride");
        record.explicit_load = explicit.map(Decimal::from);
        record.perceived_effort = effort.map(Decimal::from);
        record.duration_seconds = seconds.map(Decimal::from);

        let estimate = LoadEstimator::new().estimate(&record);
        match (explicit, effort, seconds) {
            (Some(v), _, _) => {
                prop_assert_eq!(estimate.source, LoadSource::Explicit);
                prop_assert_eq!(estimate.load, Decimal::from(v));
            }
            (None, Some(v), _) => {
                prop_assert_eq!(estimate.source, LoadSource::PerceivedEffort);
                prop_assert_eq!(estimate.load, Decimal::from(v));
            }
            (None, None, Some(s)) => {
                prop_assert_eq!(estimate.source, LoadSource::Duration);
                prop_assert_eq!(estimate.load, Decimal::from(s) / dec!(3600) * dec!(50));
            }
            (None, None, None) => {
                prop_assert_eq!(estimate.source, LoadSource::None);
                prop_assert_eq!(estimate.load, Decimal::ZERO);
            }
        }
        prop_assert!(!estimate.load.is_sign_negative() || estimate.load.is_zero());
    }

    #[test]
    fn test_engine_is_deterministic(
        spec in prop::collection::vec((0u32..60, 0u32..2000), 0..30)
    ) {
        let records = records_from(&spec);
        let engine = TrainingLoadEngine::new();

        let first = engine.analyze(&records).unwrap();
        let second = engine.analyze(&records).unwrap();
        prop_assert_eq!(&first, &second);
        prop_assert_eq!(engine.cache_key(&records).unwrap(), engine.cache_key(&records).unwrap());

        // Input order does not matter
        let mut reversed = records.clone();
        reversed.reverse();
        prop_assert_eq!(engine.analyze(&reversed).unwrap().series, first.series);
    }

    #[test]
    fn test_resume_matches_full_run(
        loads in prop::collection::vec(0u32..300, 2..60),
        split in 1usize..59,
    ) {
        let split = split.min(loads.len() - 1);
        let records: Vec<ActivityRecord> = loads
            .iter()
            .enumerate()
            .map(|(day, load)| {
                let ts = (base_date() + Duration::days(day as i64)).and_hms_opt(7, 0, 0).unwrap();
                ActivityRecord::new(ts, "Ride").with_explicit_load(Decimal::from(*load))
            })
            .collect();
        let daily = DailyAggregator::default().aggregate(&records).unwrap();

        let calculator = PmcCalculator::new();
        let full = calculator.calculate_series(&daily).unwrap();
        let head = calculator.calculate_series(&daily[..split]).unwrap();
        let tail = calculator.resume(head.last().unwrap(), &daily[split..]).unwrap();

        prop_assert_eq!(&full[split..], &tail[..]);
    }
}

#[test]
fn test_constant_load_converges() {
    let value = dec!(60);
    let records: Vec<ActivityRecord> = (0..400)
        .map(|day| {
            let ts = (base_date() + Duration::days(day)).and_hms_opt(7, 0, 0).unwrap();
            ActivityRecord::new(ts, "Ride").with_explicit_load(value)
        })
        .collect();

    let report = TrainingLoadEngine::new().analyze(&records).unwrap();

    // Seeded at the first load, both averages stay at v up to decimal rounding
    let tolerance = dec!(0.000000000000000001);
    for point in &report.series {
        assert!((point.fitness - value).abs() < tolerance);
        assert_eq!(point.fatigue, value);
        assert!(point.form.abs() < tolerance);
    }
}

#[test]
fn test_convergence_after_step_change() {
    // Start at 0 then hold 80: the gap to 80 shrinks by (1 − α) each day
    let mut records = vec![ActivityRecord::new(base_date().and_hms_opt(7, 0, 0).unwrap(), "Rest")];
    for day in 1..=300 {
        let ts = (base_date() + Duration::days(day)).and_hms_opt(7, 0, 0).unwrap();
        records.push(ActivityRecord::new(ts, "Ride").with_explicit_load(dec!(80)));
    }

    let report = TrainingLoadEngine::new().analyze(&records).unwrap();
    let gaps: Vec<Decimal> = report.series.iter().map(|p| dec!(80) - p.fitness).collect();

    let ratio = Decimal::ONE - PmcCalculator::smoothing_factor(42);
    for pair in gaps.windows(2).take(50) {
        assert!((pair[0] * ratio - pair[1]).abs() < dec!(0.000000000000000001));
    }

    let current = report.current.unwrap();
    assert!((dec!(80) - current.fitness) < dec!(0.01));
    assert!((dec!(80) - current.fatigue) < dec!(0.0000001));
    assert!(current.form.abs() < dec!(0.01));
}
