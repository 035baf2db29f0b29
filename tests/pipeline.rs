//! End-to-end checks of the shaping pipeline: raw JSON in, series,
//! summary and traffic condition out.

use flowcast::aggregate::{aggregate, GlobalStatistics};
use flowcast::condition::{Assessment, Recommendation, TrafficCondition};
use flowcast::forecast::RawForecast;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::{json, Value};

const HORIZON: usize = 9;
const ROUTES: usize = 228;

/// Forecast shaped like the prediction service output: (interval, route, channel).
fn synthetic(rng: &mut StdRng, lo: f64, hi: f64) -> Value {
    let intervals: Vec<Value> = (0..HORIZON)
        .map(|_| {
            let routes: Vec<Value> = (0..ROUTES).map(|_| json!([rng.gen_range(lo..hi)])).collect();
            Value::Array(routes)
        })
        .collect();
    Value::Array(intervals)
}

fn assess(v: Value) -> Assessment {
    let a = aggregate(&RawForecast::from(v));
    Assessment::from_summary(&a.summary)
}

#[test]
fn empty_forecast_is_neutral() {
    let a = aggregate(&RawForecast::from(json!([])));
    assert!(a.series.is_empty());
    assert_eq!(a.summary, GlobalStatistics::default());
    assert_eq!(
        Assessment::from_summary(&a.summary).condition,
        TrafficCondition::Moderate
    );
}

#[test]
fn single_interval_scenario() {
    let a = aggregate(&RawForecast::from(json!([[[0.2, 0.4], [0.6]]])));
    assert_eq!(a.series.len(), 1);
    assert!((a.series[0].average - 0.4).abs() < 1e-12);
    assert!((a.summary.mean - 0.4).abs() < 1e-12);
    assert_eq!(a.summary.median, 0.4);
    assert_eq!(a.summary.minimum, 0.2);
    assert_eq!(a.summary.maximum, 0.6);
    assert_eq!(
        TrafficCondition::classify(a.summary.mean),
        TrafficCondition::Moderate
    );
}

#[test]
fn mixed_entries_are_dropped_silently() {
    let a = aggregate(&RawForecast::from(json!([[1, "NaN", null, 2]])));
    assert_eq!(a.sample_count, 2);
    assert_eq!(a.series[0].average, 1.5);
}

#[test]
fn all_negative_is_favorable() {
    let a = assess(json!([[-1.0, -2.0], [[-1.5, -1.5]]]));
    assert_eq!(a.mean, -1.5);
    assert_eq!(a.condition, TrafficCondition::VeryLight);
    assert_eq!(a.recommendation, Recommendation::FavorableToTravel);
}

#[test]
fn synthetic_scenarios_classify_as_generated() {
    let mut rng = StdRng::seed_from_u64(7);

    let light = assess(synthetic(&mut rng, -1.5, -0.5));
    assert!(light.condition.is_favorable(), "{:?}", light);

    let moderate = assess(synthetic(&mut rng, -0.2, 0.4));
    assert_eq!(moderate.condition, TrafficCondition::Moderate);

    let heavy = assess(synthetic(&mut rng, 0.5, 1.3));
    assert_eq!(heavy.condition, TrafficCondition::Heavy);
    assert_eq!(heavy.recommendation, Recommendation::ConsiderAlternatives);

    let very_heavy = assess(synthetic(&mut rng, 1.5, 2.5));
    assert_eq!(very_heavy.condition, TrafficCondition::VeryHeavy);
}

#[test]
fn noisy_shapes_keep_series_well_formed() {
    let mut rng = StdRng::seed_from_u64(42);
    for _ in 0..50 {
        let n = rng.gen_range(0..12);
        let intervals: Vec<Value> = (0..n)
            .map(|_| match rng.gen_range(0..4) {
                0 => json!("not an interval"),
                1 => json!([]),
                _ => {
                    let routes: Vec<Value> = (0..rng.gen_range(0..6))
                        .map(|_| match rng.gen_range(0..6) {
                            0 => json!(null),
                            1 => json!("junk"),
                            2 => json!([rng.gen_range(-3.0..3.0), "x", [1.0]]),
                            3 => json!({"v": 1}),
                            _ => json!(rng.gen_range(-3.0..3.0)),
                        })
                        .collect();
                    Value::Array(routes)
                }
            })
            .collect();
        let raw = RawForecast::from(Value::Array(intervals));
        let a = aggregate(&raw);

        assert_eq!(a.series.len(), n);
        for (i, s) in a.series.iter().enumerate() {
            assert_eq!(s.label, format!("T+{}", i + 1));
            for v in [s.minimum, s.maximum, s.average] {
                assert!(v.is_finite());
            }
            if s.sample_count == 0 {
                assert_eq!((s.minimum, s.maximum, s.average), (0.0, 0.0, 0.0));
            }
        }
        let total: f64 = a.series.iter().map(|s| s.average * s.sample_count as f64).sum();
        if a.sample_count > 0 {
            assert!((a.summary.mean - total / a.sample_count as f64).abs() < 1e-9);
        } else {
            assert_eq!(a.summary, GlobalStatistics::default());
        }
        assert_eq!(aggregate(&raw), a);
    }
}
