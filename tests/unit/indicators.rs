//! Indicator values against hand-computed references

use chrono::{Duration, TimeZone, Utc};
use fx_timeseries::indicators::{bollinger, rsi, sma, DEFAULT_RSI_PERIOD};
use fx_timeseries::RatePoint;

fn daily(values: &[f64]) -> Vec<RatePoint> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    values
        .iter()
        .enumerate()
        .map(|(i, v)| RatePoint::new(start + Duration::days(i as i64), *v))
        .collect()
}

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn test_sma_three_day_window() {
    let points = daily(&[1.0, 2.0, 3.0, 4.0, 5.0]);
    let out = sma(&points, 3);

    let values: Vec<f64> = out.iter().map(|p| p.value).collect();
    assert_eq!(values, vec![2.0, 3.0, 4.0]);
    assert_eq!(out[0].timestamp, points[2].timestamp);
    assert_eq!(out[2].timestamp, points[4].timestamp);
}

#[test]
fn test_sma_needs_a_full_window() {
    let points = daily(&[1.0, 2.0]);
    assert!(sma(&points, 3).is_empty());
    assert!(sma(&points, 1).is_empty());
}

#[test]
fn test_bollinger_population_deviation() {
    let points = daily(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
    let bands = bollinger(&points, 8, 2.0);

    assert_eq!(bands.len(), 1);
    assert!(approx(bands.middle[0].value, 5.0));
    assert!(approx(bands.upper[0].value, 9.0));
    assert!(approx(bands.lower[0].value, 1.0));
    assert_eq!(bands.upper[0].timestamp, points[7].timestamp);
}

#[test]
fn test_bollinger_flat_series_collapses() {
    let points = daily(&[3.0; 25]);
    let bands = bollinger(&points, 20, 2.0);

    assert_eq!(bands.len(), 6);
    assert!(bands.upper.iter().zip(&bands.lower).all(|(u, l)| approx(u.value, l.value)));
}

#[test]
fn test_rsi_saturates_on_monotonic_rise() {
    let values: Vec<f64> = (0..=DEFAULT_RSI_PERIOD + 1).map(|i| 1.10 + i as f64 * 0.01).collect();
    let out = rsi(&daily(&values), DEFAULT_RSI_PERIOD);

    assert_eq!(out.len(), 1);
    assert_eq!(out[0].value, 100.0);
    assert_eq!(out[0].timestamp, daily(&values)[DEFAULT_RSI_PERIOD + 1].timestamp);
}

#[test]
fn test_rsi_first_value_is_smoothed() {
    // diffs +2, -1, +1 with period 2: seeded at gain 1.0 / loss 0.5, first
    // emitted value after smoothing in +1 is 80
    let points = daily(&[10.0, 12.0, 11.0, 12.0]);
    let out = rsi(&points, 2);

    assert_eq!(out.len(), 1);
    assert!(approx(out[0].value, 80.0));
    assert_eq!(out[0].timestamp, points[3].timestamp);
}

#[test]
fn test_rsi_period_plus_one_points_is_empty() {
    let values: Vec<f64> = (0..11).map(|i| 1.0 + i as f64).collect();
    assert!(rsi(&daily(&values), 10).is_empty());
}

#[test]
fn test_rsi_stays_in_range() {
    let values: Vec<f64> = (0..120)
        .map(|i| 140.0 + (i as f64 / 5.0).sin() * 3.0 + (i % 7) as f64 * 0.1)
        .collect();
    let out = rsi(&daily(&values), DEFAULT_RSI_PERIOD);

    assert_eq!(out.len(), values.len() - DEFAULT_RSI_PERIOD - 1);
    assert!(out.iter().all(|p| (0.0..=100.0).contains(&p.value)));
}
