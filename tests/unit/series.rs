//! Normalization and downsampling through the public API

use chrono::{Duration, TimeZone, Utc};
use fx_timeseries::series::{is_strictly_ascending, normalize, reduce, sort_and_dedup};
use fx_timeseries::{RatePoint, TimeseriesResponse};
use std::collections::HashMap;

fn response(rows: Vec<(&str, Vec<(&str, f64)>)>) -> TimeseriesResponse {
    TimeseriesResponse {
        base: "USD".to_string(),
        start_date: "2024-01-01".to_string(),
        end_date: "2024-01-31".to_string(),
        rates: rows
            .into_iter()
            .map(|(date, quotes)| {
                let quotes: HashMap<String, f64> =
                    quotes.iter().map(|(code, v)| (code.to_string(), *v)).collect();
                (date.to_string(), quotes)
            })
            .collect(),
    }
}

fn hourly(values: impl IntoIterator<Item = f64>) -> Vec<RatePoint> {
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    values
        .into_iter()
        .enumerate()
        .map(|(i, v)| RatePoint::new(start + Duration::hours(i as i64), v))
        .collect()
}

#[test]
fn test_sparse_symbol_yields_only_quoted_dates() {
    let response = response(vec![
        ("2024-01-05", vec![("JPY", 144.0)]),
        ("2024-01-01", vec![("JPY", 141.0), ("EUR", 0.91)]),
        ("2024-01-02", vec![("EUR", 0.92)]),
        ("not-a-date", vec![("JPY", 1.0)]),
    ]);

    let points = normalize(&response, "JPY");

    assert_eq!(points.len(), 2);
    assert_eq!(points[0].timestamp, Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap());
    assert_eq!(points[0].value, 141.0);
    assert_eq!(points[1].timestamp, Utc.with_ymd_and_hms(2024, 1, 5, 0, 0, 0).unwrap());
    assert!(is_strictly_ascending(&points));
}

#[test]
fn test_normalize_unknown_symbol_is_empty() {
    let response = response(vec![("2024-01-01", vec![("EUR", 0.91)])]);
    assert!(normalize(&response, "JPY").is_empty());
}

#[test]
fn test_sort_and_dedup_keeps_later_duplicate() {
    let mut points = hourly([1.0, 2.0, 3.0]);
    points.push(RatePoint::new(points[1].timestamp, 9.0));
    points.reverse();

    let cleaned = sort_and_dedup(points);

    assert!(is_strictly_ascending(&cleaned));
    assert_eq!(cleaned.len(), 3);
}

#[test]
fn test_reduce_contract_over_sizes() {
    let wave: Vec<f64> = (0..2_000).map(|i| (i as f64 / 17.0).sin() * 10.0 + 100.0).collect();
    let points = hourly(wave);

    for max in [3, 4, 10, 99, 600, 1_999] {
        let reduced = reduce(&points, max);
        assert!(reduced.len() <= max, "max {max} gave {}", reduced.len());
        assert_eq!(reduced.first(), points.first(), "max {max}");
        assert_eq!(reduced.last(), points.last(), "max {max}");
        assert!(is_strictly_ascending(&reduced), "max {max}");
        assert!(reduced.iter().all(|p| points.contains(p)), "max {max}");
    }
}

#[test]
fn test_reduce_keeps_spike_and_dip() {
    let mut values = vec![100.0; 1_000];
    values[337] = 250.0;
    values[712] = 10.0;
    let points = hourly(values);

    let reduced = reduce(&points, 50);

    assert!(reduced.iter().any(|p| p.value == 250.0));
    assert!(reduced.iter().any(|p| p.value == 10.0));
}

#[test]
fn test_reduce_is_identity_when_within_bound() {
    let points = hourly([1.0, 5.0, 2.0, 8.0]);
    assert_eq!(reduce(&points, 4), points);
    assert_eq!(reduce(&points, 600), points);
    assert_eq!(reduce(&points, 2), points);
    assert!(reduce(&[], 10).is_empty());
}
