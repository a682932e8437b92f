//! End-to-end CLI runs against the synthetic rate service

use assert_cmd::Command;
use std::fs;
use tempfile::TempDir;

fn fx() -> Command {
    let mut cmd = Command::cargo_bin("fx-timeseries").unwrap();
    cmd.env_remove("FX_ALERT_STATE").env_remove("FX_METRICS_ADDR");
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.assert().success().get_output().stdout.clone();
    String::from_utf8(output).unwrap()
}

#[test]
fn test_timeseries_human_summary() {
    let out = stdout_of(fx().args([
        "--offline",
        "timeseries",
        "--base",
        "usd",
        "--symbol",
        "jpy",
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-31",
        "--sma",
        "5",
    ]));

    assert!(out.contains("USD->JPY 2024-01-01..2024-01-31: 31 points"), "{out}");
    assert!(out.contains("sma(5)"), "{out}");
}

#[test]
fn test_timeseries_json_respects_max_points() {
    let out = stdout_of(fx().args([
        "--offline",
        "--output-format",
        "json",
        "timeseries",
        "--start",
        "2023-01-01",
        "--end",
        "2024-12-31",
        "--max-points",
        "40",
        "--rsi",
        "14",
    ]));

    let report: serde_json::Value = serde_json::from_str(&out).unwrap();
    let points = report["points"].as_array().unwrap();
    assert!(points.len() <= 40);
    assert_eq!(points.last().unwrap()["timestamp"], "2024-12-31T00:00:00Z");
    assert_eq!(report["indicators"][0]["name"], "rsi(14)");
}

#[test]
fn test_timeseries_writes_csv() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("out").join("usd_jpy.csv");

    fx().args([
        "--offline",
        "timeseries",
        "--start",
        "2024-01-01",
        "--end",
        "2024-01-05",
        "--csv",
        path.to_str().unwrap(),
    ])
    .assert()
    .success();

    let content = fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "date,rate(USD->JPY)");
    assert_eq!(lines.len(), 6);
    assert!(lines[1].starts_with("2024-01-01,"));
    assert!(lines[5].starts_with("2024-01-05,"));
}

#[test]
fn test_latest_lists_quoted_currencies() {
    let out = stdout_of(fx().args(["--offline", "latest", "--base", "USD"]));

    assert!(out.starts_with("Rates against USD"), "{out}");
    assert!(out.contains("EUR"));
    assert!(out.contains("JPY"));
    assert!(!out.contains("  USD "));
}

#[test]
fn test_latest_symbol_filter() {
    let out = stdout_of(fx().args([
        "--offline",
        "--output-format",
        "json",
        "latest",
        "--symbol",
        "eur",
    ]));

    let body: serde_json::Value = serde_json::from_str(&out).unwrap();
    let rates = body["rates"].as_object().unwrap();
    assert_eq!(rates.len(), 1);
    assert!(rates.contains_key("EUR"));
}

#[test]
fn test_alert_fires_and_persists_once_flag() {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("thresholds.json");
    let state_arg = state.to_str().unwrap();

    let first = stdout_of(fx().args([
        "--offline",
        "alert",
        "--upper",
        "0",
        "--upper-once",
        "--state",
        state_arg,
    ]));
    assert!(first.contains("ALERT above"), "{first}");
    assert!(state.exists());

    let second = stdout_of(fx().args(["--offline", "alert", "--state", state_arg]));
    assert!(second.contains("no alerts"), "{second}");

    let rearmed = stdout_of(fx().args(["--offline", "alert", "--reset", "--state", state_arg]));
    assert!(rearmed.contains("ALERT above"), "{rearmed}");
}

#[test]
fn test_alert_resetting_bounds_keeps_fired_once_flag() {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("thresholds.json");
    let state_arg = state.to_str().unwrap();
    let set_bounds = [
        "--offline",
        "alert",
        "--upper",
        "0",
        "--upper-once",
        "--state",
        state_arg,
    ];

    let first = stdout_of(fx().args(set_bounds));
    assert!(first.contains("ALERT above"), "{first}");

    let second = stdout_of(fx().args(set_bounds));
    assert!(second.contains("no alerts"), "{second}");
}

#[test]
fn test_alert_without_threshold() {
    let temp_dir = TempDir::new().unwrap();
    let state = temp_dir.path().join("thresholds.json");

    let out = stdout_of(fx().args([
        "--offline",
        "alert",
        "--symbol",
        "EUR",
        "--state",
        state.to_str().unwrap(),
    ]));
    assert!(out.contains("No threshold configured for USD->EUR"), "{out}");
}

#[test]
fn test_invalid_currency_fails() {
    fx().args(["--offline", "timeseries", "--base", "US"])
        .assert()
        .failure();
}

#[test]
fn test_inverted_range_fails() {
    fx().args([
        "--offline",
        "timeseries",
        "--start",
        "2024-02-01",
        "--end",
        "2024-01-01",
    ])
    .assert()
    .failure();
}

#[test]
fn test_unreachable_api_fails_after_retries() {
    fx().args([
        "--api-base-url",
        "http://127.0.0.1:9",
        "--max-retries",
        "0",
        "latest",
    ])
    .assert()
    .failure();
}
