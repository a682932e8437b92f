//! Tracing setup used by the binary

use chrono::{TimeZone, Utc};
use fx_timeseries::cache::ExpiringCache;
use fx_timeseries::fetcher::SyntheticRateService;
use fx_timeseries::repository::{LiveRateRepository, RateRepository};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

#[test]
fn test_tracing_subscriber_initialization() {
    // try_init: another test may already have installed a subscriber
    let result = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fx_timeseries=debug")),
        )
        .with_test_writer()
        .try_init();

    assert!(result.is_ok() || result.is_err());
}

#[test]
fn test_tracing_json_format() {
    let result = tracing_subscriber::fmt()
        .json()
        .with_env_filter(EnvFilter::new("fx_timeseries=info"))
        .with_test_writer()
        .try_init();

    assert!(result.is_ok() || result.is_err());
}

#[test]
fn test_env_filter_directives_parse() {
    for directive in ["info", "fx_timeseries=debug", "fx_timeseries::repository=trace,warn"] {
        assert!(EnvFilter::try_new(directive).is_ok(), "{directive}");
    }
}

#[tokio::test]
async fn test_repository_logs_under_subscriber() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new("fx_timeseries=trace"))
        .with_test_writer()
        .try_init();

    info!("starting instrumented fetch");
    warn!("warnings are routed to the test writer");
    error!("so are errors");

    let repo = LiveRateRepository::new(SyntheticRateService::new(), Arc::new(ExpiringCache::new()));
    let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    let end = Utc.with_ymd_and_hms(2024, 1, 3, 0, 0, 0).unwrap();

    let points = repo.timeseries("USD", "JPY", start, end, true).await.unwrap();
    assert_eq!(points.len(), 3);
}
