//! Repository orchestration: cache, retry, cancellation and error kinds

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use fx_timeseries::cache::{CacheStore, CacheStoreExt, ExpiringCache};
use fx_timeseries::cancel::CancelToken;
use fx_timeseries::fetcher::{
    FetcherError, FetcherResult, HttpRateService, RateService, SyntheticRateService,
    TimeseriesApiConfig, TransportKind,
};
use fx_timeseries::repository::{cache_key, ErrorKind, LiveRateRepository, RateRepository};
use fx_timeseries::{LatestRates, RatePoint, RetryPolicy, TimeseriesResponse};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::support::{CannedServer, USD_JPY_BODY};

fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy::new(
        max_attempts,
        Duration::from_millis(100),
        2.0,
        Duration::from_millis(400),
        0.0,
    )
    .unwrap()
}

/// Fails the first `fail_first` calls, then delegates to a synthetic series.
struct CountingService {
    calls: AtomicUsize,
    fail_first: usize,
    error: fn() -> FetcherError,
    inner: SyntheticRateService,
}

impl CountingService {
    fn healthy() -> Self {
        Self::failing(0, timeout)
    }

    fn failing(fail_first: usize, error: fn() -> FetcherError) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_first,
            error,
            inner: SyntheticRateService::new().with_noise(0.0),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

fn timeout() -> FetcherError {
    FetcherError::transport(TransportKind::Timeout, "timed out")
}

fn unavailable() -> FetcherError {
    FetcherError::BadStatus(503)
}

#[async_trait]
impl RateService for CountingService {
    async fn timeseries(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetcherResult<TimeseriesResponse> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err((self.error)());
        }
        self.inner.timeseries(base, symbol, start, end).await
    }

    async fn latest(&self, base: &str) -> FetcherResult<LatestRates> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.fail_first {
            return Err((self.error)());
        }
        self.inner.latest(base).await
    }
}

fn repository(
    service: Arc<CountingService>,
    retry: RetryPolicy,
) -> (LiveRateRepository<Arc<CountingService>>, Arc<ExpiringCache>) {
    let cache = Arc::new(ExpiringCache::new());
    let repo = LiveRateRepository::new(service, cache.clone()).with_retry(retry);
    (repo, cache)
}

#[tokio::test]
async fn test_cache_hit_skips_network() {
    let service = Arc::new(CountingService::healthy());
    let (repo, _) = repository(service.clone(), fast_retry(3));

    let first = repo.timeseries("USD", "JPY", day(1), day(10), true).await.unwrap();
    let second = repo.timeseries("USD", "JPY", day(1), day(10), true).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.len(), 10);
    assert_eq!(service.calls(), 1);
}

#[tokio::test]
async fn test_bypassing_cache_refetches_and_refreshes() {
    let service = Arc::new(CountingService::healthy());
    let (repo, cache) = repository(service.clone(), fast_retry(3));

    repo.timeseries("USD", "JPY", day(1), day(5), false).await.unwrap();
    repo.timeseries("USD", "JPY", day(1), day(5), false).await.unwrap();
    assert_eq!(service.calls(), 2);

    let cached: Option<Vec<RatePoint>> =
        cache.get_json(&cache_key("USD", "JPY", day(1), day(5))).unwrap();
    assert_eq!(cached.map(|p| p.len()), Some(5));
}

#[tokio::test]
async fn test_different_ranges_use_different_entries() {
    let service = Arc::new(CountingService::healthy());
    let (repo, _) = repository(service.clone(), fast_retry(3));

    repo.timeseries("USD", "JPY", day(1), day(5), true).await.unwrap();
    repo.timeseries("USD", "JPY", day(1), day(6), true).await.unwrap();
    repo.timeseries("USD", "EUR", day(1), day(5), true).await.unwrap();

    assert_eq!(service.calls(), 3);
}

#[tokio::test]
async fn test_corrupt_cache_entry_is_a_miss() {
    let service = Arc::new(CountingService::healthy());
    let (repo, cache) = repository(service.clone(), fast_retry(3));
    let key = cache_key("USD", "JPY", day(1), day(3));
    cache.put(&key, b"{not json".to_vec(), Duration::ZERO).unwrap();

    let points = repo.timeseries("USD", "JPY", day(1), day(3), true).await.unwrap();

    assert_eq!(points.len(), 3);
    assert_eq!(service.calls(), 1);
    let repaired: Option<Vec<RatePoint>> = cache.get_json(&key).unwrap();
    assert_eq!(repaired, Some(points));
}

#[tokio::test]
async fn test_unquoted_symbol_is_empty_data_and_not_cached() {
    let cache = Arc::new(ExpiringCache::new());
    let service = SyntheticRateService::new().with_symbols(["EUR"]);
    let repo = LiveRateRepository::new(service, cache.clone());

    let err = repo.timeseries("USD", "JPY", day(1), day(3), true).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::EmptyData);
    assert!(cache.is_empty());
}

#[tokio::test]
async fn test_inverted_range_fails_before_any_call() {
    let service = Arc::new(CountingService::healthy());
    let (repo, _) = repository(service.clone(), fast_retry(3));

    let err = repo.timeseries("USD", "JPY", day(9), day(2), true).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::InvalidRange);
    assert_eq!(service.calls(), 0);
}

#[tokio::test(start_paused = true)]
async fn test_transient_failures_are_retried_until_success() {
    let service = Arc::new(CountingService::failing(2, timeout));
    let (repo, _) = repository(service.clone(), fast_retry(3));

    let points = repo.timeseries("USD", "JPY", day(1), day(4), true).await.unwrap();

    assert_eq!(points.len(), 4);
    assert_eq!(service.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_exhausted_retries_surface_transport_kind() {
    let service = Arc::new(CountingService::failing(usize::MAX, timeout));
    let (repo, _) = repository(service.clone(), fast_retry(3));

    let err = repo.timeseries("USD", "JPY", day(1), day(4), true).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(service.calls(), 3);
}

#[tokio::test(start_paused = true)]
async fn test_bad_status_is_not_retried() {
    let service = Arc::new(CountingService::failing(usize::MAX, unavailable));
    let (repo, _) = repository(service.clone(), fast_retry(5));

    let err = repo.timeseries("USD", "JPY", day(1), day(4), true).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BadStatus);
    assert_eq!(service.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_cancel_during_backoff_returns_last_error() {
    let service = Arc::new(CountingService::failing(usize::MAX, timeout));
    let cancel = CancelToken::new();
    let slow_retry = RetryPolicy::new(
        5,
        Duration::from_secs(60),
        2.0,
        Duration::from_secs(120),
        0.0,
    )
    .unwrap();
    let (repo, _) = repository(service.clone(), slow_retry);
    let repo = repo.with_cancel(cancel.clone());

    let started = tokio::time::Instant::now();
    let (result, _) = tokio::join!(
        repo.timeseries("USD", "JPY", day(1), day(4), true),
        async {
            tokio::time::sleep(Duration::from_secs(1)).await;
            cancel.cancel();
        }
    );

    let err = result.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Transport);
    assert_eq!(service.calls(), 1);
    assert!(started.elapsed() < Duration::from_secs(60));
}

#[tokio::test(start_paused = true)]
async fn test_latest_is_retried() {
    let service = Arc::new(CountingService::failing(1, timeout));
    let (repo, _) = repository(service.clone(), fast_retry(3));

    let latest = repo.latest("USD").await.unwrap();

    assert!(latest.rates.contains_key("JPY"));
    assert!(!latest.rates.contains_key("USD"));
    assert_eq!(service.calls(), 2);
}

#[tokio::test]
async fn test_http_round_trip_normalizes_sparse_rows() {
    let server = CannedServer::start(200, USD_JPY_BODY).await;
    let api = TimeseriesApiConfig::new(&server.url(), "/timeseries").unwrap();
    let repo = LiveRateRepository::new(
        HttpRateService::new(api).unwrap(),
        Arc::new(ExpiringCache::new()),
    );

    let points = repo.timeseries("USD", "JPY", day(1), day(3), true).await.unwrap();
    repo.timeseries("USD", "JPY", day(1), day(3), true).await.unwrap();

    assert_eq!(
        points,
        vec![RatePoint::new(day(1), 141.0), RatePoint::new(day(3), 143.5)]
    );
    assert_eq!(server.hits(), 1);
}

#[tokio::test]
async fn test_http_server_error_is_bad_status_after_one_request() {
    let server = CannedServer::start(500, "{}").await;
    let api = TimeseriesApiConfig::new(&server.url(), "/timeseries").unwrap();
    let repo = LiveRateRepository::new(
        HttpRateService::new(api).unwrap(),
        Arc::new(ExpiringCache::new()),
    )
    .with_retry(fast_retry(3));

    let err = repo.timeseries("USD", "JPY", day(1), day(3), true).await.unwrap_err();

    assert_eq!(err.kind(), ErrorKind::BadStatus);
    assert_eq!(err.to_string(), "bad status: 500");
    assert_eq!(server.hits(), 1);
}
