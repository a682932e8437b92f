//! Rate repository orchestration
//!
//! [`LiveRateRepository::timeseries`] runs the full request path:
//!
//! 1. **Validate**: `start > end` fails with [`RepositoryError::InvalidRange`] before any I/O
//! 2. **Cache**: on a hit (when enabled) downsample and return, no network call
//! 3. **Fetch**: call the [`RateService`] through a [`RetryExecutor`]
//! 4. **Normalize**: extract the requested symbol; zero points is [`RepositoryError::EmptyData`]
//! 5. **Write-through**: store the full normalized series under a fixed TTL
//! 6. **Downsample**: bound the result to `max_chart_points`
//!
//! Cache failures never fail a request: a write failure is logged and
//! ignored, a corrupt payload is treated as a miss.
//!
//! Concurrent requests for the same key are not coalesced; each one fetches
//! and the last cache write wins.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn, Instrument};

use crate::cache::{CacheStore, CacheStoreExt};
use crate::cancel::CancelToken;
use crate::fetcher::{FetcherError, RateService};
use crate::metrics;
use crate::retry::{RetryExecutor, RetryPolicy};
use crate::series;
use crate::{LatestRates, RatePoint};

/// Default upper bound on points handed to a chart
pub const DEFAULT_MAX_CHART_POINTS: usize = 600;

/// Default TTL for cached series
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30 * 60);

/// Stable, inspectable error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Network-layer failure after retries
    Transport,
    /// Non-2xx response
    BadStatus,
    /// Body did not match the schema
    Decoding,
    /// Fetch succeeded but no points for the symbol/range
    EmptyData,
    /// `start > end`
    InvalidRange,
    /// Request could not be built
    InvalidRequest,
}

impl ErrorKind {
    /// Snake-case name used as a metrics label.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Transport => "transport",
            Self::BadStatus => "bad_status",
            Self::Decoding => "decoding",
            Self::EmptyData => "empty_data",
            Self::InvalidRange => "invalid_range",
            Self::InvalidRequest => "invalid_request",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository errors
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// Start is after end
    #[error("invalid range: start {start} is after end {end}")]
    InvalidRange {
        /// Requested start
        start: DateTime<Utc>,
        /// Requested end
        end: DateTime<Utc>,
    },

    /// Fetch and decode succeeded but the symbol has no points in range
    #[error("no data for {base}->{symbol} in the requested range")]
    EmptyData {
        /// Base currency
        base: String,
        /// Quoted currency
        symbol: String,
    },

    /// Fetch failed (after retries, where applicable)
    #[error(transparent)]
    Fetch(#[from] FetcherError),
}

impl RepositoryError {
    /// Error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidRange { .. } => ErrorKind::InvalidRange,
            Self::EmptyData { .. } => ErrorKind::EmptyData,
            Self::Fetch(FetcherError::Transport { .. }) => ErrorKind::Transport,
            Self::Fetch(FetcherError::BadStatus(_)) => ErrorKind::BadStatus,
            Self::Fetch(FetcherError::Decoding(_)) => ErrorKind::Decoding,
            Self::Fetch(FetcherError::InvalidRequest(_)) => ErrorKind::InvalidRequest,
        }
    }
}

/// Result type for repository operations
pub type RepositoryResult<T> = Result<T, RepositoryError>;

/// Repository tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RepositoryConfig {
    /// Downsampling bound for returned series
    pub max_chart_points: usize,
    /// TTL applied on cache write-through
    pub cache_ttl: Duration,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        Self {
            max_chart_points: DEFAULT_MAX_CHART_POINTS,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }
}

/// Cache key for a series request.
///
/// Only whole epoch seconds of `start`/`end` are part of the key, so ranges
/// differing below one second share an entry.
pub fn cache_key(base: &str, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> String {
    format!(
        "ts:{}->{}:{}:{}",
        base,
        symbol,
        start.timestamp(),
        end.timestamp()
    )
}

/// Capability set for reading rate data.
#[async_trait]
pub trait RateRepository: Send + Sync {
    /// Downsampled daily series of `symbol` quoted in `base` over `[start, end]`.
    async fn timeseries(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        use_cache: bool,
    ) -> RepositoryResult<Vec<RatePoint>>;

    /// Latest rates for every currency quoted against `base`.
    async fn latest(&self, base: &str) -> RepositoryResult<LatestRates>;
}

/// [`RateRepository`] backed by a [`RateService`] and a [`CacheStore`].
pub struct LiveRateRepository<S> {
    service: S,
    cache: Arc<dyn CacheStore>,
    retry: RetryPolicy,
    cancel: Option<CancelToken>,
    config: RepositoryConfig,
}

impl<S: RateService> LiveRateRepository<S> {
    /// Create a repository with the default retry policy and config.
    pub fn new(service: S, cache: Arc<dyn CacheStore>) -> Self {
        Self {
            service,
            cache,
            retry: RetryPolicy::default(),
            cancel: None,
            config: RepositoryConfig::default(),
        }
    }

    /// Use `retry` for network calls.
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Abandon retry backoff once `cancel` fires.
    pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Override chart bound and cache TTL.
    pub fn with_config(mut self, config: RepositoryConfig) -> Self {
        self.config = config;
        self
    }

    /// Repository configuration
    pub fn config(&self) -> &RepositoryConfig {
        &self.config
    }

    /// Underlying service
    pub fn service(&self) -> &S {
        &self.service
    }

    fn executor(&self, label: String) -> RetryExecutor {
        let executor = RetryExecutor::new(self.retry.clone()).with_label(label);
        match &self.cancel {
            Some(cancel) => executor.with_cancel(cancel.clone()),
            None => executor,
        }
    }

    fn read_cached(&self, key: &str) -> Option<Vec<RatePoint>> {
        match self.cache.get_json::<Vec<RatePoint>>(key) {
            Ok(hit) => hit,
            Err(e) => {
                warn!(key, error = %e, "unreadable cache entry, treating as miss");
                self.cache.remove(key);
                None
            }
        }
    }

    fn write_cached(&self, key: &str, points: &[RatePoint]) {
        if let Err(e) = self.cache.put_json(key, points, self.config.cache_ttl) {
            warn!(key, error = %e, "cache write failed, continuing without cache");
        }
    }

    fn finish(&self, points: &[RatePoint]) -> Vec<RatePoint> {
        let reduced = series::reduce(points, self.config.max_chart_points);
        metrics::record_series_points(reduced.len());
        reduced
    }

    async fn load_series(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        use_cache: bool,
    ) -> RepositoryResult<Vec<RatePoint>> {
        if start > end {
            return Err(RepositoryError::InvalidRange { start, end });
        }

        let key = cache_key(base, symbol, start, end);

        if use_cache {
            if let Some(points) = self.read_cached(&key) {
                metrics::record_cache_hit();
                debug!(key = %key, points = points.len(), "cache hit");
                return Ok(self.finish(&points));
            }
            metrics::record_cache_miss();
            debug!(key = %key, "cache miss");
        }

        let executor = self.executor(format!("{base}->{symbol}"));
        let response = executor
            .execute(|| self.service.timeseries(base, symbol, start, end))
            .await?;

        let points = series::sort_and_dedup(series::normalize(&response, symbol));
        if points.is_empty() {
            return Err(RepositoryError::EmptyData {
                base: base.to_string(),
                symbol: symbol.to_string(),
            });
        }

        self.write_cached(&key, &points);
        info!(points = points.len(), "fetched series");
        Ok(self.finish(&points))
    }
}

#[async_trait]
impl<S: RateService> RateRepository for LiveRateRepository<S> {
    async fn timeseries(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        use_cache: bool,
    ) -> RepositoryResult<Vec<RatePoint>> {
        let span = tracing::info_span!(
            "timeseries",
            base = %base,
            symbol = %symbol,
            start = %start.date_naive(),
            end = %end.date_naive(),
            use_cache
        );

        let result = self
            .load_series(base, symbol, start, end, use_cache)
            .instrument(span)
            .await;

        if let Err(e) = &result {
            metrics::record_fetch_failure(e.kind().as_str());
        }
        result
    }

    async fn latest(&self, base: &str) -> RepositoryResult<LatestRates> {
        let executor = self.executor(format!("{base} latest"));
        let latest = executor.execute(|| self.service.latest(base)).await;
        latest.map_err(|e| {
            let e = RepositoryError::from(e);
            metrics::record_fetch_failure(e.kind().as_str());
            e
        })
    }
}
