//! # FX Timeseries Library
//!
//! Data-access core for foreign-exchange rate charts: fetches daily rate
//! series from a configurable HTTP API, retries transient failures with
//! jittered exponential backoff, caches normalized series with a TTL, and
//! downsamples long series for rendering while keeping the visual extrema.
//!
//! ## Features
//!
//! - **Retrying fetcher**: bounded attempts, exponential backoff, jitter, cancellable waits
//! - **Expiring cache**: thread-safe byte store with lazy TTL eviction
//! - **Extrema-preserving downsampling**: min/max per bucket plus first/last points
//! - **Indicators**: SMA, Bollinger Bands and Wilder RSI
//! - **Alerts**: upper/lower thresholds with "fire once" re-arming
//! - **CSV export**: `date,rate(BASE->SYMBOL)` files
//!
//! ## Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use chrono::{Duration, Utc};
//! use fx_timeseries::cache::ExpiringCache;
//! use fx_timeseries::fetcher::{HttpRateService, TimeseriesApiConfig};
//! use fx_timeseries::repository::{LiveRateRepository, RateRepository};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let api = TimeseriesApiConfig::new("https://api.example.com", "/timeseries")?;
//! let service = HttpRateService::new(api)?;
//! let repository = LiveRateRepository::new(service, Arc::new(ExpiringCache::new()));
//!
//! let end = Utc::now();
//! let start = end - Duration::days(30);
//! let points = repository.timeseries("USD", "JPY", start, end, true).await?;
//! println!("{} points", points.len());
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`fetcher`] - Remote API access (`RateService`) and the fetch error taxonomy
//! - [`retry`] - Retry policy and executor
//! - [`cancel`] - Cooperative cancellation shared with backoff waits
//! - [`cache`] - Expiring key/value cache
//! - [`series`] - Response normalization and downsampling
//! - [`repository`] - Orchestration of cache, fetch, normalization and downsampling
//! - [`indicators`] - SMA, Bollinger Bands, RSI
//! - [`alert`] - Threshold evaluation against the latest value
//! - [`output`] - CSV export
//! - [`metrics`] - Cache/fetch/retry counters

#![warn(missing_docs)]
#![warn(clippy::all)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Threshold alert evaluation
pub mod alert;

/// Expiring key/value cache
pub mod cache;

/// Cooperative cancellation
pub mod cancel;

/// CLI command implementations
pub mod cli;

/// Remote rate API access
pub mod fetcher;

/// Technical indicators
pub mod indicators;

/// Cache, fetch and retry metrics
pub mod metrics;

/// CSV export
pub mod output;

/// Repository orchestration
pub mod repository;

/// Retry with exponential backoff
pub mod retry;

/// Series normalization and downsampling
pub mod series;

pub use repository::{ErrorKind, LiveRateRepository, RateRepository, RepositoryError};
pub use retry::RetryPolicy;

/// A single observation of a rate.
///
/// Two points with the same `timestamp` are the same point.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct RatePoint {
    /// Observation time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Rate value
    pub value: f64,
}

impl RatePoint {
    /// Create a new point
    pub fn new(timestamp: DateTime<Utc>, value: f64) -> Self {
        Self { timestamp, value }
    }
}

/// Time-series payload returned by the remote API.
///
/// Consumed once per fetch and discarded after normalization; only the
/// normalized [`RatePoint`] sequence is ever cached.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TimeseriesResponse {
    /// Base currency code (e.g., "USD")
    pub base: String,
    /// First requested date as sent by the API
    pub start_date: String,
    /// Last requested date as sent by the API
    pub end_date: String,
    /// Date string -> currency code -> rate
    pub rates: HashMap<String, HashMap<String, f64>>,
}

/// Latest rates for every currency quoted against `base`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LatestRates {
    /// Base currency code
    pub base: String,
    /// Quote date as sent by the API
    pub date: String,
    /// Currency code -> rate
    pub rates: HashMap<String, f64>,
}

impl LatestRates {
    /// Rates sorted by currency code, for stable display.
    pub fn sorted(&self) -> Vec<(&str, f64)> {
        let mut rows: Vec<(&str, f64)> = self
            .rates
            .iter()
            .map(|(code, value)| (code.as_str(), *value))
            .collect();
        rows.sort_by(|a, b| a.0.cmp(b.0));
        rows
    }
}
