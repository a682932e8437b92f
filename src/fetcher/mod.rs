//! Remote rate API access
//!
//! The repository only depends on the [`RateService`] trait; two
//! implementations ship with the crate:
//!
//! - [`HttpRateService`] - live reqwest client driven by [`TimeseriesApiConfig`]
//! - [`SyntheticRateService`] - offline sine-wave generator for demos and tests

use crate::retry::Retryable;
use crate::{LatestRates, TimeseriesResponse};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;

pub mod config;
pub mod http;
pub mod synthetic;

pub use config::TimeseriesApiConfig;
pub use http::HttpRateService;
pub use synthetic::SyntheticRateService;

/// Network-layer failure classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportKind {
    /// Request or connect timed out
    Timeout,
    /// Connection dropped mid-request
    ConnectionLost,
    /// No usable network route
    NotConnected,
    /// DNS / host resolution failure
    HostResolution,
    /// Remote host refused the connection
    ConnectionRefused,
    /// Anything else the transport reported (TLS, redirect loops, ...)
    Other,
}

impl TransportKind {
    /// Human-readable description used in log and error messages.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::ConnectionLost => "connection lost",
            Self::NotConnected => "not connected",
            Self::HostResolution => "host resolution failed",
            Self::ConnectionRefused => "connection refused",
            Self::Other => "transport failure",
        }
    }

    /// Whether a fresh attempt can reasonably succeed.
    pub fn is_transient(&self) -> bool {
        !matches!(self, Self::Other)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Fetcher errors
#[derive(Debug, thiserror::Error)]
pub enum FetcherError {
    /// Network-layer failure
    #[error("transport error ({kind}): {message}")]
    Transport {
        /// Failure class
        kind: TransportKind,
        /// Transport message
        message: String,
    },

    /// Non-2xx HTTP response
    #[error("bad status: {0}")]
    BadStatus(u16),

    /// Body did not match the expected schema
    #[error("decoding error: {0}")]
    Decoding(#[source] serde_json::Error),

    /// Request could not be built (bad URL, start after end, bad date format)
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl FetcherError {
    /// Shorthand for a transport error.
    pub fn transport(kind: TransportKind, message: impl Into<String>) -> Self {
        Self::Transport {
            kind,
            message: message.into(),
        }
    }
}

impl Retryable for FetcherError {
    fn is_retryable(&self) -> bool {
        match self {
            FetcherError::Transport { kind, .. } => kind.is_transient(),
            FetcherError::BadStatus(_)
            | FetcherError::Decoding(_)
            | FetcherError::InvalidRequest(_) => false,
        }
    }
}

/// Result type for fetcher operations
pub type FetcherResult<T> = Result<T, FetcherError>;

/// Capability set for fetching rate data.
#[async_trait]
pub trait RateService: Send + Sync {
    /// Fetch the daily series of `symbol` quoted in `base` over `[start, end]`.
    async fn timeseries(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetcherResult<TimeseriesResponse>;

    /// Fetch the latest quote of every currency against `base`.
    async fn latest(&self, base: &str) -> FetcherResult<LatestRates>;
}

#[async_trait]
impl<T: RateService + ?Sized> RateService for Box<T> {
    async fn timeseries(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetcherResult<TimeseriesResponse> {
        (**self).timeseries(base, symbol, start, end).await
    }

    async fn latest(&self, base: &str) -> FetcherResult<LatestRates> {
        (**self).latest(base).await
    }
}

#[async_trait]
impl<T: RateService + ?Sized> RateService for Arc<T> {
    async fn timeseries(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetcherResult<TimeseriesResponse> {
        (**self).timeseries(base, symbol, start, end).await
    }

    async fn latest(&self, base: &str) -> FetcherResult<LatestRates> {
        (**self).latest(base).await
    }
}
