//! Live HTTP implementation of [`RateService`]
//!
//! Issues one GET per call and maps every outcome onto the
//! [`FetcherError`] taxonomy; retrying is left to the caller's
//! [`RetryPolicy`](crate::retry::RetryPolicy).

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, Url};
use serde::de::DeserializeOwned;
use std::error::Error as StdError;
use std::io;
use std::time::Duration;
use tracing::debug;

use super::{FetcherError, FetcherResult, RateService, TimeseriesApiConfig, TransportKind};
use crate::{LatestRates, TimeseriesResponse};

/// Connect timeout (seconds)
const HTTP_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Overall request timeout (seconds), including the body
const HTTP_REQUEST_TIMEOUT_SECS: u64 = 20;

/// reqwest-backed rate service.
#[derive(Debug, Clone)]
pub struct HttpRateService {
    client: Client,
    api: TimeseriesApiConfig,
}

impl HttpRateService {
    /// Create a service with a client configured with explicit timeouts.
    pub fn new(api: TimeseriesApiConfig) -> FetcherResult<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(HTTP_CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(HTTP_REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|e| FetcherError::transport(TransportKind::Other, e.to_string()))?;
        Self::with_client(client, api)
    }

    /// Create a service around an existing client (shared pool, custom TLS, tests).
    pub fn with_client(client: Client, api: TimeseriesApiConfig) -> FetcherResult<Self> {
        api.validate()?;
        Ok(Self { client, api })
    }

    /// Endpoint configuration in use
    pub fn api(&self) -> &TimeseriesApiConfig {
        &self.api
    }

    async fn get_json<T>(&self, url: Url) -> FetcherResult<T>
    where
        T: DeserializeOwned,
    {
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(classify_reqwest_error)?;

        let status = response.status();
        if !status.is_success() {
            debug!(status = status.as_u16(), "non-success status");
            return Err(FetcherError::BadStatus(status.as_u16()));
        }

        let body = response.bytes().await.map_err(classify_reqwest_error)?;
        serde_json::from_slice(&body).map_err(FetcherError::Decoding)
    }
}

#[async_trait]
impl RateService for HttpRateService {
    async fn timeseries(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetcherResult<TimeseriesResponse> {
        let url = self.api.timeseries_url(base, symbol, start, end)?;
        self.get_json(url).await
    }

    async fn latest(&self, base: &str) -> FetcherResult<LatestRates> {
        let url = self.api.latest_url(base)?;
        self.get_json(url).await
    }
}

/// Map a reqwest failure onto a [`TransportKind`].
pub fn classify_reqwest_error(err: reqwest::Error) -> FetcherError {
    let kind = transport_kind(&err);
    FetcherError::transport(kind, err.to_string())
}

fn transport_kind(err: &reqwest::Error) -> TransportKind {
    if err.is_timeout() {
        return TransportKind::Timeout;
    }

    // Walk the source chain: hyper/std put the useful detail a few levels down.
    let mut network_cause = false;
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    while let Some(cause) = source {
        if let Some(io_err) = cause.downcast_ref::<io::Error>() {
            match io_err.kind() {
                io::ErrorKind::ConnectionRefused => return TransportKind::ConnectionRefused,
                io::ErrorKind::ConnectionReset
                | io::ErrorKind::ConnectionAborted
                | io::ErrorKind::BrokenPipe
                | io::ErrorKind::UnexpectedEof => return TransportKind::ConnectionLost,
                io::ErrorKind::TimedOut => return TransportKind::Timeout,
                // TLS and certificate failures surface as InvalidData
                io::ErrorKind::InvalidData | io::ErrorKind::InvalidInput | io::ErrorKind::Other => {}
                _ => network_cause = true,
            }
        }

        let text = cause.to_string().to_lowercase();
        if text.contains("dns error") || text.contains("failed to lookup address") {
            return TransportKind::HostResolution;
        }
        if text.contains("unreachable") {
            return TransportKind::NotConnected;
        }
        source = cause.source();
    }

    if err.is_connect() {
        return if network_cause {
            TransportKind::NotConnected
        } else {
            TransportKind::Other
        };
    }

    if err.is_request() || err.is_body() {
        return TransportKind::ConnectionLost;
    }

    TransportKind::Other
}
