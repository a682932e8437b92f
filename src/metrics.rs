//! Cache, fetch and retry metrics
//!
//! Recorded through the `metrics` facade, so every call is a cheap no-op
//! until [`init_metrics`] installs the Prometheus exporter.

use metrics::{counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram, Unit};
use metrics_exporter_prometheus::PrometheusBuilder;
use once_cell::sync::OnceCell;
use std::net::SocketAddr;
use std::time::Duration;
use tracing::{debug, info};

static METRICS_INSTALLED: OnceCell<SocketAddr> = OnceCell::new();

/// Metrics setup errors
#[derive(Debug, thiserror::Error)]
pub enum MetricsError {
    /// Exporter could not be installed
    #[error("failed to install Prometheus exporter on {addr}: {message}")]
    Install {
        /// Requested listen address
        addr: SocketAddr,
        /// Exporter message
        message: String,
    },
}

/// Install the Prometheus exporter listening on `addr`.
///
/// Idempotent: later calls are ignored once an exporter is installed.
/// Concurrent first calls are serialized, so exactly one installs.
pub fn init_metrics(addr: SocketAddr) -> Result<(), MetricsError> {
    let mut installed_now = false;
    let active = METRICS_INSTALLED.get_or_try_init(|| {
        install_exporter(addr)?;
        installed_now = true;
        Ok::<_, MetricsError>(addr)
    })?;

    if installed_now {
        info!(addr = %active, "metrics exporter listening");
    } else {
        debug!(existing = %active, "metrics already initialized, skipping");
    }
    Ok(())
}

fn install_exporter(addr: SocketAddr) -> Result<(), MetricsError> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| MetricsError::Install {
            addr,
            message: e.to_string(),
        })?;

    describe_counter!("fx_cache_hits_total", Unit::Count, "Series served from cache");
    describe_counter!("fx_cache_misses_total", Unit::Count, "Series lookups that went to the network");
    describe_counter!("fx_fetch_attempts_total", Unit::Count, "Fetch attempts including retries");
    describe_counter!("fx_retries_total", Unit::Count, "Retries scheduled after a transient failure");
    describe_counter!("fx_fetch_failures_total", Unit::Count, "Repository calls that failed");
    describe_histogram!("fx_retry_backoff_seconds", Unit::Seconds, "Backoff waits before a retry");
    describe_gauge!("fx_series_points", Unit::Count, "Points returned by the last repository call");
    Ok(())
}

/// Count one fetch attempt.
pub fn record_fetch_attempt() {
    counter!("fx_fetch_attempts_total").increment(1);
}

/// Count a scheduled retry and its wait.
pub fn record_retry_backoff(wait: Duration, attempt: u32) {
    counter!("fx_retries_total", "attempt" => attempt.to_string()).increment(1);
    histogram!("fx_retry_backoff_seconds").record(wait.as_secs_f64());
}

/// Count a cache hit.
pub fn record_cache_hit() {
    counter!("fx_cache_hits_total").increment(1);
}

/// Count a cache miss.
pub fn record_cache_miss() {
    counter!("fx_cache_misses_total").increment(1);
}

/// Count a failed repository call by error kind.
pub fn record_fetch_failure(kind: &'static str) {
    counter!("fx_fetch_failures_total", "kind" => kind).increment(1);
}

/// Record the size of the series handed back to the caller.
pub fn record_series_points(points: usize) {
    gauge!("fx_series_points").set(points as f64);
}
