//! CLI error types and conversions

use crate::alert::AlertError;
use crate::fetcher::FetcherError;
use crate::metrics::MetricsError;
use crate::output::OutputError;
use crate::repository::RepositoryError;
use crate::retry::RetryPolicyError;

/// CLI errors
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Repository error
    #[error("request failed ({}): {0}", .0.kind())]
    Repository(#[from] RepositoryError),

    /// Fetcher construction error
    #[error("fetcher error: {0}")]
    Fetcher(#[from] FetcherError),

    /// Output error
    #[error("output error: {0}")]
    Output(#[from] OutputError),

    /// Alert error
    #[error("alert error: {0}")]
    Alert(#[from] AlertError),

    /// Retry policy error
    #[error("retry policy error: {0}")]
    RetryPolicy(#[from] RetryPolicyError),

    /// Metrics exporter error
    #[error("metrics error: {0}")]
    Metrics(#[from] MetricsError),

    /// JSON rendering error
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid argument
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
