//! CLI command implementations

use chrono::{DateTime, Duration, NaiveDate, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

use crate::cache::ExpiringCache;
use crate::cancel::CancelToken;
use crate::fetcher::config::{
    DEFAULT_BASE_PARAM, DEFAULT_DATE_FORMAT, DEFAULT_END_PARAM, DEFAULT_LATEST_PATH,
    DEFAULT_START_PARAM, DEFAULT_SYMBOL_PARAM,
};
use crate::fetcher::{HttpRateService, RateService, SyntheticRateService, TimeseriesApiConfig};
use crate::repository::{LiveRateRepository, RepositoryConfig};
use crate::retry::RetryPolicy;

pub mod alert;
pub mod error;
pub mod latest;
pub mod timeseries;

pub use alert::AlertArgs;
pub use error::CliError;
pub use latest::LatestArgs;
pub use timeseries::TimeseriesArgs;

/// Default API root
pub const DEFAULT_API_BASE_URL: &str = "https://api.exchangerate.host";
/// Default time-series path
pub const DEFAULT_API_PATH: &str = "/timeseries";

/// Repository type the commands run against
pub type CliRepository = LiveRateRepository<Box<dyn RateService>>;

/// FX rate time-series client
#[derive(Parser, Debug)]
#[command(name = "fx-timeseries")]
#[command(version, about = "Fetch, cache and chart-reduce foreign-exchange rate series", long_about = None)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,

    /// API root URL
    #[arg(long, global = true, env = "FX_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Time-series path appended to the API root
    #[arg(long, global = true, env = "FX_API_PATH", default_value = DEFAULT_API_PATH)]
    pub api_path: String,

    /// Latest-rates path appended to the API root
    #[arg(long, global = true, env = "FX_API_LATEST_PATH", default_value = DEFAULT_LATEST_PATH)]
    pub api_latest_path: String,

    /// Query parameter carrying the base currency
    #[arg(long, global = true, env = "FX_API_BASE_PARAM", default_value = DEFAULT_BASE_PARAM)]
    pub base_param: String,

    /// Query parameter carrying the quoted currency
    #[arg(long, global = true, env = "FX_API_SYMBOL_PARAM", default_value = DEFAULT_SYMBOL_PARAM)]
    pub symbol_param: String,

    /// Query parameter carrying the start date
    #[arg(long, global = true, env = "FX_API_START_PARAM", default_value = DEFAULT_START_PARAM)]
    pub start_param: String,

    /// Query parameter carrying the end date
    #[arg(long, global = true, env = "FX_API_END_PARAM", default_value = DEFAULT_END_PARAM)]
    pub end_param: String,

    /// strftime format for request dates
    #[arg(long, global = true, env = "FX_API_DATE_FORMAT", default_value = DEFAULT_DATE_FORMAT)]
    pub date_format: String,

    /// Use the built-in synthetic rate generator instead of the network
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,

    /// Retries after the first failed attempt (range: 0-20)
    #[arg(long, global = true, env = "FX_MAX_RETRIES", default_value = "2", value_parser = clap::value_parser!(u32).range(0..=20))]
    pub max_retries: u32,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "human")]
    pub output_format: OutputFormat,

    /// Serve Prometheus metrics on this address (e.g., 127.0.0.1:9000)
    #[arg(long, global = true, env = "FX_METRICS_ADDR")]
    pub metrics_addr: Option<SocketAddr>,
}

/// CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch a rate series, optionally with indicators and CSV export
    Timeseries(TimeseriesArgs),

    /// Show the latest rates against a base currency
    Latest(LatestArgs),

    /// Evaluate price alerts against the latest rate
    Alert(AlertArgs),
}

/// Output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output
    Human,
    /// JSON output
    Json,
}

impl Cli {
    /// Retry policy from `--max-retries`.
    pub fn retry_policy(&self) -> Result<RetryPolicy, CliError> {
        let policy = RetryPolicy {
            max_attempts: self.max_retries.saturating_add(1),
            ..RetryPolicy::default()
        };
        policy.validate()?;
        Ok(policy)
    }

    /// API configuration from the global flags.
    pub fn api_config(&self) -> Result<TimeseriesApiConfig, CliError> {
        let api = TimeseriesApiConfig::new(&self.api_base_url, self.api_path.clone())?
            .with_params(
                self.base_param.clone(),
                self.symbol_param.clone(),
                self.start_param.clone(),
                self.end_param.clone(),
            )
            .with_date_format(self.date_format.clone())
            .with_latest_path(self.api_latest_path.clone());
        api.validate()?;
        Ok(api)
    }

    /// Rate service selected by `--offline`.
    pub fn rate_service(&self) -> Result<Box<dyn RateService>, CliError> {
        if self.offline {
            info!("Using synthetic rate service (offline)");
            return Ok(Box::new(SyntheticRateService::new()));
        }
        let api = self.api_config()?;
        info!(base_url = %api.base_url, path = %api.path, "Using HTTP rate service");
        Ok(Box::new(HttpRateService::new(api)?))
    }

    /// Repository wired with a fresh cache, the retry policy and `cancel`.
    pub fn repository(
        &self,
        config: RepositoryConfig,
        cancel: CancelToken,
    ) -> Result<CliRepository, CliError> {
        Ok(
            LiveRateRepository::new(self.rate_service()?, Arc::new(ExpiringCache::new()))
                .with_retry(self.retry_policy()?)
                .with_config(config)
                .with_cancel(cancel),
        )
    }
}

/// Upper-case and trim a currency code; rejects anything but 3 ASCII letters.
pub fn normalize_currency(code: &str) -> Result<String, CliError> {
    let code = code.trim().to_uppercase();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(CliError::InvalidArgument(format!(
            "currency code must be 3 letters, got '{code}'"
        )));
    }
    Ok(code)
}

/// Try to parse an RFC3339 datetime, assuming UTC when no offset is given.
fn try_parse_datetime_rfc3339(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(input) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(&format!("{input}Z")) {
        return Some(dt.with_timezone(&Utc));
    }
    None
}

/// Parse `YYYY-MM-DD` (midnight UTC) or an RFC3339 datetime.
pub fn parse_datetime_flexible(input: &str) -> Result<DateTime<Utc>, CliError> {
    if let Some(dt) = try_parse_datetime_rfc3339(input) {
        return Ok(dt);
    }

    let date = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d")
        .map_err(|e| CliError::InvalidArgument(format!("Invalid date '{input}': {e}")))?;
    let datetime = date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| CliError::InvalidArgument(format!("Invalid date '{input}'")))?;
    Ok(datetime.and_utc())
}

/// Resolve `[start, end]` from explicit bounds or a trailing window of `days`.
///
/// `end` defaults to `now`; `start` defaults to `end - days`.
pub fn resolve_range(
    start: Option<&str>,
    end: Option<&str>,
    days: u32,
    now: DateTime<Utc>,
) -> Result<(DateTime<Utc>, DateTime<Utc>), CliError> {
    let end = match end {
        Some(end) => parse_datetime_flexible(end)?,
        None => now,
    };
    let start = match start {
        Some(start) => parse_datetime_flexible(start)?,
        None => end - Duration::days(i64::from(days)),
    };
    if start > end {
        return Err(CliError::InvalidArgument(format!(
            "start {start} is after end {end}"
        )));
    }
    Ok((start, end))
}

/// Repository config honouring a chart bound override.
pub fn repository_config(max_points: usize) -> RepositoryConfig {
    RepositoryConfig {
        max_chart_points: max_points,
        ..RepositoryConfig::default()
    }
}
