//! Time-series API configuration
//!
//! The remote schema is per-deployment: host, path, query parameter names and
//! the date format all come from configuration rather than code, so pointing
//! the client at a different provider is a config change only.

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Utc};
use reqwest::Url;
use std::fmt::Write as _;

use super::{FetcherError, FetcherResult};

/// Default query parameter for the base currency
pub const DEFAULT_BASE_PARAM: &str = "base";
/// Default query parameter for the quoted currency
pub const DEFAULT_SYMBOL_PARAM: &str = "symbols";
/// Default query parameter for the range start
pub const DEFAULT_START_PARAM: &str = "start_date";
/// Default query parameter for the range end
pub const DEFAULT_END_PARAM: &str = "end_date";
/// Default date format (`yyyy-MM-dd`)
pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";
/// Default latest-rates path
pub const DEFAULT_LATEST_PATH: &str = "/latest";

/// Endpoint description for a time-series rate API.
#[derive(Debug, Clone, PartialEq)]
pub struct TimeseriesApiConfig {
    /// API root (e.g., <https://api.example.com>)
    pub base_url: Url,
    /// Time-series path appended to `base_url` (e.g., `/timeseries`)
    pub path: String,
    /// Query parameter carrying the base currency
    pub base_param: String,
    /// Query parameter carrying the quoted currency
    pub symbol_param: String,
    /// Query parameter carrying the formatted start date
    pub start_param: String,
    /// Query parameter carrying the formatted end date
    pub end_param: String,
    /// strftime-style format for start/end dates
    pub date_format: String,
    /// Latest-rates path appended to `base_url`
    pub latest_path: String,
}

impl TimeseriesApiConfig {
    /// Create a configuration with default parameter names.
    ///
    /// # Errors
    /// Returns [`FetcherError::InvalidRequest`] if `base_url` does not parse.
    pub fn new(base_url: &str, path: impl Into<String>) -> FetcherResult<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|e| FetcherError::InvalidRequest(format!("invalid base URL '{base_url}': {e}")))?;

        Ok(Self {
            base_url,
            path: path.into(),
            base_param: DEFAULT_BASE_PARAM.to_string(),
            symbol_param: DEFAULT_SYMBOL_PARAM.to_string(),
            start_param: DEFAULT_START_PARAM.to_string(),
            end_param: DEFAULT_END_PARAM.to_string(),
            date_format: DEFAULT_DATE_FORMAT.to_string(),
            latest_path: DEFAULT_LATEST_PATH.to_string(),
        })
    }

    /// Override all four query parameter names.
    pub fn with_params(
        mut self,
        base: impl Into<String>,
        symbol: impl Into<String>,
        start: impl Into<String>,
        end: impl Into<String>,
    ) -> Self {
        self.base_param = base.into();
        self.symbol_param = symbol.into();
        self.start_param = start.into();
        self.end_param = end.into();
        self
    }

    /// Override the date format.
    pub fn with_date_format(mut self, date_format: impl Into<String>) -> Self {
        self.date_format = date_format.into();
        self
    }

    /// Override the latest-rates path.
    pub fn with_latest_path(mut self, latest_path: impl Into<String>) -> Self {
        self.latest_path = latest_path.into();
        self
    }

    /// Check that the configuration can produce requests.
    pub fn validate(&self) -> FetcherResult<()> {
        if self.base_url.cannot_be_a_base() {
            return Err(FetcherError::InvalidRequest(format!(
                "base URL '{}' cannot carry a path",
                self.base_url
            )));
        }

        if StrftimeItems::new(&self.date_format).any(|item| matches!(item, Item::Error)) {
            return Err(FetcherError::InvalidRequest(format!(
                "invalid date format '{}'",
                self.date_format
            )));
        }

        for (name, value) in [
            ("base", &self.base_param),
            ("symbol", &self.symbol_param),
            ("start", &self.start_param),
            ("end", &self.end_param),
        ] {
            if value.trim().is_empty() {
                return Err(FetcherError::InvalidRequest(format!(
                    "{name} query parameter name cannot be empty"
                )));
            }
        }

        Ok(())
    }

    /// Format a timestamp with the configured date format.
    pub fn format_date(&self, at: DateTime<Utc>) -> FetcherResult<String> {
        let mut out = String::new();
        write!(out, "{}", at.format(&self.date_format)).map_err(|_| {
            FetcherError::InvalidRequest(format!("invalid date format '{}'", self.date_format))
        })?;
        Ok(out)
    }

    /// Build the time-series request URL.
    ///
    /// # Errors
    /// Fails with [`FetcherError::InvalidRequest`] when `start > end`, before any I/O.
    pub fn timeseries_url(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetcherResult<Url> {
        if start > end {
            return Err(FetcherError::InvalidRequest(format!(
                "start {start} is after end {end}"
            )));
        }

        let start_str = self.format_date(start)?;
        let end_str = self.format_date(end)?;

        let mut url = self.endpoint(&self.path)?;
        url.query_pairs_mut()
            .append_pair(&self.base_param, base)
            .append_pair(&self.symbol_param, symbol)
            .append_pair(&self.start_param, &start_str)
            .append_pair(&self.end_param, &end_str);
        Ok(url)
    }

    /// Build the latest-rates request URL.
    pub fn latest_url(&self, base: &str) -> FetcherResult<Url> {
        let mut url = self.endpoint(&self.latest_path)?;
        url.query_pairs_mut()
            .append_pair(&self.base_param, &base.to_uppercase());
        Ok(url)
    }

    /// Join `path` onto the base URL without doubling or dropping slashes.
    fn endpoint(&self, path: &str) -> FetcherResult<Url> {
        if self.base_url.cannot_be_a_base() {
            return Err(FetcherError::InvalidRequest(format!(
                "base URL '{}' cannot carry a path",
                self.base_url
            )));
        }

        let mut url = self.base_url.clone();
        let base_path = url.path().trim_end_matches('/').to_string();
        let add_path = path.trim_start_matches('/');
        url.set_path(&format!("{base_path}/{add_path}"));
        url.set_query(None);
        Ok(url)
    }
}
