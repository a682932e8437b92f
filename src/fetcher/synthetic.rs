//! Offline rate service
//!
//! Generates a daily sine-wave series (`level + amplitude * sin(i / 6)` plus
//! uniform noise) in the same wire shape as the live API. Used by the CLI's
//! `--offline` mode and by tests that need a well-formed response without a
//! network.

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use rand::Rng;
use std::collections::HashMap;

use super::{FetcherError, FetcherResult, RateService};
use crate::{LatestRates, TimeseriesResponse};

/// Currencies quoted by default
pub const DEFAULT_SYMBOLS: [&str; 8] = ["USD", "JPY", "EUR", "GBP", "AUD", "CAD", "CHF", "CNY"];

/// Sine-wave rate generator.
#[derive(Debug, Clone)]
pub struct SyntheticRateService {
    level: f64,
    amplitude: f64,
    noise: f64,
    symbols: Vec<String>,
}

impl Default for SyntheticRateService {
    fn default() -> Self {
        Self {
            level: 150.0,
            amplitude: 5.0,
            noise: 0.6,
            symbols: DEFAULT_SYMBOLS.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl SyntheticRateService {
    /// Create a generator with the default shape.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the noise half-width (0 makes the output deterministic).
    pub fn with_noise(mut self, noise: f64) -> Self {
        self.noise = noise.abs();
        self
    }

    /// Set the wave centre and amplitude.
    pub fn with_wave(mut self, level: f64, amplitude: f64) -> Self {
        self.level = level;
        self.amplitude = amplitude;
        self
    }

    /// Restrict the quoted currencies; requests for anything else yield no rates.
    pub fn with_symbols<I, S>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.symbols = symbols.into_iter().map(Into::into).collect();
        self
    }

    fn quotes(&self, symbol: &str) -> bool {
        self.symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol))
    }

    fn value_at(&self, index: usize, rng: &mut impl Rng) -> f64 {
        let wave = self.level + self.amplitude * (index as f64 / 6.0).sin();
        if self.noise > 0.0 {
            wave + rng.gen_range(-self.noise..=self.noise)
        } else {
            wave
        }
    }
}

fn days_between(start: NaiveDate, end: NaiveDate) -> impl Iterator<Item = NaiveDate> {
    let count = (end - start).num_days().max(-1) + 1;
    (0..count).map(move |offset| start + Duration::days(offset))
}

#[async_trait]
impl RateService for SyntheticRateService {
    async fn timeseries(
        &self,
        base: &str,
        symbol: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> FetcherResult<TimeseriesResponse> {
        if start > end {
            return Err(FetcherError::InvalidRequest(format!(
                "start {start} is after end {end}"
            )));
        }

        let quoted = self.quotes(symbol);
        let mut rng = rand::thread_rng();
        let mut rates = HashMap::new();

        for (index, date) in days_between(start.date_naive(), end.date_naive()).enumerate() {
            let mut row = HashMap::new();
            if quoted {
                row.insert(symbol.to_string(), self.value_at(index, &mut rng));
            }
            rates.insert(date.format("%Y-%m-%d").to_string(), row);
        }

        Ok(TimeseriesResponse {
            base: base.to_string(),
            start_date: start.format("%Y-%m-%d").to_string(),
            end_date: end.format("%Y-%m-%d").to_string(),
            rates,
        })
    }

    async fn latest(&self, base: &str) -> FetcherResult<LatestRates> {
        let base = base.to_uppercase();
        let mut rng = rand::thread_rng();
        let rates = self
            .symbols
            .iter()
            .filter(|code| !code.eq_ignore_ascii_case(&base))
            .enumerate()
            .map(|(index, code)| (code.to_uppercase(), self.value_at(index, &mut rng)))
            .collect();

        Ok(LatestRates {
            base,
            date: Utc::now().format("%Y-%m-%d").to_string(),
            rates,
        })
    }
}
