//! Timeseries command: fetch, summarise, indicators, CSV export.

use chrono::Utc;
use clap::Args;
use serde::Serialize;
use std::path::PathBuf;
use tracing::info;

use super::{normalize_currency, repository_config, resolve_range, Cli, CliError, OutputFormat};
use crate::cancel::CancelToken;
use crate::indicators::{self, DEFAULT_BOLLINGER_K, DEFAULT_BOLLINGER_WINDOW};
use crate::output::write_timeseries_csv;
use crate::repository::{RateRepository, DEFAULT_MAX_CHART_POINTS};
use crate::RatePoint;

/// Arguments for the timeseries command
#[derive(Args, Debug)]
pub struct TimeseriesArgs {
    /// Base currency (e.g., USD)
    #[arg(long, default_value = "USD")]
    pub base: String,

    /// Quoted currency (e.g., JPY)
    #[arg(long, default_value = "JPY")]
    pub symbol: String,

    /// Trailing window in days, used when --start is omitted
    #[arg(long, default_value_t = 30, value_parser = clap::value_parser!(u32).range(1..=3650))]
    pub days: u32,

    /// Start date (YYYY-MM-DD or RFC3339)
    #[arg(long)]
    pub start: Option<String>,

    /// End date (YYYY-MM-DD or RFC3339, default: now)
    #[arg(long)]
    pub end: Option<String>,

    /// Downsampling bound for the returned series
    #[arg(long, default_value_t = DEFAULT_MAX_CHART_POINTS)]
    pub max_points: usize,

    /// Simple moving average window; repeat for several
    #[arg(long = "sma")]
    pub sma_windows: Vec<usize>,

    /// Add Bollinger Bands
    #[arg(long, default_value_t = false)]
    pub bollinger: bool,

    /// Bollinger window
    #[arg(long, default_value_t = DEFAULT_BOLLINGER_WINDOW)]
    pub bb_window: usize,

    /// Bollinger width in standard deviations
    #[arg(long, default_value_t = DEFAULT_BOLLINGER_K)]
    pub bb_k: f64,

    /// RSI period
    #[arg(long)]
    pub rsi: Option<usize>,

    /// Write the series to this CSV file
    #[arg(long)]
    pub csv: Option<PathBuf>,

    /// Bypass the cache read
    #[arg(long, default_value_t = false)]
    pub no_cache: bool,
}

#[derive(Debug, Serialize)]
struct IndicatorSeries {
    name: String,
    points: Vec<RatePoint>,
}

#[derive(Debug, Serialize)]
struct TimeseriesReport {
    base: String,
    symbol: String,
    start: String,
    end: String,
    points: Vec<RatePoint>,
    indicators: Vec<IndicatorSeries>,
    csv: Option<PathBuf>,
}

impl TimeseriesArgs {
    fn indicator_series(&self, points: &[RatePoint]) -> Vec<IndicatorSeries> {
        let mut out = Vec::new();
        for &window in &self.sma_windows {
            out.push(IndicatorSeries {
                name: format!("sma({window})"),
                points: indicators::sma(points, window),
            });
        }
        if self.bollinger {
            let bands = indicators::bollinger(points, self.bb_window, self.bb_k);
            let label = format!("{},{}", self.bb_window, self.bb_k);
            out.push(IndicatorSeries { name: format!("bb_upper({label})"), points: bands.upper });
            out.push(IndicatorSeries { name: format!("bb_middle({label})"), points: bands.middle });
            out.push(IndicatorSeries { name: format!("bb_lower({label})"), points: bands.lower });
        }
        if let Some(period) = self.rsi {
            out.push(IndicatorSeries {
                name: format!("rsi({period})"),
                points: indicators::rsi(points, period),
            });
        }
        out
    }

    /// Execute the timeseries command
    pub async fn execute(&self, cli: &Cli, cancel: CancelToken) -> Result<(), CliError> {
        let base = normalize_currency(&self.base)?;
        let symbol = normalize_currency(&self.symbol)?;
        let (start, end) =
            resolve_range(self.start.as_deref(), self.end.as_deref(), self.days, Utc::now())?;

        let repository = cli.repository(repository_config(self.max_points), cancel)?;
        let points = repository
            .timeseries(&base, &symbol, start, end, !self.no_cache)
            .await?;
        info!(base = %base, symbol = %symbol, points = points.len(), "Series ready");

        if let Some(path) = &self.csv {
            let rows = write_timeseries_csv(path, &base, &symbol, &points)?;
            info!(path = %path.display(), rows, "CSV written");
        }

        let report = TimeseriesReport {
            indicators: self.indicator_series(&points),
            base,
            symbol,
            start: start.format("%Y-%m-%d").to_string(),
            end: end.format("%Y-%m-%d").to_string(),
            points,
            csv: self.csv.clone(),
        };

        match cli.output_format {
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&report)?),
            OutputFormat::Human => print_human(&report),
        }
        Ok(())
    }
}

fn print_human(report: &TimeseriesReport) {
    println!(
        "{}->{} {}..{}: {} points",
        report.base,
        report.symbol,
        report.start,
        report.end,
        report.points.len()
    );

    let values = report.points.iter().map(|p| p.value);
    let min = values.clone().fold(f64::INFINITY, f64::min);
    let max = values.fold(f64::NEG_INFINITY, f64::max);
    if let (Some(first), Some(last)) = (report.points.first(), report.points.last()) {
        let change = if first.value != 0.0 {
            (last.value - first.value) / first.value * 100.0
        } else {
            0.0
        };
        println!(
            "  first {:.4}  last {:.4}  min {:.4}  max {:.4}  change {:+.2}%",
            first.value, last.value, min, max, change
        );
    }

    for series in &report.indicators {
        match series.points.last() {
            Some(last) => println!(
                "  {:<24} {:>4} points, last {:.4} ({})",
                series.name,
                series.points.len(),
                last.value,
                last.timestamp.format("%Y-%m-%d")
            ),
            None => println!("  {:<24} not enough data", series.name),
        }
    }

    if let Some(path) = &report.csv {
        println!("  csv: {}", path.display());
    }
}
