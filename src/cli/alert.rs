//! Alert command: configure thresholds and check the latest rate against them.

use chrono::{Duration, Utc};
use clap::Args;
use serde_json::json;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

use super::{normalize_currency, repository_config, Cli, CliError, OutputFormat};
use crate::alert::{AlertMonitor, JsonFileStore, LogNotifier};
use crate::cancel::CancelToken;
use crate::repository::{RateRepository, DEFAULT_MAX_CHART_POINTS};

/// Arguments for the alert command
#[derive(Args, Debug)]
pub struct AlertArgs {
    /// Base currency (e.g., USD)
    #[arg(long, default_value = "USD")]
    pub base: String,

    /// Quoted currency (e.g., JPY)
    #[arg(long, default_value = "JPY")]
    pub symbol: String,

    /// Set the upper bound (fires when latest >= upper)
    #[arg(long)]
    pub upper: Option<f64>,

    /// Set the lower bound (fires when latest <= lower)
    #[arg(long)]
    pub lower: Option<f64>,

    /// Upper bound fires once until the rate drops back below it
    #[arg(long, default_value_t = false)]
    pub upper_once: bool,

    /// Lower bound fires once until the rate rises back above it
    #[arg(long, default_value_t = false)]
    pub lower_once: bool,

    /// Re-arm once-mode bounds before checking
    #[arg(long, default_value_t = false)]
    pub reset: bool,

    /// Threshold state file
    #[arg(long, env = "FX_ALERT_STATE", default_value = "fx-thresholds.json")]
    pub state: PathBuf,

    /// Days of history used to find the latest rate
    #[arg(long, default_value_t = 7, value_parser = clap::value_parser!(u32).range(1..=365))]
    pub days: u32,
}

impl AlertArgs {
    fn sets_bounds(&self) -> bool {
        self.upper.is_some() || self.lower.is_some()
    }

    /// Execute the alert command
    pub async fn execute(&self, cli: &Cli, cancel: CancelToken) -> Result<(), CliError> {
        let base = normalize_currency(&self.base)?;
        let symbol = normalize_currency(&self.symbol)?;

        let monitor = AlertMonitor::new(
            Arc::new(JsonFileStore::new(&self.state)),
            Arc::new(LogNotifier),
        );

        if self.sets_bounds() {
            monitor.update_bounds(
                &base,
                &symbol,
                self.upper,
                self.lower,
                self.upper_once,
                self.lower_once,
            )?;
        }
        if self.reset {
            monitor.reset_once_flags(&base, &symbol)?;
            info!(base = %base, symbol = %symbol, "Once flags reset");
        }

        let threshold = monitor.threshold(&base, &symbol)?;
        if !threshold.is_active() {
            println!("No threshold configured for {base}->{symbol}");
            return Ok(());
        }

        let end = Utc::now();
        let start = end - Duration::days(i64::from(self.days));
        let repository = cli.repository(repository_config(DEFAULT_MAX_CHART_POINTS), cancel)?;
        let points = repository.timeseries(&base, &symbol, start, end, true).await?;
        let Some(latest) = points.last() else {
            return Err(CliError::InvalidArgument(format!(
                "no rates for {base}->{symbol}"
            )));
        };

        let events = monitor.check(&base, &symbol, latest.value).await?;

        match cli.output_format {
            OutputFormat::Json => {
                let fired: Vec<_> = events
                    .iter()
                    .map(|e| json!({
                        "direction": e.direction.to_string(),
                        "threshold": e.threshold,
                        "message": e.message(),
                    }))
                    .collect();
                let body = json!({
                    "base": base,
                    "symbol": symbol,
                    "latest": latest.value,
                    "date": latest.timestamp.format("%Y-%m-%d").to_string(),
                    "fired": fired,
                });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            OutputFormat::Human => {
                println!(
                    "{base}->{symbol} latest {:.4} ({})",
                    latest.value,
                    latest.timestamp.format("%Y-%m-%d")
                );
                if events.is_empty() {
                    println!("  no alerts");
                }
                for event in &events {
                    println!("  ALERT {}: {}", event.direction, event.message());
                }
            }
        }
        Ok(())
    }
}
