//! Latest command: current rates against a base currency.

use clap::Args;
use serde_json::json;

use super::{normalize_currency, repository_config, Cli, CliError, OutputFormat};
use crate::cancel::CancelToken;
use crate::repository::{RateRepository, DEFAULT_MAX_CHART_POINTS};

/// Arguments for the latest command
#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Base currency (e.g., USD)
    #[arg(long, default_value = "USD")]
    pub base: String,

    /// Only show these currencies; repeat for several
    #[arg(long = "symbol")]
    pub symbols: Vec<String>,
}

impl LatestArgs {
    /// Execute the latest command
    pub async fn execute(&self, cli: &Cli, cancel: CancelToken) -> Result<(), CliError> {
        let base = normalize_currency(&self.base)?;
        let wanted = self
            .symbols
            .iter()
            .map(|s| normalize_currency(s))
            .collect::<Result<Vec<_>, _>>()?;

        let repository = cli.repository(repository_config(DEFAULT_MAX_CHART_POINTS), cancel)?;
        let latest = repository.latest(&base).await?;

        let rows: Vec<(&str, f64)> = latest
            .sorted()
            .into_iter()
            .filter(|(code, _)| wanted.is_empty() || wanted.iter().any(|w| w.as_str() == *code))
            .collect();

        match cli.output_format {
            OutputFormat::Json => {
                let rates: serde_json::Map<String, serde_json::Value> = rows
                    .iter()
                    .map(|(code, value)| (code.to_string(), json!(value)))
                    .collect();
                let body = json!({ "base": latest.base, "date": latest.date, "rates": rates });
                println!("{}", serde_json::to_string_pretty(&body)?);
            }
            OutputFormat::Human => {
                println!("Rates against {} ({}):", latest.base, latest.date);
                for (code, value) in rows {
                    println!("  {code}  {value:.6}");
                }
            }
        }
        Ok(())
    }
}
