//! Main entry point for the fx-timeseries CLI

use clap::Parser;
use fx_timeseries::cancel::CancelToken;
use fx_timeseries::cli::{Cli, Commands};
use fx_timeseries::metrics::init_metrics;
use tracing::error;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber with optional JSON formatting
fn init_tracing() {
    let json_format = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("fx_timeseries=info"));

    // Logs go to stderr so command output on stdout stays machine-readable.
    if json_format {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .init();
    }
}

async fn run(cli: &Cli, cancel: CancelToken) -> anyhow::Result<()> {
    if let Some(addr) = cli.metrics_addr {
        init_metrics(addr)?;
    }

    match &cli.command {
        Commands::Timeseries(args) => args.execute(cli, cancel).await?,
        Commands::Latest(args) => args.execute(cli, cancel).await?,
        Commands::Alert(args) => args.execute(cli, cancel).await?,
    }
    Ok(())
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    let cancel = CancelToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("Ctrl+C received - abandoning pending retries...");
                cancel.cancel();
            }
        }
    });

    if let Err(e) = run(&cli, cancel).await {
        error!("Command failed: {:#}", e);
        std::process::exit(1);
    }
}
