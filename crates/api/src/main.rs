//! Alert Ledger - Main Entry Point

use anyhow::Context;
use api::{init_logging, run_server, AppConfig};
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

/// Alertmanager webhook receiver with durable alert state
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to YAML configuration file
    #[arg(short, long, env = "ALERT_LEDGER_CONFIG", default_value = "config.yaml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = AppConfig::load(&args.config)
        .with_context(|| format!("loading config from {}", args.config.display()))?;
    init_logging(&config.logging).context("installing tracing subscriber")?;

    info!("=== Alert Ledger v{} ===", env!("CARGO_PKG_VERSION"));
    info!("Using alert store at {}", config.database.url);

    run_server(&config).await
}
