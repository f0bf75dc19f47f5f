use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use plenario::cli::{self, Cli};
use plenario::config::Config;

fn main() -> Result<()> {
    // Load configuration first
    let config = Config::load()?;

    // Initialize tracing with structured JSON logging
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .json();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    info!(version = env!("CARGO_PKG_VERSION"), "Plenario starting up");

    let cli = Cli::parse();

    if cli.verbose {
        info!("Verbose mode enabled");
    }

    cli::run(cli, config)?;

    info!("Plenario completed successfully");
    Ok(())
}
