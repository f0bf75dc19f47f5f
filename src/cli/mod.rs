use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;

pub mod commands;

#[derive(Parser)]
#[command(
    name = "plenario",
    about = "Chamber roll-call vote prediction engine",
    version = "0.1.0"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the enriched historical table from the modeling dataset
    Enrich {
        /// Modeling dataset file (defaults to DATA_DIR/modeling_dataset.json)
        #[arg(short, long)]
        input: Option<PathBuf>,

        /// Output file (defaults to ARTIFACTS_DIR/enriched_votes.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Predict one deputy's vote in one historical session
    Predict {
        /// Deputy id
        #[arg(short, long)]
        deputy: i64,

        /// Voting session id (e.g. "2438687-76")
        #[arg(short, long)]
        session: String,
    },

    /// Predict a whole historical session and compare with the record
    Session {
        /// Voting session id
        #[arg(short, long)]
        session: String,
    },

    /// Forecast the chamber scoreboard for an unvoted proposal
    Scenario {
        /// Proposal summary text (display only; forecasts are blind to
        /// proposal content)
        #[arg(short = 'm', long)]
        summary: Option<String>,
    },

    /// List historical session outcomes under the majority rule
    Sessions,

    /// Show global dataset statistics
    Stats,
}

/// Execute a CLI command against the loaded configuration
pub fn run(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Enrich { input, output } => {
            info!("Building enriched historical table");
            commands::enrich(&config, input, output)?;
        }
        Commands::Predict { deputy, session } => {
            info!(deputy, session = %session, "Predicting single vote");
            commands::predict(&config, deputy, &session)?;
        }
        Commands::Session { session } => {
            info!(session = %session, "Predicting full session");
            commands::session(&config, &session)?;
        }
        Commands::Scenario { summary } => {
            info!("Forecasting unvoted proposal");
            commands::scenario(&config, summary)?;
        }
        Commands::Sessions => {
            commands::sessions(&config)?;
        }
        Commands::Stats => {
            commands::stats(&config)?;
        }
    }
    Ok(())
}
