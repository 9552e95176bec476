//! Command-line interface definitions.

pub mod banner;
mod check_config;
pub mod output;
mod run;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use rust_decimal::Decimal;

/// Latency-arbitrage detector and executor for binary-outcome prediction markets.
#[derive(Parser, Debug)]
#[command(name = "latchpoint")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "config.toml")]
    pub config: PathBuf,

    /// Override the venue chain ID
    #[arg(long)]
    pub chain_id: Option<u64>,

    /// Override log level (trace, debug, info, warn, error)
    #[arg(long)]
    pub log_level: Option<String>,

    /// Detect opportunities but never submit trades
    #[arg(long)]
    pub dry_run: bool,

    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatches to the selected subcommand.
    pub async fn dispatch(&self) -> Result<()> {
        match &self.command {
            Commands::Run(args) => run::execute(self, args).await,
            Commands::CheckConfig => check_config::execute(&self.config),
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the engine in the foreground
    Run(RunArgs),

    /// Load and validate a config file without running anything
    CheckConfig,
}

/// Arguments for the `run` subcommand.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Skip the startup banner
    #[arg(long)]
    pub no_banner: bool,

    /// Use JSON log format instead of pretty
    #[arg(long)]
    pub json_logs: bool,

    /// Override the strategy minimum edge threshold
    #[arg(long)]
    pub min_edge: Option<Decimal>,

    /// Override the maximum bankroll fraction risked per event
    #[arg(long)]
    pub max_bankroll_pct_per_event: Option<Decimal>,

    /// Override the maximum number of concurrent open positions
    #[arg(long)]
    pub max_concurrent_positions: Option<usize>,

    /// Enable Telegram notifications
    #[arg(long)]
    pub telegram_enabled: bool,
}
