//! Handler for the `check-config` subcommand.

use std::path::Path;

use anyhow::{Context, Result};

use crate::app::Config;
use crate::cli::output;

/// Loads and validates a config file without starting the engine.
pub fn execute<P: AsRef<Path>>(config_path: P) -> Result<()> {
    let path = config_path.as_ref();
    output::section("Configuration check");
    output::field("config", path.display());

    let config = Config::load(path).with_context(|| format!("loading config from {}", path.display()))?;
    output::success("configuration file is valid");

    output::section("Summary");
    output::field("execution mode", format!("{:?}", config.execution_mode));
    output::field("chain id", config.exchange.chain_id);
    output::field("dry run", config.dry_run);
    output::field("min edge", config.strategy.min_edge);
    output::field("max daily loss (usd)", config.risk.max_daily_loss_usd);

    if config.wallet.private_key.is_some() {
        output::success("wallet credentials detected");
    } else {
        output::warning("WALLET_PRIVATE_KEY not set; execution_mode = live will fail to start");
    }

    if config.alerts.telegram_enabled {
        let token = std::env::var("TELEGRAM_BOT_TOKEN").ok();
        if token.is_some() && config.alerts.telegram_chat_id.is_some() {
            output::success("telegram alerting configured");
        } else {
            output::warning("alerts.telegram_enabled is set but TELEGRAM_BOT_TOKEN or telegram_chat_id is missing");
        }
    } else {
        output::field("telegram", "disabled");
    }

    output::success("configuration check complete");
    Ok(())
}
