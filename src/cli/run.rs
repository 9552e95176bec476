//! Handler for the `run` subcommand.

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

use crate::app::{App, Config};
use crate::cli::{banner, Cli, RunArgs};

fn map_app_result(result: std::result::Result<crate::error::Result<()>, tokio::task::JoinError>) -> Result<()> {
    match result {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => {
            error!(error = %e, "application exited with error");
            Err(e).context("application task failed")
        }
        Err(e) => {
            error!(error = %e, "application task join failed");
            Err(e).context("application task panicked or was cancelled")
        }
    }
}

/// Loads the config, applies CLI overrides, and runs the application until
/// ctrl-c or a fatal error.
pub async fn execute(cli: &Cli, args: &RunArgs) -> Result<()> {
    let mut config = Config::load(&cli.config).with_context(|| format!("loading config from {}", cli.config.display()))?;

    if let Some(chain_id) = cli.chain_id {
        config.exchange.chain_id = chain_id;
    }
    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.dry_run {
        config.dry_run = true;
    }
    if args.json_logs {
        config.logging.format = "json".to_string();
    }
    if let Some(min_edge) = args.min_edge {
        config.strategy.min_edge = min_edge;
    }
    if let Some(pct) = args.max_bankroll_pct_per_event {
        config.risk.max_bankroll_pct_per_event = pct;
    }
    if let Some(max_positions) = args.max_concurrent_positions {
        config.risk.max_concurrent_positions = max_positions;
    }
    if args.telegram_enabled {
        config.alerts.telegram_enabled = true;
    }

    config.init_logging();

    if !args.no_banner {
        banner::print_banner();
    }

    info!(
        mode = ?config.execution_mode,
        dry_run = config.dry_run,
        chain_id = config.exchange.chain_id,
        "latchpoint starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut app_handle = tokio::spawn(async move { App::run_with_shutdown(config, shutdown_rx).await });

    tokio::select! {
        result = &mut app_handle => {
            map_app_result(result)?;
            info!("latchpoint stopped");
            return Ok(());
        }
        _ = signal::ctrl_c() => {
            info!("shutdown signal received (ctrl-c)");
            let _ = shutdown_tx.send(true);
        }
    }

    map_app_result(app_handle.await)?;
    info!("latchpoint stopped");
    Ok(())
}
