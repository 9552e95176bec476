//! Wires every subsystem together and runs the application to completion.
//!
//! [`App::run`] owns process lifetime: it builds the execution client for the
//! configured [`ExecutionMode`], the scanner, the arb engine, the risk
//! monitor, the feeds, and the alerting/metrics layer, registers every
//! cross-subsystem callback, and blocks until ctrl-c.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tracing::{info, warn};

use crate::app::config::{Config, ExecutionMode};
use crate::core::alerts::{AlertDispatcher, DailySummaryScheduler, NotificationChannel};
use crate::core::exchange::traits::ExecutionClient;
use crate::core::exchange::{PaperTradingClient, SimulatedClient};
use crate::core::feed::crypto::{CryptoFeed, CryptoFeedConfig};
use crate::core::feed::economic::{EconomicFeed, EconomicFeedConfig};
use crate::core::feed::sports::{SportsFeed, SportsFeedConfig};
use crate::core::feed::FeedRunner;
use crate::core::metrics::MetricsCollector;
use crate::core::risk::kill_switch::KillSwitchManager;
use crate::core::risk::oracle_monitor::OracleMonitor;
use crate::core::risk::RiskMonitor;
use crate::core::scanner::{Scanner, ScannerConfig};
use crate::core::strategy::{ArbEngine, ArbEventKind};
use crate::error::Result;

#[cfg(feature = "polymarket")]
use crate::core::exchange::{PolymarketClient, PolymarketClientConfig};

pub struct App;

impl App {
    /// Runs the arbitrage engine to completion, listening for ctrl-c itself.
    /// Equivalent to [`App::run_with_shutdown`] with a shutdown channel that
    /// never fires externally.
    pub async fn run(config: Config) -> Result<()> {
        let (_tx, rx) = watch::channel(false);
        Self::run_with_shutdown(config, rx).await
    }

    /// Runs the arbitrage engine to completion: until `shutdown_rx` reports
    /// `true`, ctrl-c is received, or a fatal startup error occurs. The
    /// concrete execution client is selected from `config.execution_mode`.
    pub async fn run_with_shutdown(config: Config, shutdown_rx: watch::Receiver<bool>) -> Result<()> {
        match config.execution_mode {
            ExecutionMode::Live => {
                #[cfg(feature = "polymarket")]
                {
                    let client = Arc::new(build_polymarket_client(&config)?);
                    run_with_client(config, client, shutdown_rx).await
                }
                #[cfg(not(feature = "polymarket"))]
                {
                    let _ = shutdown_rx;
                    Err(crate::error::Error::Config(
                        "execution_mode = live requires the polymarket feature".to_string(),
                    ))
                }
            }
            ExecutionMode::Paper => {
                #[cfg(feature = "polymarket")]
                {
                    let real = Arc::new(build_polymarket_client(&config)?);
                    let client = Arc::new(PaperTradingClient::with_config(
                        real,
                        config.exchange.paper_slippage_bps,
                        config.exchange.paper_fill_probability,
                        config.exchange.orderbook_refresh_secs,
                    ));
                    client.start_orderbook_refresh().await;
                    run_with_client(config, client, shutdown_rx).await
                }
                #[cfg(not(feature = "polymarket"))]
                {
                    let client = Arc::new(SimulatedClient::new(config.exchange.paper_slippage_bps));
                    run_with_client(config, client, shutdown_rx).await
                }
            }
            ExecutionMode::Simulated => {
                let client = Arc::new(SimulatedClient::new(config.exchange.paper_slippage_bps));
                run_with_client(config, client, shutdown_rx).await
            }
        }
    }
}

async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    while rx.changed().await.is_ok() {
        if *rx.borrow() {
            return;
        }
    }
}

#[cfg(feature = "polymarket")]
fn build_polymarket_client(config: &Config) -> Result<PolymarketClient> {
    let private_key = config
        .wallet
        .private_key
        .clone()
        .ok_or_else(|| crate::error::Error::Config("WALLET_PRIVATE_KEY not set".to_string()))?;
    Ok(PolymarketClient::new(PolymarketClientConfig {
        clob_api_url: config.exchange.clob_api_url.clone(),
        gamma_api_url: config.exchange.gamma_api_url.clone(),
        ws_url: config.exchange.ws_url.clone(),
        chain_id: config.exchange.chain_id,
        private_key,
        request_timeout: config.request_timeout(),
        burst_per_sec: config.exchange.burst_per_sec,
        sustained_per_sec: config.exchange.sustained_per_sec,
        order_ttl_secs: config.exchange.order_ttl_secs,
        pool_staleness_secs: config.exchange.pool_staleness_secs,
        params_cache_ttl_secs: config.exchange.params_cache_ttl_secs,
        pool_refresh_secs: config.exchange.pool_refresh_secs,
    }))
}

async fn run_with_client<C: ExecutionClient + 'static>(
    config: Config,
    client: Arc<C>,
    shutdown_rx: watch::Receiver<bool>,
) -> Result<()> {
    client.connect().await?;

    let scanner_config = ScannerConfig {
        scan_interval: Duration::from_secs(config.scanner.scan_interval_secs),
        max_tracked_markets: config.scanner.max_tracked_markets,
        batch_size: config.scanner.batch_size,
        filter: config.scanner.filter.clone().into_filter(),
        liquidity: config.scanner.liquidity.clone().into(),
    };
    let scanner = Arc::new(Scanner::new(Arc::clone(&client), scanner_config));

    let risk = Arc::new(RiskMonitor::new(config.risk.clone()));
    let oracle = Arc::new(OracleMonitor::new(config.oracle.clone()));
    let kill_switch = Arc::new(tokio::sync::Mutex::new(KillSwitchManager::new(config.kill_switch.clone())));

    let engine = Arc::new(ArbEngine::new(
        Arc::clone(&client),
        Arc::clone(&scanner),
        Arc::clone(&risk),
        config.strategy.clone(),
        config.sizing,
    ));

    let channels = build_notification_channels(&config);
    let dispatcher = Arc::new(AlertDispatcher::new(channels, config.alert_throttle()));
    let metrics = Arc::new(MetricsCollector::new(500));

    wire_engine_callbacks(&engine, &dispatcher, &metrics, &kill_switch, &risk).await;
    wire_risk_callbacks(&risk, &dispatcher).await;
    wire_oracle_callbacks(&oracle, &dispatcher, &risk).await;
    wire_scanner_connectivity(&scanner, &kill_switch, &risk).await;

    let daily_summary = Arc::new(DailySummaryScheduler::new(
        Arc::clone(&dispatcher),
        {
            let risk = Arc::clone(&risk);
            Arc::new(move || {
                let risk = Arc::clone(&risk);
                Box::pin(async move { risk.snapshot().await })
            })
        },
        config.alerts.daily_summary_hour_utc,
    ));

    let feeds = build_feeds(&config, &engine, &dispatcher, &kill_switch, &risk).await;

    scanner.start().await;
    engine.start().await;
    daily_summary.start().await;
    for feed in &feeds {
        feed.start().await?;
    }

    info!(mode = ?config.execution_mode, dry_run = config.dry_run, "latchpoint started");

    tokio::select! {
        result = tokio::signal::ctrl_c() => {
            result.map_err(crate::error::Error::Io)?;
            info!("shutdown signal received (ctrl-c)");
        }
        _ = wait_for_shutdown(shutdown_rx) => {
            info!("shutdown requested");
        }
    }

    for feed in &feeds {
        feed.stop().await?;
    }
    daily_summary.stop().await;
    engine.stop().await;
    scanner.stop().await;
    dispatcher.close().await;
    client.close().await?;

    info!(stats = ?engine.stats(), "latchpoint stopped");
    Ok(())
}

fn build_notification_channels(config: &Config) -> Vec<Box<dyn NotificationChannel>> {
    let mut channels: Vec<Box<dyn NotificationChannel>> = Vec::new();

    #[cfg(feature = "telegram")]
    if config.alerts.telegram_enabled {
        let secrets = Config::alerts_secrets();
        match (secrets.telegram_bot_token, config.alerts.telegram_chat_id) {
            (Some(token), Some(chat_id)) => {
                channels.push(Box::new(crate::core::alerts::TelegramChannel::new(token, chat_id)));
            }
            _ => warn!("telegram alerts enabled but TELEGRAM_BOT_TOKEN or chat_id is missing"),
        }
    }

    if let Some(webhook_url) = &config.alerts.discord_webhook_url {
        channels.push(Box::new(crate::core::alerts::DiscordChannel::new(webhook_url.clone())));
    }

    channels
}

async fn wire_engine_callbacks<C: ExecutionClient + 'static>(
    engine: &Arc<ArbEngine<C>>,
    dispatcher: &Arc<AlertDispatcher>,
    metrics: &Arc<MetricsCollector>,
    kill_switch: &Arc<tokio::sync::Mutex<KillSwitchManager>>,
    risk: &Arc<RiskMonitor>,
) {
    let dispatcher = Arc::clone(dispatcher);
    let metrics = Arc::clone(metrics);
    let kill_switch = Arc::clone(kill_switch);
    let risk = Arc::clone(risk);

    engine
        .on_event(Arc::new(move |event| {
            let dispatcher = Arc::clone(&dispatcher);
            let metrics = Arc::clone(&metrics);
            let kill_switch = Arc::clone(&kill_switch);
            let risk = Arc::clone(&risk);
            Box::pin(async move {
                dispatcher.on_arb_event(&event).await;
                metrics.on_arb_event(&event).await;

                if matches!(event.kind, ArbEventKind::TradeExecuted | ArbEventKind::TradeFailed) {
                    let success = event.kind == ArbEventKind::TradeExecuted;
                    let trigger = kill_switch.lock().await.record_trade_result(success, Utc::now());
                    if let Some(trigger) = trigger {
                        risk.trip(format!("{trigger:?}")).await;
                    }
                }
            })
        }))
        .await;
}

async fn wire_risk_callbacks(risk: &Arc<RiskMonitor>, dispatcher: &Arc<AlertDispatcher>) {
    let dispatcher = Arc::clone(dispatcher);
    risk.on_event(Arc::new(move |event| {
        let dispatcher = Arc::clone(&dispatcher);
        Box::pin(async move { dispatcher.on_risk_event(&event).await })
    }))
    .await;
}

/// Feeds the scanner's venue-connectivity signal (market/orderbook fetch
/// failures) into the shared kill switch so a dead exchange API trips the
/// same `Connectivity` trigger feed polling errors do.
async fn wire_scanner_connectivity<C: ExecutionClient + 'static>(
    scanner: &Arc<Scanner<C>>,
    kill_switch: &Arc<tokio::sync::Mutex<KillSwitchManager>>,
    risk: &Arc<RiskMonitor>,
) {
    let kill_switch = Arc::clone(kill_switch);
    let risk = Arc::clone(risk);
    scanner
        .on_event(Arc::new(move |event| {
            let kill_switch = Arc::clone(&kill_switch);
            let risk = Arc::clone(&risk);
            Box::pin(async move {
                match event {
                    crate::core::scanner::ScanEvent::ConnectivityFailed => {
                        let trigger = kill_switch.lock().await.record_api_error(Utc::now());
                        if let Some(trigger) = trigger {
                            risk.trip(format!("{trigger:?}")).await;
                        }
                    }
                    crate::core::scanner::ScanEvent::ConnectivityOk => {
                        kill_switch.lock().await.record_api_success();
                    }
                    _ => {}
                }
            })
        }))
        .await;
}

async fn wire_oracle_callbacks(oracle: &Arc<OracleMonitor>, dispatcher: &Arc<AlertDispatcher>, risk: &Arc<RiskMonitor>) {
    let dispatcher = Arc::clone(dispatcher);
    let risk = Arc::clone(risk);
    oracle
        .on_alert(Arc::new(move |alert| {
            let dispatcher = Arc::clone(&dispatcher);
            let risk = Arc::clone(&risk);
            Box::pin(async move {
                let exposed = alert.held_position_exposure > rust_decimal::Decimal::ZERO;
                dispatcher.on_oracle_alert(&alert).await;
                if exposed && alert.event_type == crate::core::risk::OracleEventType::DisputeDetected {
                    risk.trip(alert.reason.clone()).await;
                }
            })
        }))
        .await;
}

/// Type-erased feed handle so heterogeneous `FeedRunner<F>`s can share one
/// start/stop loop in [`run_with_client`].
#[async_trait::async_trait]
trait AnyFeed: Send + Sync {
    async fn start(&self) -> Result<()>;
    async fn stop(&self) -> Result<()>;
}

async fn build_feeds<C: ExecutionClient + 'static>(
    config: &Config,
    engine: &Arc<ArbEngine<C>>,
    dispatcher: &Arc<AlertDispatcher>,
    kill_switch: &Arc<tokio::sync::Mutex<KillSwitchManager>>,
    risk: &Arc<RiskMonitor>,
) -> Vec<Box<dyn AnyFeed>> {
    let mut feeds: Vec<Box<dyn AnyFeed>> = Vec::new();

    if !config.feeds.economic.series_ids.is_empty() {
        let runner = Arc::new(FeedRunner::new(EconomicFeed::new(EconomicFeedConfig {
            endpoint: config.feeds.economic.endpoint.clone(),
            series_ids: config.feeds.economic.series_ids.clone(),
            indicator_names: std::collections::HashMap::new(),
            registration_key: config.feeds.economic.registration_key.clone(),
            poll_interval: Duration::from_secs(config.feeds.economic.poll_interval_secs),
        })));
        register_feed_callbacks(&runner, engine, dispatcher, kill_switch, risk).await;
        feeds.push(Box::new(SharedFeedRunner(runner)));
    }

    {
        let runner = Arc::new(FeedRunner::new(SportsFeed::new(SportsFeedConfig {
            endpoint: config.feeds.sports.endpoint.clone(),
            league: config.feeds.sports.league.clone(),
            poll_interval: Duration::from_secs(config.feeds.sports.poll_interval_secs),
        })));
        register_feed_callbacks(&runner, engine, dispatcher, kill_switch, risk).await;
        feeds.push(Box::new(SharedFeedRunner(runner)));
    }

    if !config.feeds.crypto.pairs.is_empty() {
        let runner = Arc::new(FeedRunner::new(CryptoFeed::new(CryptoFeedConfig {
            primary_exchange: config.feeds.crypto.primary_exchange.clone(),
            primary_ws_url: config.feeds.crypto.primary_ws_url.clone(),
            validator_ws_urls: config.feeds.crypto.validator_ws_urls.clone(),
            pairs: config.feeds.crypto.pairs.clone(),
            cross_validation_threshold_pct: config.feeds.crypto.cross_validation_threshold_pct,
            price_move_threshold_pct: config.feeds.crypto.price_move_threshold_pct,
            ping_interval: Duration::from_secs(config.feeds.crypto.ping_interval_secs),
            poll_interval: Duration::from_secs(config.feeds.crypto.poll_interval_secs),
        })));
        register_feed_callbacks(&runner, engine, dispatcher, kill_switch, risk).await;
        feeds.push(Box::new(SharedFeedRunner(runner)));
    }

    feeds
}

struct SharedFeedRunner<F: crate::core::feed::PollableFeed>(Arc<FeedRunner<F>>);

#[async_trait::async_trait]
impl<F: crate::core::feed::PollableFeed> AnyFeed for SharedFeedRunner<F> {
    async fn start(&self) -> Result<()> {
        Ok(self.0.start().await?)
    }

    async fn stop(&self) -> Result<()> {
        Ok(self.0.stop().await?)
    }
}

async fn register_feed_callbacks<F: crate::core::feed::PollableFeed, C: ExecutionClient + 'static>(
    runner: &Arc<FeedRunner<F>>,
    engine: &Arc<ArbEngine<C>>,
    dispatcher: &Arc<AlertDispatcher>,
    kill_switch: &Arc<tokio::sync::Mutex<KillSwitchManager>>,
    risk: &Arc<RiskMonitor>,
) {
    let engine = Arc::clone(engine);
    let dispatcher = Arc::clone(dispatcher);
    runner
        .on_event(Arc::new(move |event| {
            let engine = Arc::clone(&engine);
            let dispatcher = Arc::clone(&dispatcher);
            Box::pin(async move {
                dispatcher.on_feed_event(&event).await;
                engine.on_feed_event(event).await;
            })
        }))
        .await;

    let kill_switch = Arc::clone(kill_switch);
    let risk = Arc::clone(risk);
    runner
        .on_health(Arc::new(move |healthy| {
            let kill_switch = Arc::clone(&kill_switch);
            let risk = Arc::clone(&risk);
            Box::pin(async move {
                if healthy {
                    kill_switch.lock().await.record_api_success();
                } else {
                    let trigger = kill_switch.lock().await.record_api_error(Utc::now());
                    if let Some(trigger) = trigger {
                        risk.trip(format!("{trigger:?}")).await;
                    }
                }
            })
        }))
        .await;
}
