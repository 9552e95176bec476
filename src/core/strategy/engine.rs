//! Orchestrates the event -> match -> signal -> size -> execute pipeline.
//!
//! The engine does not own feed or scanner lifecycle; it is registered as a
//! callback consumer via [`ArbEngine::on_feed_event`], which callers pass to
//! a feed's own event hook.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::domain::{
    ExecutionResult, FeedEvent, FeedEventKind, MarketOrderRequest, OrderRequest, OrderType, Side, Signal, TradeAction,
};
use crate::core::exchange::traits::ExecutionClient;
use crate::core::risk::RiskMonitor;
use crate::core::scanner::Scanner;
use crate::core::strategy::config::{SizingLimits, StrategyConfig};
use crate::core::strategy::matcher::MarketMatcher;
use crate::core::strategy::signal::SignalGenerator;
use crate::core::strategy::sizer::PositionSizer;

pub type ArbEventCallback = Arc<dyn Fn(ArbEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArbEventKind {
    EngineStarted,
    EngineStopped,
    SignalGenerated,
    TradeSkipped,
    TradeExecuted,
    TradeFailed,
}

#[derive(Debug, Clone)]
pub struct ArbEvent {
    pub kind: ArbEventKind,
    pub signal: Option<Signal>,
    pub action: Option<TradeAction>,
    pub result: Option<ExecutionResult>,
    pub reason: String,
}

impl ArbEvent {
    fn new(kind: ArbEventKind, reason: impl Into<String>) -> Self {
        Self {
            kind,
            signal: None,
            action: None,
            result: None,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct EngineStats {
    pub signals_generated: u64,
    pub trades_executed: u64,
    pub trades_failed: u64,
    pub trades_skipped: u64,
}

#[derive(Default)]
struct AtomicStats {
    signals_generated: AtomicU64,
    trades_executed: AtomicU64,
    trades_failed: AtomicU64,
    trades_skipped: AtomicU64,
}

impl AtomicStats {
    fn snapshot(&self) -> EngineStats {
        EngineStats {
            signals_generated: self.signals_generated.load(Ordering::Relaxed),
            trades_executed: self.trades_executed.load(Ordering::Relaxed),
            trades_failed: self.trades_failed.load(Ordering::Relaxed),
            trades_skipped: self.trades_skipped.load(Ordering::Relaxed),
        }
    }
}

pub struct ArbEngine<C: ExecutionClient + 'static> {
    client: Arc<C>,
    scanner: Arc<Scanner<C>>,
    risk: Arc<RiskMonitor>,
    matcher: MarketMatcher,
    signal_gen: SignalGenerator,
    sizer: PositionSizer,
    callbacks: Mutex<Vec<ArbEventCallback>>,
    processing: Mutex<()>,
    running: AtomicBool,
    stats: AtomicStats,
}

impl<C: ExecutionClient + 'static> ArbEngine<C> {
    #[must_use]
    pub fn new(
        client: Arc<C>,
        scanner: Arc<Scanner<C>>,
        risk: Arc<RiskMonitor>,
        strategy_config: StrategyConfig,
        sizing_limits: SizingLimits,
    ) -> Self {
        let matcher = MarketMatcher::new(strategy_config.match_confidence_threshold);
        let signal_gen = SignalGenerator::new(strategy_config.clone());
        let sizer = PositionSizer::new(strategy_config, sizing_limits);
        Self {
            client,
            scanner,
            risk,
            matcher,
            signal_gen,
            sizer,
            callbacks: Mutex::new(Vec::new()),
            processing: Mutex::new(()),
            running: AtomicBool::new(false),
            stats: AtomicStats::default(),
        }
    }

    #[must_use]
    pub fn stats(&self) -> EngineStats {
        self.stats.snapshot()
    }

    #[must_use]
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub async fn on_event(&self, callback: ArbEventCallback) {
        self.callbacks.lock().await.push(callback);
    }

    async fn emit(&self, event: ArbEvent) {
        for cb in self.callbacks.lock().await.iter() {
            cb(event.clone()).await;
        }
    }

    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        info!("arb_engine_started");
        self.emit(ArbEvent::new(ArbEventKind::EngineStarted, "Engine started")).await;
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        info!(stats = ?self.stats.snapshot(), "arb_engine_stopped");
        self.emit(ArbEvent::new(ArbEventKind::EngineStopped, "Engine stopped")).await;
    }

    /// Entry point intended to be passed to a feed's `on_event` hook.
    /// Ignores non-data events and serializes processing with an internal
    /// lock so overlapping feed callbacks can't race each other.
    pub async fn on_feed_event(&self, event: FeedEvent) {
        if !self.running() || event.event_kind() != FeedEventKind::DataReleased {
            return;
        }
        let _guard = self.processing.lock().await;
        self.process_event_internal(&event).await;
    }

    /// Processes a feed event and returns the execution results, for testing
    /// and backtest replay where callers want results rather than callbacks.
    pub async fn process_event(&self, event: &FeedEvent) -> Vec<ExecutionResult> {
        let opportunities = self.scanner.opportunities();
        let matches = self.matcher.match_event(event, &opportunities);
        if matches.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for m in matches {
            if let Some(result) = self.process_match(m).await {
                results.push(result);
            }
        }
        results
    }

    async fn process_event_internal(&self, event: &FeedEvent) {
        let opportunities = self.scanner.opportunities();
        let matches = self.matcher.match_event(event, &opportunities);
        if matches.is_empty() {
            return;
        }
        for m in matches {
            self.process_match(m).await;
        }
    }

    async fn process_match(&self, m: crate::core::domain::MatchResult) -> Option<ExecutionResult> {
        let signal = self.signal_gen.evaluate(m)?;
        self.stats.signals_generated.fetch_add(1, Ordering::Relaxed);
        self.emit({
            let mut e = ArbEvent::new(ArbEventKind::SignalGenerated, "signal generated");
            e.signal = Some(signal.clone());
            e
        })
        .await;

        let Some(action) = self.sizer.size(signal.clone()) else {
            self.stats.trades_skipped.fetch_add(1, Ordering::Relaxed);
            self.emit({
                let mut e = ArbEvent::new(ArbEventKind::TradeSkipped, "position sizing returned none");
                e.signal = Some(signal);
                e
            })
            .await;
            return None;
        };

        let verdict = self.risk.check_trade(&action).await;
        if !verdict.is_approved() {
            self.stats.trades_skipped.fetch_add(1, Ordering::Relaxed);
            let reason = verdict.detail().map(String::from).unwrap_or_else(|| "risk gate rejected trade".to_string());
            self.emit({
                let mut e = ArbEvent::new(ArbEventKind::TradeSkipped, reason);
                e.action = Some(action);
                e
            })
            .await;
            return None;
        }

        let result = self.execute_action(action).await;
        self.risk.record_fill(&result).await;
        Some(result)
    }

    async fn execute_action(&self, action: TradeAction) -> ExecutionResult {
        let now = Utc::now();

        let response = if action.order_type() == OrderType::Fok {
            self.client
                .place_market_order(MarketOrderRequest {
                    token_id: action.token_id().clone(),
                    side: action.side(),
                    size: action.size(),
                    worst_price: action.worst_price(),
                })
                .await
        } else {
            self.client
                .place_order(OrderRequest {
                    token_id: action.token_id().clone(),
                    side: action.side(),
                    price: action.price(),
                    size: action.size(),
                    order_type: action.order_type(),
                })
                .await
        };

        match response {
            Ok(response) if response.success => {
                self.stats.trades_executed.fetch_add(1, Ordering::Relaxed);
                let result = ExecutionResult::success(
                    action.clone(),
                    response.fill_price.unwrap_or(action.price()),
                    response.fill_size.unwrap_or(action.size()),
                    now,
                );
                info!(
                    token_id = %action.token_id(),
                    side = ?action.side(),
                    size = %action.size(),
                    price = %action.price(),
                    "trade_executed"
                );
                self.emit({
                    let mut e = ArbEvent::new(ArbEventKind::TradeExecuted, action.reason().to_string());
                    e.action = Some(action);
                    e.result = Some(result.clone());
                    e
                })
                .await;
                result
            }
            Ok(response) => {
                self.stats.trades_failed.fetch_add(1, Ordering::Relaxed);
                let error = response.error.unwrap_or_else(|| "order not successful".to_string());
                warn!(token_id = %action.token_id(), error = %error, "trade_failed");
                let result = ExecutionResult::failure(action.clone(), now, error);
                self.emit({
                    let mut e = ArbEvent::new(ArbEventKind::TradeFailed, "order not successful");
                    e.action = Some(action);
                    e.result = Some(result.clone());
                    e
                })
                .await;
                result
            }
            Err(err) => {
                self.stats.trades_failed.fetch_add(1, Ordering::Relaxed);
                warn!(error = %err, "trade_execution_error");
                let result = ExecutionResult::failure(action.clone(), now, err.to_string());
                self.emit({
                    let mut e = ArbEvent::new(ArbEventKind::TradeFailed, err.to_string());
                    e.action = Some(action);
                    e.result = Some(result.clone());
                    e
                })
                .await;
                result
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{
        Category, ConditionId, FeedKind, MarketInfo, OrderBook, OutcomeToken, OutcomeType, PriceLevel, TokenId,
        VenueOrderResponse,
    };
    use crate::core::exchange::traits::{MarketOrderRequest as MOR, OrderRequest as OR};
    use crate::core::scanner::{LiquidityScreen, ScanFilter, ScannerConfig};
    use crate::error::ClobClientError;
    use async_trait::async_trait;
    use rust_decimal::Decimal;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    struct FakeClient;

    #[async_trait]
    impl ExecutionClient for FakeClient {
        async fn connect(&self) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn close(&self) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn get_all_markets(&self) -> Result<Vec<MarketInfo>, ClobClientError> {
            Ok(vec![market()])
        }
        async fn get_market(&self, _condition_id: &str) -> Result<MarketInfo, ClobClientError> {
            Ok(market())
        }
        async fn get_orderbook(&self, token_id: &TokenId) -> Result<OrderBook, ClobClientError> {
            Ok(OrderBook::new(
                token_id.clone(),
                vec![PriceLevel::new(dec!(0.90), dec!(5000))],
                vec![PriceLevel::new(dec!(0.93), dec!(5000))],
                Utc::now(),
            ))
        }
        async fn get_orderbooks(&self, token_ids: &[TokenId]) -> Result<HashMap<TokenId, OrderBook>, ClobClientError> {
            let mut out = HashMap::new();
            for t in token_ids {
                out.insert(t.clone(), self.get_orderbook(t).await?);
            }
            Ok(out)
        }
        async fn get_midpoint(&self, _token_id: &TokenId) -> Result<Decimal, ClobClientError> {
            Ok(dec!(0.915))
        }
        async fn get_spread(&self, _token_id: &TokenId) -> Result<Decimal, ClobClientError> {
            Ok(dec!(0.03))
        }
        async fn subscribe_orderbook(&self, _token_id: &TokenId) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn unsubscribe_orderbook(&self, _token_id: &TokenId) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn place_order(&self, _request: OR) -> Result<VenueOrderResponse, ClobClientError> {
            unreachable!("test only exercises FOK orders")
        }
        async fn place_market_order(&self, request: MOR) -> Result<VenueOrderResponse, ClobClientError> {
            Ok(VenueOrderResponse {
                success: true,
                order_id: Some("order-1".to_string()),
                fill_price: Some(request.worst_price),
                fill_size: Some(request.size),
                error: None,
            })
        }
        async fn cancel_order(&self, _order_id: &str) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn cancel_orders(&self, _order_ids: &[String]) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn cancel_all(&self) -> Result<(), ClobClientError> {
            Ok(())
        }
    }

    fn market() -> MarketInfo {
        MarketInfo::new(
            ConditionId::new("c1"),
            "Will CPI be above 3.0%?",
            vec![
                OutcomeToken::new(TokenId::new("yes"), "Yes"),
                OutcomeToken::new(TokenId::new("no"), "No"),
            ],
            true,
            false,
            false,
            true,
            None,
            vec![],
            0,
        )
    }

    fn economic_event() -> FeedEvent {
        FeedEvent::new(
            FeedKind::Economic,
            FeedEventKind::DataReleased,
            "CPI",
            "3.5",
            Some(dec!(3.5)),
            OutcomeType::Numeric,
            Utc::now(),
            Utc::now(),
            HashMap::new(),
            serde_json::Value::Null,
        )
    }

    fn scanner_config() -> ScannerConfig {
        ScannerConfig {
            scan_interval: std::time::Duration::from_secs(60),
            max_tracked_markets: 100,
            batch_size: 10,
            filter: ScanFilter::default(),
            liquidity: LiquidityScreen {
                min_total_depth_usd: dec!(0),
                max_spread: dec!(1),
                min_bid_depth_usd: dec!(0),
                min_ask_depth_usd: dec!(0),
            },
        }
    }

    fn build_scanner(client: Arc<FakeClient>) -> Arc<Scanner<FakeClient>> {
        Arc::new(Scanner::new(client, scanner_config()))
    }

    fn build_risk() -> Arc<crate::core::risk::RiskMonitor> {
        Arc::new(crate::core::risk::RiskMonitor::new(crate::core::risk::RiskConfig::default()))
    }

    #[tokio::test]
    async fn process_event_with_no_opportunities_yields_no_results() {
        let client = Arc::new(FakeClient);
        let scanner = build_scanner(Arc::clone(&client));
        let engine = ArbEngine::new(client, scanner, build_risk(), StrategyConfig::default(), SizingLimits::default());
        let results = engine.process_event(&economic_event()).await;
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn start_and_stop_toggle_running_flag() {
        let client = Arc::new(FakeClient);
        let scanner = build_scanner(client.clone());
        let engine = ArbEngine::new(client, scanner, build_risk(), StrategyConfig::default(), SizingLimits::default());
        assert!(!engine.running());
        engine.start().await;
        assert!(engine.running());
        engine.stop().await;
        assert!(!engine.running());
    }

    #[allow(dead_code)]
    fn _unused(_: Category) {}
}
