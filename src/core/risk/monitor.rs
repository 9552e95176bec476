//! Orchestrates the risk gates, position book, and P&L tracker behind a
//! single entry point: [`RiskMonitor::check_trade`] before execution,
//! [`RiskMonitor::record_fill`] after.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;
use tracing::warn;

use crate::core::domain::{ExecutionResult, PnlTracker, Position, TradeAction};
use crate::core::risk::config::RiskConfig;
use crate::core::risk::gates::{
    check_daily_loss, check_kill_switch, check_max_concurrent_positions, check_orderbook_depth,
    check_position_concentration, check_spread, RiskVerdict,
};
use crate::core::risk::positions::PositionBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskEventType {
    PositionOpened,
    PositionClosed,
    KillSwitchTriggered,
    KillSwitchReset,
}

#[derive(Debug, Clone)]
pub struct RiskEvent {
    pub event_type: RiskEventType,
    pub position: Option<Position>,
    pub daily_pnl: Option<rust_decimal::Decimal>,
    pub reason: String,
}

impl RiskEvent {
    fn new(event_type: RiskEventType) -> Self {
        Self {
            event_type,
            position: None,
            daily_pnl: None,
            reason: String::new(),
        }
    }
}

pub type RiskEventCallback = Arc<dyn Fn(RiskEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct RiskMonitor {
    config: RiskConfig,
    positions: Mutex<PositionBook>,
    pnl: Mutex<PnlTracker>,
    killed: std::sync::atomic::AtomicBool,
    callbacks: Mutex<Vec<RiskEventCallback>>,
}

impl RiskMonitor {
    #[must_use]
    pub fn new(config: RiskConfig) -> Self {
        Self {
            config,
            positions: Mutex::new(PositionBook::new()),
            pnl: Mutex::new(PnlTracker::new(Utc::now())),
            killed: std::sync::atomic::AtomicBool::new(false),
            callbacks: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn killed(&self) -> bool {
        self.killed.load(std::sync::atomic::Ordering::SeqCst)
    }

    pub async fn on_event(&self, callback: RiskEventCallback) {
        self.callbacks.lock().await.push(callback);
    }

    async fn emit(&self, event: RiskEvent) {
        for cb in self.callbacks.lock().await.iter() {
            cb(event.clone()).await;
        }
    }

    /// Runs every gate in priority order, returning the first rejection.
    pub async fn check_trade(&self, action: &TradeAction) -> RiskVerdict {
        let verdict = check_kill_switch(self.killed());
        if !verdict.is_approved() {
            return verdict;
        }

        let realized_today = self.pnl.lock().await.realized_today(Utc::now());
        let verdict = check_daily_loss(realized_today, &self.config);
        if !verdict.is_approved() {
            return verdict;
        }

        let positions = self.positions.lock().await;
        let verdict = check_position_concentration(action, &positions, &self.config);
        if !verdict.is_approved() {
            return verdict;
        }

        let verdict = check_max_concurrent_positions(&positions, &self.config);
        if !verdict.is_approved() {
            return verdict;
        }
        drop(positions);

        let verdict = check_orderbook_depth(action, &self.config);
        if !verdict.is_approved() {
            return verdict;
        }

        check_spread(action, &self.config)
    }

    /// Records a successful fill: updates positions and realized P&L, and
    /// auto-trips the kill switch if the fill breaches the daily loss limit.
    pub async fn record_fill(&self, result: &ExecutionResult) {
        let now = Utc::now();
        let action = result.action();
        let fill_price = result.fill_price().unwrap_or_else(|| action.price());
        let fill_size = result.fill_size().unwrap_or_else(|| action.size());

        let existing = self.positions.lock().await.get(action.token_id()).cloned();
        let realized = if let Some(existing) = &existing {
            if existing.side() == action.side() {
                rust_decimal::Decimal::ZERO
            } else {
                let close_size = fill_size.min(existing.size());
                self.pnl
                    .lock()
                    .await
                    .record_close(existing.side(), existing.entry_price(), fill_price, close_size, now)
            }
        } else {
            rust_decimal::Decimal::ZERO
        };

        let updated = self.positions.lock().await.record_fill(result, now);

        match updated {
            Some(position) => {
                let mut event = RiskEvent::new(RiskEventType::PositionOpened);
                event.position = Some(position);
                self.emit(event).await;
            }
            None => {
                let daily_pnl = self.pnl.lock().await.realized_today(now);
                let mut event = RiskEvent::new(RiskEventType::PositionClosed);
                event.daily_pnl = Some(daily_pnl);
                self.emit(event).await;
            }
        }

        if realized < rust_decimal::Decimal::ZERO {
            let daily_pnl = self.pnl.lock().await.realized_today(now);
            if daily_pnl < -self.config.max_daily_loss_usd && !self.killed() {
                self.killed.store(true, std::sync::atomic::Ordering::SeqCst);
                let reason = format!("daily loss {daily_pnl} breached -{} limit", self.config.max_daily_loss_usd);
                warn!(daily_pnl = %daily_pnl, "kill_switch_triggered");
                let mut event = RiskEvent::new(RiskEventType::KillSwitchTriggered);
                event.daily_pnl = Some(daily_pnl);
                event.reason = reason;
                self.emit(event).await;
            }
        }
    }

    /// Trips the kill switch from an external source (the multi-trigger
    /// [`crate::core::risk::kill_switch::KillSwitchManager`], an oracle
    /// dispute, a manual operator command) rather than the daily-loss check.
    pub async fn trip(&self, reason: impl Into<String>) {
        if self.killed.swap(true, std::sync::atomic::Ordering::SeqCst) {
            return;
        }
        warn!("kill_switch_triggered_externally");
        let mut event = RiskEvent::new(RiskEventType::KillSwitchTriggered);
        event.reason = reason.into();
        self.emit(event).await;
    }

    pub async fn reset_kill_switch(&self) {
        self.killed.store(false, std::sync::atomic::Ordering::SeqCst);
        let mut event = RiskEvent::new(RiskEventType::KillSwitchReset);
        event.reason = "kill switch manually reset".to_string();
        self.emit(event).await;
    }

    #[must_use]
    pub async fn snapshot(&self) -> RiskSnapshot {
        let positions = self.positions.lock().await;
        let mut pnl = self.pnl.lock().await;
        let now = Utc::now();
        RiskSnapshot {
            killed: self.killed(),
            open_positions: positions.count(),
            total_exposure_usd: positions.total_exposure_usd(),
            realized_today: pnl.realized_today(now),
            realized_total: pnl.realized_total(),
            trade_count_today: pnl.trade_count_today(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RiskSnapshot {
    pub killed: bool,
    pub open_positions: usize,
    pub total_exposure_usd: rust_decimal::Decimal,
    pub realized_today: rust_decimal::Decimal,
    pub realized_total: rust_decimal::Decimal,
    pub trade_count_today: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{
        Category, ConditionId, FeedEvent, FeedEventKind, FeedKind, MarketInfo, MarketOpportunity, MatchResult, OrderType,
        OutcomeToken, OutcomeType, Side, Signal, TokenId,
    };
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn result(side: Side, price: rust_decimal::Decimal, size: rust_decimal::Decimal) -> ExecutionResult {
        let market = MarketInfo::new(
            ConditionId::new("c1"),
            "q",
            vec![OutcomeToken::new(TokenId::new("yes"), "Yes")],
            true,
            false,
            false,
            true,
            None,
            vec![],
            0,
        );
        let opp = MarketOpportunity::new(
            market,
            Category::Economic,
            TokenId::new("yes"),
            Some(dec!(0.90)),
            Some(dec!(0.93)),
            None,
            dec!(5000),
            dec!(2500),
            dec!(2500),
            0.8,
            Utc::now(),
        );
        let event = FeedEvent::new(
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
        );
        let m = MatchResult::new(event, opp, TokenId::new("yes"), 0.95);
        let signal = Signal::new(m, dec!(0.99), 0.95, side, price, dec!(0.06));
        let action = TradeAction::new(signal, TokenId::new("yes"), side, price, size, OrderType::Fok, dec!(0.01), dec!(10), "r");
        ExecutionResult::success(action, price, size, Utc::now())
    }

    #[tokio::test]
    async fn check_trade_approves_by_default() {
        let monitor = RiskMonitor::new(RiskConfig::default());
        let action = result(Side::Buy, dec!(0.93), dec!(100)).action().clone();
        assert!(monitor.check_trade(&action).await.is_approved());
    }

    #[tokio::test]
    async fn record_fill_opens_then_closes_a_position() {
        let monitor = RiskMonitor::new(RiskConfig::default());
        monitor.record_fill(&result(Side::Buy, dec!(0.50), dec!(100))).await;
        assert_eq!(monitor.snapshot().await.open_positions, 1);

        monitor.record_fill(&result(Side::Sell, dec!(0.40), dec!(100))).await;
        let snapshot = monitor.snapshot().await;
        assert_eq!(snapshot.open_positions, 0);
        assert_eq!(snapshot.realized_today, dec!(-10));
    }

    #[tokio::test]
    async fn daily_loss_breach_trips_kill_switch() {
        let mut config = RiskConfig::default();
        config.max_daily_loss_usd = dec!(5);
        let monitor = RiskMonitor::new(config);
        monitor.record_fill(&result(Side::Buy, dec!(0.50), dec!(100))).await;
        monitor.record_fill(&result(Side::Sell, dec!(0.30), dec!(100))).await;
        assert!(monitor.killed());
    }

    #[tokio::test]
    async fn reset_kill_switch_clears_killed_flag() {
        let mut config = RiskConfig::default();
        config.max_daily_loss_usd = dec!(5);
        let monitor = RiskMonitor::new(config);
        monitor.record_fill(&result(Side::Buy, dec!(0.50), dec!(100))).await;
        monitor.record_fill(&result(Side::Sell, dec!(0.30), dec!(100))).await;
        assert!(monitor.killed());
        monitor.reset_kill_switch().await;
        assert!(!monitor.killed());
    }
}
