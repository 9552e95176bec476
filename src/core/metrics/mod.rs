//! Real-time trade performance tracking.
//!
//! [`MetricsCollector`] subscribes to [`crate::core::strategy::ArbEngine::on_event`]
//! and aggregates per-category win rate and P&L, latency from feed release to
//! order fill, a cumulative P&L curve, and liquidity captured vs. available.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::core::domain::Category;
use crate::core::strategy::{ArbEvent, ArbEventKind};

/// Immutable record of a single executed or failed trade.
#[derive(Debug, Clone)]
pub struct TradeRecord {
    pub category: Category,
    pub token_id: String,
    pub price: Decimal,
    pub size: Decimal,
    pub fill_price: Decimal,
    pub fill_size: Decimal,
    pub estimated_profit: Decimal,
    pub edge: Decimal,
    pub confidence: f64,
    pub success: bool,
    pub feed_released_at: Option<DateTime<Utc>>,
    pub executed_at: DateTime<Utc>,
    pub available_depth_usd: Decimal,
}

/// Aggregated statistics for a single market category.
#[derive(Debug, Clone, Copy, Default)]
pub struct CategoryStats {
    pub total_trades: u64,
    pub wins: u64,
    pub losses: u64,
    pub total_profit: Decimal,
    pub total_volume: Decimal,
}

impl CategoryStats {
    #[must_use]
    pub fn win_rate(&self) -> f64 {
        if self.total_trades == 0 {
            0.0
        } else {
            self.wins as f64 / self.total_trades as f64
        }
    }

    #[must_use]
    pub fn avg_profit(&self) -> Decimal {
        if self.total_trades == 0 {
            Decimal::ZERO
        } else {
            self.total_profit / Decimal::from(self.total_trades)
        }
    }
}

/// A single point on the cumulative P&L curve.
#[derive(Debug, Clone, Copy)]
pub struct PnlPoint {
    pub timestamp: DateTime<Utc>,
    pub cumulative_pnl: Decimal,
    pub trade_index: usize,
}

/// Latency breakdown for a single successfully executed trade.
#[derive(Debug, Clone, Copy)]
pub struct LatencySample {
    pub total_secs: f64,
    pub category: Category,
}

#[derive(Debug, Clone, Copy)]
pub struct LatencyPercentiles {
    pub p50: f64,
    pub p90: f64,
    pub p99: f64,
    pub min: f64,
    pub max: f64,
}

#[derive(Debug, Clone, Copy)]
pub struct LiquidityStats {
    pub total_captured_usd: Decimal,
    pub total_available_usd: Decimal,
    pub capture_ratio: f64,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsSummary {
    pub total_trades: usize,
    pub successful_trades: usize,
    pub failed_trades: usize,
    pub win_rate: f64,
    pub cumulative_pnl: Decimal,
    pub avg_profit_per_trade: Decimal,
    pub signals_generated: u64,
    pub trades_executed: u64,
    pub trades_failed: u64,
    pub trades_skipped: u64,
}

#[derive(Default)]
struct Inner {
    trades: Vec<TradeRecord>,
    category_stats: HashMap<Category, CategoryStats>,
    pnl_curve: Vec<PnlPoint>,
    cumulative_pnl: Decimal,
    latency_samples: Vec<LatencySample>,
    signals_generated: u64,
    trades_executed: u64,
    trades_failed: u64,
    trades_skipped: u64,
}

/// Collects real-time performance metrics from [`ArbEvent`]s.
///
/// ```ignore
/// let collector = Arc::new(MetricsCollector::new(10_000));
/// let c = Arc::clone(&collector);
/// engine.on_event(Arc::new(move |event| {
///     let c = Arc::clone(&c);
///     Box::pin(async move { c.on_arb_event(&event).await })
/// })).await;
/// ```
pub struct MetricsCollector {
    inner: Mutex<Inner>,
    max_latency_samples: usize,
}

impl MetricsCollector {
    #[must_use]
    pub fn new(max_latency_samples: usize) -> Self {
        Self {
            inner: Mutex::new(Inner::default()),
            max_latency_samples,
        }
    }

    pub async fn on_arb_event(&self, event: &ArbEvent) {
        let mut inner = self.inner.lock().await;
        match event.kind {
            ArbEventKind::SignalGenerated => inner.signals_generated += 1,
            ArbEventKind::TradeSkipped => inner.trades_skipped += 1,
            ArbEventKind::TradeExecuted => {
                inner.trades_executed += 1;
                self.record_trade(&mut inner, event, true);
            }
            ArbEventKind::TradeFailed => {
                inner.trades_failed += 1;
                self.record_trade(&mut inner, event, false);
            }
            ArbEventKind::EngineStarted | ArbEventKind::EngineStopped => {}
        }
    }

    fn record_trade(&self, inner: &mut Inner, event: &ArbEvent, success: bool) {
        let Some(action) = &event.action else { return };
        let signal = &event.signal;

        let category = signal.as_ref().map_or(Category::Other, |s| s.match_result().opportunity().category());
        let available_depth = signal.as_ref().map_or(Decimal::ZERO, |s| s.match_result().opportunity().depth_usd());
        let feed_released_at = signal.as_ref().map(|s| s.match_result().event().released_at());

        let (fill_price, fill_size) = event
            .result
            .as_ref()
            .map_or((action.price(), action.size()), |r| (r.fill_price().unwrap_or(action.price()), r.fill_size().unwrap_or(action.size())));

        let executed_at = event.result.as_ref().map_or(Utc::now(), |r| r.executed_at());
        let estimated_pnl = if success { action.estimated_profit_usd() } else { -(action.price() * action.size()) };

        let record = TradeRecord {
            category,
            token_id: action.token_id().to_string(),
            price: action.price(),
            size: action.size(),
            fill_price,
            fill_size,
            estimated_profit: action.estimated_profit_usd(),
            edge: signal.as_ref().map_or(Decimal::ZERO, |s| s.edge()),
            confidence: signal.as_ref().map_or(0.0, |s| s.confidence()),
            success,
            feed_released_at,
            executed_at,
            available_depth_usd: available_depth,
        };
        inner.trades.push(record);

        let stats = inner.category_stats.entry(category).or_default();
        stats.total_trades += 1;
        if success {
            stats.wins += 1;
        } else {
            stats.losses += 1;
        }
        stats.total_profit += estimated_pnl;
        stats.total_volume += fill_price * fill_size;

        inner.cumulative_pnl += estimated_pnl;
        inner.pnl_curve.push(PnlPoint {
            timestamp: executed_at,
            cumulative_pnl: inner.cumulative_pnl,
            trade_index: inner.trades.len(),
        });

        if success {
            if let Some(released_at) = feed_released_at {
                if executed_at > released_at {
                    let total_secs = (executed_at - released_at).num_milliseconds() as f64 / 1000.0;
                    inner.latency_samples.push(LatencySample { total_secs, category });
                    if inner.latency_samples.len() > self.max_latency_samples {
                        let overflow = inner.latency_samples.len() - self.max_latency_samples;
                        inner.latency_samples.drain(0..overflow);
                    }
                }
            }
        }
    }

    pub async fn trades(&self) -> Vec<TradeRecord> {
        self.inner.lock().await.trades.clone()
    }

    pub async fn category_stats(&self) -> HashMap<Category, CategoryStats> {
        self.inner.lock().await.category_stats.clone()
    }

    pub async fn pnl_curve(&self) -> Vec<PnlPoint> {
        self.inner.lock().await.pnl_curve.clone()
    }

    pub async fn latency_percentiles(&self) -> LatencyPercentiles {
        let inner = self.inner.lock().await;
        if inner.latency_samples.is_empty() {
            return LatencyPercentiles { p50: 0.0, p90: 0.0, p99: 0.0, min: 0.0, max: 0.0 };
        }
        let mut values: Vec<f64> = inner.latency_samples.iter().map(|s| s.total_secs).collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        let n = values.len();
        LatencyPercentiles {
            p50: values[(n as f64 * 0.50) as usize],
            p90: values[((n as f64 * 0.90) as usize).min(n - 1)],
            p99: values[((n as f64 * 0.99) as usize).min(n - 1)],
            min: values[0],
            max: values[n - 1],
        }
    }

    pub async fn liquidity_stats(&self) -> LiquidityStats {
        let inner = self.inner.lock().await;
        if inner.trades.is_empty() {
            return LiquidityStats { total_captured_usd: Decimal::ZERO, total_available_usd: Decimal::ZERO, capture_ratio: 0.0 };
        }
        let captured: Decimal = inner.trades.iter().filter(|t| t.success).map(|t| t.fill_price * t.fill_size).sum();
        let available: Decimal = inner.trades.iter().filter(|t| t.success).map(|t| t.available_depth_usd).sum();
        let ratio = if available > Decimal::ZERO {
            (captured / available).to_f64().unwrap_or(0.0)
        } else {
            0.0
        };
        LiquidityStats { total_captured_usd: captured, total_available_usd: available, capture_ratio: ratio }
    }

    pub async fn summary(&self) -> MetricsSummary {
        let inner = self.inner.lock().await;
        let total_trades = inner.trades.len();
        let successful = inner.trades.iter().filter(|t| t.success).count();
        let win_rate = if total_trades == 0 { 0.0 } else { successful as f64 / total_trades as f64 };
        let avg_profit = if total_trades == 0 { Decimal::ZERO } else { inner.cumulative_pnl / Decimal::from(total_trades) };

        MetricsSummary {
            total_trades,
            successful_trades: successful,
            failed_trades: total_trades - successful,
            win_rate,
            cumulative_pnl: inner.cumulative_pnl,
            avg_profit_per_trade: avg_profit,
            signals_generated: inner.signals_generated,
            trades_executed: inner.trades_executed,
            trades_failed: inner.trades_failed,
            trades_skipped: inner.trades_skipped,
        }
    }
}
