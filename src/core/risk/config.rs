//! Tunables for the risk gates, kill switch, and market quality filter.

use rust_decimal::Decimal;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct RiskConfig {
    #[serde(default = "default_max_daily_loss_usd")]
    pub max_daily_loss_usd: Decimal,
    #[serde(default = "default_bankroll_usd")]
    pub bankroll_usd: Decimal,
    #[serde(default = "default_max_bankroll_pct_per_event")]
    pub max_bankroll_pct_per_event: Decimal,
    #[serde(default = "default_max_concurrent_positions")]
    pub max_concurrent_positions: usize,
    #[serde(default = "default_min_orderbook_depth_usd")]
    pub min_orderbook_depth_usd: Decimal,
    #[serde(default = "default_max_spread")]
    pub max_spread: Decimal,
    #[serde(default)]
    pub max_fee_rate_bps: u32,
}

fn default_max_daily_loss_usd() -> Decimal {
    Decimal::new(500_00, 2)
}

fn default_bankroll_usd() -> Decimal {
    Decimal::new(10_000_00, 2)
}

fn default_max_bankroll_pct_per_event() -> Decimal {
    Decimal::new(10, 2)
}

fn default_max_concurrent_positions() -> usize {
    10
}

fn default_min_orderbook_depth_usd() -> Decimal {
    Decimal::new(500_00, 2)
}

fn default_max_spread() -> Decimal {
    Decimal::new(10, 2)
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            max_daily_loss_usd: default_max_daily_loss_usd(),
            bankroll_usd: default_bankroll_usd(),
            max_bankroll_pct_per_event: default_max_bankroll_pct_per_event(),
            max_concurrent_positions: default_max_concurrent_positions(),
            min_orderbook_depth_usd: default_min_orderbook_depth_usd(),
            max_spread: default_max_spread(),
            max_fee_rate_bps: 0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct KillSwitchConfig {
    #[serde(default = "default_max_consecutive_losses")]
    pub max_consecutive_losses: u32,
    #[serde(default = "default_max_error_rate_pct")]
    pub max_error_rate_pct: f64,
    #[serde(default = "default_error_window_trades")]
    pub error_window_trades: usize,
    #[serde(default = "default_connectivity_max_errors")]
    pub connectivity_max_errors: u32,
}

fn default_max_consecutive_losses() -> u32 {
    5
}

fn default_max_error_rate_pct() -> f64 {
    50.0
}

fn default_error_window_trades() -> usize {
    20
}

fn default_connectivity_max_errors() -> u32 {
    10
}

impl Default for KillSwitchConfig {
    fn default() -> Self {
        Self {
            max_consecutive_losses: default_max_consecutive_losses(),
            max_error_rate_pct: default_max_error_rate_pct(),
            error_window_trades: default_error_window_trades(),
            connectivity_max_errors: default_connectivity_max_errors(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct OracleConfig {
    #[serde(default)]
    pub whale_addresses: Vec<String>,
}
