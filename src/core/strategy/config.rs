//! Tunables for the match -> signal -> size -> prioritize pipeline.

use std::collections::HashMap;

use rust_decimal::Decimal;
use serde::Deserialize;

use crate::core::domain::OrderType;

#[derive(Debug, Clone, Deserialize)]
pub struct StrategyConfig {
    #[serde(default = "default_match_confidence_threshold")]
    pub match_confidence_threshold: f64,
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f64,
    #[serde(default = "default_max_staleness_secs")]
    pub max_staleness_secs: i64,
    #[serde(default = "default_min_edge")]
    pub min_edge: Decimal,
    #[serde(default)]
    pub economic_min_edge: Option<Decimal>,
    #[serde(default)]
    pub sports_min_edge: Option<Decimal>,
    #[serde(default)]
    pub crypto_min_edge: Option<Decimal>,
    #[serde(default = "default_base_size_usd")]
    pub base_size_usd: Decimal,
    #[serde(default = "default_max_size_usd")]
    pub max_size_usd: Decimal,
    #[serde(default)]
    pub use_kelly_sizing: bool,
    #[serde(default = "default_kelly_fraction")]
    pub kelly_fraction: Decimal,
    #[serde(default = "default_order_type")]
    pub default_order_type: OrderType,
    #[serde(default = "default_max_slippage")]
    pub max_slippage: Decimal,
    #[serde(default = "default_max_depth_fraction")]
    pub max_depth_fraction: Decimal,
}

fn default_match_confidence_threshold() -> f64 {
    0.8
}

fn default_min_confidence() -> f64 {
    0.7
}

fn default_max_staleness_secs() -> i64 {
    30
}

fn default_min_edge() -> Decimal {
    Decimal::new(3, 2)
}

fn default_base_size_usd() -> Decimal {
    Decimal::new(10_000, 2)
}

fn default_max_size_usd() -> Decimal {
    Decimal::new(100_000, 2)
}

fn default_kelly_fraction() -> Decimal {
    Decimal::new(25, 2)
}

fn default_order_type() -> OrderType {
    OrderType::Fok
}

fn default_max_slippage() -> Decimal {
    Decimal::new(1, 2)
}

fn default_max_depth_fraction() -> Decimal {
    Decimal::new(20, 2)
}

impl Default for StrategyConfig {
    fn default() -> Self {
        Self {
            match_confidence_threshold: default_match_confidence_threshold(),
            min_confidence: default_min_confidence(),
            max_staleness_secs: default_max_staleness_secs(),
            min_edge: default_min_edge(),
            economic_min_edge: None,
            sports_min_edge: None,
            crypto_min_edge: None,
            base_size_usd: default_base_size_usd(),
            max_size_usd: default_max_size_usd(),
            use_kelly_sizing: false,
            kelly_fraction: default_kelly_fraction(),
            default_order_type: default_order_type(),
            max_slippage: default_max_slippage(),
            max_depth_fraction: default_max_depth_fraction(),
        }
    }
}

impl StrategyConfig {
    #[must_use]
    pub fn min_edge_for(&self, kind: crate::core::domain::FeedKind) -> Decimal {
        use crate::core::domain::FeedKind;
        match kind {
            FeedKind::Economic => self.economic_min_edge.unwrap_or(self.min_edge),
            FeedKind::Sports => self.sports_min_edge.unwrap_or(self.min_edge),
            FeedKind::Crypto => self.crypto_min_edge.unwrap_or(self.min_edge),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PrioritizerConfig {
    #[serde(default = "default_category_weights")]
    pub category_weights: HashMap<String, f64>,
    #[serde(default = "default_score_weight_opportunity")]
    pub score_weight_opportunity: f64,
    #[serde(default = "default_score_weight_confidence")]
    pub score_weight_confidence: f64,
    #[serde(default = "default_score_weight_edge")]
    pub score_weight_edge: f64,
    #[serde(default = "default_score_weight_category")]
    pub score_weight_category: f64,
    #[serde(default = "default_max_trades_per_event")]
    pub max_trades_per_event: usize,
    #[serde(default = "default_cooldown_secs")]
    pub cooldown_secs: i64,
}

fn default_category_weights() -> HashMap<String, f64> {
    HashMap::from([
        ("economic".to_string(), 0.9),
        ("sports".to_string(), 0.7),
        ("crypto".to_string(), 0.6),
        ("politics".to_string(), 0.5),
        ("other".to_string(), 0.3),
    ])
}

fn default_score_weight_opportunity() -> f64 {
    0.3
}

fn default_score_weight_confidence() -> f64 {
    0.3
}

fn default_score_weight_edge() -> f64 {
    0.3
}

fn default_score_weight_category() -> f64 {
    0.1
}

fn default_max_trades_per_event() -> usize {
    3
}

fn default_cooldown_secs() -> i64 {
    60
}

impl Default for PrioritizerConfig {
    fn default() -> Self {
        Self {
            category_weights: default_category_weights(),
            score_weight_opportunity: default_score_weight_opportunity(),
            score_weight_confidence: default_score_weight_confidence(),
            score_weight_edge: default_score_weight_edge(),
            score_weight_category: default_score_weight_category(),
            max_trades_per_event: default_max_trades_per_event(),
            cooldown_secs: default_cooldown_secs(),
        }
    }
}

/// Risk limits the sizer enforces independent of the broader risk subsystem.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct SizingLimits {
    #[serde(default = "default_min_profit_usd")]
    pub min_profit_usd: Decimal,
}

fn default_min_profit_usd() -> Decimal {
    Decimal::new(100, 2)
}

impl Default for SizingLimits {
    fn default() -> Self {
        Self {
            min_profit_usd: default_min_profit_usd(),
        }
    }
}
