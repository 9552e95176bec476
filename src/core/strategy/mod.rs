//! The arbitrage pipeline: matches feed events against tracked
//! opportunities, evaluates signals, sizes trades, and executes them.
//! [`prioritizer`] is a standalone ranking/cooldown component used by
//! backtest replay rather than the live [`engine::ArbEngine`], which
//! processes every match it receives.

pub mod config;
pub mod engine;
pub mod matcher;
pub mod prioritizer;
pub mod signal;
pub mod sizer;

pub use config::{PrioritizerConfig, SizingLimits, StrategyConfig};
pub use engine::{ArbEngine, ArbEvent, ArbEventCallback, ArbEventKind, EngineStats};
pub use matcher::MarketMatcher;
pub use prioritizer::{compute_priority_score, OpportunityPrioritizer};
pub use signal::SignalGenerator;
pub use sizer::PositionSizer;
