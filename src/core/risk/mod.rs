//! Pre-trade risk gates, the kill switch, position/P&L bookkeeping, and
//! oracle-dispute monitoring. [`gates`] and [`market_quality`] are pure
//! check functions; [`monitor::RiskMonitor`] is the stateful orchestrator a
//! live engine calls before and after every trade.

pub mod config;
pub mod gates;
pub mod kill_switch;
pub mod market_quality;
pub mod monitor;
pub mod oracle_monitor;
pub mod positions;

pub use config::{KillSwitchConfig, OracleConfig, RiskConfig};
pub use gates::{RiskRejectionReason, RiskVerdict};
pub use kill_switch::KillSwitchManager;
pub use market_quality::MarketQualityFilter;
pub use monitor::{RiskEvent, RiskEventCallback, RiskEventType, RiskMonitor, RiskSnapshot};
pub use oracle_monitor::{OracleAlert, OracleAlertCallback, OracleEventType, OracleMonitor, WhaleActivity};
pub use positions::PositionBook;
