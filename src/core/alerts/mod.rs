//! Converts domain events into normalised alerts and routes them to
//! notification channels with throttling, plus a scheduled daily P&L
//! summary. [`dispatcher::AlertDispatcher`] is the entry point a deployment
//! wires `ArbEngine`/`RiskMonitor`/`FeedRunner`/`OracleMonitor` callbacks into.

pub mod channels;
pub mod daily_summary;
pub mod dispatcher;
pub mod formatters;
pub mod types;

pub use channels::{DiscordChannel, NotificationChannel};
pub use daily_summary::{DailySummaryScheduler, SnapshotFn};
pub use dispatcher::AlertDispatcher;
pub use types::{AlertMessage, Severity};

#[cfg(feature = "telegram")]
pub use channels::TelegramChannel;
