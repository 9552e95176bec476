//! Core domain and subsystems: pure data types, the feed/scanner ingestion
//! pipeline, the arbitrage strategy pipeline, the execution-venue client
//! contract, and the risk subsystem that gates every trade.

pub mod alerts;
pub mod domain;
pub mod exchange;
pub mod feed;
pub mod metrics;
pub mod risk;
pub mod scanner;
pub mod strategy;
pub mod util;
