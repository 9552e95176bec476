//! Error taxonomy.
//!
//! Each subsystem gets its own `thiserror` enum with the subtypes named in the
//! design; the crate-level [`Error`] aggregates them (plus ambient transport
//! errors) so anything crossing a subsystem boundary can use `?`.

use thiserror::Error;

/// Feed polling/streaming failures.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("feed {feed} connection failed: {source}")]
    Connection {
        feed: &'static str,
        #[source]
        source: reqwest::Error,
    },
    #[error("feed {feed} failed to parse response: {detail}")]
    Parse { feed: &'static str, detail: String },
    #[error("feed {feed} rate limited")]
    RateLimit { feed: &'static str },
}

/// Execution-venue client failures.
#[derive(Debug, Error)]
pub enum ClobClientError {
    #[error("clob connection error: {0}")]
    Connection(String),
    #[error("clob rate limited")]
    RateLimit,
    #[error("clob order error: {0}")]
    Order(String),
    #[error("clob websocket error: {0}")]
    WebSocket(String),
}

/// Risk-subsystem failures (as distinct from a gate *rejection*, which is a
/// normal [`crate::core::risk::gates::RiskVerdict`], not an error).
#[derive(Debug, Error)]
pub enum RiskError {
    #[error("risk limit breached: {0}")]
    LimitBreached(String),
    #[error("kill switch active: {0}")]
    KillSwitchActive(String),
    #[error("oracle risk: {0}")]
    Oracle(String),
}

/// Arbitrage-pipeline stage failures.
#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("match error: {0}")]
    Match(String),
    #[error("signal error: {0}")]
    Signal(String),
    #[error("sizing error: {0}")]
    Sizing(String),
    #[error("prioritization error: {0}")]
    Prioritization(String),
    #[error("execution error: {0}")]
    Execution(String),
}

/// Crate-level error, used wherever a failure can originate from more than one
/// subsystem (orchestrator wiring, CLI handlers).
#[derive(Debug, Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),
    #[error(transparent)]
    Feed(#[from] FeedError),
    #[error(transparent)]
    Clob(#[from] ClobClientError),
    #[error(transparent)]
    Risk(#[from] RiskError),
    #[error(transparent)]
    Strategy(#[from] StrategyError),
    #[error(transparent)]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Toml(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
