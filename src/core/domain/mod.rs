//! Pure domain types shared across the engine: identifiers, market/book
//! snapshots, the event→match→signal→action→result pipeline chain, and the
//! risk-side bookkeeping records (positions, P&L, kill switch, oracle state).
//!
//! No domain type here owns I/O or async behavior — everything in this
//! module is plain data plus the invariant-preserving methods on it.

mod feed_event;
mod id;
mod kill_switch;
mod market;
mod market_params;
mod opportunity;
mod pipeline;
mod pnl;
mod position;
mod presigned_order;
mod oracle;
mod order_book;

pub use feed_event::{FeedEvent, FeedEventKind, FeedKind, OutcomeType};
pub use id::{ConditionId, MarketId, TokenId};
pub use kill_switch::{KillSwitchState, KillSwitchTrigger};
pub use market::{MarketInfo, OutcomeToken};
pub use market_params::MarketParams;
pub use opportunity::{Category, MarketOpportunity};
pub use oracle::{OracleProposal, ProposalState};
pub use order_book::{OrderBook, PriceLevel};
pub use pipeline::{ExecutionResult, MatchResult, OrderType, PrioritizedMatch, Side, Signal, TradeAction};
pub use pnl::PnlTracker;
pub use position::Position;
pub use presigned_order::PreSignedOrder;
