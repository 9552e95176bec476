//! Live Polymarket adapter, gated behind the `polymarket` feature since it
//! pulls in the SDK and alloy signing stack.

mod client;
mod dto;

pub use client::{PolymarketBookFrameParser, PolymarketClient, PolymarketClientConfig};
