//! Execution-venue adapters: the [`traits::ExecutionClient`] contract every
//! strategy/risk component programs against, plus the concrete
//! implementations (live Polymarket, paper trading, simulated backtest) and
//! the supporting machinery (rate limiting, market-params cache, presigning,
//! order pooling, order-book streaming).

pub mod market_params_cache;
pub mod order_pool;
#[cfg(feature = "polymarket")]
pub mod polymarket;
pub mod paper;
pub mod presigner;
pub mod rate_limiter;
pub mod sim_client;
pub mod traits;
pub mod websocket;

pub use paper::PaperTradingClient;
#[cfg(feature = "polymarket")]
pub use polymarket::{PolymarketBookFrameParser, PolymarketClient, PolymarketClientConfig};
pub use sim_client::SimulatedClient;
pub use traits::{BookCallback, ExecutionClient, MarketOrderRequest, OrderRequest, VenueOrderResponse};
