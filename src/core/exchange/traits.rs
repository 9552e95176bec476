//! The venue-facing contract consumed by the scanner and the arbitrage
//! engine. Concrete adapters: the live Polymarket client
//! ([`super::polymarket::PolymarketClient`]), the paper-trading wrapper
//! ([`super::paper::PaperTradingClient`]), and the simulated backend used by
//! both paper trading and backtests ([`super::sim_client::SimulatedClient`]).

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::core::domain::{MarketInfo, OrderBook, OrderType, Side, TokenId};
use crate::error::ClobClientError;

pub type BookCallback = Arc<dyn Fn(OrderBook) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Debug, Clone)]
pub struct OrderRequest {
    pub token_id: TokenId,
    pub side: Side,
    pub price: Decimal,
    pub size: Decimal,
    pub order_type: OrderType,
}

#[derive(Debug, Clone)]
pub struct MarketOrderRequest {
    pub token_id: TokenId,
    pub side: Side,
    pub worst_price: Decimal,
    pub size: Decimal,
}

#[derive(Debug, Clone)]
pub struct VenueOrderResponse {
    pub success: bool,
    pub order_id: Option<String>,
    pub fill_price: Option<Decimal>,
    pub fill_size: Option<Decimal>,
    pub error: Option<String>,
}

/// The full set of operations the engine and scanner need from an execution
/// venue. `async_trait` because several adapters (paper, simulated) need
/// `&self` methods that still need to be object-safe for dynamic dispatch in
/// tests and CLI wiring.
#[async_trait]
pub trait ExecutionClient: Send + Sync {
    async fn connect(&self) -> Result<(), ClobClientError>;
    async fn close(&self) -> Result<(), ClobClientError>;

    async fn get_all_markets(&self) -> Result<Vec<MarketInfo>, ClobClientError>;
    async fn get_market(&self, condition_id: &str) -> Result<MarketInfo, ClobClientError>;
    async fn get_orderbook(&self, token_id: &TokenId) -> Result<OrderBook, ClobClientError>;
    async fn get_orderbooks(
        &self,
        token_ids: &[TokenId],
    ) -> Result<HashMap<TokenId, OrderBook>, ClobClientError>;
    async fn get_midpoint(&self, token_id: &TokenId) -> Result<Decimal, ClobClientError>;
    async fn get_spread(&self, token_id: &TokenId) -> Result<Decimal, ClobClientError>;

    async fn subscribe_orderbook(&self, token_id: &TokenId) -> Result<(), ClobClientError>;
    async fn unsubscribe_orderbook(&self, token_id: &TokenId) -> Result<(), ClobClientError>;

    async fn place_order(&self, request: OrderRequest) -> Result<VenueOrderResponse, ClobClientError>;
    async fn place_market_order(
        &self,
        request: MarketOrderRequest,
    ) -> Result<VenueOrderResponse, ClobClientError>;
    async fn cancel_order(&self, order_id: &str) -> Result<(), ClobClientError>;
    async fn cancel_orders(&self, order_ids: &[String]) -> Result<(), ClobClientError>;
    async fn cancel_all(&self) -> Result<(), ClobClientError>;
}
