//! Deterministic-by-default simulated fills, for backtests and the
//! paper-trading write path. Walks a supplied order book instead of hitting
//! a real venue; the clock is injectable (`set_time`) so backtests can replay
//! against historical timestamps instead of wall-clock time.

use std::collections::HashMap;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::domain::{MarketInfo, OrderBook, OrderType, Side, TokenId};
use crate::core::exchange::traits::{ExecutionClient, MarketOrderRequest, OrderRequest, VenueOrderResponse};
use crate::error::ClobClientError;

#[derive(Debug, Clone)]
pub struct FillRecord {
    pub token_id: TokenId,
    pub side: Side,
    pub requested_price: Decimal,
    pub requested_size: Decimal,
    pub fill_price: Decimal,
    pub fill_size: Decimal,
    pub success: bool,
    pub slippage: Decimal,
    pub timestamp: DateTime<Utc>,
}

/// Drop-in [`ExecutionClient`] for backtests and paper trading: fills orders
/// by walking caller-supplied order books rather than a real venue.
pub struct SimulatedClient {
    books: RwLock<HashMap<TokenId, OrderBook>>,
    markets: RwLock<HashMap<String, MarketInfo>>,
    fills: RwLock<Vec<FillRecord>>,
    slippage_bps: u32,
    fill_probability: f64,
    order_counter: AtomicU64,
    clock: RwLock<Option<DateTime<Utc>>>,
}

impl SimulatedClient {
    #[must_use]
    pub fn new(slippage_bps: u32) -> Self {
        Self::with_fill_probability(slippage_bps, 1.0)
    }

    #[must_use]
    pub fn with_fill_probability(slippage_bps: u32, fill_probability: f64) -> Self {
        Self {
            books: RwLock::new(HashMap::new()),
            markets: RwLock::new(HashMap::new()),
            fills: RwLock::new(Vec::new()),
            slippage_bps,
            fill_probability,
            order_counter: AtomicU64::new(0),
            clock: RwLock::new(None),
        }
    }

    pub fn set_orderbook(&self, token_id: TokenId, book: OrderBook) {
        self.books.write().insert(token_id, book);
    }

    pub fn set_market(&self, condition_id: impl Into<String>, market: MarketInfo) {
        self.markets.write().insert(condition_id.into(), market);
    }

    /// Pins the simulated clock used for fill timestamps, for replaying
    /// against historical data instead of wall-clock time.
    pub fn set_time(&self, ts: DateTime<Utc>) {
        *self.clock.write() = Some(ts);
    }

    fn now(&self) -> DateTime<Utc> {
        self.clock.read().unwrap_or_else(Utc::now)
    }

    #[must_use]
    pub fn fills(&self) -> Vec<FillRecord> {
        self.fills.read().clone()
    }

    /// Deterministic pseudo-randomness derived from the order's identity, so
    /// replaying the same sequence of orders reproduces the same fill/no-fill
    /// outcomes even though a real venue would be genuinely random.
    fn passes_fill_probability(&self, token_id: &TokenId, side: Side, price: Decimal, size: Decimal, seq: u64) -> bool {
        if self.fill_probability >= 1.0 {
            return true;
        }
        let mut hasher = DefaultHasher::new();
        token_id.hash(&mut hasher);
        format!("{side:?}{price}{size}{seq}").hash(&mut hasher);
        let mut rng = StdRng::seed_from_u64(hasher.finish());
        rng.gen::<f64>() <= self.fill_probability
    }

    /// Walks the book: BUY consumes asks ascending, SELL consumes bids
    /// descending. FOK requires the full requested size to fill or the whole
    /// order fails; GTC accepts a partial fill.
    fn simulate_fill(
        &self,
        token_id: &TokenId,
        side: Side,
        price: Decimal,
        size: Decimal,
        order_type: OrderType,
    ) -> VenueOrderResponse {
        let seq = self.order_counter.fetch_add(1, Ordering::SeqCst);
        let order_id = format!("sim_{seq}");

        if !self.passes_fill_probability(token_id, side, price, size, seq) {
            self.record_failure(token_id, side, price, size);
            return VenueOrderResponse {
                success: false,
                order_id: Some(order_id),
                fill_price: None,
                fill_size: None,
                error: Some("simulated fill probability miss".to_string()),
            };
        }

        let Some(book) = self.books.read().get(token_id).cloned() else {
            self.record_failure(token_id, side, price, size);
            return VenueOrderResponse {
                success: false,
                order_id: Some(order_id),
                fill_price: None,
                fill_size: None,
                error: Some("no orderbook for token".to_string()),
            };
        };

        let levels: Vec<_> = match side {
            Side::Buy => book.asks().to_vec(),
            Side::Sell => book.bids().to_vec(),
        };

        let mut filled_size = Decimal::ZERO;
        let mut total_cost = Decimal::ZERO;

        for level in &levels {
            let crosses = match side {
                Side::Buy => level.price() <= price,
                Side::Sell => level.price() >= price,
            };
            if !crosses {
                break;
            }
            let take = level.size().min(size - filled_size);
            filled_size += take;
            total_cost += take * level.price();
            if filled_size >= size {
                break;
            }
        }

        if (order_type == OrderType::Fok && filled_size < size) || filled_size <= Decimal::ZERO {
            self.record_failure(token_id, side, price, size);
            return VenueOrderResponse {
                success: false,
                order_id: Some(order_id),
                fill_price: None,
                fill_size: None,
                error: Some("insufficient liquidity for order".to_string()),
            };
        }

        let mut avg_fill_price = total_cost / filled_size;
        let slippage = avg_fill_price * Decimal::from(self.slippage_bps) / dec!(10000);
        avg_fill_price += match side {
            Side::Buy => slippage,
            Side::Sell => -slippage,
        };

        self.fills.write().push(FillRecord {
            token_id: token_id.clone(),
            side,
            requested_price: price,
            requested_size: size,
            fill_price: avg_fill_price,
            fill_size: filled_size,
            success: true,
            slippage,
            timestamp: self.now(),
        });

        VenueOrderResponse {
            success: true,
            order_id: Some(order_id),
            fill_price: Some(avg_fill_price),
            fill_size: Some(filled_size),
            error: None,
        }
    }

    fn record_failure(&self, token_id: &TokenId, side: Side, price: Decimal, size: Decimal) {
        self.fills.write().push(FillRecord {
            token_id: token_id.clone(),
            side,
            requested_price: price,
            requested_size: size,
            fill_price: Decimal::ZERO,
            fill_size: Decimal::ZERO,
            success: false,
            slippage: Decimal::ZERO,
            timestamp: self.now(),
        });
    }
}

impl Default for SimulatedClient {
    fn default() -> Self {
        Self::new(0)
    }
}

#[async_trait]
impl ExecutionClient for SimulatedClient {
    async fn connect(&self) -> Result<(), ClobClientError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), ClobClientError> {
        Ok(())
    }

    async fn get_all_markets(&self) -> Result<Vec<MarketInfo>, ClobClientError> {
        Ok(self.markets.read().values().cloned().collect())
    }

    async fn get_market(&self, condition_id: &str) -> Result<MarketInfo, ClobClientError> {
        self.markets
            .read()
            .get(condition_id)
            .cloned()
            .ok_or_else(|| ClobClientError::Connection(format!("unknown simulated market {condition_id}")))
    }

    async fn get_orderbook(&self, token_id: &TokenId) -> Result<OrderBook, ClobClientError> {
        self.books
            .read()
            .get(token_id)
            .cloned()
            .ok_or_else(|| ClobClientError::Connection(format!("no simulated book for {token_id}")))
    }

    async fn get_orderbooks(
        &self,
        token_ids: &[TokenId],
    ) -> Result<HashMap<TokenId, OrderBook>, ClobClientError> {
        let mut out = HashMap::with_capacity(token_ids.len());
        for token_id in token_ids {
            if let Some(book) = self.books.read().get(token_id).cloned() {
                out.insert(token_id.clone(), book);
            }
        }
        Ok(out)
    }

    async fn get_midpoint(&self, token_id: &TokenId) -> Result<Decimal, ClobClientError> {
        let book = self.get_orderbook(token_id).await?;
        match (book.best_bid(), book.best_ask()) {
            (Some(bid), Some(ask)) => Ok((bid + ask) / Decimal::from(2)),
            _ => Err(ClobClientError::Connection("no two-sided book".to_string())),
        }
    }

    async fn get_spread(&self, token_id: &TokenId) -> Result<Decimal, ClobClientError> {
        let book = self.get_orderbook(token_id).await?;
        book.spread().ok_or_else(|| ClobClientError::Connection("no two-sided book".to_string()))
    }

    async fn subscribe_orderbook(&self, _token_id: &TokenId) -> Result<(), ClobClientError> {
        Ok(())
    }

    async fn unsubscribe_orderbook(&self, _token_id: &TokenId) -> Result<(), ClobClientError> {
        Ok(())
    }

    async fn place_order(&self, request: OrderRequest) -> Result<VenueOrderResponse, ClobClientError> {
        Ok(self.simulate_fill(&request.token_id, request.side, request.price, request.size, request.order_type))
    }

    async fn place_market_order(
        &self,
        request: MarketOrderRequest,
    ) -> Result<VenueOrderResponse, ClobClientError> {
        Ok(self.simulate_fill(
            &request.token_id,
            request.side,
            request.worst_price,
            request.size,
            OrderType::Fok,
        ))
    }

    async fn cancel_order(&self, _order_id: &str) -> Result<(), ClobClientError> {
        Ok(())
    }

    async fn cancel_orders(&self, _order_ids: &[String]) -> Result<(), ClobClientError> {
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), ClobClientError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::PriceLevel;

    fn book() -> OrderBook {
        OrderBook::new(
            TokenId::new("t1"),
            vec![PriceLevel::new(dec!(0.48), dec!(1000))],
            vec![PriceLevel::new(dec!(0.52), dec!(500)), PriceLevel::new(dec!(0.53), dec!(500))],
            chrono::Utc::now(),
        )
    }

    #[tokio::test]
    async fn buy_order_fills_from_asks_ascending() {
        let client = SimulatedClient::new(0);
        client.set_orderbook(TokenId::new("t1"), book());
        let response = client
            .place_order(OrderRequest {
                token_id: TokenId::new("t1"),
                side: Side::Buy,
                price: dec!(0.53),
                size: dec!(700),
                order_type: OrderType::Fok,
            })
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.fill_size, Some(dec!(700)));
    }

    #[tokio::test]
    async fn fok_order_fails_when_book_cannot_fill_full_size() {
        let client = SimulatedClient::new(0);
        client.set_orderbook(TokenId::new("t1"), book());
        let response = client
            .place_order(OrderRequest {
                token_id: TokenId::new("t1"),
                side: Side::Buy,
                price: dec!(0.52),
                size: dec!(10_000),
                order_type: OrderType::Fok,
            })
            .await
            .unwrap();
        assert!(!response.success);
    }

    #[tokio::test]
    async fn gtc_order_accepts_partial_fill() {
        let client = SimulatedClient::new(0);
        client.set_orderbook(TokenId::new("t1"), book());
        let response = client
            .place_order(OrderRequest {
                token_id: TokenId::new("t1"),
                side: Side::Buy,
                price: dec!(0.52),
                size: dec!(10_000),
                order_type: OrderType::Gtc,
            })
            .await
            .unwrap();
        assert!(response.success);
        assert_eq!(response.fill_size, Some(dec!(500)));
    }

    #[tokio::test]
    async fn slippage_worsens_buy_fill_price() {
        let client = SimulatedClient::new(100);
        client.set_orderbook(TokenId::new("t1"), book());
        let response = client
            .place_order(OrderRequest {
                token_id: TokenId::new("t1"),
                side: Side::Buy,
                price: dec!(0.52),
                size: dec!(500),
                order_type: OrderType::Fok,
            })
            .await
            .unwrap();
        assert!(response.fill_price.unwrap() > dec!(0.52));
    }

    #[tokio::test]
    async fn missing_book_fails_order() {
        let client = SimulatedClient::new(0);
        let response = client
            .place_order(OrderRequest {
                token_id: TokenId::new("unknown"),
                side: Side::Buy,
                price: dec!(0.5),
                size: dec!(10),
                order_type: OrderType::Fok,
            })
            .await
            .unwrap();
        assert!(!response.success);
    }

    #[tokio::test]
    async fn zero_fill_probability_always_fails() {
        let client = SimulatedClient::with_fill_probability(0, 0.0);
        client.set_orderbook(TokenId::new("t1"), book());
        let response = client
            .place_order(OrderRequest {
                token_id: TokenId::new("t1"),
                side: Side::Buy,
                price: dec!(0.53),
                size: dec!(700),
                order_type: OrderType::Fok,
            })
            .await
            .unwrap();
        assert!(!response.success);
    }

    #[tokio::test]
    async fn set_time_pins_fill_timestamp() {
        let client = SimulatedClient::new(0);
        client.set_orderbook(TokenId::new("t1"), book());
        let pinned = chrono::DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap().with_timezone(&Utc);
        client.set_time(pinned);
        client
            .place_order(OrderRequest {
                token_id: TokenId::new("t1"),
                side: Side::Buy,
                price: dec!(0.53),
                size: dec!(700),
                order_type: OrderType::Fok,
            })
            .await
            .unwrap();
        assert_eq!(client.fills()[0].timestamp, pinned);
    }
}
