//! Paper trading: reads flow through to a real venue client, writes are
//! simulated. Keeps the simulator's book cache warm from every real read so
//! fills stay close to what would have happened live. Also runs a background
//! refresh loop over whatever tokens have been read at least once, so the
//! simulator's book cache doesn't go stale between trades.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashSet;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::core::domain::{MarketInfo, OrderBook, TokenId};
use crate::core::exchange::sim_client::{FillRecord, SimulatedClient};
use crate::core::exchange::traits::{ExecutionClient, MarketOrderRequest, OrderRequest, VenueOrderResponse};
use crate::error::ClobClientError;

pub struct PaperTradingClient<R: ExecutionClient + 'static> {
    real: Arc<R>,
    sim: SimulatedClient,
    tracked_tokens: Arc<DashSet<TokenId>>,
    refresh_secs: u64,
    refresh_task: Mutex<Option<JoinHandle<()>>>,
}

impl<R: ExecutionClient + 'static> PaperTradingClient<R> {
    #[must_use]
    pub fn new(real: Arc<R>, slippage_bps: u32) -> Self {
        Self::with_config(real, slippage_bps, 1.0, 5)
    }

    #[must_use]
    pub fn with_config(
        real: Arc<R>,
        slippage_bps: u32,
        fill_probability: f64,
        orderbook_refresh_secs: u64,
    ) -> Self {
        Self {
            real,
            sim: SimulatedClient::with_fill_probability(slippage_bps, fill_probability),
            tracked_tokens: Arc::new(DashSet::new()),
            refresh_secs: orderbook_refresh_secs,
            refresh_task: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn fills(&self) -> Vec<FillRecord> {
        self.sim.fills()
    }

    /// Starts the background loop that periodically refetches tracked tokens'
    /// orderbooks from the real client and feeds them into the simulator.
    /// Replaces any previously running loop.
    pub async fn start_orderbook_refresh(self: &Arc<Self>) {
        let mut guard = self.refresh_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }

        let this = Arc::clone(self);
        let interval_secs = self.refresh_secs;
        *guard = Some(tokio::spawn(async move {
            this.refresh_loop(interval_secs).await;
        }));
        info!(tracked_tokens = self.tracked_tokens.len(), interval_secs, "orderbook_refresh_started");
    }

    pub async fn stop_orderbook_refresh(&self) {
        let mut guard = self.refresh_task.lock().await;
        if let Some(handle) = guard.take() {
            handle.abort();
        }
    }

    async fn refresh_loop(&self, interval_secs: u64) {
        let mut ticker = tokio::time::interval(std::time::Duration::from_secs(interval_secs));
        loop {
            ticker.tick().await;
            if self.tracked_tokens.is_empty() {
                continue;
            }
            let token_list: Vec<TokenId> = self.tracked_tokens.iter().map(|t| t.clone()).collect();
            match self.real.get_orderbooks(&token_list).await {
                Ok(books) => {
                    let count = books.len();
                    for (token_id, book) in books {
                        self.sim.set_orderbook(token_id, book);
                    }
                    debug!(count, "orderbooks_refreshed");
                }
                Err(err) => {
                    debug!(error = %err, "orderbook_refresh_failed");
                }
            }
        }
    }
}

#[async_trait]
impl<R: ExecutionClient + 'static> ExecutionClient for PaperTradingClient<R> {
    async fn connect(&self) -> Result<(), ClobClientError> {
        self.real.connect().await
    }

    async fn close(&self) -> Result<(), ClobClientError> {
        self.stop_orderbook_refresh().await;
        self.real.close().await
    }

    async fn get_all_markets(&self) -> Result<Vec<MarketInfo>, ClobClientError> {
        self.real.get_all_markets().await
    }

    async fn get_market(&self, condition_id: &str) -> Result<MarketInfo, ClobClientError> {
        self.real.get_market(condition_id).await
    }

    async fn get_orderbook(&self, token_id: &TokenId) -> Result<OrderBook, ClobClientError> {
        let book = self.real.get_orderbook(token_id).await?;
        self.sim.set_orderbook(token_id.clone(), book.clone());
        self.tracked_tokens.insert(token_id.clone());
        Ok(book)
    }

    async fn get_orderbooks(
        &self,
        token_ids: &[TokenId],
    ) -> Result<HashMap<TokenId, OrderBook>, ClobClientError> {
        let books = self.real.get_orderbooks(token_ids).await?;
        for (token_id, book) in &books {
            self.sim.set_orderbook(token_id.clone(), book.clone());
            self.tracked_tokens.insert(token_id.clone());
        }
        Ok(books)
    }

    async fn get_midpoint(&self, token_id: &TokenId) -> Result<Decimal, ClobClientError> {
        self.real.get_midpoint(token_id).await
    }

    async fn get_spread(&self, token_id: &TokenId) -> Result<Decimal, ClobClientError> {
        self.real.get_spread(token_id).await
    }

    async fn subscribe_orderbook(&self, token_id: &TokenId) -> Result<(), ClobClientError> {
        self.real.subscribe_orderbook(token_id).await
    }

    async fn unsubscribe_orderbook(&self, token_id: &TokenId) -> Result<(), ClobClientError> {
        self.real.unsubscribe_orderbook(token_id).await
    }

    async fn place_order(&self, request: OrderRequest) -> Result<VenueOrderResponse, ClobClientError> {
        self.sim.place_order(request).await
    }

    async fn place_market_order(
        &self,
        request: MarketOrderRequest,
    ) -> Result<VenueOrderResponse, ClobClientError> {
        self.sim.place_market_order(request).await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ClobClientError> {
        self.sim.cancel_order(order_id).await
    }

    async fn cancel_orders(&self, order_ids: &[String]) -> Result<(), ClobClientError> {
        self.sim.cancel_orders(order_ids).await
    }

    async fn cancel_all(&self) -> Result<(), ClobClientError> {
        self.sim.cancel_all().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{PriceLevel, Side};
    use rust_decimal_macros::dec;

    struct FakeReal;

    #[async_trait]
    impl ExecutionClient for FakeReal {
        async fn connect(&self) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn close(&self) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn get_all_markets(&self) -> Result<Vec<MarketInfo>, ClobClientError> {
            Ok(Vec::new())
        }
        async fn get_market(&self, _condition_id: &str) -> Result<MarketInfo, ClobClientError> {
            Err(ClobClientError::Connection("not implemented".into()))
        }
        async fn get_orderbook(&self, token_id: &TokenId) -> Result<OrderBook, ClobClientError> {
            Ok(OrderBook::new(
                token_id.clone(),
                vec![PriceLevel::new(dec!(0.48), dec!(1000))],
                vec![PriceLevel::new(dec!(0.52), dec!(1000))],
                chrono::Utc::now(),
            ))
        }
        async fn get_orderbooks(&self, token_ids: &[TokenId]) -> Result<HashMap<TokenId, OrderBook>, ClobClientError> {
            let mut out = HashMap::new();
            for token_id in token_ids {
                out.insert(token_id.clone(), self.get_orderbook(token_id).await?);
            }
            Ok(out)
        }
        async fn get_midpoint(&self, _token_id: &TokenId) -> Result<Decimal, ClobClientError> {
            Ok(dec!(0.5))
        }
        async fn get_spread(&self, _token_id: &TokenId) -> Result<Decimal, ClobClientError> {
            Ok(dec!(0.04))
        }
        async fn subscribe_orderbook(&self, _token_id: &TokenId) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn unsubscribe_orderbook(&self, _token_id: &TokenId) -> Result<(), ClobClientError> {
            Ok(())
        }
        async fn place_order(&self, _request: OrderRequest) -> Result<VenueOrderResponse, ClobClientError> {
            panic!("writes must go through the simulator, not the real client")
        }
        async fn place_market_order(&self, _request: MarketOrderRequest) -> Result<VenueOrderResponse, ClobClientError> {
            panic!("writes must go through the simulator, not the real client")
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

    #[tokio::test]
    async fn get_orderbook_warms_simulator_cache_and_write_fills_from_it() {
        let client = PaperTradingClient::new(Arc::new(FakeReal), 0);
        let token = TokenId::new("t1");
        client.get_orderbook(&token).await.unwrap();

        let response = client
            .place_order(OrderRequest {
                token_id: token,
                side: Side::Buy,
                price: dec!(0.52),
                size: dec!(500),
                order_type: crate::core::domain::OrderType::Fok,
            })
            .await
            .unwrap();
        assert!(response.success);
    }

    #[tokio::test]
    async fn get_orderbook_adds_token_to_tracked_set() {
        let client = PaperTradingClient::new(Arc::new(FakeReal), 0);
        let token = TokenId::new("t1");
        assert!(!client.tracked_tokens.contains(&token));
        client.get_orderbook(&token).await.unwrap();
        assert!(client.tracked_tokens.contains(&token));
    }

    #[tokio::test]
    async fn start_and_stop_orderbook_refresh_round_trip() {
        let client = Arc::new(PaperTradingClient::with_config(Arc::new(FakeReal), 0, 1.0, 1));
        let token = TokenId::new("t1");
        client.get_orderbook(&token).await.unwrap();

        client.start_orderbook_refresh().await;
        assert!(client.refresh_task.lock().await.is_some());
        client.stop_orderbook_refresh().await;
        assert!(client.refresh_task.lock().await.is_none());
    }
}
