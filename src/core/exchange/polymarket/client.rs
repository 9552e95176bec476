//! Concrete Polymarket adapter: Gamma for market discovery, CLOB REST for
//! order books and order state, `polymarket-client-sdk` for authenticated
//! order signing/submission, and a dedicated WS session for book streaming.

use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use dashmap::DashMap;
use polymarket_client_sdk::auth::state::Authenticated;
use polymarket_client_sdk::auth::Normal;
use polymarket_client_sdk::clob::types::Side as SdkSide;
use polymarket_client_sdk::clob::{Client as ClobSdkClient, Config as ClobSdkConfig};
use polymarket_client_sdk::types::U256;
use reqwest::Client as HttpClient;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::dto::{BookMessage, ClobMarketsResponse, GammaMarket, UnsubscribeMessage, WsMessage};
use crate::core::domain::{ConditionId, MarketInfo, MarketParams, OrderBook, Side, TokenId};
use crate::core::exchange::market_params_cache::{MarketParamsCache, ParamsSource};
use crate::core::exchange::order_pool::OrderPool;
use crate::core::exchange::presigner::{OrderSigner, Presigner};
use crate::core::exchange::rate_limiter::RateLimiter;
use crate::core::exchange::traits::{ExecutionClient, MarketOrderRequest, OrderRequest, VenueOrderResponse};
use crate::core::exchange::websocket::{BookFrameParser, OrderBookSession};
use crate::error::ClobClientError;

type AuthenticatedClobClient = ClobSdkClient<Authenticated<Normal>>;
type ClobOrderPool = OrderPool<SdkOrderSigner, ClobParamsSource>;

#[derive(Debug, Clone)]
pub struct PolymarketClientConfig {
    pub clob_api_url: String,
    pub gamma_api_url: String,
    pub ws_url: String,
    pub chain_id: u64,
    pub private_key: String,
    pub request_timeout: Duration,
    pub burst_per_sec: f64,
    pub sustained_per_sec: f64,
    pub order_ttl_secs: i64,
    pub pool_staleness_secs: i64,
    pub params_cache_ttl_secs: i64,
    pub pool_refresh_secs: u64,
}

pub struct PolymarketClient {
    http: HttpClient,
    config: PolymarketClientConfig,
    clob: RwLock<Option<Arc<AuthenticatedClobClient>>>,
    signer: RwLock<Option<Arc<PrivateKeySigner>>>,
    rate_limiter: RateLimiter,
    order_pool: RwLock<Option<Arc<ClobOrderPool>>>,
    pool_refresh_task: tokio::sync::Mutex<Option<tokio::task::JoinHandle<()>>>,
    book_session: RwLock<Option<Arc<OrderBookSession<PolymarketBookFrameParser>>>>,
    book_cache: Arc<DashMap<TokenId, OrderBook>>,
}

impl PolymarketClient {
    #[must_use]
    pub fn new(config: PolymarketClientConfig) -> Self {
        let http = HttpClient::builder()
            .timeout(config.request_timeout)
            .build()
            .unwrap_or_else(|err| {
                warn!(error = %err, "failed to build http client with timeout, using default");
                HttpClient::new()
            });
        let rate_limiter = RateLimiter::new(config.burst_per_sec, config.sustained_per_sec);

        Self {
            http,
            config,
            clob: RwLock::new(None),
            signer: RwLock::new(None),
            rate_limiter,
            order_pool: RwLock::new(None),
            pool_refresh_task: tokio::sync::Mutex::new(None),
            book_session: RwLock::new(None),
            book_cache: Arc::new(DashMap::new()),
        }
    }

    async fn clob_client(&self) -> Result<Arc<AuthenticatedClobClient>, ClobClientError> {
        self.clob
            .read()
            .await
            .clone()
            .ok_or_else(|| ClobClientError::Connection("client not connected".to_string()))
    }

    async fn signer(&self) -> Result<Arc<PrivateKeySigner>, ClobClientError> {
        self.signer
            .read()
            .await
            .clone()
            .ok_or_else(|| ClobClientError::Connection("client not connected".to_string()))
    }

    async fn order_pool(&self) -> Result<Arc<ClobOrderPool>, ClobClientError> {
        self.order_pool
            .read()
            .await
            .clone()
            .ok_or_else(|| ClobClientError::Connection("client not connected".to_string()))
    }
}

#[async_trait]
impl ExecutionClient for PolymarketClient {
    async fn connect(&self) -> Result<(), ClobClientError> {
        let signer = PrivateKeySigner::from_str(&self.config.private_key)
            .map_err(|err| ClobClientError::Connection(format!("invalid private key: {err}")))?
            .with_chain_id(Some(self.config.chain_id));

        info!(chain_id = self.config.chain_id, address = %signer.address(), "connecting to polymarket clob");

        let client = ClobSdkClient::new(&self.config.clob_api_url, ClobSdkConfig::default())
            .map_err(|err| ClobClientError::Connection(format!("clob client init failed: {err}")))?
            .authentication_builder(&signer)
            .authenticate()
            .await
            .map_err(|err| ClobClientError::Connection(format!("clob authentication failed: {err}")))?;

        let clob = Arc::new(client);
        let signer = Arc::new(signer);

        let order_signer = Arc::new(SdkOrderSigner {
            clob: Arc::clone(&clob),
            signer: Arc::clone(&signer),
        });
        let params_source = Arc::new(ClobParamsSource { clob: Arc::clone(&clob) });
        let presigner = Arc::new(Presigner::new(order_signer, chrono::Duration::seconds(self.config.order_ttl_secs)));
        let params_cache = Arc::new(MarketParamsCache::with_ttl(self.config.params_cache_ttl_secs));
        let pool = Arc::new(OrderPool::new(presigner, params_cache, params_source, self.config.pool_staleness_secs));

        let book_cache = Arc::clone(&self.book_cache);
        let session = Arc::new(OrderBookSession::new(
            self.config.ws_url.clone(),
            Arc::new(PolymarketBookFrameParser),
            Arc::new(move |book: OrderBook| {
                book_cache.insert(book.token_id().clone(), book);
            }),
        ));
        session.start().await?;

        let refresh_handle = {
            let pool = Arc::clone(&pool);
            let interval = Duration::from_secs(self.config.pool_refresh_secs);
            tokio::spawn(async move { pool.run_refresh_loop(interval).await })
        };

        *self.clob.write().await = Some(clob);
        *self.signer.write().await = Some(signer);
        *self.order_pool.write().await = Some(pool);
        *self.pool_refresh_task.lock().await = Some(refresh_handle);
        *self.book_session.write().await = Some(session);
        Ok(())
    }

    async fn close(&self) -> Result<(), ClobClientError> {
        if let Some(handle) = self.pool_refresh_task.lock().await.take() {
            handle.abort();
        }
        if let Some(session) = self.book_session.write().await.take() {
            session.stop().await;
        }
        *self.order_pool.write().await = None;
        self.book_cache.clear();
        *self.clob.write().await = None;
        *self.signer.write().await = None;
        Ok(())
    }

    async fn get_all_markets(&self) -> Result<Vec<MarketInfo>, ClobClientError> {
        let url = format!("{}/markets?active=true&closed=false&limit=500", self.config.gamma_api_url);
        let markets: Vec<GammaMarket> = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ClobClientError::Connection(err.to_string()))?
            .json()
            .await
            .map_err(|err| ClobClientError::Connection(err.to_string()))?;
        debug!(count = markets.len(), "fetched markets from gamma");
        Ok(markets.into_iter().map(MarketInfo::from).collect())
    }

    async fn get_market(&self, condition_id: &str) -> Result<MarketInfo, ClobClientError> {
        let url = format!("{}/markets?condition_ids={}", self.config.clob_api_url, condition_id);
        let response: ClobMarketsResponse = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ClobClientError::Connection(err.to_string()))?
            .json()
            .await
            .map_err(|err| ClobClientError::Connection(err.to_string()))?;

        let market = response
            .data
            .unwrap_or_default()
            .into_iter()
            .next()
            .ok_or_else(|| ClobClientError::Connection(format!("market {condition_id} not found")))?;

        let tokens = market
            .tokens
            .into_iter()
            .map(|t| crate::core::domain::OutcomeToken::new(TokenId::new(t.token_id), t.outcome))
            .collect();

        Ok(MarketInfo::new(
            ConditionId::new(market.condition_id),
            market.question.unwrap_or_default(),
            tokens,
            market.active,
            market.closed,
            false,
            market.active && !market.closed,
            None,
            Vec::new(),
            0,
        ))
    }

    async fn get_orderbook(&self, token_id: &TokenId) -> Result<OrderBook, ClobClientError> {
        if let Some(book) = self.book_cache.get(token_id) {
            return Ok(book.clone());
        }
        let url = format!("{}/book?token_id={}", self.config.clob_api_url, token_id.as_str());
        let text = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|err| ClobClientError::Connection(err.to_string()))?
            .text()
            .await
            .map_err(|err| ClobClientError::Connection(err.to_string()))?;
        let message: BookMessage = serde_json::from_str(&text)
            .map_err(|err| ClobClientError::Connection(format!("malformed orderbook response: {err}")))?;
        Ok(message.to_orderbook())
    }

    async fn get_orderbooks(
        &self,
        token_ids: &[TokenId],
    ) -> Result<HashMap<TokenId, OrderBook>, ClobClientError> {
        let mut books = HashMap::with_capacity(token_ids.len());
        for token_id in token_ids {
            books.insert(token_id.clone(), self.get_orderbook(token_id).await?);
        }
        Ok(books)
    }

    async fn get_midpoint(&self, token_id: &TokenId) -> Result<Decimal, ClobClientError> {
        let book = self.get_orderbook(token_id).await?;
        match (book.best_bid(), book.best_ask()) {
            (Some(bid), Some(ask)) => Ok((bid + ask) / Decimal::from(2)),
            _ => Err(ClobClientError::Connection("no two-sided book for midpoint".to_string())),
        }
    }

    async fn get_spread(&self, token_id: &TokenId) -> Result<Decimal, ClobClientError> {
        let book = self.get_orderbook(token_id).await?;
        book.spread()
            .ok_or_else(|| ClobClientError::Connection("no two-sided book for spread".to_string()))
    }

    async fn subscribe_orderbook(&self, token_id: &TokenId) -> Result<(), ClobClientError> {
        let session = self
            .book_session
            .read()
            .await
            .clone()
            .ok_or_else(|| ClobClientError::Connection("client not connected".to_string()))?;
        session.subscribe(token_id.clone()).await
    }

    async fn unsubscribe_orderbook(&self, token_id: &TokenId) -> Result<(), ClobClientError> {
        let session = self
            .book_session
            .read()
            .await
            .clone()
            .ok_or_else(|| ClobClientError::Connection("client not connected".to_string()))?;
        self.book_cache.remove(token_id);
        session.unsubscribe(token_id.clone()).await
    }

    async fn place_order(&self, request: OrderRequest) -> Result<VenueOrderResponse, ClobClientError> {
        self.rate_limiter.acquire().await;
        let pool = self.order_pool().await?;

        let presigned = pool
            .get_or_sign(&request.token_id, request.side, request.price, request.size)
            .await?;

        let clob = self.clob_client().await?;
        let signed_order: polymarket_client_sdk::clob::types::SignedOrder =
            serde_json::from_slice(presigned.signed_payload())
                .map_err(|err| ClobClientError::Order(format!("malformed pre-signed payload: {err}")))?;

        let response = clob
            .post_order(signed_order)
            .await
            .map_err(|err| ClobClientError::Order(format!("submission failed: {err}")))?;

        info!(order_id = %response.order_id, token_id = %request.token_id, "order submitted");

        Ok(VenueOrderResponse {
            success: true,
            order_id: Some(response.order_id),
            fill_price: None,
            fill_size: None,
            error: None,
        })
    }

    async fn place_market_order(
        &self,
        request: MarketOrderRequest,
    ) -> Result<VenueOrderResponse, ClobClientError> {
        self.place_order(OrderRequest {
            token_id: request.token_id,
            side: request.side,
            price: request.worst_price,
            size: request.size,
            order_type: crate::core::domain::OrderType::Fok,
        })
        .await
    }

    async fn cancel_order(&self, order_id: &str) -> Result<(), ClobClientError> {
        self.rate_limiter.acquire().await;
        let clob = self.clob_client().await?;
        let response = clob
            .cancel_order(order_id)
            .await
            .map_err(|err| ClobClientError::Order(format!("cancel failed: {err}")))?;

        if let Some(reason) = response.not_canceled.get(order_id) {
            return Err(ClobClientError::Order(format!("order {order_id} not cancelled: {reason}")));
        }
        Ok(())
    }

    async fn cancel_orders(&self, order_ids: &[String]) -> Result<(), ClobClientError> {
        for order_id in order_ids {
            self.cancel_order(order_id).await?;
        }
        Ok(())
    }

    async fn cancel_all(&self) -> Result<(), ClobClientError> {
        self.rate_limiter.acquire().await;
        let clob = self.clob_client().await?;
        clob.cancel_all()
            .await
            .map_err(|err| ClobClientError::Order(format!("cancel-all failed: {err}")))?;
        Ok(())
    }
}

/// Bridges the pre-sign pool's synchronous [`OrderSigner`] contract to the
/// SDK's async signing flow. `sign` is only ever called from inside
/// `Presigner::presign`'s `spawn_blocking`, so the nested `block_on` here
/// does not starve the runtime.
pub struct SdkOrderSigner {
    clob: Arc<AuthenticatedClobClient>,
    signer: Arc<PrivateKeySigner>,
}

impl OrderSigner for SdkOrderSigner {
    fn sign(
        &self,
        token_id: &TokenId,
        side: Side,
        price: Decimal,
        size: Decimal,
        params: &MarketParams,
        expiration_ts: i64,
    ) -> Result<Vec<u8>, ClobClientError> {
        let clob = Arc::clone(&self.clob);
        let signer = Arc::clone(&self.signer);
        let token_id = token_id.clone();
        let neg_risk = params.neg_risk();

        tokio::runtime::Handle::current().block_on(async move {
            let token_id_u256 = U256::from_str(token_id.as_str())
                .map_err(|err| ClobClientError::Order(format!("invalid token id: {err}")))?;
            let sdk_side = match side {
                Side::Buy => SdkSide::Buy,
                Side::Sell => SdkSide::Sell,
            };

            let order = clob
                .limit_order()
                .token_id(token_id_u256)
                .side(sdk_side)
                .price(price)
                .size(size)
                .expiration(expiration_ts)
                .neg_risk(neg_risk)
                .build()
                .await
                .map_err(|err| ClobClientError::Order(format!("order build failed: {err}")))?;

            let signed_order = clob
                .sign(signer.as_ref(), order)
                .await
                .map_err(|err| ClobClientError::Order(format!("signing failed: {err}")))?;

            serde_json::to_vec(&signed_order)
                .map_err(|err| ClobClientError::Order(format!("serializing signed order failed: {err}")))
        })
    }
}

/// Fetches per-token signing parameters straight from the CLOB SDK, the way
/// the pool's background refresh needs them.
pub struct ClobParamsSource {
    clob: Arc<AuthenticatedClobClient>,
}

#[async_trait]
impl ParamsSource for ClobParamsSource {
    async fn fetch_params(&self, token_id: &TokenId) -> Result<MarketParams, ClobClientError> {
        let token_id_u256 = U256::from_str(token_id.as_str())
            .map_err(|err| ClobClientError::Order(format!("invalid token id: {err}")))?;

        let tick_size = self
            .clob
            .get_tick_size(token_id_u256)
            .await
            .map_err(|err| ClobClientError::Connection(format!("tick size lookup failed: {err}")))?;
        let neg_risk = self
            .clob
            .get_neg_risk(token_id_u256)
            .await
            .map_err(|err| ClobClientError::Connection(format!("neg risk lookup failed: {err}")))?;
        let fee_rate_bps = self
            .clob
            .get_fee_rate_bps(token_id_u256)
            .await
            .map_err(|err| ClobClientError::Connection(format!("fee rate lookup failed: {err}")))?;

        Ok(MarketParams::new(tick_size, neg_risk, fee_rate_bps, chrono::Utc::now()))
    }
}

/// Parses/builds Polymarket's market-channel WS frames for
/// [`crate::core::exchange::websocket::OrderBookSession`].
pub struct PolymarketBookFrameParser;

impl BookFrameParser for PolymarketBookFrameParser {
    fn parse(&self, text: &str) -> Option<(TokenId, OrderBook)> {
        match serde_json::from_str::<WsMessage>(text).ok()? {
            WsMessage::Books(mut books) => {
                let book = books.pop()?;
                let token_id = TokenId::new(book.asset_id.clone());
                Some((token_id, book.to_orderbook()))
            }
            WsMessage::Unknown(_) => None,
        }
    }

    fn subscribe_payload(&self, token_ids: &[TokenId]) -> String {
        let ids = token_ids.iter().map(|t| t.as_str().to_string()).collect();
        serde_json::to_string(&super::dto::SubscribeMessage::new(ids)).unwrap_or_default()
    }

    fn unsubscribe_payload(&self, token_ids: &[TokenId]) -> String {
        let ids = token_ids.iter().map(|t| t.as_str().to_string()).collect();
        serde_json::to_string(&UnsubscribeMessage::new(ids)).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parser_parses_book_snapshot_array() {
        let parser = PolymarketBookFrameParser;
        let text = r#"[{"asset_id":"t1","bids":[{"price":"0.4","size":"10"}],"asks":[{"price":"0.6","size":"20"}]}]"#;
        let (token_id, book) = parser.parse(text).unwrap();
        assert_eq!(token_id.as_str(), "t1");
        assert!(book.best_bid().is_some());
    }

    #[test]
    fn parser_subscribe_payload_contains_token_ids() {
        let parser = PolymarketBookFrameParser;
        let payload = parser.subscribe_payload(&[TokenId::new("abc")]);
        assert!(payload.contains("abc"));
        assert!(payload.contains("market"));
    }
}
