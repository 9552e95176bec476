//! Keyed pool of pre-signed orders, refreshed in the background so the
//! arbitrage engine never waits on signing latency at match time.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use crate::core::domain::{MarketParams, OrderType, PreSignedOrder, Side, TokenId};
use crate::error::ClobClientError;

use super::market_params_cache::{MarketParamsCache, ParamsSource};
use super::presigner::{OrderSigner, Presigner};

#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct PoolKey {
    pub token_id: TokenId,
    pub side: Side,
    pub size_ticks: i64,
}

impl PoolKey {
    #[must_use]
    pub fn new(token_id: TokenId, side: Side, size: Decimal) -> Self {
        Self {
            token_id,
            side,
            size_ticks: (size * Decimal::from(100)).round().to_string().parse().unwrap_or(0),
        }
    }
}

/// Orders are pre-signed at a fixed set of representative sizes; the engine
/// looks up the nearest key rather than signing on the hot path.
pub struct OrderPool<S: OrderSigner + 'static, P: ParamsSource + 'static> {
    presigner: Arc<Presigner<S>>,
    params_cache: Arc<MarketParamsCache>,
    params_source: Arc<P>,
    pool: RwLock<HashMap<PoolKey, PreSignedOrder>>,
    staleness_threshold_secs: i64,
}

impl<S: OrderSigner + 'static, P: ParamsSource + 'static> OrderPool<S, P> {
    #[must_use]
    pub fn new(
        presigner: Arc<Presigner<S>>,
        params_cache: Arc<MarketParamsCache>,
        params_source: Arc<P>,
        staleness_threshold_secs: i64,
    ) -> Self {
        Self {
            presigner,
            params_cache,
            params_source,
            pool: RwLock::new(HashMap::new()),
            staleness_threshold_secs,
        }
    }

    pub async fn get_or_sign(
        &self,
        token_id: &TokenId,
        side: Side,
        price: Decimal,
        size: Decimal,
    ) -> Result<PreSignedOrder, ClobClientError> {
        let key = PoolKey::new(token_id.clone(), side, size);

        if let Some(order) = self.pool.read().await.get(&key) {
            if !order.is_stale(Utc::now(), self.staleness_threshold_secs) {
                return Ok(order.clone());
            }
        }

        self.sign_and_insert(key, token_id.clone(), side, price, size).await
    }

    async fn sign_and_insert(
        &self,
        key: PoolKey,
        token_id: TokenId,
        side: Side,
        price: Decimal,
        size: Decimal,
    ) -> Result<PreSignedOrder, ClobClientError> {
        let params = self
            .params_cache
            .get(&token_id, self.params_source.as_ref(), false)
            .await?;

        let order = self
            .presigner
            .presign(token_id, side, OrderType::Fok, price, size, params)
            .await?;

        self.pool.write().await.insert(key, order.clone());
        Ok(order)
    }

    /// Re-signs every pooled entry that is stale or about to go stale. Meant
    /// to run on a background interval alongside the scanner/engine loops.
    pub async fn refresh_stale(&self) {
        let stale_keys: Vec<PoolKey> = {
            let pool = self.pool.read().await;
            pool.iter()
                .filter(|(_, order)| order.is_stale(Utc::now(), self.staleness_threshold_secs))
                .map(|(key, _)| key.clone())
                .collect()
        };

        for key in stale_keys {
            let Some(existing) = self.pool.read().await.get(&key).cloned() else {
                continue;
            };
            match self
                .sign_and_insert(
                    key.clone(),
                    existing.token_id().clone(),
                    existing.side(),
                    existing.price(),
                    existing.size(),
                )
                .await
            {
                Ok(_) => debug!(token = %key.token_id, "order pool entry refreshed"),
                Err(err) => warn!(token = %key.token_id, error = %err, "order pool refresh failed"),
            }
        }
    }

    pub async fn run_refresh_loop(self: Arc<Self>, interval: Duration) {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            self.refresh_stale().await;
        }
    }

    pub async fn invalidate(&self, key: &PoolKey) {
        self.pool.write().await.remove(key);
    }

    pub async fn len(&self) -> usize {
        self.pool.read().await.len()
    }
}
