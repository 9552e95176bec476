//! Per-token signing-parameter cache. A global lock guards the map of
//! per-token locks; the per-token lock serializes concurrent misses for the
//! same token so only one fetch happens per cold token.

use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use tokio::sync::Mutex as AsyncMutex;

use crate::core::domain::{MarketParams, TokenId};
use crate::error::ClobClientError;

const DEFAULT_TTL_SECS: i64 = 300;

/// Fetches the three signing parameters for a token. Implemented by the
/// venue client; kept separate from [`crate::core::exchange::traits::ExecutionClient`]
/// so the cache can be unit-tested against a fake.
#[async_trait::async_trait]
pub trait ParamsSource: Send + Sync {
    async fn fetch_params(&self, token_id: &TokenId) -> Result<MarketParams, ClobClientError>;
}

pub struct MarketParamsCache {
    entries: DashMap<TokenId, MarketParams>,
    locks: Arc<DashMap<TokenId, Arc<AsyncMutex<()>>>>,
    ttl_secs: i64,
}

impl MarketParamsCache {
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
            locks: Arc::new(DashMap::new()),
            ttl_secs: DEFAULT_TTL_SECS,
        }
    }

    #[must_use]
    pub const fn with_ttl(ttl_secs: i64) -> Self {
        Self {
            entries: DashMap::new(),
            locks: Arc::new(DashMap::new()),
            ttl_secs,
        }
    }

    fn token_lock(&self, token_id: &TokenId) -> Arc<AsyncMutex<()>> {
        Arc::clone(
            self.locks
                .entry(token_id.clone())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .value(),
        )
    }

    pub async fn get<S: ParamsSource>(
        &self,
        token_id: &TokenId,
        source: &S,
        force_refresh: bool,
    ) -> Result<MarketParams, ClobClientError> {
        if !force_refresh {
            if let Some(entry) = self.entries.get(token_id) {
                if !entry.is_stale(Utc::now(), self.ttl_secs) {
                    return Ok(*entry);
                }
            }
        }

        let lock = self.token_lock(token_id);
        let _guard = lock.lock().await;

        if !force_refresh {
            if let Some(entry) = self.entries.get(token_id) {
                if !entry.is_stale(Utc::now(), self.ttl_secs) {
                    return Ok(*entry);
                }
            }
        }

        let params = source.fetch_params(token_id).await?;
        self.entries.insert(token_id.clone(), params);
        Ok(params)
    }

    pub async fn warm<S: ParamsSource>(&self, token_ids: &[TokenId], source: &S) {
        for token_id in token_ids {
            let _ = self.get(token_id, source, false).await;
        }
    }

    pub fn invalidate(&self, token_id: &TokenId) {
        self.entries.remove(token_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[must_use]
    pub fn contains(&self, token_id: &TokenId) -> bool {
        self.entries.contains_key(token_id)
    }
}

impl Default for MarketParamsCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl ParamsSource for CountingSource {
        async fn fetch_params(&self, _token_id: &TokenId) -> Result<MarketParams, ClobClientError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(MarketParams::new(dec!(0.01), false, 200, Utc::now()))
        }
    }

    #[tokio::test]
    async fn repeated_get_hits_cache_once_warm() {
        let cache = MarketParamsCache::new();
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let token = TokenId::new("t1");
        cache.get(&token, &source, false).await.unwrap();
        cache.get(&token, &source, false).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn force_refresh_bypasses_cache() {
        let cache = MarketParamsCache::new();
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let token = TokenId::new("t1");
        cache.get(&token, &source, false).await.unwrap();
        cache.get(&token, &source, true).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = MarketParamsCache::new();
        let source = CountingSource {
            calls: AtomicUsize::new(0),
        };
        let token = TokenId::new("t1");
        cache.get(&token, &source, false).await.unwrap();
        cache.invalidate(&token);
        cache.get(&token, &source, false).await.unwrap();
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }
}
