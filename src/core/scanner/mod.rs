//! Market scanner: periodic discovery, filtering, scoring, and opportunity
//! lifecycle tracking with attached live-book subscriptions.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use parking_lot::RwLock;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::core::domain::{Category, ConditionId, MarketInfo, MarketOpportunity, OrderBook};
use crate::core::exchange::traits::ExecutionClient;

pub type ScanEventCallback = Arc<dyn Fn(ScanEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

#[derive(Debug, Clone)]
pub enum ScanEvent {
    OpportunityFound(ConditionId),
    OpportunityUpdated(ConditionId),
    OpportunityLost(ConditionId),
    /// A market or orderbook fetch against the venue failed this cycle.
    ConnectivityFailed,
    /// A full scan cycle completed with no fetch failures.
    ConnectivityOk,
}

#[derive(Debug, Clone)]
pub struct ScanFilter {
    pub require_active: bool,
    pub exclude_closed: bool,
    pub categories: Option<Vec<Category>>,
    pub tag_allowlist: Option<Vec<String>>,
    pub tag_blocklist: Option<Vec<String>>,
    pub question_patterns: Vec<String>,
    pub min_hours_to_expiry: Option<f64>,
    pub max_hours_to_expiry: Option<f64>,
}

impl Default for ScanFilter {
    fn default() -> Self {
        Self {
            require_active: true,
            exclude_closed: true,
            categories: None,
            tag_allowlist: None,
            tag_blocklist: None,
            question_patterns: Vec::new(),
            min_hours_to_expiry: None,
            max_hours_to_expiry: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct LiquidityScreen {
    pub min_total_depth_usd: Decimal,
    pub max_spread: Decimal,
    pub min_bid_depth_usd: Decimal,
    pub min_ask_depth_usd: Decimal,
}

#[derive(Debug, Clone)]
pub struct ScannerConfig {
    pub scan_interval: Duration,
    pub max_tracked_markets: usize,
    pub batch_size: usize,
    pub filter: ScanFilter,
    pub liquidity: LiquidityScreen,
}

const TAG_CATEGORY_PAIRS: &[(&str, Category)] = &[
    ("economics", Category::Economic),
    ("economy", Category::Economic),
    ("fed", Category::Economic),
    ("inflation", Category::Economic),
    ("cpi", Category::Economic),
    ("gdp", Category::Economic),
    ("jobs", Category::Economic),
    ("unemployment", Category::Economic),
    ("interest-rates", Category::Economic),
    ("sports", Category::Sports),
    ("nfl", Category::Sports),
    ("nba", Category::Sports),
    ("mlb", Category::Sports),
    ("soccer", Category::Sports),
    ("football", Category::Sports),
    ("baseball", Category::Sports),
    ("basketball", Category::Sports),
    ("hockey", Category::Sports),
    ("mma", Category::Sports),
    ("ufc", Category::Sports),
    ("tennis", Category::Sports),
    ("crypto", Category::Crypto),
    ("bitcoin", Category::Crypto),
    ("ethereum", Category::Crypto),
    ("defi", Category::Crypto),
    ("politics", Category::Politics),
    ("elections", Category::Politics),
    ("congress", Category::Politics),
    ("president", Category::Politics),
    ("senate", Category::Politics),
];

const QUESTION_HINTS: &[(&str, Category)] = &[
    ("cpi", Category::Economic),
    ("inflation", Category::Economic),
    ("fed", Category::Economic),
    ("nfl", Category::Sports),
    ("nba", Category::Sports),
    ("win the game", Category::Sports),
    ("bitcoin", Category::Crypto),
    ("btc", Category::Crypto),
    ("ethereum", Category::Crypto),
    ("election", Category::Politics),
    ("president", Category::Politics),
];

#[must_use]
pub fn classify_market(market: &MarketInfo) -> Category {
    for tag in market.tags() {
        let lowered = tag.to_lowercase();
        if let Some((_, category)) = TAG_CATEGORY_PAIRS.iter().find(|(t, _)| *t == lowered) {
            return *category;
        }
    }
    let question = market.question().to_lowercase();
    for (keyword, category) in QUESTION_HINTS {
        if question.contains(keyword) {
            return *category;
        }
    }
    Category::Other
}

fn passes_filter(market: &MarketInfo, filter: &ScanFilter, now: chrono::DateTime<Utc>) -> bool {
    if filter.require_active && !market.active() {
        return false;
    }
    if filter.exclude_closed && market.closed() {
        return false;
    }
    if let Some(categories) = &filter.categories {
        if !categories.contains(&classify_market(market)) {
            return false;
        }
    }
    let tags_lower: Vec<String> = market.tags().iter().map(|t| t.to_lowercase()).collect();
    if let Some(allow) = &filter.tag_allowlist {
        let allow_lower: Vec<String> = allow.iter().map(|t| t.to_lowercase()).collect();
        if !tags_lower.iter().any(|t| allow_lower.contains(t)) {
            return false;
        }
    }
    if let Some(block) = &filter.tag_blocklist {
        let block_lower: Vec<String> = block.iter().map(|t| t.to_lowercase()).collect();
        if tags_lower.iter().any(|t| block_lower.contains(t)) {
            return false;
        }
    }
    if !filter.question_patterns.is_empty() {
        let question_lower = market.question().to_lowercase();
        let matches = filter
            .question_patterns
            .iter()
            .any(|pattern| question_lower.contains(&pattern.to_lowercase()));
        if !matches {
            return false;
        }
    }
    if let Some(hours) = market.hours_until_expiry(now) {
        if let Some(min) = filter.min_hours_to_expiry {
            if hours < min {
                return false;
            }
        }
        if let Some(max) = filter.max_hours_to_expiry {
            if hours > max {
                return false;
            }
        }
    }
    true
}

fn passes_liquidity(book: &OrderBook, screen: &LiquidityScreen) -> bool {
    if book.depth_usd() < screen.min_total_depth_usd {
        return false;
    }
    if let Some(spread) = book.spread() {
        if spread > screen.max_spread {
            return false;
        }
    }
    if book.bid_depth_usd() < screen.min_bid_depth_usd {
        return false;
    }
    if book.ask_depth_usd() < screen.min_ask_depth_usd {
        return false;
    }
    true
}

fn score_opportunity(book: &OrderBook, market: &MarketInfo, now: chrono::DateTime<Utc>) -> f64 {
    let depth = book.depth_usd().to_f64().unwrap_or_default();
    let depth_score = (depth / 10_000.0).min(1.0);

    let spread_score = book
        .spread()
        .and_then(|s| s.to_f64())
        .map_or(1.0, |s| (1.0 - s * 10.0).max(0.0));

    let recency_score = match market.hours_until_expiry(now) {
        Some(hours) if hours > 0.0 => (1.0 - hours / 168.0).max(0.0),
        Some(_) => 0.0,
        None => 0.5,
    };

    (depth_score + spread_score + recency_score) / 3.0
}

/// Maintains the bounded set of actively-tracked opportunities.
pub struct Scanner<C: ExecutionClient> {
    client: Arc<C>,
    config: ScannerConfig,
    opportunities: Arc<RwLock<HashMap<ConditionId, MarketOpportunity>>>,
    callbacks: Arc<Mutex<Vec<ScanEventCallback>>>,
    running: Arc<AtomicBool>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<C: ExecutionClient + 'static> Scanner<C> {
    #[must_use]
    pub fn new(client: Arc<C>, config: ScannerConfig) -> Self {
        Self {
            client,
            config,
            opportunities: Arc::new(RwLock::new(HashMap::new())),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            running: Arc::new(AtomicBool::new(false)),
            task: Mutex::new(None),
        }
    }

    pub async fn on_event(&self, callback: ScanEventCallback) {
        self.callbacks.lock().await.push(callback);
    }

    #[must_use]
    pub fn opportunities(&self) -> Vec<MarketOpportunity> {
        self.opportunities.read().values().cloned().collect()
    }

    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }
        let running = Arc::clone(&self.running);
        let opportunities = Arc::clone(&self.opportunities);
        let callbacks = Arc::clone(&self.callbacks);
        let client = Arc::clone(&self.client);
        let config = self.config.clone();

        let handle = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                scan_once(&client, &config, &opportunities, &callbacks).await;
                tokio::time::sleep(config.scan_interval).await;
            }
        });
        *self.task.lock().await = Some(handle);
    }

    pub async fn stop(&self) {
        if !self.running.swap(false, Ordering::SeqCst) {
            return;
        }
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }
        let tokens: Vec<_> = self
            .opportunities
            .read()
            .values()
            .map(|o| o.token_id().clone())
            .collect();
        for token in tokens {
            let _ = self.client.unsubscribe_orderbook(&token).await;
        }
    }

    /// Direct, test-friendly entry point (also used by the background loop).
    pub async fn scan_once(&self) {
        scan_once(&self.client, &self.config, &self.opportunities, &self.callbacks).await;
    }
}

async fn scan_once<C: ExecutionClient>(
    client: &Arc<C>,
    config: &ScannerConfig,
    opportunities: &Arc<RwLock<HashMap<ConditionId, MarketOpportunity>>>,
    callbacks: &Arc<Mutex<Vec<ScanEventCallback>>>,
) {
    let now = Utc::now();
    let markets = match client.get_all_markets().await {
        Ok(markets) => markets,
        Err(err) => {
            warn!(error = %err, "scanner: failed to fetch markets, keeping prior snapshot");
            emit_scan_event(callbacks, ScanEvent::ConnectivityFailed).await;
            return;
        }
    };

    let filtered: Vec<MarketInfo> = markets
        .into_iter()
        .filter(|m| passes_filter(m, &config.filter, now))
        .collect();

    let mut new_map: HashMap<ConditionId, MarketOpportunity> = HashMap::new();
    let mut any_failure = false;

    for batch in filtered.chunks(config.batch_size.max(1)) {
        let token_ids: Vec<_> = batch
            .iter()
            .filter_map(|m| m.tokens().first().map(|t| t.token_id().clone()))
            .collect();
        let books = match client.get_orderbooks(&token_ids).await {
            Ok(books) => books,
            Err(err) => {
                warn!(error = %err, "scanner: batch orderbook fetch failed, skipping batch");
                any_failure = true;
                emit_scan_event(callbacks, ScanEvent::ConnectivityFailed).await;
                continue;
            }
        };

        for market in batch {
            let Some(token) = market.tokens().first() else {
                continue;
            };
            let Some(book) = books.get(token.token_id()) else {
                continue;
            };
            if !passes_liquidity(book, &config.liquidity) {
                continue;
            }
            let score = score_opportunity(book, market, now);
            let opp = MarketOpportunity::new(
                market.clone(),
                classify_market(market),
                token.token_id().clone(),
                book.best_bid(),
                book.best_ask(),
                book.spread(),
                book.depth_usd(),
                book.bid_depth_usd(),
                book.ask_depth_usd(),
                score,
                now,
            );
            new_map.insert(market.condition_id().clone(), opp);
        }
    }

    let mut ranked: Vec<_> = new_map.into_iter().collect();
    ranked.sort_by(|a, b| b.1.score().partial_cmp(&a.1.score()).unwrap_or(std::cmp::Ordering::Equal));
    ranked.truncate(config.max_tracked_markets);
    let new_map: HashMap<ConditionId, MarketOpportunity> = ranked.into_iter().collect();

    if !any_failure {
        emit_scan_event(callbacks, ScanEvent::ConnectivityOk).await;
    }

    reconcile(client, opportunities, callbacks, new_map).await;
}

async fn emit_scan_event(callbacks: &Mutex<Vec<ScanEventCallback>>, event: ScanEvent) {
    let callbacks = callbacks.lock().await;
    for callback in callbacks.iter() {
        callback(event.clone()).await;
    }
}

async fn reconcile<C: ExecutionClient>(
    client: &Arc<C>,
    opportunities: &Arc<RwLock<HashMap<ConditionId, MarketOpportunity>>>,
    callbacks: &Arc<Mutex<Vec<ScanEventCallback>>>,
    mut new_map: HashMap<ConditionId, MarketOpportunity>,
) {
    let mut events = Vec::new();
    let mut lost_tokens = Vec::new();
    let mut found_tokens = Vec::new();

    {
        let mut current = opportunities.write();

        for condition_id in current.keys().cloned().collect::<Vec<_>>() {
            if !new_map.contains_key(&condition_id) {
                if let Some(old) = current.remove(&condition_id) {
                    lost_tokens.push(old.token_id().clone());
                    events.push(ScanEvent::OpportunityLost(condition_id));
                }
            }
        }

        for (condition_id, opp) in new_map.iter_mut() {
            match current.get(condition_id) {
                Some(old) => {
                    opp.preserve_first_seen(old.first_seen());
                    events.push(ScanEvent::OpportunityUpdated(condition_id.clone()));
                }
                None => {
                    found_tokens.push(opp.token_id().clone());
                    events.push(ScanEvent::OpportunityFound(condition_id.clone()));
                }
            }
        }

        std::mem::swap(&mut *current, &mut new_map);
    }

    for token in lost_tokens {
        let _ = client.unsubscribe_orderbook(&token).await;
    }
    for token in found_tokens {
        let _ = client.subscribe_orderbook(&token).await;
    }

    let callbacks = callbacks.lock().await;
    for event in events {
        for callback in callbacks.iter() {
            callback(event.clone()).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{ConditionId as Cid, OutcomeToken, TokenId};

    fn sample_market(tags: Vec<&str>, question: &str) -> MarketInfo {
        MarketInfo::new(
            Cid::new("c1"),
            question,
            vec![OutcomeToken::new(TokenId::new("t1"), "Yes")],
            true,
            false,
            false,
            true,
            None,
            tags.into_iter().map(String::from).collect(),
            0,
        )
    }

    #[test]
    fn classify_by_tag_takes_precedence() {
        let market = sample_market(vec!["nba"], "irrelevant question");
        assert_eq!(classify_market(&market), Category::Sports);
    }

    #[test]
    fn classify_falls_back_to_question_keywords() {
        let market = sample_market(vec![], "Will the Fed cut rates?");
        assert_eq!(classify_market(&market), Category::Economic);
    }

    #[test]
    fn classify_defaults_to_other() {
        let market = sample_market(vec![], "Will it rain tomorrow?");
        assert_eq!(classify_market(&market), Category::Other);
    }

    #[test]
    fn filter_excludes_inactive_by_default() {
        let mut market = sample_market(vec![], "q");
        market = MarketInfo::new(
            market.condition_id().clone(),
            market.question(),
            market.tokens().to_vec(),
            false,
            false,
            false,
            true,
            None,
            vec![],
            0,
        );
        assert!(!passes_filter(&market, &ScanFilter::default(), Utc::now()));
    }
}
