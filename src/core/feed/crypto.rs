//! Crypto feed: one WebSocket session per configured exchange, feeding an
//! in-memory ticker map; cross-validation and move detection happen on the
//! inherited poll cadence rather than per-tick.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tokio::sync::Mutex as AsyncMutex;
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;

use super::PollableFeed;
use crate::core::domain::{FeedEvent, FeedEventKind, FeedKind, OutcomeType};
use crate::core::util::Backoff;
use crate::error::FeedError;

#[derive(Debug, Clone)]
pub struct CryptoFeedConfig {
    pub primary_exchange: String,
    pub primary_ws_url: String,
    pub validator_ws_urls: HashMap<String, String>,
    pub pairs: Vec<String>,
    pub cross_validation_threshold_pct: Decimal,
    pub price_move_threshold_pct: Decimal,
    pub ping_interval: Duration,
    pub poll_interval: Duration,
}

struct Ticker {
    price: Decimal,
    #[allow(dead_code)]
    observed_at: chrono::DateTime<Utc>,
}

/// Splits a config pair like "BTC-USD" or "BTC_USDT" into `(base, quote)`,
/// both upper-cased.
fn split_pair(pair: &str) -> (String, String) {
    let upper = pair.to_uppercase();
    let mut parts = upper.split(['-', '_', '/']);
    let base = parts.next().unwrap_or(&upper).to_string();
    let quote = parts.next().unwrap_or_default().to_string();
    (base, quote)
}

/// Coinbase and Kraken quote against USD rather than USDT; Binance quotes
/// against whatever the pair names.
fn quote_for_exchange(exchange: &str, quote: &str) -> String {
    if quote == "USDT" && matches!(exchange, "coinbase" | "kraken") {
        "USD".to_string()
    } else {
        quote.to_string()
    }
}

/// Maps a canonical config pair to the native symbol/product-id an exchange
/// expects in its subscribe frame, e.g. "BTC-USD" -> "btcusdt" (binance),
/// "BTC-USD" (coinbase), "BTC/USD" (kraken).
fn pair_to_exchange_symbol(exchange: &str, pair: &str) -> String {
    let (base, quote) = split_pair(pair);
    let quote = quote_for_exchange(exchange, &quote);
    match exchange {
        "binance" => format!("{base}{quote}").to_lowercase(),
        "coinbase" => format!("{base}-{quote}"),
        "kraken" => format!("{base}/{quote}"),
        _ => pair.to_string(),
    }
}

/// Builds the reverse mapping from `(exchange, native symbol)` back to the
/// canonical config pair, so a WS frame reporting "BTCUSDT" on Binance and
/// "BTC-USD" on Coinbase both resolve to the same internal ticker key.
fn build_symbol_map(exchanges: &[&str], pairs: &[String]) -> HashMap<(String, String), String> {
    let mut map = HashMap::new();
    for pair in pairs {
        for exchange in exchanges {
            let native = pair_to_exchange_symbol(exchange, pair).to_uppercase();
            map.insert(((*exchange).to_string(), native), pair.clone());
        }
    }
    map
}

pub struct CryptoFeed {
    config: CryptoFeedConfig,
    tickers: Arc<DashMap<(String, String), Ticker>>,
    symbol_map: Arc<HashMap<(String, String), String>>,
    baselines: AsyncMutex<HashMap<String, Decimal>>,
    running: Arc<AtomicBool>,
    sessions: AsyncMutex<Vec<tokio::task::JoinHandle<()>>>,
}

impl CryptoFeed {
    #[must_use]
    pub fn new(config: CryptoFeedConfig) -> Self {
        let exchanges: Vec<&str> = std::iter::once(config.primary_exchange.as_str())
            .chain(config.validator_ws_urls.keys().map(String::as_str))
            .collect();
        let symbol_map = Arc::new(build_symbol_map(&exchanges, &config.pairs));
        Self {
            config,
            tickers: Arc::new(DashMap::new()),
            symbol_map,
            baselines: AsyncMutex::new(HashMap::new()),
            running: Arc::new(AtomicBool::new(false)),
            sessions: AsyncMutex::new(Vec::new()),
        }
    }

    fn all_exchanges(&self) -> Vec<(String, String)> {
        let mut exchanges = vec![(self.config.primary_exchange.clone(), self.config.primary_ws_url.clone())];
        exchanges.extend(
            self.config
                .validator_ws_urls
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        exchanges
    }
}

#[async_trait]
impl PollableFeed for CryptoFeed {
    fn feed_kind(&self) -> FeedKind {
        FeedKind::Crypto
    }

    async fn connect(&self) -> Result<(), FeedError> {
        self.running.store(true, Ordering::SeqCst);
        let mut sessions = self.sessions.lock().await;
        for (exchange, url) in self.all_exchanges() {
            let tickers = Arc::clone(&self.tickers);
            let symbol_map = Arc::clone(&self.symbol_map);
            let running = Arc::clone(&self.running);
            let pairs = self.config.pairs.clone();
            let ping_interval = self.config.ping_interval;
            sessions.push(tokio::spawn(run_session(
                exchange,
                url,
                pairs,
                tickers,
                symbol_map,
                running,
                ping_interval,
            )));
        }
        Ok(())
    }

    async fn close(&self) -> Result<(), FeedError> {
        self.running.store(false, Ordering::SeqCst);
        let mut sessions = self.sessions.lock().await;
        for handle in sessions.drain(..) {
            handle.abort();
            let _ = handle.await;
        }
        Ok(())
    }

    async fn poll(&self) -> Result<Vec<FeedEvent>, FeedError> {
        let now = Utc::now();
        let mut events = Vec::new();
        let mut baselines = self.baselines.lock().await;

        for pair in &self.config.pairs {
            let Some(primary) = self
                .tickers
                .get(&(self.config.primary_exchange.clone(), pair.clone()))
                .map(|t| t.price)
            else {
                continue;
            };

            let mut validated = true;
            for validator in self.config.validator_ws_urls.keys() {
                let Some(v_price) = self.tickers.get(&(validator.clone(), pair.clone())).map(|t| t.price) else {
                    validated = false;
                    continue;
                };
                let diff_pct = ((primary - v_price) / primary).abs() * Decimal::from(100);
                if diff_pct > self.config.cross_validation_threshold_pct {
                    validated = false;
                }
            }

            let Some(&baseline) = baselines.get(pair) else {
                baselines.insert(pair.clone(), primary);
                continue;
            };

            let change_pct = ((primary - baseline) / baseline).abs() * Decimal::from(100);
            if change_pct < self.config.price_move_threshold_pct {
                continue;
            }
            baselines.insert(pair.clone(), primary);

            let mut metadata = HashMap::new();
            metadata.insert("pair".to_string(), serde_json::Value::String(pair.clone()));
            metadata.insert(
                "exchange".to_string(),
                serde_json::Value::String(self.config.primary_exchange.clone()),
            );
            metadata.insert(
                "change_pct".to_string(),
                serde_json::json!(change_pct.to_f64().unwrap_or_default()),
            );
            metadata.insert("validated".to_string(), serde_json::Value::Bool(validated));

            events.push(FeedEvent::new(
                FeedKind::Crypto,
                FeedEventKind::DataReleased,
                pair.clone(),
                primary.to_string(),
                Some(primary),
                OutcomeType::Numeric,
                now,
                now,
                metadata,
                serde_json::Value::Null,
            ));
        }

        Ok(events)
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }
}

async fn run_session(
    exchange: String,
    url: String,
    pairs: Vec<String>,
    tickers: Arc<DashMap<(String, String), Ticker>>,
    symbol_map: Arc<HashMap<(String, String), String>>,
    running: Arc<AtomicBool>,
    ping_interval: Duration,
) {
    let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));

    while running.load(Ordering::SeqCst) {
        match tokio_tungstenite::connect_async(&url).await {
            Ok((stream, _)) => {
                backoff.reset();
                let (mut write, mut read) = stream.split();

                let ping_running = Arc::clone(&running);
                let ping_task = tokio::spawn(async move {
                    while ping_running.load(Ordering::SeqCst) {
                        tokio::time::sleep(ping_interval).await;
                        if write.send(Message::Ping(vec![])).await.is_err() {
                            break;
                        }
                    }
                });

                while running.load(Ordering::SeqCst) {
                    match read.next().await {
                        Some(Ok(Message::Text(text))) => {
                            if let Some((raw_symbol, price)) = parse_ticker(&exchange, &text) {
                                let key = (exchange.clone(), raw_symbol.to_uppercase());
                                if let Some(pair) = symbol_map.get(&key) {
                                    tickers.insert(
                                        (exchange.clone(), pair.clone()),
                                        Ticker {
                                            price,
                                            observed_at: Utc::now(),
                                        },
                                    );
                                }
                            }
                        }
                        Some(Ok(_)) => {}
                        Some(Err(err)) => {
                            warn!(exchange = %exchange, error = %err, "crypto ws error");
                            break;
                        }
                        None => break,
                    }
                }
                ping_task.abort();
                let _ = pairs.len();
            }
            Err(err) => {
                warn!(exchange = %exchange, error = %err, "crypto ws connect failed");
            }
        }

        if !running.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(backoff.next_delay()).await;
    }
}

/// Parses a single ticker update out of an exchange-specific frame. Payload
/// shapes are a collaborator concern (§1) — this only extracts pair/price.
fn parse_ticker(exchange: &str, text: &str) -> Option<(String, Decimal)> {
    let value: serde_json::Value = serde_json::from_str(text).ok()?;
    match exchange {
        "binance" => {
            let pair = value.get("s")?.as_str()?.to_string();
            let price: Decimal = value.get("c")?.as_str()?.parse().ok()?;
            Some((pair, price))
        }
        "coinbase" => {
            if value.get("type")?.as_str()? != "ticker" {
                return None;
            }
            let pair = value.get("product_id")?.as_str()?.to_string();
            let price: Decimal = value.get("price")?.as_str()?.parse().ok()?;
            Some((pair, price))
        }
        "kraken" => {
            let data = value.get("data")?.as_array()?.first()?;
            let pair = data.get("symbol")?.as_str()?.to_string();
            let price: Decimal = data.get("last")?.as_f64()?.to_string().parse().ok()?;
            Some((pair, price))
        }
        _ => None,
    }
}
