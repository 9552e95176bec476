//! Per-token order-book WebSocket subscription, with the same
//! backoff-and-reconnect shape as the crypto feed's sessions.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashSet;
use futures_util::{SinkExt, StreamExt};
use tokio::sync::{mpsc, Mutex as AsyncMutex};
use tokio_tungstenite::tungstenite::Message;
use tracing::warn;

use crate::core::domain::{OrderBook, TokenId};
use crate::core::util::Backoff;
use crate::error::ClobClientError;

pub enum WsCommand {
    Subscribe(TokenId),
    Unsubscribe(TokenId),
}

/// Parses a single order-book frame into `(token_id, book)`. Venue-specific;
/// injected so the session loop stays venue-agnostic.
pub trait BookFrameParser: Send + Sync {
    fn parse(&self, text: &str) -> Option<(TokenId, OrderBook)>;
    fn subscribe_payload(&self, token_ids: &[TokenId]) -> String;
    fn unsubscribe_payload(&self, token_ids: &[TokenId]) -> String;
}

pub struct OrderBookSession<P: BookFrameParser + 'static> {
    url: String,
    parser: Arc<P>,
    subscribed: Arc<DashSet<TokenId>>,
    running: Arc<AtomicBool>,
    commands: AsyncMutex<Option<mpsc::UnboundedSender<WsCommand>>>,
    on_update: Arc<dyn Fn(OrderBook) + Send + Sync>,
}

impl<P: BookFrameParser + 'static> OrderBookSession<P> {
    #[must_use]
    pub fn new(url: String, parser: Arc<P>, on_update: Arc<dyn Fn(OrderBook) + Send + Sync>) -> Self {
        Self {
            url,
            parser,
            subscribed: Arc::new(DashSet::new()),
            running: Arc::new(AtomicBool::new(false)),
            commands: AsyncMutex::new(None),
            on_update,
        }
    }

    pub async fn start(&self) -> Result<(), ClobClientError> {
        self.running.store(true, Ordering::SeqCst);
        let (tx, rx) = mpsc::unbounded_channel();
        *self.commands.lock().await = Some(tx);

        let url = self.url.clone();
        let parser = Arc::clone(&self.parser);
        let subscribed = Arc::clone(&self.subscribed);
        let running = Arc::clone(&self.running);
        let on_update = Arc::clone(&self.on_update);

        tokio::spawn(run_session(url, parser, subscribed, running, rx, on_update));
        Ok(())
    }

    pub async fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
        *self.commands.lock().await = None;
    }

    pub async fn subscribe(&self, token_id: TokenId) -> Result<(), ClobClientError> {
        self.subscribed.insert(token_id.clone());
        if let Some(tx) = self.commands.lock().await.as_ref() {
            tx.send(WsCommand::Subscribe(token_id))
                .map_err(|err| ClobClientError::WebSocket(err.to_string()))?;
        }
        Ok(())
    }

    pub async fn unsubscribe(&self, token_id: TokenId) -> Result<(), ClobClientError> {
        self.subscribed.remove(&token_id);
        if let Some(tx) = self.commands.lock().await.as_ref() {
            tx.send(WsCommand::Unsubscribe(token_id))
                .map_err(|err| ClobClientError::WebSocket(err.to_string()))?;
        }
        Ok(())
    }
}

async fn run_session<P: BookFrameParser + 'static>(
    url: String,
    parser: Arc<P>,
    subscribed: Arc<DashSet<TokenId>>,
    running: Arc<AtomicBool>,
    mut commands: mpsc::UnboundedReceiver<WsCommand>,
    on_update: Arc<dyn Fn(OrderBook) + Send + Sync>,
) {
    let mut backoff = Backoff::new(Duration::from_secs(1), Duration::from_secs(30));

    while running.load(Ordering::SeqCst) {
        match tokio_tungstenite::connect_async(&url).await {
            Ok((stream, _)) => {
                backoff.reset();
                let (mut write, mut read) = stream.split();

                let resubscribe: Vec<TokenId> = subscribed.iter().map(|t| t.clone()).collect();
                if !resubscribe.is_empty() {
                    let payload = parser.subscribe_payload(&resubscribe);
                    if write.send(Message::Text(payload)).await.is_err() {
                        continue;
                    }
                }

                loop {
                    tokio::select! {
                        cmd = commands.recv() => {
                            match cmd {
                                Some(WsCommand::Subscribe(token_id)) => {
                                    let payload = parser.subscribe_payload(std::slice::from_ref(&token_id));
                                    if write.send(Message::Text(payload)).await.is_err() {
                                        break;
                                    }
                                }
                                Some(WsCommand::Unsubscribe(token_id)) => {
                                    let payload = parser.unsubscribe_payload(std::slice::from_ref(&token_id));
                                    if write.send(Message::Text(payload)).await.is_err() {
                                        break;
                                    }
                                }
                                None => break,
                            }
                        }
                        msg = read.next() => {
                            match msg {
                                Some(Ok(Message::Text(text))) => {
                                    if let Some((_, book)) = parser.parse(&text) {
                                        on_update(book);
                                    }
                                }
                                Some(Ok(_)) => {}
                                Some(Err(err)) => {
                                    warn!(error = %err, "orderbook ws error");
                                    break;
                                }
                                None => break,
                            }
                        }
                    }
                    if !running.load(Ordering::SeqCst) {
                        break;
                    }
                }
            }
            Err(err) => {
                warn!(error = %err, "orderbook ws connect failed");
            }
        }

        if !running.load(Ordering::SeqCst) {
            break;
        }
        tokio::time::sleep(backoff.next_delay()).await;
    }
}

#[must_use]
pub fn diff_subscriptions(
    currently: &HashSet<TokenId>,
    desired: &HashSet<TokenId>,
) -> (Vec<TokenId>, Vec<TokenId>) {
    let to_subscribe = desired.difference(currently).cloned().collect();
    let to_unsubscribe = currently.difference(desired).cloned().collect();
    (to_subscribe, to_unsubscribe)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn diff_subscriptions_computes_additions_and_removals() {
        let currently: HashSet<TokenId> = [TokenId::new("a"), TokenId::new("b")].into_iter().collect();
        let desired: HashSet<TokenId> = [TokenId::new("b"), TokenId::new("c")].into_iter().collect();
        let (subscribe, unsubscribe) = diff_subscriptions(&currently, &desired);
        assert_eq!(subscribe, vec![TokenId::new("c")]);
        assert_eq!(unsubscribe, vec![TokenId::new("a")]);
    }
}
