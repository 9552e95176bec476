//! Feed runtime: a uniform [`FeedEvent`] stream from heterogeneous sources.
//!
//! Each concrete feed implements the small [`PollableFeed`] contract
//! (`connect`/`close`/`poll`); [`FeedRunner`] owns the shared loop, error
//! counting, callback fan-out, and start/stop lifecycle so that contract is
//! the only thing a new feed has to get right.

pub mod crypto;
pub mod economic;
pub mod sports;

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::core::domain::{FeedEvent, FeedKind};
use crate::error::FeedError;

pub type EventCallback = Arc<dyn Fn(FeedEvent) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// Fired after every poll attempt: `true` on success, `false` on failure.
/// Lets callers feed feed connectivity into something like a kill switch
/// without the runner needing to know what a kill switch is.
pub type HealthCallback = Arc<dyn Fn(bool) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

/// The three primitives a concrete feed must implement. The runner owns
/// everything else (the loop, error counting, callback dispatch).
#[async_trait]
pub trait PollableFeed: Send + Sync + 'static {
    fn feed_kind(&self) -> FeedKind;

    async fn connect(&self) -> Result<(), FeedError>;

    async fn close(&self) -> Result<(), FeedError>;

    /// One polling pass; returns whatever new events were found. Returning
    /// an empty vec on a quiet tick is normal, not an error.
    async fn poll(&self) -> Result<Vec<FeedEvent>, FeedError>;

    fn poll_interval(&self) -> Duration;
}

/// Shared start/stop/callback machinery for any [`PollableFeed`].
pub struct FeedRunner<F: PollableFeed> {
    feed: Arc<F>,
    running: Arc<AtomicBool>,
    error_count: Arc<AtomicU64>,
    callbacks: Arc<Mutex<Vec<EventCallback>>>,
    health_callbacks: Arc<Mutex<Vec<HealthCallback>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl<F: PollableFeed> FeedRunner<F> {
    #[must_use]
    pub fn new(feed: F) -> Self {
        Self {
            feed: Arc::new(feed),
            running: Arc::new(AtomicBool::new(false)),
            error_count: Arc::new(AtomicU64::new(0)),
            callbacks: Arc::new(Mutex::new(Vec::new())),
            health_callbacks: Arc::new(Mutex::new(Vec::new())),
            task: Mutex::new(None),
        }
    }

    pub async fn on_event(&self, callback: EventCallback) {
        self.callbacks.lock().await.push(callback);
    }

    pub async fn on_health(&self, callback: HealthCallback) {
        self.health_callbacks.lock().await.push(callback);
    }

    #[must_use]
    pub fn running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn error_count(&self) -> u64 {
        self.error_count.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn feed_kind(&self) -> FeedKind {
        self.feed.feed_kind()
    }

    pub async fn start(&self) -> Result<(), FeedError> {
        if self.running.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.feed.connect().await?;
        debug!(feed = ?self.feed.feed_kind(), "feed connected");

        let feed = Arc::clone(&self.feed);
        let running = Arc::clone(&self.running);
        let error_count = Arc::clone(&self.error_count);
        let callbacks = Arc::clone(&self.callbacks);
        let health_callbacks = Arc::clone(&self.health_callbacks);
        let interval = self.feed.poll_interval();

        let handle = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                match feed.poll().await {
                    Ok(events) => {
                        dispatch_health(&health_callbacks, true).await;
                        for event in events {
                            dispatch(&callbacks, event).await;
                        }
                    }
                    Err(err) => {
                        error_count.fetch_add(1, Ordering::SeqCst);
                        warn!(feed = ?feed.feed_kind(), error = %err, "feed poll error");
                        dispatch_health(&health_callbacks, false).await;
                    }
                }
                tokio::time::sleep(interval).await;
            }
        });
        *self.task.lock().await = Some(handle);
        Ok(())
    }

    pub async fn stop(&self) -> Result<(), FeedError> {
        if !self.running.swap(false, Ordering::SeqCst) {
            return Ok(());
        }
        if let Some(handle) = self.task.lock().await.take() {
            handle.abort();
            let _ = handle.await;
        }
        self.feed.close().await?;
        debug!(feed = ?self.feed.feed_kind(), at = %Utc::now(), "feed disconnected");
        Ok(())
    }
}

async fn dispatch(callbacks: &Mutex<Vec<EventCallback>>, event: FeedEvent) {
    let callbacks = callbacks.lock().await;
    for callback in callbacks.iter() {
        callback(event.clone()).await;
    }
}

async fn dispatch_health(callbacks: &Mutex<Vec<HealthCallback>>, healthy: bool) {
    let callbacks = callbacks.lock().await;
    for callback in callbacks.iter() {
        callback(healthy).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::collections::HashMap;
    use rust_decimal_macros::dec;

    struct CountingFeed {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl PollableFeed for CountingFeed {
        fn feed_kind(&self) -> FeedKind {
            FeedKind::Economic
        }

        async fn connect(&self) -> Result<(), FeedError> {
            Ok(())
        }

        async fn close(&self) -> Result<(), FeedError> {
            Ok(())
        }

        async fn poll(&self) -> Result<Vec<FeedEvent>, FeedError> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n == 0 {
                Ok(vec![FeedEvent::new(
                    FeedKind::Economic,
                    crate::core::domain::FeedEventKind::DataReleased,
                    "CPI",
                    "3.5",
                    Some(dec!(3.5)),
                    crate::core::domain::OutcomeType::Numeric,
                    Utc::now(),
                    Utc::now(),
                    HashMap::new(),
                    serde_json::Value::Null,
                )])
            } else {
                Ok(vec![])
            }
        }

        fn poll_interval(&self) -> Duration {
            Duration::from_millis(10)
        }
    }

    #[tokio::test]
    async fn start_dispatches_events_to_registered_callbacks() {
        let runner = FeedRunner::new(CountingFeed {
            polls: AtomicUsize::new(0),
        });
        let received = Arc::new(AtomicUsize::new(0));
        let received_clone = Arc::clone(&received);
        runner
            .on_event(Arc::new(move |_event| {
                let received = Arc::clone(&received_clone);
                Box::pin(async move {
                    received.fetch_add(1, Ordering::SeqCst);
                })
            }))
            .await;

        runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        runner.stop().await.unwrap();

        assert!(received.load(Ordering::SeqCst) >= 1);
        assert!(!runner.running());
    }

    struct FailingFeed;

    #[async_trait]
    impl PollableFeed for FailingFeed {
        fn feed_kind(&self) -> FeedKind {
            FeedKind::Economic
        }

        async fn connect(&self) -> Result<(), FeedError> {
            Ok(())
        }

        async fn close(&self) -> Result<(), FeedError> {
            Ok(())
        }

        async fn poll(&self) -> Result<Vec<FeedEvent>, FeedError> {
            Err(FeedError::Parse {
                feed: "economic",
                detail: "unreachable".to_string(),
            })
        }

        fn poll_interval(&self) -> Duration {
            Duration::from_millis(10)
        }
    }

    #[tokio::test]
    async fn poll_failure_dispatches_unhealthy() {
        let runner = FeedRunner::new(FailingFeed);
        let healthy_calls = Arc::new(AtomicUsize::new(0));
        let unhealthy_calls = Arc::new(AtomicUsize::new(0));
        let healthy_clone = Arc::clone(&healthy_calls);
        let unhealthy_clone = Arc::clone(&unhealthy_calls);
        runner
            .on_health(Arc::new(move |healthy| {
                let healthy_calls = Arc::clone(&healthy_clone);
                let unhealthy_calls = Arc::clone(&unhealthy_clone);
                Box::pin(async move {
                    if healthy {
                        healthy_calls.fetch_add(1, Ordering::SeqCst);
                    } else {
                        unhealthy_calls.fetch_add(1, Ordering::SeqCst);
                    }
                })
            }))
            .await;

        runner.start().await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        runner.stop().await.unwrap();

        assert!(unhealthy_calls.load(Ordering::SeqCst) >= 1);
        assert_eq!(healthy_calls.load(Ordering::SeqCst), 0);
    }
}
