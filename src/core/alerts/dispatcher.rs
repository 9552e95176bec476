//! Central alert dispatcher — routes events to channels with throttling.

use std::collections::HashMap;
use std::time::Instant;

use tokio::sync::Mutex;
use tracing::{error, info};

use crate::core::alerts::channels::NotificationChannel;
use crate::core::alerts::formatters::{format_arb_event, format_feed_event, format_oracle_alert, format_risk_event};
use crate::core::alerts::types::{AlertMessage, Severity};
use crate::core::domain::FeedEvent;
use crate::core::risk::{OracleAlert, RiskEvent};
use crate::core::strategy::ArbEvent;

/// Routes domain events to notification channels.
///
/// - Every event is logged via the `decision_log` tracing target.
/// - `Debug` events are log-only — never sent to channels.
/// - `Info`/`Warning` events are dispatched subject to per-event-type throttling.
/// - `Critical` events bypass the throttle and are dispatched immediately.
pub struct AlertDispatcher {
    channels: Vec<Box<dyn NotificationChannel>>,
    throttle: std::time::Duration,
    last_sent: Mutex<HashMap<String, Instant>>,
}

impl AlertDispatcher {
    #[must_use]
    pub fn new(channels: Vec<Box<dyn NotificationChannel>>, throttle: std::time::Duration) -> Self {
        Self {
            channels,
            throttle,
            last_sent: Mutex::new(HashMap::new()),
        }
    }

    pub async fn on_arb_event(&self, event: &ArbEvent) {
        self.handle(format_arb_event(event)).await;
    }

    pub async fn on_risk_event(&self, event: &RiskEvent) {
        self.handle(format_risk_event(event)).await;
    }

    pub async fn on_feed_event(&self, event: &FeedEvent) {
        self.handle(format_feed_event(event)).await;
    }

    pub async fn on_oracle_alert(&self, alert: &OracleAlert) {
        self.handle(format_oracle_alert(alert)).await;
    }

    /// Dispatches an [`AlertMessage`] directly, bypassing the throttle.
    /// Used by the daily summary scheduler.
    pub async fn send(&self, msg: AlertMessage) {
        self.log_decision(&msg);
        self.dispatch_to_channels(&msg).await;
    }

    async fn handle(&self, msg: AlertMessage) {
        self.log_decision(&msg);

        if msg.severity == Severity::Debug {
            return;
        }

        if msg.severity == Severity::Critical {
            self.last_sent.lock().await.insert(msg.source_event_type.clone(), Instant::now());
            self.dispatch_to_channels(&msg).await;
            return;
        }

        let now = Instant::now();
        let mut last_sent = self.last_sent.lock().await;
        let throttled = last_sent
            .get(&msg.source_event_type)
            .is_some_and(|last| now.duration_since(*last) < self.throttle);
        if throttled {
            return;
        }
        last_sent.insert(msg.source_event_type.clone(), now);
        drop(last_sent);

        self.dispatch_to_channels(&msg).await;
    }

    fn log_decision(&self, msg: &AlertMessage) {
        info!(
            target: "decision_log",
            severity = msg.severity.label(),
            title = %msg.title,
            body = %msg.body,
            source_event_type = %msg.source_event_type,
            "decision"
        );
    }

    async fn dispatch_to_channels(&self, msg: &AlertMessage) {
        for channel in &self.channels {
            if !channel.send(msg).await {
                error!(title = %msg.title, "channel_dispatch_failed");
            }
        }
    }

    pub async fn close(&self) {
        for channel in &self.channels {
            channel.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingChannel {
        sent: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl NotificationChannel for CountingChannel {
        async fn send(&self, _msg: &AlertMessage) -> bool {
            self.sent.fetch_add(1, Ordering::SeqCst);
            true
        }

        async fn close(&self) {}
    }

    #[tokio::test]
    async fn debug_events_never_reach_channels() {
        let sent = Arc::new(AtomicUsize::new(0));
        let dispatcher = AlertDispatcher::new(
            vec![Box::new(CountingChannel { sent: Arc::clone(&sent) })],
            std::time::Duration::from_secs(30),
        );
        let msg = AlertMessage::new(Severity::Debug, "t", "kind_a");
        dispatcher.handle(msg).await;
        assert_eq!(sent.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn critical_events_bypass_throttle() {
        let sent = Arc::new(AtomicUsize::new(0));
        let dispatcher = AlertDispatcher::new(
            vec![Box::new(CountingChannel { sent: Arc::clone(&sent) })],
            std::time::Duration::from_secs(30),
        );
        for _ in 0..3 {
            dispatcher.handle(AlertMessage::new(Severity::Critical, "t", "kind_a")).await;
        }
        assert_eq!(sent.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn warning_events_are_throttled_per_event_type() {
        let sent = Arc::new(AtomicUsize::new(0));
        let dispatcher = AlertDispatcher::new(
            vec![Box::new(CountingChannel { sent: Arc::clone(&sent) })],
            std::time::Duration::from_secs(30),
        );
        for _ in 0..3 {
            dispatcher.handle(AlertMessage::new(Severity::Warning, "t", "kind_a")).await;
        }
        assert_eq!(sent.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn distinct_event_types_throttle_independently() {
        let sent = Arc::new(AtomicUsize::new(0));
        let dispatcher = AlertDispatcher::new(
            vec![Box::new(CountingChannel { sent: Arc::clone(&sent) })],
            std::time::Duration::from_secs(30),
        );
        dispatcher.handle(AlertMessage::new(Severity::Warning, "t", "kind_a")).await;
        dispatcher.handle(AlertMessage::new(Severity::Warning, "t", "kind_b")).await;
        assert_eq!(sent.load(Ordering::SeqCst), 2);
    }
}
