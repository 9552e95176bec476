//! Background task that emits a daily P&L summary at a configured UTC hour.

use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::warn;

use crate::core::alerts::dispatcher::AlertDispatcher;
use crate::core::alerts::types::{AlertMessage, Severity};
use crate::core::risk::RiskSnapshot;

pub type SnapshotFn = Arc<dyn Fn() -> Pin<Box<dyn Future<Output = RiskSnapshot> + Send>> + Send + Sync>;

/// Emits one [`AlertMessage`] per UTC day once the clock crosses `hour_utc`.
///
/// ```ignore
/// let scheduler = DailySummaryScheduler::new(dispatcher, snapshot_fn, 0);
/// scheduler.start().await;
/// // ...
/// scheduler.stop().await;
/// ```
pub struct DailySummaryScheduler {
    dispatcher: Arc<AlertDispatcher>,
    snapshot_fn: SnapshotFn,
    hour_utc: u32,
    running: Arc<AtomicBool>,
    last_sent_date: Arc<Mutex<Option<NaiveDate>>>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl DailySummaryScheduler {
    #[must_use]
    pub fn new(dispatcher: Arc<AlertDispatcher>, snapshot_fn: SnapshotFn, hour_utc: u32) -> Self {
        Self {
            dispatcher,
            snapshot_fn,
            hour_utc,
            running: Arc::new(AtomicBool::new(false)),
            last_sent_date: Arc::new(Mutex::new(None)),
            task: Mutex::new(None),
        }
    }

    pub async fn start(&self) {
        if self.running.swap(true, Ordering::SeqCst) {
            return;
        }

        let dispatcher = Arc::clone(&self.dispatcher);
        let snapshot_fn = Arc::clone(&self.snapshot_fn);
        let hour_utc = self.hour_utc;
        let running = Arc::clone(&self.running);
        let last_sent_date = Arc::clone(&self.last_sent_date);

        let handle = tokio::spawn(async move {
            while running.load(Ordering::SeqCst) {
                let now = Utc::now();
                let today = now.date_naive();
                let already_sent = *last_sent_date.lock().await == Some(today);
                if now.format("%H").to_string().parse::<u32>() == Ok(hour_utc) && !already_sent {
                    let snapshot = snapshot_fn().await;
                    dispatcher.send(build_summary(&snapshot)).await;
                    *last_sent_date.lock().await = Some(today);
                }
                tokio::time::sleep(std::time::Duration::from_secs(60)).await;
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
        } else {
            warn!("daily_summary_scheduler stopped without a running task");
        }
    }

    /// Builds and sends the summary immediately, bypassing the schedule.
    /// Useful for manual `/summary`-style triggers.
    pub async fn emit_now(&self) {
        let snapshot = (self.snapshot_fn)().await;
        self.dispatcher.send(build_summary(&snapshot)).await;
        *self.last_sent_date.lock().await = Some(Utc::now().date_naive());
    }
}

fn build_summary(snapshot: &RiskSnapshot) -> AlertMessage {
    let mut fields = std::collections::HashMap::new();
    fields.insert("open_positions".to_string(), snapshot.open_positions.to_string());
    fields.insert("total_exposure_usd".to_string(), snapshot.total_exposure_usd.to_string());
    fields.insert("realized_today".to_string(), snapshot.realized_today.to_string());
    fields.insert("realized_total".to_string(), snapshot.realized_total.to_string());
    fields.insert("trade_count_today".to_string(), snapshot.trade_count_today.to_string());
    fields.insert("killed".to_string(), snapshot.killed.to_string());

    AlertMessage {
        severity: Severity::Info,
        title: "DAILY_SUMMARY".to_string(),
        body: format!("Realized today: ${}", snapshot.realized_today),
        fields,
        source_event_type: "DAILY_SUMMARY".to_string(),
        timestamp: Utc::now(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn snapshot() -> RiskSnapshot {
        RiskSnapshot {
            killed: false,
            open_positions: 2,
            total_exposure_usd: dec!(500),
            realized_today: dec!(-12.5),
            realized_total: dec!(88),
            trade_count_today: 4,
        }
    }

    #[test]
    fn build_summary_carries_realized_today_in_the_body() {
        let msg = build_summary(&snapshot());
        assert!(msg.body.contains("-12.5"));
        assert_eq!(msg.source_event_type, "DAILY_SUMMARY");
    }

    #[tokio::test]
    async fn emit_now_sends_through_the_dispatcher() {
        let dispatcher = Arc::new(AlertDispatcher::new(vec![], std::time::Duration::from_secs(30)));
        let snapshot_fn: SnapshotFn = Arc::new(|| Box::pin(async { snapshot() }));
        let scheduler = DailySummaryScheduler::new(dispatcher, snapshot_fn, 0);
        scheduler.emit_now().await;
        assert!(scheduler.last_sent_date.lock().await.is_some());
    }
}
