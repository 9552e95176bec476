//! Uniform event emitted by any feed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;

/// Which feed produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedKind {
    Economic,
    Sports,
    Crypto,
}

/// Lifecycle/data event type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FeedEventKind {
    DataReleased,
    FeedConnected,
    FeedDisconnected,
    FeedError,
}

/// How to interpret `numeric_value`/`value` downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutcomeType {
    Numeric,
    Boolean,
    Categorical,
}

#[derive(Debug, Clone)]
pub struct FeedEvent {
    feed_kind: FeedKind,
    event_kind: FeedEventKind,
    indicator: String,
    value: String,
    numeric_value: Option<Decimal>,
    outcome_type: OutcomeType,
    released_at: DateTime<Utc>,
    received_at: DateTime<Utc>,
    metadata: HashMap<String, Value>,
    raw: Value,
}

impl FeedEvent {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        feed_kind: FeedKind,
        event_kind: FeedEventKind,
        indicator: impl Into<String>,
        value: impl Into<String>,
        numeric_value: Option<Decimal>,
        outcome_type: OutcomeType,
        released_at: DateTime<Utc>,
        received_at: DateTime<Utc>,
        metadata: HashMap<String, Value>,
        raw: Value,
    ) -> Self {
        Self {
            feed_kind,
            event_kind,
            indicator: indicator.into(),
            value: value.into(),
            numeric_value,
            outcome_type,
            released_at,
            received_at,
            metadata,
            raw,
        }
    }

    #[must_use]
    pub const fn feed_kind(&self) -> FeedKind {
        self.feed_kind
    }

    #[must_use]
    pub const fn event_kind(&self) -> FeedEventKind {
        self.event_kind
    }

    #[must_use]
    pub fn indicator(&self) -> &str {
        &self.indicator
    }

    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    #[must_use]
    pub const fn numeric_value(&self) -> Option<Decimal> {
        self.numeric_value
    }

    #[must_use]
    pub const fn outcome_type(&self) -> OutcomeType {
        self.outcome_type
    }

    #[must_use]
    pub const fn released_at(&self) -> DateTime<Utc> {
        self.released_at
    }

    #[must_use]
    pub const fn received_at(&self) -> DateTime<Utc> {
        self.received_at
    }

    #[must_use]
    pub fn metadata(&self) -> &HashMap<String, Value> {
        &self.metadata
    }

    #[must_use]
    pub fn metadata_bool(&self, key: &str) -> bool {
        self.metadata
            .get(key)
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }

    #[must_use]
    pub const fn raw(&self) -> &Value {
        &self.raw
    }

    #[must_use]
    pub fn staleness_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.received_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn staleness_secs_measures_from_received_at() {
        let now = Utc::now();
        let event = FeedEvent::new(
            FeedKind::Economic,
            FeedEventKind::DataReleased,
            "CPI",
            "3.5",
            Some(dec!(3.5)),
            OutcomeType::Numeric,
            now,
            now - chrono::Duration::seconds(5),
            HashMap::new(),
            Value::Null,
        );
        assert_eq!(event.staleness_secs(now), 5);
    }

    #[test]
    fn metadata_bool_defaults_false() {
        let now = Utc::now();
        let event = FeedEvent::new(
            FeedKind::Crypto,
            FeedEventKind::DataReleased,
            "BTC_USDT",
            "41200",
            Some(dec!(41200)),
            OutcomeType::Numeric,
            now,
            now,
            HashMap::new(),
            Value::Null,
        );
        assert!(!event.metadata_bool("validated"));
    }
}
