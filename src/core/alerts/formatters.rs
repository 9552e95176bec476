//! Pure functions that convert domain events into [`AlertMessage`]s.

use std::collections::HashMap;

use crate::core::alerts::types::{AlertMessage, Severity};
use crate::core::domain::{FeedEvent, FeedEventKind};
use crate::core::risk::{OracleAlert, OracleEventType, RiskEvent, RiskEventType};
use crate::core::strategy::{ArbEvent, ArbEventKind};

fn arb_severity(kind: ArbEventKind) -> Severity {
    match kind {
        ArbEventKind::SignalGenerated | ArbEventKind::TradeSkipped => Severity::Debug,
        ArbEventKind::TradeExecuted | ArbEventKind::EngineStarted | ArbEventKind::EngineStopped => Severity::Info,
        ArbEventKind::TradeFailed => Severity::Warning,
    }
}

fn risk_severity(kind: RiskEventType) -> Severity {
    match kind {
        RiskEventType::KillSwitchTriggered => Severity::Critical,
        RiskEventType::KillSwitchReset => Severity::Info,
        RiskEventType::PositionOpened | RiskEventType::PositionClosed => Severity::Debug,
    }
}

fn feed_severity(kind: FeedEventKind) -> Severity {
    match kind {
        FeedEventKind::DataReleased | FeedEventKind::FeedConnected => Severity::Debug,
        FeedEventKind::FeedDisconnected | FeedEventKind::FeedError => Severity::Warning,
    }
}

fn oracle_severity(kind: OracleEventType) -> Severity {
    match kind {
        OracleEventType::ProposalDetected => Severity::Debug,
        OracleEventType::SettlementDetected => Severity::Info,
        OracleEventType::WhaleActivityDetected => Severity::Warning,
        OracleEventType::DisputeDetected => Severity::Critical,
    }
}

#[must_use]
pub fn format_arb_event(event: &ArbEvent) -> AlertMessage {
    let mut fields = HashMap::new();

    if let Some(action) = &event.action {
        fields.insert("token_id".to_string(), action.token_id().to_string());
        fields.insert("side".to_string(), format!("{:?}", action.side()));
        fields.insert("price".to_string(), action.price().to_string());
        fields.insert("size".to_string(), action.size().to_string());
        fields.insert("est_profit".to_string(), action.estimated_profit_usd().to_string());
    }

    if let Some(result) = &event.result {
        if let Some(fill_price) = result.fill_price() {
            fields.insert("fill_price".to_string(), fill_price.to_string());
        }
        if let Some(fill_size) = result.fill_size() {
            fields.insert("fill_size".to_string(), fill_size.to_string());
        }
        fields.insert("success".to_string(), result.success().to_string());
    }

    if let Some(signal) = &event.signal {
        fields.insert("confidence".to_string(), signal.confidence().to_string());
        fields.insert("edge".to_string(), signal.edge().to_string());
    }

    let title = format!("{:?}", event.kind);
    AlertMessage {
        severity: arb_severity(event.kind),
        title: title.clone(),
        body: event.reason.clone(),
        fields,
        source_event_type: title,
        timestamp: chrono::Utc::now(),
    }
}

#[must_use]
pub fn format_risk_event(event: &RiskEvent) -> AlertMessage {
    let mut fields = HashMap::new();

    if let Some(position) = &event.position {
        fields.insert("token_id".to_string(), position.token_id().to_string());
        fields.insert("condition_id".to_string(), position.condition_id().to_string());
        fields.insert("entry_price".to_string(), position.entry_price().to_string());
        fields.insert("size".to_string(), position.size().to_string());
    }

    if let Some(daily_pnl) = event.daily_pnl {
        fields.insert("daily_pnl".to_string(), daily_pnl.to_string());
    }

    let title = format!("{:?}", event.event_type);
    AlertMessage {
        severity: risk_severity(event.event_type),
        title: title.clone(),
        body: event.reason.clone(),
        fields,
        source_event_type: title,
        timestamp: chrono::Utc::now(),
    }
}

#[must_use]
pub fn format_feed_event(event: &FeedEvent) -> AlertMessage {
    let mut fields = HashMap::new();
    fields.insert("feed_kind".to_string(), format!("{:?}", event.feed_kind()));
    fields.insert("indicator".to_string(), event.indicator().to_string());
    if !event.value().is_empty() {
        fields.insert("value".to_string(), event.value().to_string());
    }

    let title = format!("{:?} {:?}", event.feed_kind(), event.event_kind());
    AlertMessage {
        severity: feed_severity(event.event_kind()),
        title: title.clone(),
        body: event.indicator().to_string(),
        fields,
        source_event_type: title,
        timestamp: event.received_at(),
    }
}

#[must_use]
pub fn format_oracle_alert(alert: &OracleAlert) -> AlertMessage {
    let mut fields = HashMap::new();
    fields.insert("condition_id".to_string(), alert.condition_id.to_string());

    if let Some(proposal) = &alert.proposal {
        fields.insert("proposal_state".to_string(), format!("{:?}", proposal.state()));
        fields.insert("proposer".to_string(), proposal.proposer().to_string());
    }

    if let Some(whale) = &alert.whale_activity {
        fields.insert("whale_address".to_string(), whale.address.clone());
        fields.insert("whale_action".to_string(), whale.action.clone());
    }

    if alert.held_position_exposure > rust_decimal::Decimal::ZERO {
        fields.insert("exposure_usd".to_string(), alert.held_position_exposure.to_string());
    }

    let title = format!("{:?}", alert.event_type);
    AlertMessage {
        severity: oracle_severity(alert.event_type),
        title: title.clone(),
        body: alert.reason.clone(),
        fields,
        source_event_type: title,
        timestamp: alert.timestamp,
    }
}
