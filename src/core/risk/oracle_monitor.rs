//! Tracks UMA-style oracle proposals, disputes, and whale activity against
//! markets we hold positions in. Ingest methods accept data from whatever
//! upstream source (subgraph, RPC) a deployment wires up, so this can be
//! driven by synthetic data in tests today and a real feed later.

use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use tokio::sync::Mutex;
use tracing::{info, warn};

use crate::core::domain::{ConditionId, OracleProposal, Position, ProposalState};
use crate::core::risk::config::OracleConfig;
use crate::core::risk::positions::PositionBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OracleEventType {
    ProposalDetected,
    DisputeDetected,
    SettlementDetected,
    WhaleActivityDetected,
}

#[derive(Debug, Clone)]
pub struct WhaleActivity {
    pub address: String,
    pub action: String,
    pub condition_id: ConditionId,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct OracleAlert {
    pub event_type: OracleEventType,
    pub condition_id: ConditionId,
    pub proposal: Option<OracleProposal>,
    pub whale_activity: Option<WhaleActivity>,
    pub held_position_exposure: Decimal,
    pub reason: String,
    pub timestamp: DateTime<Utc>,
}

pub type OracleAlertCallback = Arc<dyn Fn(OracleAlert) -> Pin<Box<dyn Future<Output = ()> + Send>> + Send + Sync>;

pub struct OracleMonitor {
    config: OracleConfig,
    proposals: HashMap<ConditionId, OracleProposal>,
    callbacks: Mutex<Vec<OracleAlertCallback>>,
    whale_addresses: HashSet<String>,
}

impl OracleMonitor {
    #[must_use]
    pub fn new(config: OracleConfig) -> Self {
        let whale_addresses = config.whale_addresses.iter().map(|a| a.to_lowercase()).collect();
        Self {
            config,
            proposals: HashMap::new(),
            callbacks: Mutex::new(Vec::new()),
            whale_addresses,
        }
    }

    #[must_use]
    pub fn proposals(&self) -> &HashMap<ConditionId, OracleProposal> {
        &self.proposals
    }

    #[must_use]
    pub fn disputed_conditions(&self) -> HashSet<ConditionId> {
        self.proposals
            .values()
            .filter(|p| p.is_disputed())
            .map(|p| p.condition_id().clone())
            .collect()
    }

    #[must_use]
    pub fn whale_addresses(&self) -> &HashSet<String> {
        &self.whale_addresses
    }

    #[must_use]
    pub fn is_disputed(&self, condition_id: &str) -> bool {
        self.proposals
            .get(&ConditionId::new(condition_id))
            .is_some_and(OracleProposal::is_disputed)
    }

    #[must_use]
    pub fn get_proposal(&self, condition_id: &ConditionId) -> Option<&OracleProposal> {
        self.proposals.get(condition_id)
    }

    #[must_use]
    pub fn exposure_at_risk(&self, positions: &PositionBook) -> Decimal {
        self.disputed_conditions()
            .iter()
            .map(|cid| positions.exposure_for_condition(cid.as_str()))
            .sum()
    }

    #[must_use]
    pub fn disputed_positions<'a>(&self, positions: &'a PositionBook) -> Vec<(ConditionId, &'a Position, &OracleProposal)> {
        let mut out = Vec::new();
        for cid in self.disputed_conditions() {
            let Some(proposal) = self.proposals.get(&cid) else { continue };
            for pos in positions.positions().values() {
                if pos.condition_id() == &cid {
                    out.push((cid.clone(), pos, proposal));
                }
            }
        }
        out
    }

    pub async fn on_alert(&self, callback: OracleAlertCallback) {
        self.callbacks.lock().await.push(callback);
    }

    async fn emit(&self, alert: OracleAlert) {
        for cb in self.callbacks.lock().await.iter() {
            cb(alert.clone()).await;
        }
    }

    pub async fn ingest_proposal(&mut self, proposal: OracleProposal, positions: &PositionBook) {
        let condition_id = proposal.condition_id().clone();
        self.proposals.insert(condition_id.clone(), proposal.clone());
        info!(condition_id = %condition_id, state = ?proposal.state(), "oracle_proposal_ingested");

        let exposure = positions.exposure_for_condition(condition_id.as_str());
        if exposure > Decimal::ZERO {
            self.emit(OracleAlert {
                event_type: OracleEventType::ProposalDetected,
                condition_id,
                proposal: Some(proposal),
                whale_activity: None,
                held_position_exposure: exposure,
                reason: format!("proposal detected on held position (${exposure})"),
                timestamp: Utc::now(),
            })
            .await;
        }
    }

    pub async fn ingest_dispute(&mut self, condition_id: ConditionId, disputer: impl Into<String>, positions: &PositionBook) {
        let disputer = disputer.into();
        let now = Utc::now();
        let proposal = self
            .proposals
            .entry(condition_id.clone())
            .or_insert_with(|| OracleProposal::proposed(condition_id.clone(), "", "", now));
        proposal.mark_disputed(disputer.clone(), now);
        let proposal = proposal.clone();
        warn!(condition_id = %condition_id, disputer = %disputer, "oracle_dispute_detected");

        let exposure = positions.exposure_for_condition(condition_id.as_str());
        let mut reason = format!("dispute filed on {condition_id}");
        if exposure > Decimal::ZERO {
            reason.push_str(&format!(" (${exposure} at risk)"));
        }
        self.emit(OracleAlert {
            event_type: OracleEventType::DisputeDetected,
            condition_id,
            proposal: Some(proposal),
            whale_activity: None,
            held_position_exposure: exposure,
            reason,
            timestamp: now,
        })
        .await;
    }

    pub async fn ingest_settlement(&mut self, condition_id: ConditionId) {
        let now = Utc::now();
        let proposal = self
            .proposals
            .entry(condition_id.clone())
            .or_insert_with(|| OracleProposal::proposed(condition_id.clone(), "", "", now));
        proposal.mark_settled(now);
        info!(condition_id = %condition_id, "oracle_settlement_detected");

        self.emit(OracleAlert {
            event_type: OracleEventType::SettlementDetected,
            condition_id: condition_id.clone(),
            proposal: Some(proposal.clone()),
            whale_activity: None,
            held_position_exposure: Decimal::ZERO,
            reason: format!("settlement on {condition_id}"),
            timestamp: now,
        })
        .await;
    }

    pub async fn ingest_whale_activity(&self, activity: WhaleActivity, positions: &PositionBook) {
        if !self.whale_addresses.contains(&activity.address.to_lowercase()) {
            return;
        }
        warn!(address = %activity.address, action = %activity.action, condition_id = %activity.condition_id, "oracle_whale_activity");

        let exposure = positions.exposure_for_condition(activity.condition_id.as_str());
        let reason = format!(
            "whale {}... {} on {}",
            &activity.address.chars().take(10).collect::<String>(),
            activity.action,
            activity.condition_id
        );
        self.emit(OracleAlert {
            event_type: OracleEventType::WhaleActivityDetected,
            condition_id: activity.condition_id.clone(),
            proposal: None,
            whale_activity: Some(activity),
            held_position_exposure: exposure,
            reason,
            timestamp: Utc::now(),
        })
        .await;
    }

    pub fn clear(&mut self) {
        self.proposals.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn ingest_dispute_marks_condition_disputed() {
        let mut monitor = OracleMonitor::new(OracleConfig::default());
        monitor.ingest_dispute(ConditionId::new("c1"), "0xdisputer", &PositionBook::new()).await;
        assert!(monitor.is_disputed("c1"));
    }

    #[tokio::test]
    async fn ingest_settlement_clears_dispute_state() {
        let mut monitor = OracleMonitor::new(OracleConfig::default());
        monitor.ingest_dispute(ConditionId::new("c1"), "0xdisputer", &PositionBook::new()).await;
        monitor.ingest_settlement(ConditionId::new("c1")).await;
        assert!(!monitor.is_disputed("c1"));
    }

    #[tokio::test]
    async fn whale_activity_from_unknown_address_is_ignored() {
        let monitor = OracleMonitor::new(OracleConfig {
            whale_addresses: vec!["0xabc".to_string()],
        });
        let received = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let received_clone = Arc::clone(&received);
        monitor
            .on_alert(Arc::new(move |_alert| {
                let received = Arc::clone(&received_clone);
                Box::pin(async move {
                    received.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                })
            }))
            .await;

        monitor
            .ingest_whale_activity(
                WhaleActivity {
                    address: "0xdef".to_string(),
                    action: "sell".to_string(),
                    condition_id: ConditionId::new("c1"),
                    timestamp: Utc::now(),
                },
                &PositionBook::new(),
            )
            .await;
        assert_eq!(received.load(std::sync::atomic::Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn whale_activity_from_known_address_emits_alert() {
        let monitor = OracleMonitor::new(OracleConfig {
            whale_addresses: vec!["0xABC".to_string()],
        });
        let received = Arc::new(std::sync::atomic::AtomicUsize::new(0));
        let received_clone = Arc::clone(&received);
        monitor
            .on_alert(Arc::new(move |_alert| {
                let received = Arc::clone(&received_clone);
                Box::pin(async move {
                    received.fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                })
            }))
            .await;

        monitor
            .ingest_whale_activity(
                WhaleActivity {
                    address: "0xabc".to_string(),
                    action: "sell".to_string(),
                    condition_id: ConditionId::new("c1"),
                    timestamp: Utc::now(),
                },
                &PositionBook::new(),
            )
            .await;
        assert_eq!(received.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
