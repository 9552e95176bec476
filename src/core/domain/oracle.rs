//! UMA-style resolution-oracle state for a condition.

use chrono::{DateTime, Utc};

use super::id::ConditionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProposalState {
    Proposed,
    Disputed,
    Settled,
}

#[derive(Debug, Clone)]
pub struct OracleProposal {
    condition_id: ConditionId,
    state: ProposalState,
    proposer: Option<String>,
    disputer: Option<String>,
    proposed_outcome: Option<String>,
    updated_at: DateTime<Utc>,
}

impl OracleProposal {
    #[must_use]
    pub fn proposed(
        condition_id: ConditionId,
        proposer: impl Into<String>,
        proposed_outcome: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            condition_id,
            state: ProposalState::Proposed,
            proposer: Some(proposer.into()),
            disputer: None,
            proposed_outcome: Some(proposed_outcome.into()),
            updated_at: now,
        }
    }

    #[must_use]
    pub const fn condition_id(&self) -> &ConditionId {
        &self.condition_id
    }

    #[must_use]
    pub const fn state(&self) -> ProposalState {
        self.state
    }

    #[must_use]
    pub fn proposer(&self) -> Option<&str> {
        self.proposer.as_deref()
    }

    #[must_use]
    pub fn disputer(&self) -> Option<&str> {
        self.disputer.as_deref()
    }

    #[must_use]
    pub fn proposed_outcome(&self) -> Option<&str> {
        self.proposed_outcome.as_deref()
    }

    #[must_use]
    pub const fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn mark_disputed(&mut self, disputer: impl Into<String>, now: DateTime<Utc>) {
        self.state = ProposalState::Disputed;
        self.disputer = Some(disputer.into());
        self.updated_at = now;
    }

    pub fn mark_settled(&mut self, now: DateTime<Utc>) {
        self.state = ProposalState::Settled;
        self.updated_at = now;
    }

    #[must_use]
    pub const fn is_disputed(&self) -> bool {
        matches!(self.state, ProposalState::Disputed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mark_disputed_flips_is_disputed() {
        let mut p = OracleProposal::proposed(ConditionId::new("c"), "proposer", "Yes", Utc::now());
        assert!(!p.is_disputed());
        p.mark_disputed("disputer", Utc::now());
        assert!(p.is_disputed());
    }

    #[test]
    fn mark_settled_clears_disputed() {
        let mut p = OracleProposal::proposed(ConditionId::new("c"), "proposer", "Yes", Utc::now());
        p.mark_disputed("disputer", Utc::now());
        p.mark_settled(Utc::now());
        assert!(!p.is_disputed());
        assert_eq!(p.state(), ProposalState::Settled);
    }
}
