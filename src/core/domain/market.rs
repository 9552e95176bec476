//! Market metadata as returned by the execution venue.

use chrono::{DateTime, Utc};

use super::id::{ConditionId, TokenId};

/// One outcome token of a market (e.g. "Yes" / "No").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutcomeToken {
    token_id: TokenId,
    outcome: String,
}

impl OutcomeToken {
    #[must_use]
    pub fn new(token_id: TokenId, outcome: impl Into<String>) -> Self {
        Self {
            token_id,
            outcome: outcome.into(),
        }
    }

    #[must_use]
    pub const fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[must_use]
    pub fn outcome(&self) -> &str {
        &self.outcome
    }
}

/// Venue-reported market state.
#[derive(Debug, Clone)]
pub struct MarketInfo {
    condition_id: ConditionId,
    question: String,
    tokens: Vec<OutcomeToken>,
    active: bool,
    closed: bool,
    flagged: bool,
    accepting_orders: bool,
    end_date: Option<DateTime<Utc>>,
    tags: Vec<String>,
    fee_rate_bps: u32,
}

impl MarketInfo {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        condition_id: ConditionId,
        question: impl Into<String>,
        tokens: Vec<OutcomeToken>,
        active: bool,
        closed: bool,
        flagged: bool,
        accepting_orders: bool,
        end_date: Option<DateTime<Utc>>,
        tags: Vec<String>,
        fee_rate_bps: u32,
    ) -> Self {
        Self {
            condition_id,
            question: question.into(),
            tokens,
            active,
            closed,
            flagged,
            accepting_orders,
            end_date,
            tags,
            fee_rate_bps,
        }
    }

    #[must_use]
    pub const fn condition_id(&self) -> &ConditionId {
        &self.condition_id
    }

    #[must_use]
    pub fn question(&self) -> &str {
        &self.question
    }

    #[must_use]
    pub fn tokens(&self) -> &[OutcomeToken] {
        &self.tokens
    }

    #[must_use]
    pub const fn active(&self) -> bool {
        self.active
    }

    #[must_use]
    pub const fn closed(&self) -> bool {
        self.closed
    }

    #[must_use]
    pub const fn flagged(&self) -> bool {
        self.flagged
    }

    #[must_use]
    pub const fn accepting_orders(&self) -> bool {
        self.accepting_orders
    }

    #[must_use]
    pub const fn end_date(&self) -> Option<DateTime<Utc>> {
        self.end_date
    }

    #[must_use]
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    #[must_use]
    pub const fn fee_rate_bps(&self) -> u32 {
        self.fee_rate_bps
    }

    #[must_use]
    pub fn is_binary(&self) -> bool {
        self.tokens.len() == 2
    }

    /// Case-insensitive lookup by outcome label.
    #[must_use]
    pub fn outcome_by_name(&self, name: &str) -> Option<&OutcomeToken> {
        let needle = name.to_lowercase();
        self.tokens
            .iter()
            .find(|t| t.outcome.to_lowercase() == needle)
    }

    #[must_use]
    pub fn token_ids(&self) -> Vec<TokenId> {
        self.tokens.iter().map(|t| t.token_id.clone()).collect()
    }

    #[must_use]
    pub fn hours_until_expiry(&self, now: DateTime<Utc>) -> Option<f64> {
        self.end_date
            .map(|end| (end - now).num_seconds() as f64 / 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_market() -> MarketInfo {
        MarketInfo::new(
            ConditionId::new("cond-1"),
            "Will CPI be above 3.0%?",
            vec![
                OutcomeToken::new(TokenId::new("t_yes"), "Yes"),
                OutcomeToken::new(TokenId::new("t_no"), "No"),
            ],
            true,
            false,
            false,
            true,
            Some(Utc::now() + chrono::Duration::hours(48)),
            vec!["economics".to_string(), "fed".to_string()],
            200,
        )
    }

    #[test]
    fn is_binary_true_for_two_outcomes() {
        assert!(binary_market().is_binary());
    }

    #[test]
    fn outcome_by_name_is_case_insensitive() {
        let m = binary_market();
        assert_eq!(m.outcome_by_name("yes").unwrap().outcome(), "Yes");
        assert_eq!(m.outcome_by_name("NO").unwrap().outcome(), "No");
        assert!(m.outcome_by_name("maybe").is_none());
    }

    #[test]
    fn token_ids_preserves_order() {
        let m = binary_market();
        assert_eq!(
            m.token_ids(),
            vec![TokenId::new("t_yes"), TokenId::new("t_no")]
        );
    }

    #[test]
    fn hours_until_expiry_is_none_without_end_date() {
        let mut m = binary_market();
        m.end_date = None;
        assert_eq!(m.hours_until_expiry(Utc::now()), None);
    }
}
