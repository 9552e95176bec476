//! The chained records produced by the arbitrage pipeline: a [`FeedEvent`]
//! becomes a [`MatchResult`], which may become a [`Signal`], which may become
//! a [`TradeAction`], which is executed into an [`ExecutionResult`]. Each
//! stage carries the previous one so downstream consumers (metrics, alerts)
//! have full context without re-joining records.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::feed_event::FeedEvent;
use super::id::TokenId;
use super::opportunity::MarketOpportunity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Buy,
    Sell,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    Fok,
    Gtc,
}

/// Result of matching a feed event against a tracked opportunity.
#[derive(Debug, Clone)]
pub struct MatchResult {
    event: FeedEvent,
    opportunity: MarketOpportunity,
    target_token_id: TokenId,
    confidence: f64,
}

impl MatchResult {
    #[must_use]
    pub fn new(
        event: FeedEvent,
        opportunity: MarketOpportunity,
        target_token_id: TokenId,
        confidence: f64,
    ) -> Self {
        debug_assert!(
            opportunity
                .market()
                .tokens()
                .iter()
                .any(|t| *t.token_id() == target_token_id),
            "matched token must belong to the opportunity"
        );
        Self {
            event,
            opportunity,
            target_token_id,
            confidence,
        }
    }

    #[must_use]
    pub const fn event(&self) -> &FeedEvent {
        &self.event
    }

    #[must_use]
    pub const fn opportunity(&self) -> &MarketOpportunity {
        &self.opportunity
    }

    #[must_use]
    pub const fn target_token_id(&self) -> &TokenId {
        &self.target_token_id
    }

    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }
}

/// A [`MatchResult`] ranked against its peers, with its score breakdown kept
/// for observability.
#[derive(Debug, Clone)]
pub struct PrioritizedMatch {
    match_result: MatchResult,
    priority_score: f64,
    score_components: std::collections::HashMap<String, f64>,
    rank: usize,
}

impl PrioritizedMatch {
    #[must_use]
    pub fn new(
        match_result: MatchResult,
        priority_score: f64,
        score_components: std::collections::HashMap<String, f64>,
        rank: usize,
    ) -> Self {
        Self {
            match_result,
            priority_score,
            score_components,
            rank,
        }
    }

    #[must_use]
    pub const fn match_result(&self) -> &MatchResult {
        &self.match_result
    }

    #[must_use]
    pub const fn priority_score(&self) -> f64 {
        self.priority_score
    }

    #[must_use]
    pub fn score_components(&self) -> &std::collections::HashMap<String, f64> {
        &self.score_components
    }

    #[must_use]
    pub const fn rank(&self) -> usize {
        self.rank
    }
}

/// A priced, directional trade hypothesis derived from a [`MatchResult`].
#[derive(Debug, Clone)]
pub struct Signal {
    match_result: MatchResult,
    fair_value: Decimal,
    confidence: f64,
    direction: Side,
    current_price: Decimal,
    edge: Decimal,
}

impl Signal {
    #[must_use]
    pub fn new(
        match_result: MatchResult,
        fair_value: Decimal,
        confidence: f64,
        direction: Side,
        current_price: Decimal,
        edge: Decimal,
    ) -> Self {
        Self {
            match_result,
            fair_value,
            confidence,
            direction,
            current_price,
            edge,
        }
    }

    #[must_use]
    pub const fn match_result(&self) -> &MatchResult {
        &self.match_result
    }

    #[must_use]
    pub const fn fair_value(&self) -> Decimal {
        self.fair_value
    }

    #[must_use]
    pub const fn confidence(&self) -> f64 {
        self.confidence
    }

    #[must_use]
    pub const fn direction(&self) -> Side {
        self.direction
    }

    #[must_use]
    pub const fn current_price(&self) -> Decimal {
        self.current_price
    }

    #[must_use]
    pub const fn edge(&self) -> Decimal {
        self.edge
    }
}

/// A sized order ready for submission.
#[derive(Debug, Clone)]
pub struct TradeAction {
    signal: Signal,
    token_id: TokenId,
    side: Side,
    price: Decimal,
    size: Decimal,
    order_type: OrderType,
    max_slippage: Decimal,
    estimated_profit_usd: Decimal,
    reason: String,
}

impl TradeAction {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        signal: Signal,
        token_id: TokenId,
        side: Side,
        price: Decimal,
        size: Decimal,
        order_type: OrderType,
        max_slippage: Decimal,
        estimated_profit_usd: Decimal,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            signal,
            token_id,
            side,
            price,
            size,
            order_type,
            max_slippage,
            estimated_profit_usd,
            reason: reason.into(),
        }
    }

    #[must_use]
    pub const fn signal(&self) -> &Signal {
        &self.signal
    }

    #[must_use]
    pub const fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub const fn price(&self) -> Decimal {
        self.price
    }

    #[must_use]
    pub const fn size(&self) -> Decimal {
        self.size
    }

    #[must_use]
    pub const fn order_type(&self) -> OrderType {
        self.order_type
    }

    #[must_use]
    pub const fn max_slippage(&self) -> Decimal {
        self.max_slippage
    }

    #[must_use]
    pub const fn estimated_profit_usd(&self) -> Decimal {
        self.estimated_profit_usd
    }

    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// Worst acceptable execution price for a market (FOK) order.
    #[must_use]
    pub fn worst_price(&self) -> Decimal {
        match self.side {
            Side::Buy => self.price + self.max_slippage,
            Side::Sell => self.price - self.max_slippage,
        }
    }
}

/// Outcome of submitting a [`TradeAction`] to the venue.
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    action: TradeAction,
    success: bool,
    fill_price: Option<Decimal>,
    fill_size: Option<Decimal>,
    executed_at: DateTime<Utc>,
    error: Option<String>,
}

impl ExecutionResult {
    #[must_use]
    pub fn success(
        action: TradeAction,
        fill_price: Decimal,
        fill_size: Decimal,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            action,
            success: true,
            fill_price: Some(fill_price),
            fill_size: Some(fill_size),
            executed_at,
            error: None,
        }
    }

    #[must_use]
    pub fn failure(action: TradeAction, executed_at: DateTime<Utc>, error: impl Into<String>) -> Self {
        Self {
            action,
            success: false,
            fill_price: None,
            fill_size: None,
            executed_at,
            error: Some(error.into()),
        }
    }

    #[must_use]
    pub const fn action(&self) -> &TradeAction {
        &self.action
    }

    #[must_use]
    pub const fn success(&self) -> bool {
        self.success
    }

    #[must_use]
    pub const fn fill_price(&self) -> Option<Decimal> {
        self.fill_price
    }

    #[must_use]
    pub const fn fill_size(&self) -> Option<Decimal> {
        self.fill_size
    }

    #[must_use]
    pub const fn executed_at(&self) -> DateTime<Utc> {
        self.executed_at
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn worst_price_adds_slippage_for_buy_subtracts_for_sell() {
        let action_buy = TradeAction {
            signal: test_signal(Side::Buy),
            token_id: TokenId::new("t"),
            side: Side::Buy,
            price: dec!(0.50),
            size: dec!(100),
            order_type: OrderType::Fok,
            max_slippage: dec!(0.02),
            estimated_profit_usd: dec!(10),
            reason: "test".into(),
        };
        assert_eq!(action_buy.worst_price(), dec!(0.52));

        let action_sell = TradeAction {
            side: Side::Sell,
            ..action_buy
        };
        assert_eq!(action_sell.worst_price(), dec!(0.48));
    }

    fn test_signal(direction: Side) -> Signal {
        use super::super::market::{MarketInfo, OutcomeToken};
        use super::super::id::ConditionId;
        use crate::core::domain::feed_event::{FeedEventKind, FeedKind, OutcomeType};
        use std::collections::HashMap;

        let market = MarketInfo::new(
            ConditionId::new("c1"),
            "q",
            vec![OutcomeToken::new(TokenId::new("t"), "Yes")],
            true,
            false,
            false,
            true,
            None,
            vec![],
            0,
        );
        let opp = MarketOpportunity::new(
            market,
            super::super::opportunity::Category::Economic,
            TokenId::new("t"),
            Some(dec!(0.49)),
            Some(dec!(0.51)),
            Some(dec!(0.02)),
            dec!(5000),
            dec!(2500),
            dec!(2500),
            0.8,
            Utc::now(),
        );
        let event = FeedEvent::new(
            FeedKind::Economic,
            FeedEventKind::DataReleased,
            "CPI",
            "3.5",
            Some(dec!(3.5)),
            OutcomeType::Numeric,
            Utc::now(),
            Utc::now(),
            HashMap::new(),
            serde_json::Value::Null,
        );
        let match_result = MatchResult::new(event, opp, TokenId::new("t"), 0.95);
        Signal::new(match_result, dec!(0.99), 0.99, direction, dec!(0.50), dec!(0.49))
    }
}
