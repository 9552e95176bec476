//! Tracked market opportunities, as maintained by the scanner.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::id::{ConditionId, TokenId};
use super::market::MarketInfo;

/// Coarse classification used to route matching.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Economic,
    Sports,
    Crypto,
    Politics,
    Other,
}

/// A market currently being tracked by the scanner, with cached book state.
#[derive(Debug, Clone)]
pub struct MarketOpportunity {
    condition_id: ConditionId,
    question: String,
    category: Category,
    token_id: TokenId,
    market: MarketInfo,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
    spread: Option<Decimal>,
    depth_usd: Decimal,
    bid_depth_usd: Decimal,
    ask_depth_usd: Decimal,
    score: f64,
    first_seen: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl MarketOpportunity {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        market: MarketInfo,
        category: Category,
        token_id: TokenId,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
        spread: Option<Decimal>,
        depth_usd: Decimal,
        bid_depth_usd: Decimal,
        ask_depth_usd: Decimal,
        score: f64,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            condition_id: market.condition_id().clone(),
            question: market.question().to_string(),
            category,
            token_id,
            market,
            best_bid,
            best_ask,
            spread,
            depth_usd,
            bid_depth_usd,
            ask_depth_usd,
            score,
            first_seen: now,
            last_updated: now,
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
    pub const fn category(&self) -> Category {
        self.category
    }

    #[must_use]
    pub const fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[must_use]
    pub const fn market(&self) -> &MarketInfo {
        &self.market
    }

    #[must_use]
    pub const fn best_bid(&self) -> Option<Decimal> {
        self.best_bid
    }

    #[must_use]
    pub const fn best_ask(&self) -> Option<Decimal> {
        self.best_ask
    }

    #[must_use]
    pub const fn spread(&self) -> Option<Decimal> {
        self.spread
    }

    #[must_use]
    pub const fn depth_usd(&self) -> Decimal {
        self.depth_usd
    }

    #[must_use]
    pub const fn bid_depth_usd(&self) -> Decimal {
        self.bid_depth_usd
    }

    #[must_use]
    pub const fn ask_depth_usd(&self) -> Decimal {
        self.ask_depth_usd
    }

    #[must_use]
    pub const fn score(&self) -> f64 {
        self.score
    }

    #[must_use]
    pub const fn first_seen(&self) -> DateTime<Utc> {
        self.first_seen
    }

    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Replace book-derived fields and rescore, preserving `first_seen`.
    #[allow(clippy::too_many_arguments)]
    pub fn refresh_book(
        &mut self,
        best_bid: Option<Decimal>,
        best_ask: Option<Decimal>,
        spread: Option<Decimal>,
        depth_usd: Decimal,
        bid_depth_usd: Decimal,
        ask_depth_usd: Decimal,
        score: f64,
        now: DateTime<Utc>,
    ) {
        self.best_bid = best_bid;
        self.best_ask = best_ask;
        self.spread = spread;
        self.depth_usd = depth_usd;
        self.bid_depth_usd = bid_depth_usd;
        self.ask_depth_usd = ask_depth_usd;
        self.score = score;
        self.last_updated = now;
    }

    /// Carry `first_seen` forward from a previous scan of the same condition.
    pub fn preserve_first_seen(&mut self, previous_first_seen: DateTime<Utc>) {
        self.first_seen = previous_first_seen;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::market::OutcomeToken;
    use rust_decimal_macros::dec;

    fn market() -> MarketInfo {
        MarketInfo::new(
            ConditionId::new("c1"),
            "Will CPI be above 3.0%?",
            vec![
                OutcomeToken::new(TokenId::new("t_yes"), "Yes"),
                OutcomeToken::new(TokenId::new("t_no"), "No"),
            ],
            true,
            false,
            false,
            true,
            None,
            vec![],
            100,
        )
    }

    #[test]
    fn refresh_book_preserves_first_seen() {
        let t0 = Utc::now();
        let mut opp = MarketOpportunity::new(
            market(),
            Category::Economic,
            TokenId::new("t_yes"),
            Some(dec!(0.49)),
            Some(dec!(0.51)),
            Some(dec!(0.02)),
            dec!(5000),
            dec!(2500),
            dec!(2500),
            0.8,
            t0,
        );
        let t1 = t0 + chrono::Duration::seconds(30);
        opp.refresh_book(
            Some(dec!(0.50)),
            Some(dec!(0.52)),
            Some(dec!(0.02)),
            dec!(6000),
            dec!(3000),
            dec!(3000),
            0.81,
            t1,
        );
        assert_eq!(opp.first_seen(), t0);
        assert_eq!(opp.last_updated(), t1);
        assert_eq!(opp.best_bid(), Some(dec!(0.50)));
    }
}
