//! In-memory open-position book, keyed by token id.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use crate::core::domain::{ExecutionResult, Position, TokenId};

#[derive(Debug, Clone, Default)]
pub struct PositionBook {
    positions: HashMap<TokenId, Position>,
}

impl PositionBook {
    #[must_use]
    pub fn new() -> Self {
        Self {
            positions: HashMap::new(),
        }
    }

    #[must_use]
    pub fn positions(&self) -> &HashMap<TokenId, Position> {
        &self.positions
    }

    #[must_use]
    pub fn count(&self) -> usize {
        self.positions.len()
    }

    #[must_use]
    pub fn get(&self, token_id: &TokenId) -> Option<&Position> {
        self.positions.get(token_id)
    }

    #[must_use]
    pub fn total_exposure_usd(&self) -> Decimal {
        self.positions.values().map(Position::usd_exposure).sum()
    }

    #[must_use]
    pub fn exposure_for_condition(&self, condition_id: &str) -> Decimal {
        self.positions
            .values()
            .filter(|p| p.condition_id().as_str() == condition_id)
            .map(Position::usd_exposure)
            .sum()
    }

    /// Fold a fill into the book. Returns the opened/updated position, or
    /// `None` when the fill fully closed (or over-filled) an existing one.
    pub fn record_fill(&mut self, result: &ExecutionResult, now: DateTime<Utc>) -> Option<Position> {
        let action = result.action();
        let token_id = action.token_id().clone();
        let fill_price = result.fill_price().unwrap_or_else(|| action.price());
        let fill_size = result.fill_size().unwrap_or_else(|| action.size());
        let fill_side = action.side();

        let Some(existing) = self.positions.get_mut(&token_id) else {
            let condition_id = action.signal().match_result().opportunity().condition_id().clone();
            let position = Position::open(token_id.clone(), condition_id, fill_side, fill_price, fill_size, now);
            self.positions.insert(token_id, position.clone());
            return Some(position);
        };

        if existing.side() == fill_side {
            existing.average_in(fill_price, fill_size, now);
            return Some(existing.clone());
        }

        match existing.reduce(fill_size, now) {
            Some(_) => Some(existing.clone()),
            None => {
                self.positions.remove(&token_id);
                None
            }
        }
    }

    pub fn clear(&mut self) {
        self.positions.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{
        Category, ConditionId as Cid, FeedEvent, FeedEventKind, FeedKind, MarketInfo, MarketOpportunity, MatchResult,
        OrderType, OutcomeToken, OutcomeType, Side, Signal, TradeAction,
    };
    use rust_decimal_macros::dec;
    use std::collections::HashMap as StdHashMap;

    fn fill(side: Side, price: Decimal, size: Decimal) -> ExecutionResult {
        let market = MarketInfo::new(
            Cid::new("c1"),
            "q",
            vec![OutcomeToken::new(TokenId::new("yes"), "Yes")],
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
            Category::Economic,
            TokenId::new("yes"),
            Some(dec!(0.90)),
            Some(dec!(0.93)),
            None,
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
            StdHashMap::new(),
            serde_json::Value::Null,
        );
        let m = MatchResult::new(event, opp, TokenId::new("yes"), 0.95);
        let signal = Signal::new(m, dec!(0.99), 0.95, side, price, dec!(0.06));
        let action = TradeAction::new(signal, TokenId::new("yes"), side, price, size, OrderType::Fok, dec!(0.01), dec!(10), "r");
        ExecutionResult::success(action, price, size, Utc::now())
    }

    #[test]
    fn opening_fill_creates_a_position() {
        let mut book = PositionBook::new();
        let pos = book.record_fill(&fill(Side::Buy, dec!(0.50), dec!(100)), Utc::now());
        assert!(pos.is_some());
        assert_eq!(book.count(), 1);
    }

    #[test]
    fn same_direction_fill_averages_in() {
        let mut book = PositionBook::new();
        book.record_fill(&fill(Side::Buy, dec!(0.50), dec!(100)), Utc::now());
        book.record_fill(&fill(Side::Buy, dec!(0.60), dec!(100)), Utc::now());
        let pos = book.get(&TokenId::new("yes")).unwrap();
        assert_eq!(pos.entry_price(), dec!(0.55));
        assert_eq!(pos.size(), dec!(200));
    }

    #[test]
    fn opposite_direction_full_fill_closes_position() {
        let mut book = PositionBook::new();
        book.record_fill(&fill(Side::Buy, dec!(0.50), dec!(100)), Utc::now());
        let remaining = book.record_fill(&fill(Side::Sell, dec!(0.60), dec!(100)), Utc::now());
        assert!(remaining.is_none());
        assert_eq!(book.count(), 0);
    }

    #[test]
    fn exposure_for_condition_sums_matching_positions() {
        let mut book = PositionBook::new();
        book.record_fill(&fill(Side::Buy, dec!(0.50), dec!(100)), Utc::now());
        assert_eq!(book.exposure_for_condition("c1"), dec!(50));
        assert_eq!(book.exposure_for_condition("other"), dec!(0));
    }
}
