//! Turns a [`MatchResult`] into a directional, priced [`Signal`] once fair
//! value diverges from the book by more than the configured edge.

use chrono::Utc;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::domain::{FeedKind, MatchResult, OutcomeType, Side, Signal};
use crate::core::strategy::config::StrategyConfig;

const DETERMINISTIC_FAIR_VALUE: Decimal = dec!(0.99);

fn direction_and_price(
    fair_value: Decimal,
    best_bid: Option<Decimal>,
    best_ask: Option<Decimal>,
) -> Option<(Side, Decimal)> {
    if let Some(ask) = best_ask {
        if fair_value > ask {
            return Some((Side::Buy, ask));
        }
    }
    if let Some(bid) = best_bid {
        if fair_value < bid {
            return Some((Side::Sell, bid));
        }
    }
    None
}

pub struct SignalGenerator {
    config: StrategyConfig,
}

impl SignalGenerator {
    #[must_use]
    pub const fn new(config: StrategyConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn evaluate(&self, m: MatchResult) -> Option<Signal> {
        let now = Utc::now();
        let event = m.event();
        if event.staleness_secs(now) > self.config.max_staleness_secs {
            return None;
        }

        match event.outcome_type() {
            OutcomeType::Categorical => self.evaluate_categorical(m),
            OutcomeType::Numeric | OutcomeType::Boolean => self.evaluate_numeric(m),
        }
    }

    fn evaluate_categorical(&self, m: MatchResult) -> Option<Signal> {
        let confidence = 0.99;
        let opp = m.opportunity();
        let (direction, current_price) =
            direction_and_price(DETERMINISTIC_FAIR_VALUE, opp.best_bid(), opp.best_ask())?;
        let edge = (DETERMINISTIC_FAIR_VALUE - current_price).abs();

        if edge < self.config.min_edge_for(FeedKind::Sports) {
            return None;
        }

        Some(Signal::new(m, DETERMINISTIC_FAIR_VALUE, confidence, direction, current_price, edge))
    }

    fn evaluate_numeric(&self, m: MatchResult) -> Option<Signal> {
        let feed_kind = m.event().feed_kind();
        let confidence = if feed_kind == FeedKind::Crypto {
            if m.event().metadata_bool("cross_validated") { 0.92 } else { 0.85 }
        } else {
            0.99
        };

        let opp = m.opportunity();
        let (direction, current_price) =
            direction_and_price(DETERMINISTIC_FAIR_VALUE, opp.best_bid(), opp.best_ask())?;
        let edge = (DETERMINISTIC_FAIR_VALUE - current_price).abs();

        if edge < self.config.min_edge_for(feed_kind) {
            return None;
        }

        Some(Signal::new(m, DETERMINISTIC_FAIR_VALUE, confidence, direction, current_price, edge))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{
        Category, ConditionId, FeedEvent, FeedEventKind, MarketInfo, MarketOpportunity, OutcomeToken, TokenId,
    };
    use std::collections::HashMap;

    fn opportunity(best_bid: Option<Decimal>, best_ask: Option<Decimal>, category: Category) -> MarketOpportunity {
        let market = MarketInfo::new(
            ConditionId::new("c1"),
            "Will CPI be above 3.0%?",
            vec![OutcomeToken::new(TokenId::new("yes"), "Yes")],
            true,
            false,
            false,
            true,
            None,
            vec![],
            0,
        );
        MarketOpportunity::new(
            market,
            category,
            TokenId::new("yes"),
            best_bid,
            best_ask,
            None,
            dec!(5000),
            dec!(2500),
            dec!(2500),
            0.8,
            Utc::now(),
        )
    }

    fn economic_event() -> FeedEvent {
        FeedEvent::new(
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
        )
    }

    #[test]
    fn underpriced_ask_produces_buy_signal() {
        let gen = SignalGenerator::new(StrategyConfig::default());
        let opp = opportunity(Some(dec!(0.90)), Some(dec!(0.93)), Category::Economic);
        let m = MatchResult::new(economic_event(), opp, TokenId::new("yes"), 0.95);
        let signal = gen.evaluate(m).unwrap();
        assert_eq!(signal.direction(), Side::Buy);
        assert_eq!(signal.current_price(), dec!(0.93));
    }

    #[test]
    fn no_signal_when_already_priced_in() {
        let gen = SignalGenerator::new(StrategyConfig::default());
        let opp = opportunity(Some(dec!(0.985)), Some(dec!(0.99)), Category::Economic);
        let m = MatchResult::new(economic_event(), opp, TokenId::new("yes"), 0.95);
        assert!(gen.evaluate(m).is_none());
    }

    #[test]
    fn stale_event_is_rejected() {
        let mut config = StrategyConfig::default();
        config.max_staleness_secs = 1;
        let gen = SignalGenerator::new(config);
        let opp = opportunity(Some(dec!(0.90)), Some(dec!(0.93)), Category::Economic);
        let event = FeedEvent::new(
            FeedKind::Economic,
            FeedEventKind::DataReleased,
            "CPI",
            "3.5",
            Some(dec!(3.5)),
            OutcomeType::Numeric,
            Utc::now() - chrono::Duration::seconds(30),
            Utc::now() - chrono::Duration::seconds(30),
            HashMap::new(),
            serde_json::Value::Null,
        );
        let m = MatchResult::new(event, opp, TokenId::new("yes"), 0.95);
        assert!(gen.evaluate(m).is_none());
    }
}
