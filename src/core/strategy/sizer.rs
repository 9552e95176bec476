//! Converts a [`Signal`] into a sized [`TradeAction`], applying Kelly sizing
//! (optional), depth caps, and a minimum-profit floor.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::core::domain::{OrderType, Side, Signal, TradeAction};
use crate::core::strategy::config::{SizingLimits, StrategyConfig};

pub struct PositionSizer {
    config: StrategyConfig,
    limits: SizingLimits,
}

impl PositionSizer {
    #[must_use]
    pub const fn new(config: StrategyConfig, limits: SizingLimits) -> Self {
        Self { config, limits }
    }

    #[must_use]
    pub fn size(&self, signal: Signal) -> Option<TradeAction> {
        let mut size_usd = self.config.base_size_usd;

        if self.config.use_kelly_sizing {
            let kelly = self.kelly_size(&signal);
            if kelly > Decimal::ZERO {
                size_usd = kelly;
            }
        }

        size_usd = size_usd.min(self.config.max_size_usd);
        size_usd = self.cap_to_depth(size_usd, &signal);

        if size_usd <= Decimal::ZERO {
            return None;
        }

        let price = signal.current_price();
        if price <= Decimal::ZERO {
            return None;
        }

        let size_tokens = size_usd / price;
        let estimated_profit = size_tokens * signal.edge();
        if estimated_profit < self.limits.min_profit_usd {
            return None;
        }

        let side = signal.direction();
        let order_type = self.config.default_order_type;
        let max_slippage = self.config.max_slippage;
        let reason = format!(
            "edge={:.4} conf={:.2} size=${:.2}",
            signal.edge(),
            signal.confidence(),
            size_usd
        );
        let token_id = signal.match_result().target_token_id().clone();

        Some(TradeAction::new(
            signal,
            token_id,
            side,
            price,
            size_tokens,
            order_type,
            max_slippage,
            estimated_profit,
            reason,
        ))
    }

    /// Fractional Kelly: `f* = (p*b - q) / b`, scaled by `kelly_fraction` and
    /// applied against `max_size_usd` as the notional bankroll.
    fn kelly_size(&self, signal: &Signal) -> Decimal {
        let p = Decimal::try_from(signal.confidence()).unwrap_or(Decimal::ZERO);
        let q = Decimal::ONE - p;
        let price = signal.current_price();
        if price <= Decimal::ZERO || price >= Decimal::ONE {
            return Decimal::ZERO;
        }

        let b = match signal.direction() {
            Side::Buy => (Decimal::ONE - price) / price,
            Side::Sell => price / (Decimal::ONE - price),
        };
        if b <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        let kelly_f = (p * b - q) / b;
        if kelly_f <= Decimal::ZERO {
            return Decimal::ZERO;
        }

        kelly_f * self.config.kelly_fraction * self.config.max_size_usd
    }

    fn cap_to_depth(&self, size_usd: Decimal, signal: &Signal) -> Decimal {
        let depth = signal.match_result().opportunity().depth_usd();
        if depth <= Decimal::ZERO {
            return Decimal::ZERO;
        }
        let max_from_depth = depth * self.config.max_depth_fraction;
        size_usd.min(max_from_depth)
    }
}

#[allow(dead_code)]
const fn _assert_order_type_default_is_fok(order_type: OrderType) -> bool {
    matches!(order_type, OrderType::Fok)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{
        Category, ConditionId, FeedEvent, FeedEventKind, FeedKind, MarketInfo, MarketOpportunity, MatchResult,
        OutcomeToken, OutcomeType, TokenId,
    };
    use chrono::Utc;
    use std::collections::HashMap;

    fn signal(depth_usd: Decimal, edge: Decimal, confidence: f64) -> Signal {
        let market = MarketInfo::new(
            ConditionId::new("c1"),
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
            Some(dec!(0.03)),
            depth_usd,
            depth_usd / dec!(2),
            depth_usd / dec!(2),
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
        let m = MatchResult::new(event, opp, TokenId::new("yes"), confidence);
        Signal::new(m, dec!(0.99), confidence, Side::Buy, dec!(0.93), edge)
    }

    #[test]
    fn sizes_within_base_size_when_profitable() {
        let sizer = PositionSizer::new(StrategyConfig::default(), SizingLimits::default());
        let action = sizer.size(signal(dec!(50_000), dec!(0.06), 0.95)).unwrap();
        assert_eq!(action.side(), Side::Buy);
        assert!(action.size() > Decimal::ZERO);
    }

    #[test]
    fn rejects_when_below_min_profit() {
        let sizer = PositionSizer::new(StrategyConfig::default(), SizingLimits::default());
        assert!(sizer.size(signal(dec!(50_000), dec!(0.0001), 0.95)).is_none());
    }

    #[test]
    fn caps_size_to_depth_fraction() {
        let mut config = StrategyConfig::default();
        config.base_size_usd = dec!(100_000);
        let sizer = PositionSizer::new(config, SizingLimits::default());
        let action = sizer.size(signal(dec!(1000), dec!(0.06), 0.95));
        assert!(action.is_none() || action.unwrap().size() * dec!(0.93) <= dec!(200.01));
    }
}
