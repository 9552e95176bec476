//! Pre-screens [`MarketOpportunity`] objects before they enter the matching
//! pipeline. Distinct from [`crate::core::risk::gates`], which checks sized
//! [`TradeAction`]s at execution time — this operates earlier, at the
//! scanner/engine boundary, so a bad market never gets that far. Like
//! [`crate::core::strategy::prioritizer::OpportunityPrioritizer`], nothing
//! wires this into [`crate::core::strategy::ArbEngine`] today; it is meant to
//! be composed in front of the scanner by whatever owns that wiring.

use rust_decimal::Decimal;

use crate::core::domain::{MarketOpportunity, Side};
use crate::core::risk::config::RiskConfig;
use crate::core::risk::gates::{RiskRejectionReason, RiskVerdict};
use crate::core::risk::oracle_monitor::OracleMonitor;

pub struct MarketQualityFilter {
    config: RiskConfig,
}

impl MarketQualityFilter {
    #[must_use]
    pub const fn new(config: RiskConfig) -> Self {
        Self { config }
    }

    /// Runs every check, short-circuiting on the first rejection.
    #[must_use]
    pub fn check(&self, opportunity: &MarketOpportunity, side: Option<Side>, oracle: Option<&OracleMonitor>) -> RiskVerdict {
        for verdict in [
            self.check_market_status(opportunity),
            self.check_depth(opportunity, side),
            self.check_spread(opportunity),
            self.check_disputes(opportunity, oracle),
            self.check_fee_rate(opportunity),
        ] {
            if !verdict.is_approved() {
                return verdict;
            }
        }
        RiskVerdict::approved()
    }

    /// Runs every check and returns every rejection, for diagnostics.
    #[must_use]
    pub fn check_all(&self, opportunity: &MarketOpportunity, side: Option<Side>, oracle: Option<&OracleMonitor>) -> Vec<RiskVerdict> {
        [
            self.check_market_status(opportunity),
            self.check_depth(opportunity, side),
            self.check_spread(opportunity),
            self.check_disputes(opportunity, oracle),
            self.check_fee_rate(opportunity),
        ]
        .into_iter()
        .filter(|v| !v.is_approved())
        .collect()
    }

    fn check_market_status(&self, opportunity: &MarketOpportunity) -> RiskVerdict {
        let info = opportunity.market();
        let condition_id = opportunity.condition_id();
        if !info.active() {
            return RiskVerdict::rejected(RiskRejectionReason::MarketNotActive, format!("market {condition_id} is not active"));
        }
        if info.closed() {
            return RiskVerdict::rejected(RiskRejectionReason::MarketNotActive, format!("market {condition_id} is closed"));
        }
        if info.flagged() {
            return RiskVerdict::rejected(RiskRejectionReason::MarketNotActive, format!("market {condition_id} is flagged"));
        }
        if !info.accepting_orders() {
            return RiskVerdict::rejected(
                RiskRejectionReason::MarketNotActive,
                format!("market {condition_id} is not accepting orders"),
            );
        }
        RiskVerdict::approved()
    }

    /// `Buy` checks ask depth (we buy from asks), `Sell` checks bid depth (we
    /// sell into bids). Falls back to total depth with no side or zero
    /// directional depth.
    fn check_depth(&self, opportunity: &MarketOpportunity, side: Option<Side>) -> RiskVerdict {
        let min_depth = self.config.min_orderbook_depth_usd;
        let (depth, label) = match side {
            Some(Side::Buy) if opportunity.ask_depth_usd() > Decimal::ZERO => (opportunity.ask_depth_usd(), "ask"),
            Some(Side::Sell) if opportunity.bid_depth_usd() > Decimal::ZERO => (opportunity.bid_depth_usd(), "bid"),
            _ => (opportunity.depth_usd(), "total"),
        };

        if depth < min_depth {
            return RiskVerdict::rejected(
                RiskRejectionReason::OrderbookDepth,
                format!("market {} {label} depth {depth} < {min_depth} minimum", opportunity.condition_id()),
            );
        }
        RiskVerdict::approved()
    }

    fn check_spread(&self, opportunity: &MarketOpportunity) -> RiskVerdict {
        let Some(spread) = opportunity.spread() else {
            return RiskVerdict::approved();
        };
        if spread > self.config.max_spread {
            return RiskVerdict::rejected(
                RiskRejectionReason::SpreadTooWide,
                format!("market {} spread {spread} > {} maximum", opportunity.condition_id(), self.config.max_spread),
            );
        }
        RiskVerdict::approved()
    }

    fn check_disputes(&self, opportunity: &MarketOpportunity, oracle: Option<&OracleMonitor>) -> RiskVerdict {
        let Some(oracle) = oracle else {
            return RiskVerdict::approved();
        };
        if oracle.is_disputed(opportunity.condition_id().as_str()) {
            return RiskVerdict::rejected(
                RiskRejectionReason::UmaExposure,
                format!("market {} has an active UMA dispute", opportunity.condition_id()),
            );
        }
        RiskVerdict::approved()
    }

    /// Markets with dynamic fees are rejected at the market-quality layer
    /// unconditionally; [`crate::core::risk::gates`] handles any profit-based
    /// override at execution time.
    fn check_fee_rate(&self, opportunity: &MarketOpportunity) -> RiskVerdict {
        let fee_rate_bps = opportunity.market().fee_rate_bps();
        if fee_rate_bps <= self.config.max_fee_rate_bps {
            return RiskVerdict::approved();
        }
        RiskVerdict::rejected(
            RiskRejectionReason::FeeRateTooHigh,
            format!(
                "market {} fee rate {fee_rate_bps}bps > {}bps limit",
                opportunity.condition_id(),
                self.config.max_fee_rate_bps
            ),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{Category, ConditionId, MarketInfo, OutcomeToken, TokenId};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn opportunity(fee_rate_bps: u32, depth_usd: Decimal, spread: Option<Decimal>, active: bool) -> MarketOpportunity {
        let market = MarketInfo::new(
            ConditionId::new("c1"),
            "q",
            vec![OutcomeToken::new(TokenId::new("yes"), "Yes")],
            active,
            false,
            false,
            true,
            None,
            vec![],
            fee_rate_bps,
        );
        MarketOpportunity::new(
            market,
            Category::Economic,
            TokenId::new("yes"),
            Some(dec!(0.49)),
            Some(dec!(0.51)),
            spread,
            depth_usd,
            depth_usd / dec!(2),
            depth_usd / dec!(2),
            0.8,
            Utc::now(),
        )
    }

    #[test]
    fn rejects_inactive_markets() {
        let filter = MarketQualityFilter::new(RiskConfig::default());
        let verdict = filter.check(&opportunity(0, dec!(5000), None, false), None, None);
        assert_eq!(verdict.reason(), Some(RiskRejectionReason::MarketNotActive));
    }

    #[test]
    fn rejects_thin_orderbooks() {
        let filter = MarketQualityFilter::new(RiskConfig::default());
        let verdict = filter.check(&opportunity(0, dec!(10), None, true), None, None);
        assert_eq!(verdict.reason(), Some(RiskRejectionReason::OrderbookDepth));
    }

    #[test]
    fn rejects_nonzero_fee_rate_by_default() {
        let filter = MarketQualityFilter::new(RiskConfig::default());
        let verdict = filter.check(&opportunity(25, dec!(5000), None, true), None, None);
        assert_eq!(verdict.reason(), Some(RiskRejectionReason::FeeRateTooHigh));
    }

    #[test]
    fn approves_clean_market() {
        let filter = MarketQualityFilter::new(RiskConfig::default());
        let verdict = filter.check(&opportunity(0, dec!(5000), Some(dec!(0.02)), true), None, None);
        assert!(verdict.is_approved());
    }

    #[test]
    fn check_all_collects_every_rejection() {
        let filter = MarketQualityFilter::new(RiskConfig::default());
        let verdicts = filter.check_all(&opportunity(25, dec!(1), Some(dec!(0.9)), false), None, None);
        assert!(verdicts.len() >= 3);
    }
}
