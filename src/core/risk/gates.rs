//! Pure risk gate functions. Each takes the state it needs and returns a
//! [`RiskVerdict`] — a rejection here is a normal outcome, not an error.

use rust_decimal::Decimal;

use crate::core::domain::TradeAction;
use crate::core::risk::config::RiskConfig;
use crate::core::risk::positions::PositionBook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskRejectionReason {
    KillSwitchActive,
    DailyLossLimit,
    PositionConcentration,
    MaxConcurrentPositions,
    OrderbookDepth,
    SpreadTooWide,
    MarketNotActive,
    UmaExposure,
    FeeRateTooHigh,
}

#[derive(Debug, Clone)]
pub struct RiskVerdict {
    approved: bool,
    reason: Option<RiskRejectionReason>,
    detail: Option<String>,
}

impl RiskVerdict {
    #[must_use]
    pub const fn approved() -> Self {
        Self {
            approved: true,
            reason: None,
            detail: None,
        }
    }

    #[must_use]
    pub fn rejected(reason: RiskRejectionReason, detail: impl Into<String>) -> Self {
        Self {
            approved: false,
            reason: Some(reason),
            detail: Some(detail.into()),
        }
    }

    #[must_use]
    pub const fn is_approved(&self) -> bool {
        self.approved
    }

    #[must_use]
    pub const fn reason(&self) -> Option<RiskRejectionReason> {
        self.reason
    }

    #[must_use]
    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }
}

#[must_use]
pub fn check_kill_switch(killed: bool) -> RiskVerdict {
    if killed {
        return RiskVerdict::rejected(
            RiskRejectionReason::KillSwitchActive,
            "kill switch is active, all trading halted",
        );
    }
    RiskVerdict::approved()
}

#[must_use]
pub fn check_daily_loss(realized_today: Decimal, config: &RiskConfig) -> RiskVerdict {
    if realized_today < -config.max_daily_loss_usd {
        return RiskVerdict::rejected(
            RiskRejectionReason::DailyLossLimit,
            format!("daily loss {realized_today} exceeds -{} limit", config.max_daily_loss_usd),
        );
    }
    RiskVerdict::approved()
}

#[must_use]
pub fn check_position_concentration(action: &TradeAction, positions: &PositionBook, config: &RiskConfig) -> RiskVerdict {
    let condition_id = action.signal().match_result().opportunity().condition_id();
    let existing_exposure = positions.exposure_for_condition(condition_id.as_str());
    let new_exposure = action.price() * action.size();
    let total = existing_exposure + new_exposure;
    let limit = config.bankroll_usd * config.max_bankroll_pct_per_event;

    if total > limit {
        return RiskVerdict::rejected(
            RiskRejectionReason::PositionConcentration,
            format!(
                "event exposure {total} would exceed {limit} limit ({}% of {})",
                config.max_bankroll_pct_per_event * Decimal::from(100),
                config.bankroll_usd
            ),
        );
    }
    RiskVerdict::approved()
}

#[must_use]
pub fn check_max_concurrent_positions(positions: &PositionBook, config: &RiskConfig) -> RiskVerdict {
    if positions.count() >= config.max_concurrent_positions {
        return RiskVerdict::rejected(
            RiskRejectionReason::MaxConcurrentPositions,
            format!("{} open positions >= {} limit", positions.count(), config.max_concurrent_positions),
        );
    }
    RiskVerdict::approved()
}

#[must_use]
pub fn check_orderbook_depth(action: &TradeAction, config: &RiskConfig) -> RiskVerdict {
    let depth = action.signal().match_result().opportunity().depth_usd();
    if depth < config.min_orderbook_depth_usd {
        return RiskVerdict::rejected(
            RiskRejectionReason::OrderbookDepth,
            format!("depth {depth} < {} minimum", config.min_orderbook_depth_usd),
        );
    }
    RiskVerdict::approved()
}

#[must_use]
pub fn check_spread(action: &TradeAction, config: &RiskConfig) -> RiskVerdict {
    let Some(spread) = action.signal().match_result().opportunity().spread() else {
        return RiskVerdict::approved();
    };
    if spread > config.max_spread {
        return RiskVerdict::rejected(
            RiskRejectionReason::SpreadTooWide,
            format!("spread {spread} > {} maximum", config.max_spread),
        );
    }
    RiskVerdict::approved()
}
