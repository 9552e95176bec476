//! Per-token order-signing parameters, cached with a staleness window.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy)]
pub struct MarketParams {
    tick_size: Decimal,
    neg_risk: bool,
    fee_rate_bps: u32,
    fetched_at: DateTime<Utc>,
}

impl MarketParams {
    #[must_use]
    pub const fn new(
        tick_size: Decimal,
        neg_risk: bool,
        fee_rate_bps: u32,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            tick_size,
            neg_risk,
            fee_rate_bps,
            fetched_at,
        }
    }

    #[must_use]
    pub const fn tick_size(&self) -> Decimal {
        self.tick_size
    }

    #[must_use]
    pub const fn neg_risk(&self) -> bool {
        self.neg_risk
    }

    #[must_use]
    pub const fn fee_rate_bps(&self) -> u32 {
        self.fee_rate_bps
    }

    #[must_use]
    pub const fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, ttl_secs: i64) -> bool {
        (now - self.fetched_at).num_seconds() > ttl_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn is_stale_past_ttl() {
        let fetched = Utc::now() - chrono::Duration::seconds(301);
        let params = MarketParams::new(dec!(0.01), false, 0, fetched);
        assert!(params.is_stale(Utc::now(), 300));
    }

    #[test]
    fn is_not_stale_within_ttl() {
        let fetched = Utc::now() - chrono::Duration::seconds(10);
        let params = MarketParams::new(dec!(0.01), false, 0, fetched);
        assert!(!params.is_stale(Utc::now(), 300));
    }
}
