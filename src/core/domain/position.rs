//! Open position bookkeeping. No persistence — positions live only as long
//! as the process runs (§1 Non-goals).

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::id::{ConditionId, TokenId};
use super::pipeline::Side;

#[derive(Debug, Clone)]
pub struct Position {
    token_id: TokenId,
    condition_id: ConditionId,
    side: Side,
    entry_price: Decimal,
    size: Decimal,
    opened_at: DateTime<Utc>,
    last_updated: DateTime<Utc>,
}

impl Position {
    #[must_use]
    pub fn open(
        token_id: TokenId,
        condition_id: ConditionId,
        side: Side,
        entry_price: Decimal,
        size: Decimal,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            token_id,
            condition_id,
            side,
            entry_price,
            size,
            opened_at: now,
            last_updated: now,
        }
    }

    #[must_use]
    pub const fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[must_use]
    pub const fn condition_id(&self) -> &ConditionId {
        &self.condition_id
    }

    #[must_use]
    pub const fn side(&self) -> Side {
        self.side
    }

    #[must_use]
    pub const fn entry_price(&self) -> Decimal {
        self.entry_price
    }

    #[must_use]
    pub const fn size(&self) -> Decimal {
        self.size
    }

    #[must_use]
    pub const fn opened_at(&self) -> DateTime<Utc> {
        self.opened_at
    }

    #[must_use]
    pub const fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    #[must_use]
    pub fn usd_exposure(&self) -> Decimal {
        self.entry_price * self.size
    }

    /// Apply a same-direction fill: weighted-average the entry price.
    pub fn average_in(&mut self, fill_price: Decimal, fill_size: Decimal, now: DateTime<Utc>) {
        let total_size = self.size + fill_size;
        self.entry_price =
            (self.entry_price * self.size + fill_price * fill_size) / total_size;
        self.size = total_size;
        self.last_updated = now;
    }

    /// Apply an opposite-direction fill, returning the size actually closed.
    /// Returns `None` (caller removes the position) if the fill closes it
    /// fully or over-fills it; returns `Some(remaining_size)` on a partial
    /// reduction.
    #[must_use]
    pub fn reduce(&mut self, fill_size: Decimal, now: DateTime<Utc>) -> Option<Decimal> {
        if fill_size >= self.size {
            return None;
        }
        self.size -= fill_size;
        self.last_updated = now;
        Some(self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn base_position() -> Position {
        Position::open(
            TokenId::new("t"),
            ConditionId::new("c"),
            Side::Buy,
            dec!(0.50),
            dec!(100),
            Utc::now(),
        )
    }

    #[test]
    fn average_in_computes_weighted_average_price() {
        let mut p = base_position();
        p.average_in(dec!(0.60), dec!(100), Utc::now());
        assert_eq!(p.entry_price(), dec!(0.55));
        assert_eq!(p.size(), dec!(200));
    }

    #[test]
    fn reduce_partial_keeps_entry_price() {
        let mut p = base_position();
        let remaining = p.reduce(dec!(40), Utc::now());
        assert_eq!(remaining, Some(dec!(60)));
        assert_eq!(p.entry_price(), dec!(0.50));
    }

    #[test]
    fn reduce_full_or_over_closes_position() {
        let mut p = base_position();
        assert_eq!(p.reduce(dec!(100), Utc::now()), None);
        let mut p2 = base_position();
        assert_eq!(p2.reduce(dec!(150), Utc::now()), None);
    }
}
