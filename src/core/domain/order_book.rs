//! Order book snapshot and derived liquidity metrics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::id::TokenId;

/// A single price/size level.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PriceLevel {
    price: Decimal,
    size: Decimal,
}

impl PriceLevel {
    #[must_use]
    pub fn new(price: Decimal, size: Decimal) -> Self {
        Self { price, size }
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
    pub fn usd(&self) -> Decimal {
        self.price * self.size
    }
}

/// Book snapshot for one token. Bids are kept sorted descending, asks
/// ascending, as produced by the venue feed.
#[derive(Debug, Clone)]
pub struct OrderBook {
    token_id: TokenId,
    bids: Vec<PriceLevel>,
    asks: Vec<PriceLevel>,
    snapshot_at: DateTime<Utc>,
}

impl OrderBook {
    #[must_use]
    pub fn new(
        token_id: TokenId,
        mut bids: Vec<PriceLevel>,
        mut asks: Vec<PriceLevel>,
        snapshot_at: DateTime<Utc>,
    ) -> Self {
        bids.sort_by(|a, b| b.price.cmp(&a.price));
        asks.sort_by(|a, b| a.price.cmp(&b.price));
        Self {
            token_id,
            bids,
            asks,
            snapshot_at,
        }
    }

    #[must_use]
    pub const fn token_id(&self) -> &TokenId {
        &self.token_id
    }

    #[must_use]
    pub fn bids(&self) -> &[PriceLevel] {
        &self.bids
    }

    #[must_use]
    pub fn asks(&self) -> &[PriceLevel] {
        &self.asks
    }

    #[must_use]
    pub const fn snapshot_at(&self) -> DateTime<Utc> {
        self.snapshot_at
    }

    #[must_use]
    pub fn best_bid(&self) -> Option<Decimal> {
        self.bids.first().map(PriceLevel::price)
    }

    #[must_use]
    pub fn best_ask(&self) -> Option<Decimal> {
        self.asks.first().map(PriceLevel::price)
    }

    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_ask(), self.best_bid()) {
            (Some(ask), Some(bid)) => Some(ask - bid),
            _ => None,
        }
    }

    #[must_use]
    pub fn bid_depth_usd(&self) -> Decimal {
        self.bids.iter().map(PriceLevel::usd).sum()
    }

    #[must_use]
    pub fn ask_depth_usd(&self) -> Decimal {
        self.asks.iter().map(PriceLevel::usd).sum()
    }

    #[must_use]
    pub fn depth_usd(&self) -> Decimal {
        self.bid_depth_usd() + self.ask_depth_usd()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn book() -> OrderBook {
        OrderBook::new(
            TokenId::new("t1"),
            vec![
                PriceLevel::new(dec!(0.48), dec!(1000)),
                PriceLevel::new(dec!(0.49), dec!(500)),
            ],
            vec![
                PriceLevel::new(dec!(0.52), dec!(800)),
                PriceLevel::new(dec!(0.51), dec!(400)),
            ],
            Utc::now(),
        )
    }

    #[test]
    fn bids_sorted_descending_asks_ascending() {
        let b = book();
        assert_eq!(b.bids()[0].price(), dec!(0.49));
        assert_eq!(b.asks()[0].price(), dec!(0.51));
    }

    #[test]
    fn best_bid_ask_and_spread() {
        let b = book();
        assert_eq!(b.best_bid(), Some(dec!(0.49)));
        assert_eq!(b.best_ask(), Some(dec!(0.51)));
        assert_eq!(b.spread(), Some(dec!(0.02)));
    }

    #[test]
    fn empty_book_has_no_spread() {
        let b = OrderBook::new(TokenId::new("t1"), vec![], vec![], Utc::now());
        assert_eq!(b.spread(), None);
        assert_eq!(b.depth_usd(), dec!(0));
    }

    #[test]
    fn depth_sums_both_sides() {
        let b = book();
        assert_eq!(b.bid_depth_usd(), dec!(0.48) * dec!(1000) + dec!(0.49) * dec!(500));
        assert_eq!(b.ask_depth_usd(), dec!(0.52) * dec!(800) + dec!(0.51) * dec!(400));
        assert_eq!(b.depth_usd(), b.bid_depth_usd() + b.ask_depth_usd());
    }
}
