//! Signed-but-unposted orders, held in the pre-sign pool.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

use super::id::TokenId;
use super::market_params::MarketParams;
use super::pipeline::{OrderType, Side};

/// Opaque signed-order payload. The signing scheme itself (chain-level
/// signatures) is delegated to the execution venue's SDK — this wrapper only
/// carries the bytes plus the metadata needed to manage its lifecycle.
#[derive(Debug, Clone)]
pub struct PreSignedOrder {
    token_id: TokenId,
    side: Side,
    price: Decimal,
    size: Decimal,
    order_type: OrderType,
    params: MarketParams,
    signed_payload: Vec<u8>,
    created_at: DateTime<Utc>,
    expiration_ts: i64,
}

impl PreSignedOrder {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        token_id: TokenId,
        side: Side,
        price: Decimal,
        size: Decimal,
        order_type: OrderType,
        params: MarketParams,
        signed_payload: Vec<u8>,
        created_at: DateTime<Utc>,
        expiration_ts: i64,
    ) -> Self {
        Self {
            token_id,
            side,
            price,
            size,
            order_type,
            params,
            signed_payload,
            created_at,
            expiration_ts,
        }
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
    pub const fn params(&self) -> &MarketParams {
        &self.params
    }

    #[must_use]
    pub fn signed_payload(&self) -> &[u8] {
        &self.signed_payload
    }

    #[must_use]
    pub const fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    #[must_use]
    pub const fn expiration_ts(&self) -> i64 {
        self.expiration_ts
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expiration_ts != 0 && now.timestamp() >= self.expiration_ts
    }

    #[must_use]
    pub fn time_until_expiry(&self, now: DateTime<Utc>) -> i64 {
        if self.expiration_ts == 0 {
            i64::MAX
        } else {
            self.expiration_ts - now.timestamp()
        }
    }

    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, staleness_threshold_secs: i64) -> bool {
        let remaining = self.time_until_expiry(now);
        remaining != i64::MAX && remaining <= staleness_threshold_secs
    }

    #[must_use]
    pub fn age_secs(&self, now: DateTime<Utc>) -> i64 {
        (now - self.created_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn order(expiration_ts: i64) -> PreSignedOrder {
        PreSignedOrder::new(
            TokenId::new("t"),
            Side::Buy,
            dec!(0.50),
            dec!(100),
            OrderType::Fok,
            MarketParams::new(dec!(0.01), false, 0, Utc::now()),
            vec![1, 2, 3],
            Utc::now(),
            expiration_ts,
        )
    }

    #[test]
    fn no_expiration_never_expires_or_stales() {
        let o = order(0);
        assert!(!o.is_expired(Utc::now()));
        assert!(!o.is_stale(Utc::now(), 30));
    }

    #[test]
    fn expired_past_expiration_ts() {
        let o = order(Utc::now().timestamp() - 1);
        assert!(o.is_expired(Utc::now()));
    }

    #[test]
    fn stale_within_threshold_of_expiry() {
        let o = order(Utc::now().timestamp() + 10);
        assert!(o.is_stale(Utc::now(), 30));
        assert!(!o.is_expired(Utc::now()));
    }
}
