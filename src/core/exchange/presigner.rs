//! Order pre-signing. EIP-712 signing is CPU-bound enough to stall the
//! executor if done inline on the async runtime, so it is pushed onto
//! `spawn_blocking` and awaited from there.

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use rust_decimal::Decimal;

use crate::core::domain::{MarketParams, OrderType, PreSignedOrder, Side, TokenId};
use crate::error::ClobClientError;

/// Wallet/signing backend. The concrete Polymarket adapter implements this
/// with `alloy` primitives; kept as a trait so the presigner can be tested
/// without a real key.
pub trait OrderSigner: Send + Sync {
    fn sign(
        &self,
        token_id: &TokenId,
        side: Side,
        price: Decimal,
        size: Decimal,
        params: &MarketParams,
        expiration_ts: i64,
    ) -> Result<Vec<u8>, ClobClientError>;
}

pub struct Presigner<S: OrderSigner + 'static> {
    signer: std::sync::Arc<S>,
    order_ttl: ChronoDuration,
}

impl<S: OrderSigner + 'static> Presigner<S> {
    #[must_use]
    pub fn new(signer: std::sync::Arc<S>, order_ttl: ChronoDuration) -> Self {
        Self { signer, order_ttl }
    }

    pub async fn presign(
        &self,
        token_id: TokenId,
        side: Side,
        order_type: OrderType,
        price: Decimal,
        size: Decimal,
        params: MarketParams,
    ) -> Result<PreSignedOrder, ClobClientError> {
        let signer = std::sync::Arc::clone(&self.signer);
        let expiration: DateTime<Utc> = Utc::now() + self.order_ttl;
        let expiration_ts = expiration.timestamp();
        let created_at = Utc::now();
        let token_for_blocking = token_id.clone();

        let signed_payload = tokio::task::spawn_blocking(move || {
            signer.sign(&token_for_blocking, side, price, size, &params, expiration_ts)
        })
        .await
        .map_err(|err| ClobClientError::Connection(format!("presign task panicked: {err}")))??;

        Ok(PreSignedOrder::new(
            token_id,
            side,
            price,
            size,
            order_type,
            params,
            signed_payload,
            created_at,
            expiration_ts,
        ))
    }

    pub async fn presign_batch(
        &self,
        requests: Vec<(TokenId, Side, OrderType, Decimal, Decimal, MarketParams)>,
    ) -> Vec<Result<PreSignedOrder, ClobClientError>> {
        let mut results = Vec::with_capacity(requests.len());
        for (token_id, side, order_type, price, size, params) in requests {
            results.push(self.presign(token_id, side, order_type, price, size, params).await);
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    struct FakeSigner;

    impl OrderSigner for FakeSigner {
        fn sign(
            &self,
            token_id: &TokenId,
            _side: Side,
            _price: Decimal,
            _size: Decimal,
            _params: &MarketParams,
            _expiration_ts: i64,
        ) -> Result<Vec<u8>, ClobClientError> {
            Ok(format!("sig-{}", token_id.as_str()).into_bytes())
        }
    }

    #[tokio::test]
    async fn presign_produces_order_with_ttl_expiration() {
        let presigner = Presigner::new(std::sync::Arc::new(FakeSigner), ChronoDuration::seconds(60));
        let params = MarketParams::new(dec!(0.01), false, 200, Utc::now());
        let order = presigner
            .presign(TokenId::new("t1"), Side::Buy, OrderType::Fok, dec!(0.5), dec!(10), params)
            .await
            .unwrap();
        assert_eq!(order.signed_payload(), b"sig-t1");
        assert!(!order.is_expired(Utc::now()));
    }
}
