//! Wire types for Polymarket's CLOB and Gamma REST APIs, plus the WS
//! book-snapshot frame shape.

use serde::{Deserialize, Serialize};

use crate::core::domain::{ConditionId, MarketInfo, OrderBook, OutcomeToken, PriceLevel, TokenId};

#[derive(Debug, Deserialize, Default)]
pub struct ClobMarketsResponse {
    pub data: Option<Vec<ClobMarket>>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ClobMarket {
    pub condition_id: String,
    pub question: Option<String>,
    #[serde(default)]
    pub tokens: Vec<ClobToken>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    pub end_date_iso: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
pub struct ClobToken {
    pub token_id: String,
    pub outcome: String,
    pub price: Option<f64>,
}

#[derive(Debug, Deserialize, Default)]
pub struct GammaMarket {
    pub condition_id: String,
    pub question: Option<String>,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub closed: bool,
    pub outcomes: Option<String>,
    pub outcome_prices: Option<String>,
    pub clob_token_ids: Option<String>,
    pub volume_24hr: Option<f64>,
    pub liquidity_num: Option<f64>,
    pub end_date: Option<String>,
    pub tags: Option<Vec<String>>,
}

impl GammaMarket {
    fn parse_string_array(raw: &str) -> Vec<String> {
        serde_json::from_str(raw).unwrap_or_default()
    }

    #[must_use]
    pub fn token_ids(&self) -> Vec<String> {
        self.clob_token_ids
            .as_deref()
            .map(Self::parse_string_array)
            .unwrap_or_default()
    }

    #[must_use]
    pub fn outcome_names(&self) -> Vec<String> {
        self.outcomes
            .as_deref()
            .map(Self::parse_string_array)
            .unwrap_or_default()
    }
}

impl From<GammaMarket> for MarketInfo {
    fn from(m: GammaMarket) -> Self {
        let token_ids = m.token_ids();
        let names = m.outcome_names();

        let outcomes = token_ids
            .into_iter()
            .enumerate()
            .map(|(i, token_id)| {
                OutcomeToken::new(TokenId::new(token_id), names.get(i).cloned().unwrap_or_default())
            })
            .collect();

        let end_date = m
            .end_date
            .as_deref()
            .and_then(|s| chrono::DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&chrono::Utc));

        MarketInfo::new(
            ConditionId::new(m.condition_id),
            m.question.unwrap_or_default(),
            outcomes,
            m.active,
            m.closed,
            false,
            m.active && !m.closed,
            end_date,
            m.tags.unwrap_or_default(),
            0,
        )
    }
}

#[derive(Debug, Serialize)]
pub struct SubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl SubscribeMessage {
    #[must_use]
    pub fn new(asset_ids: Vec<String>) -> Self {
        Self {
            assets_ids: asset_ids,
            msg_type: "market".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UnsubscribeMessage {
    pub assets_ids: Vec<String>,
    #[serde(rename = "type")]
    pub msg_type: String,
}

impl UnsubscribeMessage {
    #[must_use]
    pub fn new(asset_ids: Vec<String>) -> Self {
        Self {
            assets_ids: asset_ids,
            msg_type: "unsubscribe".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum WsMessage {
    Books(Vec<BookMessage>),
    Unknown(serde_json::Value),
}

#[derive(Debug, Deserialize)]
pub struct BookMessage {
    pub asset_id: String,
    pub bids: Vec<WsPriceLevel>,
    pub asks: Vec<WsPriceLevel>,
}

impl BookMessage {
    #[must_use]
    pub fn to_orderbook(&self) -> OrderBook {
        OrderBook::new(
            TokenId::new(self.asset_id.clone()),
            Self::parse_levels(&self.bids),
            Self::parse_levels(&self.asks),
            chrono::Utc::now(),
        )
    }

    fn parse_levels(levels: &[WsPriceLevel]) -> Vec<PriceLevel> {
        levels
            .iter()
            .filter_map(|pl| Some(PriceLevel::new(pl.price.parse().ok()?, pl.size.parse().ok()?)))
            .collect()
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct WsPriceLevel {
    pub price: String,
    pub size: String,
}
