//! BLS-style economic release feed: polls a fixed list of series IDs and
//! emits an event whenever a series reports a new value.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use super::PollableFeed;
use crate::core::domain::{FeedEvent, FeedEventKind, FeedKind, OutcomeType};
use crate::error::FeedError;

#[derive(Debug, Clone)]
pub struct EconomicFeedConfig {
    pub endpoint: String,
    pub series_ids: Vec<String>,
    pub indicator_names: HashMap<String, String>,
    pub registration_key: Option<String>,
    pub poll_interval: Duration,
}

#[derive(Deserialize)]
struct BlsResponse {
    #[serde(rename = "Results")]
    results: Option<BlsResults>,
}

#[derive(Deserialize)]
struct BlsResults {
    series: Vec<BlsSeries>,
}

#[derive(Deserialize)]
struct BlsSeries {
    #[serde(rename = "seriesID")]
    series_id: String,
    data: Vec<BlsDataPoint>,
}

#[derive(Deserialize)]
struct BlsDataPoint {
    value: String,
}

pub struct EconomicFeed {
    client: Client,
    config: EconomicFeedConfig,
    last_values: StdMutex<HashMap<String, String>>,
}

impl EconomicFeed {
    #[must_use]
    pub fn new(config: EconomicFeedConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            last_values: StdMutex::new(HashMap::new()),
        }
    }

    fn indicator_name(&self, series_id: &str) -> String {
        self.config
            .indicator_names
            .get(series_id)
            .cloned()
            .unwrap_or_else(|| series_id.to_string())
    }
}

#[async_trait]
impl PollableFeed for EconomicFeed {
    fn feed_kind(&self) -> FeedKind {
        FeedKind::Economic
    }

    async fn connect(&self) -> Result<(), FeedError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), FeedError> {
        Ok(())
    }

    async fn poll(&self) -> Result<Vec<FeedEvent>, FeedError> {
        let mut body = serde_json::json!({
            "seriesid": self.config.series_ids,
            "latest": true,
        });
        if let Some(key) = &self.config.registration_key {
            body["registrationkey"] = Value::String(key.clone());
        }

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&body)
            .send()
            .await
            .map_err(|source| FeedError::Connection {
                feed: "economic",
                source,
            })?;

        let parsed: BlsResponse = response.json().await.map_err(|source| FeedError::Connection {
            feed: "economic",
            source,
        })?;

        let Some(results) = parsed.results else {
            return Ok(vec![]);
        };

        let now = Utc::now();
        let mut events = Vec::new();
        let mut last_values = self.last_values.lock().expect("lock poisoned");

        for series in results.series {
            let Some(point) = series.data.first() else {
                continue;
            };
            let is_new = last_values.get(&series.series_id) != Some(&point.value);
            if !is_new {
                continue;
            }
            last_values.insert(series.series_id.clone(), point.value.clone());

            let numeric_value: Option<Decimal> = point.value.parse().ok();
            events.push(FeedEvent::new(
                FeedKind::Economic,
                FeedEventKind::DataReleased,
                self.indicator_name(&series.series_id),
                point.value.clone(),
                numeric_value,
                OutcomeType::Numeric,
                now,
                now,
                HashMap::new(),
                serde_json::json!({ "series_id": series.series_id }),
            ));
        }

        Ok(events)
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> EconomicFeedConfig {
        let mut names = HashMap::new();
        names.insert("CUUR0000SA0".to_string(), "CPI".to_string());
        EconomicFeedConfig {
            endpoint: "https://example.invalid/bls".to_string(),
            series_ids: vec!["CUUR0000SA0".to_string()],
            indicator_names: names,
            registration_key: None,
            poll_interval: Duration::from_secs(60),
        }
    }

    #[test]
    fn indicator_name_falls_back_to_series_id() {
        let feed = EconomicFeed::new(config());
        assert_eq!(feed.indicator_name("CUUR0000SA0"), "CPI");
        assert_eq!(feed.indicator_name("UNKNOWN"), "UNKNOWN");
    }
}
