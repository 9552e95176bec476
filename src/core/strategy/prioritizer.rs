//! Ranks [`MatchResult`]s by a composite priority score, enforces a per-event
//! trade cap, and tracks a per-market cooldown so a single condition can't be
//! re-traded faster than `cooldown_secs`.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use tracing::debug;

use crate::core::domain::{Category, MatchResult, PrioritizedMatch};
use crate::core::strategy::config::PrioritizerConfig;

const ASSUMED_FAIR_VALUE: f64 = 0.99;

fn category_key(category: Category) -> &'static str {
    match category {
        Category::Economic => "economic",
        Category::Sports => "sports",
        Category::Crypto => "crypto",
        Category::Politics => "politics",
        Category::Other => "other",
    }
}

fn estimate_edge(m: &MatchResult) -> f64 {
    let Some(ask) = m.opportunity().best_ask() else {
        return 0.0;
    };
    let ask = ask.to_f64().unwrap_or(1.0);
    if ask >= ASSUMED_FAIR_VALUE {
        return 0.0;
    }
    ((ASSUMED_FAIR_VALUE - ask) / ASSUMED_FAIR_VALUE).clamp(0.0, 1.0)
}

#[must_use]
pub fn compute_priority_score(m: &MatchResult, config: &PrioritizerConfig) -> (f64, HashMap<String, f64>) {
    let opp_score = m.opportunity().score();
    let confidence = m.confidence();
    let edge = estimate_edge(m);
    let cat_key = category_key(m.opportunity().category());
    let cat_weight = config.category_weights.get(cat_key).copied().unwrap_or(0.3);

    let components = HashMap::from([
        ("opportunity".to_string(), opp_score),
        ("confidence".to_string(), confidence),
        ("edge".to_string(), edge),
        ("category".to_string(), cat_weight),
    ]);

    let total = config.score_weight_opportunity * opp_score
        + config.score_weight_confidence * confidence
        + config.score_weight_edge * edge
        + config.score_weight_category * cat_weight;

    (total, components)
}

pub struct OpportunityPrioritizer {
    config: PrioritizerConfig,
    cooldowns: HashMap<String, DateTime<Utc>>,
}

impl OpportunityPrioritizer {
    #[must_use]
    pub fn new(config: PrioritizerConfig) -> Self {
        Self {
            config,
            cooldowns: HashMap::new(),
        }
    }

    #[must_use]
    pub fn cooldowns(&self) -> HashMap<String, DateTime<Utc>> {
        self.cooldowns.clone()
    }

    pub fn prioritize(&mut self, matches: Vec<MatchResult>) -> Vec<PrioritizedMatch> {
        if matches.is_empty() {
            return Vec::new();
        }

        let now = Utc::now();
        let filtered = self.filter_cooldowns(matches, now);
        if filtered.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<(f64, HashMap<String, f64>, MatchResult)> = filtered
            .into_iter()
            .map(|m| {
                let (total, components) = compute_priority_score(&m, &self.config);
                (total, components, m)
            })
            .collect();

        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(self.config.max_trades_per_event);

        scored
            .into_iter()
            .enumerate()
            .map(|(idx, (total, components, m))| PrioritizedMatch::new(m, total, components, idx + 1))
            .collect()
    }

    pub fn record_trade(&mut self, condition_id: impl Into<String>) {
        let condition_id = condition_id.into();
        let expiry = Utc::now() + chrono::Duration::seconds(self.config.cooldown_secs);
        debug!(condition_id = %condition_id, cooldown_secs = self.config.cooldown_secs, "cooldown_started");
        self.cooldowns.insert(condition_id, expiry);
    }

    pub fn clear_cooldown(&mut self, condition_id: &str) {
        self.cooldowns.remove(condition_id);
    }

    pub fn clear_all_cooldowns(&mut self) {
        self.cooldowns.clear();
    }

    fn filter_cooldowns(&mut self, matches: Vec<MatchResult>, now: DateTime<Utc>) -> Vec<MatchResult> {
        self.cooldowns.retain(|_, expiry| *expiry > now);

        matches
            .into_iter()
            .filter(|m| {
                let condition_id = m.opportunity().condition_id().as_str();
                let on_cooldown = self.cooldowns.contains_key(condition_id);
                if on_cooldown {
                    debug!(condition_id, "match_on_cooldown");
                }
                !on_cooldown
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{
        ConditionId, FeedEvent, FeedEventKind, FeedKind, MarketInfo, MarketOpportunity, OutcomeToken, OutcomeType,
        TokenId,
    };
    use rust_decimal_macros::dec;
    use std::collections::HashMap as StdHashMap;

    fn a_match(condition_id: &str, score: f64) -> MatchResult {
        let market = MarketInfo::new(
            ConditionId::new(condition_id),
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
            dec!(5000),
            dec!(2500),
            dec!(2500),
            score,
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
            StdHashMap::new(),
            serde_json::Value::Null,
        );
        MatchResult::new(event, opp, TokenId::new("yes"), 0.95)
    }

    #[test]
    fn prioritize_sorts_descending_and_ranks_from_one() {
        let mut p = OpportunityPrioritizer::new(PrioritizerConfig::default());
        let results = p.prioritize(vec![a_match("low", 0.2), a_match("high", 0.95)]);
        assert_eq!(results[0].rank(), 1);
        assert!(results[0].priority_score() >= results[1].priority_score());
    }

    #[test]
    fn caps_to_max_trades_per_event() {
        let mut config = PrioritizerConfig::default();
        config.max_trades_per_event = 1;
        let mut p = OpportunityPrioritizer::new(config);
        let results = p.prioritize(vec![a_match("a", 0.5), a_match("b", 0.9)]);
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn cooldown_excludes_recently_traded_condition() {
        let mut p = OpportunityPrioritizer::new(PrioritizerConfig::default());
        p.record_trade("cond-1");
        let results = p.prioritize(vec![a_match("cond-1", 0.9)]);
        assert!(results.is_empty());
    }

    #[test]
    fn clear_cooldown_allows_retrade() {
        let mut p = OpportunityPrioritizer::new(PrioritizerConfig::default());
        p.record_trade("cond-1");
        p.clear_cooldown("cond-1");
        let results = p.prioritize(vec![a_match("cond-1", 0.9)]);
        assert_eq!(results.len(), 1);
    }
}
