//! Maps feed events onto tracked opportunities, one matcher per feed
//! category. No regex dependency: threshold extraction is a small
//! hand-rolled scan since the question phrasing space is narrow
//! ("above X%", "below $Y", "exceeds Z").

use std::collections::HashMap;

use rust_decimal::Decimal;

use crate::core::domain::{Category, FeedEvent, FeedKind, MarketOpportunity, MatchResult, TokenId};

const ARTICLES: [&str; 3] = ["the", "a", "an"];

enum Direction {
    Above,
    Below,
}

/// Finds the first `(direction-word, number)` pair in a market question,
/// e.g. "Will CPI be above 3.0%?" -> (Above, 3.0).
fn extract_threshold(question: &str) -> Option<(Decimal, Direction)> {
    let lower = question.to_lowercase();
    let words: Vec<&str> = lower.split_whitespace().collect();

    for (i, word) in words.iter().enumerate() {
        let direction = match word.trim_end_matches(['.', ',', '?']) {
            "above" | "over" | "exceed" | "exceeds" => Some(Direction::Above),
            "below" | "under" => Some(Direction::Below),
            _ => None,
        };
        let Some(direction) = direction else { continue };

        let Some(candidate) = words.get(i + 1) else { continue };
        let cleaned: String = candidate
            .chars()
            .filter(|c| c.is_ascii_digit() || *c == '.')
            .collect();
        if cleaned.is_empty() {
            continue;
        }
        if let Ok(value) = cleaned.parse::<Decimal>() {
            return Some((value, direction));
        }
    }
    None
}

fn normalize_team_name(name: &str) -> String {
    name.to_lowercase()
        .split_whitespace()
        .filter(|w| !ARTICLES.contains(w))
        .collect::<Vec<_>>()
        .join(" ")
}

fn team_in_question(team_name: &str, question: &str) -> bool {
    let normalized = normalize_team_name(team_name);
    if normalized.is_empty() {
        return false;
    }
    question.to_lowercase().contains(&normalized)
}

fn metadata_str<'a>(event: &'a FeedEvent, key: &str) -> Option<&'a str> {
    event.metadata().get(key).and_then(|v| v.as_str())
}

pub struct MarketMatcher {
    confidence_threshold: f64,
}

impl MarketMatcher {
    #[must_use]
    pub const fn new(confidence_threshold: f64) -> Self {
        Self { confidence_threshold }
    }

    #[must_use]
    pub fn match_event(&self, event: &FeedEvent, opportunities: &[MarketOpportunity]) -> Vec<MatchResult> {
        match event.feed_kind() {
            FeedKind::Economic => self.match_threshold(event, opportunities, Category::Economic, 0.95),
            FeedKind::Sports => self.match_sports(event, opportunities),
            FeedKind::Crypto => self.match_crypto(event, opportunities),
        }
    }

    fn match_threshold(
        &self,
        event: &FeedEvent,
        opportunities: &[MarketOpportunity],
        category: Category,
        confidence: f64,
    ) -> Vec<MatchResult> {
        let Some(numeric_value) = event.numeric_value() else {
            return Vec::new();
        };
        let indicator_lower = event.indicator().to_lowercase();

        let mut results = Vec::new();
        for opp in opportunities {
            if opp.category() != category {
                continue;
            }
            let question = opp.market().question();
            if !question.to_lowercase().contains(&indicator_lower) {
                continue;
            }
            let Some((threshold, direction)) = extract_threshold(question) else {
                continue;
            };

            let outcome_yes = match direction {
                Direction::Above => numeric_value > threshold,
                Direction::Below => numeric_value < threshold,
            };
            let outcome_name = if outcome_yes { "Yes" } else { "No" };
            let Some(token) = opp.market().outcome_by_name(outcome_name) else {
                continue;
            };

            if confidence < self.confidence_threshold {
                continue;
            }
            results.push(MatchResult::new(
                event.clone(),
                opp.clone(),
                token.token_id().clone(),
                confidence,
            ));
        }
        results
    }

    /// Crypto pairs arrive as exchange-style indicators ("BTC-USD",
    /// "BTC_USDT") while questions reference the bare base symbol
    /// ("Will BTC go above $50,000?"), so unlike economic/sports this
    /// matches on the extracted base symbol, not the raw indicator.
    fn match_crypto(&self, event: &FeedEvent, opportunities: &[MarketOpportunity]) -> Vec<MatchResult> {
        const CONFIDENCE: f64 = 0.90;

        let Some(numeric_value) = event.numeric_value() else {
            return Vec::new();
        };
        let pair = event.indicator().to_uppercase();
        let base_symbol = pair
            .replace(['-', '_', '/'], " ")
            .split_whitespace()
            .next()
            .map(str::to_string)
            .unwrap_or(pair);
        if base_symbol.is_empty() {
            return Vec::new();
        }

        let mut results = Vec::new();
        for opp in opportunities {
            if opp.category() != Category::Crypto {
                continue;
            }
            let question = opp.market().question();
            if !question.to_uppercase().contains(&base_symbol) {
                continue;
            }
            let Some((threshold, direction)) = extract_threshold(question) else {
                continue;
            };

            let outcome_yes = match direction {
                Direction::Above => numeric_value > threshold,
                Direction::Below => numeric_value < threshold,
            };
            let outcome_name = if outcome_yes { "Yes" } else { "No" };
            let Some(token) = opp.market().outcome_by_name(outcome_name) else {
                continue;
            };

            if CONFIDENCE < self.confidence_threshold {
                continue;
            }
            results.push(MatchResult::new(
                event.clone(),
                opp.clone(),
                token.token_id().clone(),
                CONFIDENCE,
            ));
        }
        results
    }

    fn match_sports(&self, event: &FeedEvent, opportunities: &[MarketOpportunity]) -> Vec<MatchResult> {
        let Some(winner) = metadata_str(event, "winner") else {
            return Vec::new();
        };
        let home_team = metadata_str(event, "home_team").unwrap_or_default();
        let away_team = metadata_str(event, "away_team").unwrap_or_default();

        let mut results = Vec::new();
        for opp in opportunities {
            if opp.category() != Category::Sports {
                continue;
            }
            let question = opp.market().question();

            let home_in = !home_team.is_empty() && team_in_question(home_team, question);
            let away_in = !away_team.is_empty() && team_in_question(away_team, question);
            if !home_in && !away_in {
                continue;
            }

            let token = opp.market().outcome_by_name(winner).or_else(|| {
                if team_in_question(winner, question) {
                    opp.market().outcome_by_name("Yes")
                } else {
                    opp.market().outcome_by_name("No")
                }
            });
            let Some(token) = token else { continue };

            const CONFIDENCE: f64 = 0.95;
            if CONFIDENCE < self.confidence_threshold {
                continue;
            }
            results.push(MatchResult::new(
                event.clone(),
                opp.clone(),
                token.token_id().clone(),
                CONFIDENCE,
            ));
        }
        results
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::domain::{ConditionId, FeedEventKind, MarketInfo, OutcomeToken, OutcomeType};
    use chrono::Utc;
    use rust_decimal_macros::dec;

    fn economic_opportunity(question: &str) -> MarketOpportunity {
        let market = MarketInfo::new(
            ConditionId::new("c1"),
            question,
            vec![
                OutcomeToken::new(TokenId::new("yes"), "Yes"),
                OutcomeToken::new(TokenId::new("no"), "No"),
            ],
            true,
            false,
            false,
            true,
            None,
            vec![],
            0,
        );
        MarketOpportunity::new(
            market,
            Category::Economic,
            TokenId::new("yes"),
            Some(dec!(0.49)),
            Some(dec!(0.51)),
            Some(dec!(0.02)),
            dec!(5000),
            dec!(2500),
            dec!(2500),
            0.8,
            Utc::now(),
        )
    }

    fn event(indicator: &str, value: Decimal) -> FeedEvent {
        FeedEvent::new(
            FeedKind::Economic,
            FeedEventKind::DataReleased,
            indicator,
            value.to_string(),
            Some(value),
            OutcomeType::Numeric,
            Utc::now(),
            Utc::now(),
            HashMap::new(),
            serde_json::Value::Null,
        )
    }

    fn crypto_event(indicator: &str, value: Decimal) -> FeedEvent {
        FeedEvent::new(
            FeedKind::Crypto,
            FeedEventKind::DataReleased,
            indicator,
            value.to_string(),
            Some(value),
            OutcomeType::Numeric,
            Utc::now(),
            Utc::now(),
            HashMap::new(),
            serde_json::Value::Null,
        )
    }

    fn crypto_opportunity(question: &str) -> MarketOpportunity {
        let market = MarketInfo::new(
            ConditionId::new("c2"),
            question,
            vec![
                OutcomeToken::new(TokenId::new("yes"), "Yes"),
                OutcomeToken::new(TokenId::new("no"), "No"),
            ],
            true,
            false,
            false,
            true,
            None,
            vec![],
            0,
        );
        MarketOpportunity::new(
            market,
            Category::Crypto,
            TokenId::new("yes"),
            Some(dec!(0.49)),
            Some(dec!(0.51)),
            Some(dec!(0.02)),
            dec!(5000),
            dec!(2500),
            dec!(2500),
            0.8,
            Utc::now(),
        )
    }

    #[test]
    fn extracts_above_threshold_with_percent() {
        let (value, direction) = extract_threshold("Will CPI be above 3.0%?").unwrap();
        assert_eq!(value, dec!(3.0));
        assert!(matches!(direction, Direction::Above));
    }

    #[test]
    fn extracts_below_threshold() {
        let (value, _) = extract_threshold("Will unemployment fall below 4.5%?").unwrap();
        assert_eq!(value, dec!(4.5));
    }

    #[test]
    fn matches_economic_event_above_threshold_to_yes() {
        let matcher = MarketMatcher::new(0.8);
        let opportunities = vec![economic_opportunity("Will CPI be above 3.0%?")];
        let results = matcher.match_event(&event("CPI", dec!(3.5)), &opportunities);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].target_token_id().as_str(), "yes");
    }

    #[test]
    fn no_match_when_indicator_absent_from_question() {
        let matcher = MarketMatcher::new(0.8);
        let opportunities = vec![economic_opportunity("Will GDP be above 3.0%?")];
        let results = matcher.match_event(&event("CPI", dec!(3.5)), &opportunities);
        assert!(results.is_empty());
    }

    #[test]
    fn matches_crypto_event_by_base_symbol_not_raw_pair() {
        let matcher = MarketMatcher::new(0.8);
        let opportunities = vec![crypto_opportunity("Will BTC go above $50,000?")];
        let results = matcher.match_event(&crypto_event("BTC-USD", dec!(51000)), &opportunities);
        assert_eq!(results.len(), 1);
        assert_eq!(results[0].target_token_id().as_str(), "yes");
        assert!((results[0].confidence() - 0.90).abs() < f64::EPSILON);
    }

    #[test]
    fn no_crypto_match_when_base_symbol_absent_from_question() {
        let matcher = MarketMatcher::new(0.8);
        let opportunities = vec![crypto_opportunity("Will ETH go above $5,000?")];
        let results = matcher.match_event(&crypto_event("BTC-USD", dec!(51000)), &opportunities);
        assert!(results.is_empty());
    }
}
