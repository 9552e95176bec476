//! Scoreboard polling feed: emits an event only on the transition of a game
//! to FINAL, never on repeated observation of an already-final game.

use std::collections::HashMap;
use std::sync::Mutex as StdMutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;

use super::PollableFeed;
use crate::core::domain::{FeedEvent, FeedEventKind, FeedKind, OutcomeType};
use crate::error::FeedError;

#[derive(Debug, Clone)]
pub struct SportsFeedConfig {
    pub endpoint: String,
    pub league: String,
    pub poll_interval: Duration,
}

#[derive(Deserialize)]
struct Scoreboard {
    events: Vec<GameEvent>,
}

#[derive(Deserialize)]
struct GameEvent {
    id: String,
    status: GameStatus,
    competitions: Vec<Competition>,
}

#[derive(Deserialize)]
struct GameStatus {
    #[serde(rename = "type")]
    status_type: StatusType,
}

#[derive(Deserialize)]
struct StatusType {
    name: String,
}

#[derive(Deserialize)]
struct Competition {
    competitors: Vec<Competitor>,
}

#[derive(Deserialize)]
struct Competitor {
    #[serde(rename = "homeAway")]
    home_away: String,
    team: Team,
    score: Option<String>,
}

#[derive(Deserialize)]
struct Team {
    #[serde(rename = "displayName")]
    display_name: String,
}

pub struct SportsFeed {
    client: Client,
    config: SportsFeedConfig,
    game_status: StdMutex<HashMap<String, String>>,
}

impl SportsFeed {
    #[must_use]
    pub fn new(config: SportsFeedConfig) -> Self {
        Self {
            client: Client::new(),
            config,
            game_status: StdMutex::new(HashMap::new()),
        }
    }
}

#[async_trait]
impl PollableFeed for SportsFeed {
    fn feed_kind(&self) -> FeedKind {
        FeedKind::Sports
    }

    async fn connect(&self) -> Result<(), FeedError> {
        Ok(())
    }

    async fn close(&self) -> Result<(), FeedError> {
        Ok(())
    }

    async fn poll(&self) -> Result<Vec<FeedEvent>, FeedError> {
        let url = format!("{}/{}/scoreboard", self.config.endpoint, self.config.league);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FeedError::Connection {
                feed: "sports",
                source,
            })?;
        let board: Scoreboard = response.json().await.map_err(|source| FeedError::Connection {
            feed: "sports",
            source,
        })?;

        let now = Utc::now();
        let mut events = Vec::new();
        let mut game_status = self.game_status.lock().expect("lock poisoned");

        for game in board.events {
            let was_final = game_status.get(&game.id).map(String::as_str) == Some("FINAL");
            let is_final = game.status.status_type.name == "STATUS_FINAL";
            game_status.insert(game.id.clone(), game.status.status_type.name.clone());

            if !is_final || was_final {
                continue;
            }

            let Some(competition) = game.competitions.first() else {
                continue;
            };
            let home = competition.competitors.iter().find(|c| c.home_away == "home");
            let away = competition.competitors.iter().find(|c| c.home_away == "away");
            let (Some(home), Some(away)) = (home, away) else {
                continue;
            };

            let home_score: i64 = home.score.as_deref().unwrap_or("0").parse().unwrap_or(0);
            let away_score: i64 = away.score.as_deref().unwrap_or("0").parse().unwrap_or(0);
            let winner = if home_score > away_score {
                home.team.display_name.clone()
            } else if away_score > home_score {
                away.team.display_name.clone()
            } else {
                String::new()
            };
            if winner.is_empty() {
                continue;
            }

            let mut metadata = HashMap::new();
            metadata.insert("home".to_string(), Value::String(home.team.display_name.clone()));
            metadata.insert("away".to_string(), Value::String(away.team.display_name.clone()));
            metadata.insert("winner".to_string(), Value::String(winner.clone()));

            events.push(FeedEvent::new(
                FeedKind::Sports,
                FeedEventKind::DataReleased,
                self.config.league.clone(),
                winner,
                None,
                OutcomeType::Categorical,
                now,
                now,
                metadata,
                serde_json::json!({ "game_id": game.id }),
            ));
        }

        Ok(events)
    }

    fn poll_interval(&self) -> Duration {
        self.config.poll_interval
    }
}
