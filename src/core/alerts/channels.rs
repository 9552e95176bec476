//! Notification channels — Telegram and Discord delivery.

use async_trait::async_trait;

use crate::core::alerts::types::{AlertMessage, Severity};

/// Delivery backend for normalised alerts. Implementors own their own
/// transport lifecycle (HTTP client, bot handle, etc).
#[async_trait]
pub trait NotificationChannel: Send + Sync {
    async fn send(&self, msg: &AlertMessage) -> bool;

    async fn close(&self);
}

#[cfg(feature = "telegram")]
pub use telegram::TelegramChannel;

#[cfg(feature = "telegram")]
mod telegram {
    use async_trait::async_trait;
    use teloxide::prelude::*;
    use teloxide::types::ParseMode;
    use tracing::{error, warn};

    use super::NotificationChannel;
    use crate::core::alerts::types::AlertMessage;

    /// Delivers alerts via the Telegram Bot API.
    pub struct TelegramChannel {
        bot: Bot,
        chat_id: ChatId,
    }

    impl TelegramChannel {
        #[must_use]
        pub fn new(bot_token: impl AsRef<str>, chat_id: i64) -> Self {
            Self {
                bot: Bot::new(bot_token.as_ref()),
                chat_id: ChatId(chat_id),
            }
        }

        fn render(msg: &AlertMessage) -> String {
            let mut text = format!("[{}] {}", msg.severity.label(), msg.title);
            if !msg.body.is_empty() {
                text.push('\n');
                text.push_str(&msg.body);
            }
            for (k, v) in &msg.fields {
                text.push_str(&format!("\n  {k}: {v}"));
            }
            text
        }
    }

    #[async_trait]
    impl NotificationChannel for TelegramChannel {
        async fn send(&self, msg: &AlertMessage) -> bool {
            let text = Self::render(msg);
            match self.bot.send_message(self.chat_id, text).parse_mode(ParseMode::Html).await {
                Ok(_) => true,
                Err(err) => {
                    warn!(error = %err, "telegram_send_failed");
                    false
                }
            }
        }

        async fn close(&self) {
            // Bot holds its own reqwest client internally; nothing to release.
        }
    }
}

/// Discord embed colours keyed by severity.
fn discord_color(severity: Severity) -> u32 {
    match severity {
        Severity::Debug => 0x95A5A6,
        Severity::Info => 0x2ECC71,
        Severity::Warning => 0xF39C12,
        Severity::Critical => 0xE74C3C,
    }
}

/// Delivers alerts via a Discord webhook with colour-coded embeds.
pub struct DiscordChannel {
    webhook_url: String,
    client: reqwest::Client,
}

impl DiscordChannel {
    #[must_use]
    pub fn new(webhook_url: impl Into<String>) -> Self {
        Self {
            webhook_url: webhook_url.into(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl NotificationChannel for DiscordChannel {
    async fn send(&self, msg: &AlertMessage) -> bool {
        let fields: Vec<serde_json::Value> = msg
            .fields
            .iter()
            .map(|(k, v)| serde_json::json!({"name": k, "value": v, "inline": true}))
            .collect();

        let mut embed = serde_json::json!({
            "title": format!("[{}] {}", msg.severity.label(), msg.title),
            "color": discord_color(msg.severity),
        });
        if !msg.body.is_empty() {
            embed["description"] = serde_json::Value::String(msg.body.clone());
        }
        if !fields.is_empty() {
            embed["fields"] = serde_json::Value::Array(fields);
        }

        let payload = serde_json::json!({"embeds": [embed]});
        match self.client.post(&self.webhook_url).json(&payload).send().await {
            Ok(resp) if resp.status().is_success() => true,
            Ok(resp) => {
                tracing::warn!(status = %resp.status(), "discord_send_failed");
                false
            }
            Err(err) => {
                tracing::warn!(error = %err, "discord_send_error");
                false
            }
        }
    }

    async fn close(&self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discord_colors_are_distinct_per_severity() {
        let colors: std::collections::HashSet<u32> = [Severity::Debug, Severity::Info, Severity::Warning, Severity::Critical]
            .into_iter()
            .map(discord_color)
            .collect();
        assert_eq!(colors.len(), 4);
    }
}
