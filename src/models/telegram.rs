//! Telegram Bot API payloads
//!
//! Builders for the webhook updates the probe injects and the subset of the
//! Bot API responses it inspects. Update ids are derived from the current
//! time so repeated runs never collide with updates Telegram itself delivers.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Synthetic Telegram user id used for injected updates
pub const PROBE_USER_ID: i64 = 987_654_321;

/// An incoming update as posted to the webhook endpoint
#[derive(Clone, Debug, Serialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Message,
}

#[derive(Clone, Debug, Serialize)]
pub struct Message {
    pub message_id: i64,
    pub from: User,
    pub chat: Chat,
    pub date: i64,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entities: Option<Vec<MessageEntity>>,
}

#[derive(Clone, Debug, Serialize)]
pub struct User {
    pub id: i64,
    pub is_bot: bool,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub language_code: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct Chat {
    pub id: i64,
    pub first_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Clone, Debug, Serialize)]
pub struct MessageEntity {
    pub offset: i64,
    pub length: i64,
    #[serde(rename = "type")]
    pub kind: String,
}

impl Update {
    fn text_message(text: impl Into<String>, entities: Option<Vec<MessageEntity>>) -> Self {
        let now = Utc::now();
        let text = text.into();
        Self {
            update_id: now.timestamp_millis(),
            message: Message {
                message_id: now.timestamp() % 100_000,
                from: User {
                    id: PROBE_USER_ID,
                    is_bot: false,
                    first_name: "Probe".to_string(),
                    username: Some("probe_user".to_string()),
                    language_code: "es".to_string(),
                },
                chat: Chat {
                    id: PROBE_USER_ID,
                    first_name: "Probe".to_string(),
                    username: Some("probe_user".to_string()),
                    kind: "private".to_string(),
                },
                date: now.timestamp(),
                text,
                entities,
            },
        }
    }

    /// A bare `/start` command
    pub fn start_command() -> Self {
        Self::text_message(
            "/start",
            Some(vec![MessageEntity {
                offset: 0,
                length: 6,
                kind: "bot_command".to_string(),
            }]),
        )
    }

    /// A `/start` carrying a deep-link payload (`/start product_<id>`)
    pub fn deep_link(product_id: &str) -> Self {
        Self::text_message(
            format!("/start product_{product_id}"),
            Some(vec![MessageEntity {
                offset: 0,
                length: 6,
                kind: "bot_command".to_string(),
            }]),
        )
    }

    /// A plain message pasting a bot link, `https://t.me/<bot>?start=product_<id>`
    pub fn product_link(bot_username: &str, product_id: &str) -> Self {
        Self::text_message(
            format!("Mira esto: https://t.me/{bot_username}?start=product_{product_id}"),
            None,
        )
    }

    /// Free text with no command and no link
    pub fn plain_text() -> Self {
        Self::text_message("hola, que tal", None)
    }

    /// An update with an empty message body, used to poke error handling
    pub fn empty() -> serde_json::Value {
        json!({ "update_id": Utc::now().timestamp_millis(), "message": {} })
    }
}

/// Response from the Bot API `getWebhookInfo` method
#[derive(Clone, Debug, Deserialize)]
pub struct WebhookInfoResponse {
    pub ok: bool,
    pub result: Option<WebhookInfo>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct WebhookInfo {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub pending_update_count: i64,
    #[serde(default)]
    pub last_error_message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn start_command_has_bot_command_entity() {
        let update = Update::start_command();
        let json = serde_json::to_value(&update).unwrap();

        assert_eq!(json["message"]["text"], "/start");
        assert_eq!(json["message"]["entities"][0]["type"], "bot_command");
        assert_eq!(json["message"]["chat"]["type"], "private");
    }

    #[test]
    fn deep_link_embeds_product_id() {
        let update = Update::deep_link("abc123");
        assert_eq!(update.message.text, "/start product_abc123");
    }

    #[test]
    fn product_link_pastes_a_bot_link() {
        let update = Update::product_link("marketplace_bot", "p9");
        assert!(update
            .message
            .text
            .contains("https://t.me/marketplace_bot?start=product_p9"));
        assert!(update.message.entities.is_none());
    }

    #[test]
    fn webhook_info_parses_bot_api_shape() {
        let json = r#"{"ok":true,"result":{"url":"https://shop.example.com/api/telegram/webhook","pending_update_count":0}}"#;
        let info: WebhookInfoResponse = serde_json::from_str(json).unwrap();

        assert!(info.ok);
        assert_eq!(
            info.result.unwrap().url,
            "https://shop.example.com/api/telegram/webhook"
        );
    }
}
