//! Wire shapes exchanged with the Telegram Bot API.
//!
//! Only the fields the tracker reads are modelled; everything else in an
//! update is ignored by serde.

use serde::{Deserialize, Serialize};

use crate::domain::ChatId;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Update {
    #[serde(default)]
    pub update_id: Option<i64>,
    #[serde(default)]
    pub message: Option<IncomingMessage>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IncomingMessage {
    pub chat: Chat,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chat {
    pub id: ChatId,
}

impl Update {
    /// Returns the chat to reply to and the command text, if the update has both.
    pub fn command(&self) -> Option<(ChatId, &str)> {
        let message = self.message.as_ref()?;
        let text = message.text.as_deref()?;
        Some((message.chat.id, text))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendMessageRequest {
    pub chat_id: ChatId,
    pub text: String,
}

/// Envelope every Bot API method answers with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotApiResponse {
    pub ok: bool,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebhookAck {
    pub status: String,
}

impl WebhookAck {
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
        }
    }

    /// Acknowledges an update that carries no command so Telegram drops it.
    pub fn ignored() -> Self {
        Self {
            status: "ignored".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extracts_chat_and_text_from_text_update() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 9001,
            "message": {
                "message_id": 3,
                "from": { "id": 77, "is_bot": false, "first_name": "Ada" },
                "chat": { "id": 77, "type": "private" },
                "date": 1_700_000_000,
                "text": "/summary"
            }
        }))
        .expect("update");
        assert_eq!(update.command(), Some((ChatId(77), "/summary")));
    }

    #[test]
    fn non_text_update_has_no_command() {
        let update: Update = serde_json::from_value(serde_json::json!({
            "update_id": 1,
            "message": { "chat": { "id": 5 }, "sticker": { "file_id": "x" } }
        }))
        .expect("update");
        assert!(update.command().is_none());

        let edited: Update = serde_json::from_value(serde_json::json!({
            "update_id": 2,
            "edited_message": { "chat": { "id": 5 }, "text": "/hacker" }
        }))
        .expect("update");
        assert!(edited.command().is_none());
    }

    #[test]
    fn send_message_request_serializes_flat_chat_id() {
        let request = SendMessageRequest {
            chat_id: ChatId(12),
            text: "hi".into(),
        };
        assert_eq!(
            serde_json::to_value(&request).expect("json"),
            serde_json::json!({ "chat_id": 12, "text": "hi" })
        );
    }
}
