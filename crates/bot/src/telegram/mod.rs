//! Telegram Bot API transport
//!
//! Only the pieces the bot uses: long-polled `getUpdates` and HTML
//! `sendMessage`.

mod client;

pub use client::TelegramClient;

use async_trait::async_trait;
use serde::Deserialize;

/// Destination for outgoing chat messages.
#[async_trait]
pub trait MessageSink: Send + Sync {
    /// Send an HTML-formatted message to a chat.
    async fn send_message(&self, chat_id: i64, text: &str) -> crate::Result<()>;
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
    pub my_chat_member: Option<ChatMemberUpdated>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub from: Option<User>,
    pub chat: Chat,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub title: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub is_bot: bool,
    pub username: Option<String>,
}

/// The bot's own membership in a chat changed.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatMemberUpdated {
    pub chat: Chat,
    pub from: User,
    pub old_chat_member: ChatMember,
    pub new_chat_member: ChatMember,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatMember {
    pub status: String,
    pub user: User,
}

impl ChatMemberUpdated {
    /// The bot went from outside the chat to being a member of it.
    pub fn is_join(&self) -> bool {
        let was_out = matches!(self.old_chat_member.status.as_str(), "left" | "kicked");
        let is_in = matches!(
            self.new_chat_member.status.as_str(),
            "member" | "administrator" | "creator" | "restricted"
        );
        was_out && is_in
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct ApiResponse<T> {
    pub ok: bool,
    pub result: Option<T>,
    pub description: Option<String>,
    pub error_code: Option<u16>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_join_transition() {
        let update: Update = serde_json::from_value(json!({
            "update_id": 10,
            "my_chat_member": {
                "chat": { "id": -100200, "type": "supergroup", "title": "Acme Alerts" },
                "from": { "id": 42, "is_bot": false },
                "old_chat_member": { "status": "left", "user": { "id": 99, "is_bot": true } },
                "new_chat_member": { "status": "member", "user": { "id": 99, "is_bot": true } }
            }
        }))
        .unwrap();

        let change = update.my_chat_member.unwrap();
        assert!(change.is_join());
        assert_eq!(change.chat.title.as_deref(), Some("Acme Alerts"));
    }

    #[test]
    fn test_leave_is_not_join() {
        let change: ChatMemberUpdated = serde_json::from_value(json!({
            "chat": { "id": -100200, "type": "group" },
            "from": { "id": 42 },
            "old_chat_member": { "status": "member", "user": { "id": 99 } },
            "new_chat_member": { "status": "left", "user": { "id": 99 } }
        }))
        .unwrap();

        assert!(!change.is_join());
    }
}
