use serde::Deserialize;

use crate::domain::{ChatId, UpdateId, UserId};

/// Messenger-agnostic inbound update consumed by the dispatcher.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundUpdate {
    pub update_id: UpdateId,
    pub message: Option<InboundMessage>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InboundMessage {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub text: String,
}

impl InboundUpdate {
    pub fn text(update_id: i64, chat_id: i64, user_id: i64, text: &str) -> Self {
        Self {
            update_id: UpdateId(update_id),
            message: Some(InboundMessage {
                chat_id: ChatId(chat_id),
                user_id: UserId(user_id),
                text: text.to_string(),
            }),
        }
    }
}

// ============== Telegram Bot API wire model ==============
//
// Only the fields the dispatcher reads. Unknown fields are ignored.

#[derive(Clone, Debug, Deserialize)]
pub struct TelegramUpdate {
    #[serde(default)]
    pub update_id: i64,
    #[serde(default)]
    pub message: Option<TelegramMessage>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TelegramMessage {
    pub chat: TelegramChat,
    #[serde(default)]
    pub from: Option<TelegramUser>,
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TelegramChat {
    pub id: i64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TelegramUser {
    pub id: i64,
}

impl From<TelegramUpdate> for InboundUpdate {
    fn from(u: TelegramUpdate) -> Self {
        Self {
            update_id: UpdateId(u.update_id),
            message: u.message.map(|m| InboundMessage {
                chat_id: ChatId(m.chat.id),
                user_id: UserId(m.from.map(|f| f.id).unwrap_or(0)),
                text: m.text.unwrap_or_default(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> InboundUpdate {
        serde_json::from_str::<TelegramUpdate>(raw).unwrap().into()
    }

    #[test]
    fn decodes_text_message() {
        let u = decode(
            r#"{"update_id":3,"message":{"message_id":9,"chat":{"id":100,"type":"private"},"from":{"id":1,"is_bot":false},"text":"/start"}}"#,
        );
        assert_eq!(u, InboundUpdate::text(3, 100, 1, "/start"));
    }

    #[test]
    fn missing_sender_and_text_default() {
        let u = decode(r#"{"update_id":2,"message":{"chat":{"id":100}}}"#);
        let m = u.message.unwrap();
        assert_eq!(m.user_id, UserId(0));
        assert_eq!(m.text, "");
    }

    #[test]
    fn update_without_message() {
        let u = decode(r#"{"update_id":1}"#);
        assert_eq!(u.update_id, UpdateId(1));
        assert!(u.message.is_none());
    }
}
