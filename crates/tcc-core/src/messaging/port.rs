use async_trait::async_trait;

use crate::{
    domain::ChatId,
    messaging::types::{ChatAction, DeliveryError, TextFormat},
};

/// Cross-messenger port: one request per call, no chunking.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
    ) -> Result<(), DeliveryError>;

    async fn send_chat_action(&self, chat_id: ChatId, action: ChatAction)
        -> Result<(), DeliveryError>;
}
