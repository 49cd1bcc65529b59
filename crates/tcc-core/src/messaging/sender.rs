use std::sync::Arc;

use tracing::{debug, warn};

use crate::{
    chunker::chunk,
    domain::ChatId,
    messaging::{
        port::MessagingPort,
        types::{DeliveryError, TextFormat},
    },
};

/// Chunked, best-effort delivery on top of a [`MessagingPort`].
///
/// Failures are logged per chunk and never returned: a failed chunk does not
/// stop the ones after it.
pub struct MessageSender {
    messenger: Arc<dyn MessagingPort>,
    chunk_limit: usize,
}

impl MessageSender {
    pub fn new(messenger: Arc<dyn MessagingPort>, chunk_limit: usize) -> Self {
        Self {
            messenger,
            chunk_limit,
        }
    }

    pub fn messenger(&self) -> Arc<dyn MessagingPort> {
        self.messenger.clone()
    }

    pub async fn send(&self, chat_id: ChatId, text: &str) {
        let chunks = chunk(text, self.chunk_limit);
        let total = chunks.len();

        for (idx, body) in chunks.into_iter().enumerate() {
            let body = if total > 1 {
                format!("[{}/{}]\n{}", idx + 1, total, body)
            } else {
                body
            };

            if let Err(e) = self.send_chunk(chat_id, &body).await {
                warn!(
                    chat_id = chat_id.0,
                    chunk = idx + 1,
                    total,
                    error = %e,
                    "send_error"
                );
            }
        }
    }

    async fn send_chunk(&self, chat_id: ChatId, body: &str) -> Result<(), DeliveryError> {
        match self
            .messenger
            .send_text(chat_id, body, TextFormat::Markdown)
            .await
        {
            Err(DeliveryError::FormatRejected(reason)) => {
                debug!(chat_id = chat_id.0, %reason, "markdown rejected, resending as plain text");
                self.messenger
                    .send_text(chat_id, body, TextFormat::Plain)
                    .await
            }
            other => other,
        }
    }
}
