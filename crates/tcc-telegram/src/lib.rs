//! Telegram adapter (teloxide).
//!
//! Implements the `tcc-core` MessagingPort over the Bot API, plus the two
//! inbound transports: long polling and the axum webhook.

use std::time::Duration;

use async_trait::async_trait;

use teloxide::{prelude::*, types::ParseMode, RequestError};

use tokio::time::sleep;

pub mod polling;
pub mod webhook;

pub use teloxide::Bot;

use tcc_core::{
    domain::ChatId,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, DeliveryError, TextFormat},
    },
};

/// `reqwest` timeout; must outlive the long-poll server timeout.
pub const CLIENT_TIMEOUT: Duration = Duration::from_secs(45);

/// Build a bot whose HTTP client tolerates long polling.
pub fn build_bot(token: &str) -> anyhow::Result<Bot> {
    let client: reqwest::Client = teloxide::net::default_reqwest_settings()
        .timeout(CLIENT_TIMEOUT)
        .build()?;
    Ok(Bot::with_client(token, client))
}

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
}

impl TelegramMessenger {
    pub fn new(bot: Bot) -> Self {
        Self { bot }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    async fn with_retry<T, Fut>(
        &self,
        mut op: impl FnMut() -> Fut,
    ) -> std::result::Result<T, DeliveryError>
    where
        Fut: std::future::IntoFuture<Output = std::result::Result<T, RequestError>>,
        Fut::IntoFuture: Send,
    {
        const MAX_RETRIES: usize = 1;
        let mut attempts = 0usize;
        loop {
            match op().await {
                Ok(v) => return Ok(v),
                Err(RequestError::RetryAfter(d)) if attempts < MAX_RETRIES => {
                    attempts += 1;
                    sleep(d).await;
                }
                Err(other) => return Err(classify_error(other)),
            }
        }
    }
}

/// Split Bot API failures into "the markup was bad" and everything else.
pub fn classify_error(e: RequestError) -> DeliveryError {
    if let RequestError::Api(api) = &e {
        let text = api.to_string().to_lowercase();
        if text.contains("can't parse") || text.contains("parse entities") {
            return DeliveryError::FormatRejected(api.to_string());
        }
    }
    DeliveryError::Transport(format!("telegram error: {e}"))
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
    ) -> std::result::Result<(), DeliveryError> {
        self.with_retry(|| {
            let req = self.bot.send_message(Self::tg_chat(chat_id), text.to_string());
            match format {
                #[allow(deprecated)]
                TextFormat::Markdown => req.parse_mode(ParseMode::Markdown),
                TextFormat::Plain => req,
            }
        })
        .await?;
        Ok(())
    }

    async fn send_chat_action(
        &self,
        chat_id: ChatId,
        action: ChatAction,
    ) -> std::result::Result<(), DeliveryError> {
        let tg_action = match action {
            ChatAction::Typing => teloxide::types::ChatAction::Typing,
        };
        self.with_retry(|| self.bot.send_chat_action(Self::tg_chat(chat_id), tg_action))
            .await?;
        Ok(())
    }
}
