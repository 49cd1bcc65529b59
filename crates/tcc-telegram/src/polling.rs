use std::{sync::Arc, time::Duration};

use teloxide::{
    prelude::*,
    types::{Update, UpdateKind},
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use tcc_core::{
    dispatcher::Dispatcher,
    domain::{ChatId, UpdateId, UserId},
    update::{InboundMessage, InboundUpdate},
};

/// Pause after a failed `getUpdates`.
pub const FETCH_BACKOFF: Duration = Duration::from_secs(5);

/// Map a teloxide update onto the dispatcher's input.
pub fn to_inbound(update: Update) -> InboundUpdate {
    let update_id = UpdateId(i64::from(update.id));
    let message = match update.kind {
        UpdateKind::Message(msg) => Some(InboundMessage {
            chat_id: ChatId(msg.chat.id.0),
            user_id: UserId(msg.from().map(|u| u.id.0 as i64).unwrap_or(0)),
            text: msg.text().unwrap_or_default().to_string(),
        }),
        _ => None,
    };
    InboundUpdate { update_id, message }
}

/// Long-poll loop for inline mode. Returns when `cancel` fires.
pub async fn run_polling(
    bot: Bot,
    dispatcher: Arc<Dispatcher>,
    poll_timeout: Duration,
    cancel: CancellationToken,
) -> anyhow::Result<()> {
    let me = bot.get_me().await?;
    info!(username = %me.username(), "telegram bot connected");

    // getUpdates is refused while a webhook is registered.
    bot.delete_webhook().await?;

    let timeout_secs = u32::try_from(poll_timeout.as_secs()).unwrap_or(u32::MAX);
    let mut offset: i32 = 0;

    loop {
        let fetched = tokio::select! {
            _ = cancel.cancelled() => break,
            res = bot.get_updates().offset(offset).timeout(timeout_secs).send() => res,
        };

        let mut updates = match fetched {
            Ok(updates) => updates,
            Err(e) => {
                warn!(error = %e, "getUpdates failed");
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = tokio::time::sleep(FETCH_BACKOFF) => continue,
                }
            }
        };

        debug!(count = updates.len(), "got telegram updates");
        updates.sort_by_key(|u| u.id);

        for update in updates {
            offset = update.id.saturating_add(1);
            let inbound = to_inbound(update);
            let update_id = inbound.update_id.0;
            // A panicking handler must not take the loop down with it.
            let dispatcher = dispatcher.clone();
            match tokio::spawn(async move { dispatcher.handle(inbound).await }).await {
                Ok(outcome) => debug!(update_id, ?outcome, "update handled"),
                Err(e) => error!(update_id, error = %e, "update handler failed"),
            }
        }
    }

    info!("telegram polling stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn update(json: serde_json::Value) -> Update {
        // teloxide 0.12 cannot deserialize `Update` from a `Value`; go through a string.
        serde_json::from_str(&json.to_string()).unwrap()
    }

    #[test]
    fn maps_text_message() {
        let u = update(serde_json::json!({
            "update_id": 42,
            "message": {
                "message_id": 1,
                "date": 1_700_000_000,
                "chat": {"id": 100, "type": "private", "first_name": "A"},
                "from": {"id": 7, "is_bot": false, "first_name": "A"},
                "text": "/ask hi"
            }
        }));
        assert_eq!(to_inbound(u), InboundUpdate::text(42, 100, 7, "/ask hi"));
    }
}
