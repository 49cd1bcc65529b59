use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::{
    domain::ChatId,
    messaging::{port::MessagingPort, types::ChatAction},
};

// ============== Typing Indicator Loop ==============

/// Handle for a running typing loop.
///
/// Dropping it cancels the loop; [`TypingGuard::stop`] also waits for it.
pub struct TypingGuard {
    cancel: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl TypingGuard {
    pub async fn stop(mut self) {
        self.cancel.cancel();
        if let Some(h) = self.handle.take() {
            let _ = h.await;
        }
    }
}

impl Drop for TypingGuard {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(h) = self.handle.take() {
            h.abort();
        }
    }
}

/// Send a `typing` action now and every `interval` until stopped.
///
/// Send failures are ignored. An in-flight send is abandoned on cancellation.
pub fn start_typing(
    messenger: Arc<dyn MessagingPort>,
    chat_id: ChatId,
    interval: Duration,
) -> TypingGuard {
    let cancel = CancellationToken::new();
    let token = cancel.clone();
    let interval = interval.max(Duration::from_millis(1));

    let handle = tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                _ = ticker.tick() => {}
            }
            tokio::select! {
                biased;
                _ = token.cancelled() => break,
                res = messenger.send_chat_action(chat_id, ChatAction::Typing) => {
                    if let Err(e) = res {
                        debug!(chat_id = chat_id.0, error = %e, "typing action failed");
                    }
                }
            }
        }
    });

    TypingGuard {
        cancel,
        handle: Some(handle),
    }
}
