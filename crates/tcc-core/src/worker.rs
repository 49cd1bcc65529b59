use std::{sync::Arc, time::Duration};

use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::{
    domain::ChatId,
    messaging::sender::MessageSender,
    model::client::Assistant,
    queue::{Job, JobSource},
    replies,
};

/// How long one claim blocks waiting for work.
pub const CLAIM_WAIT: Duration = Duration::from_secs(5);

/// Pause after the broker fails a claim or an ack.
pub const ERROR_BACKOFF: Duration = Duration::from_secs(5);

/// Consumes queued jobs: execute, reply, ack.
pub struct Worker {
    assistant: Arc<dyn Assistant>,
    sender: Arc<MessageSender>,
    backoff: Duration,
}

impl Worker {
    pub fn new(assistant: Arc<dyn Assistant>, sender: Arc<MessageSender>) -> Self {
        Self {
            assistant,
            sender,
            backoff: ERROR_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Run one job and deliver its reply. No typing indicator.
    pub async fn process(&self, job: &Job) {
        let chat_id = ChatId(job.chat_id);
        info!(
            chat_id = job.chat_id,
            user_id = job.user_id,
            prompt_len = job.prompt.chars().count(),
            "job started"
        );

        let result = self.assistant.execute(&job.prompt).await;
        if let Err(e) = &result {
            warn!(chat_id = job.chat_id, error = %e, "job execution failed");
        }

        let reply = replies::outcome_message(&result);
        self.sender.send(chat_id, &reply).await;
        info!(
            chat_id = job.chat_id,
            output_len = reply.chars().count(),
            "job finished"
        );
    }

    /// Claim loop. Returns once `cancel` fires, never in the middle of a job.
    pub async fn run<S: JobSource>(&self, mut source: S, cancel: CancellationToken) {
        while !cancel.is_cancelled() {
            let claim = tokio::select! {
                _ = cancel.cancelled() => break,
                claim = source.claim(CLAIM_WAIT) => claim,
            };

            let claim = match claim {
                Ok(Some(claim)) => claim,
                Ok(None) => continue,
                Err(e) => {
                    error!(error = %e, "claim failed");
                    self.pause(&cancel).await;
                    continue;
                }
            };

            match claim.decode() {
                Ok(job) => self.process(&job).await,
                Err(e) => warn!(error = %e, raw_len = claim.raw().len(), "dropping undecodable job"),
            }

            if let Err(e) = source.ack(&claim).await {
                error!(error = %e, "ack failed");
                self.pause(&cancel).await;
            }
        }
        info!("worker stopped");
    }

    async fn pause(&self, cancel: &CancellationToken) {
        tokio::select! {
            _ = cancel.cancelled() => {}
            _ = tokio::time::sleep(self.backoff) => {}
        }
    }
}
