use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::{
    domain::{ChatId, UserId},
    Result,
};

/// A queued prompt. Serialized as JSON on the wire.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub chat_id: i64,
    pub user_id: i64,
    pub prompt: String,
    /// RFC 3339, informational only.
    #[serde(default)]
    pub enqueued_at: String,
}

impl Job {
    pub fn new(chat_id: ChatId, user_id: UserId, prompt: &str) -> Self {
        Self {
            chat_id: chat_id.0,
            user_id: user_id.0,
            prompt: prompt.to_string(),
            enqueued_at: Utc::now().to_rfc3339(),
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Producer side of the job queue.
#[async_trait]
pub trait JobQueue: Send + Sync {
    async fn enqueue(&self, job: &Job) -> Result<()>;

    /// Cheap liveness probe for readiness checks.
    async fn ping(&self) -> Result<()>;
}

/// A payload moved into this consumer's processing list.
///
/// Kept raw so it can be acked even when it does not decode.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClaimedJob {
    raw: String,
}

impl ClaimedJob {
    pub fn new(raw: String) -> Self {
        Self { raw }
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn decode(&self) -> Result<Job> {
        Ok(serde_json::from_str(&self.raw)?)
    }
}

/// Consumer side: claim, process, ack.
///
/// A claimed job stays in the processing list until acked, so a crash
/// between claim and ack leaves it recoverable.
#[async_trait]
pub trait JobSource: Send {
    /// Wait up to `wait` for a job. `Ok(None)` on an idle window.
    async fn claim(&mut self, wait: Duration) -> Result<Option<ClaimedJob>>;

    async fn ack(&mut self, claim: &ClaimedJob) -> Result<()>;
}
