//! In-memory fakes for the ports: messenger, assistant, queue and job source.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::{
    domain::ChatId,
    errors::Error,
    messaging::{
        port::MessagingPort,
        types::{ChatAction, DeliveryError, TextFormat},
    },
    model::{client::Assistant, types::ExecError},
    queue::{ClaimedJob, Job, JobQueue, JobSource},
    Result,
};

fn lock<T>(m: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|e| e.into_inner())
}

// ---------------------------------------------------------------------------
// FakeMessenger
// ---------------------------------------------------------------------------

/// One recorded `send_text` attempt.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sent {
    pub chat_id: ChatId,
    pub text: String,
    pub format: TextFormat,
    pub ok: bool,
}

#[derive(Default)]
pub struct FakeMessenger {
    reject_markdown: bool,
    fail_marker: Option<String>,
    sent: Mutex<Vec<Sent>>,
    actions: AtomicUsize,
}

impl FakeMessenger {
    /// Every Markdown send fails with `FormatRejected`.
    pub fn rejecting_markdown() -> Self {
        Self {
            reject_markdown: true,
            ..Self::default()
        }
    }

    /// Sends whose text contains `marker` fail with `Transport`.
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_marker: Some(marker.to_string()),
            ..Self::default()
        }
    }

    /// Every attempt, in order, successful or not.
    pub fn sent(&self) -> Vec<Sent> {
        lock(&self.sent).clone()
    }

    pub fn delivered(&self) -> Vec<Sent> {
        self.sent().into_iter().filter(|s| s.ok).collect()
    }

    /// Texts of delivered messages.
    pub fn texts(&self) -> Vec<String> {
        self.delivered().into_iter().map(|s| s.text).collect()
    }

    pub fn actions(&self) -> usize {
        self.actions.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MessagingPort for FakeMessenger {
    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        format: TextFormat,
    ) -> std::result::Result<(), DeliveryError> {
        let outcome = if self
            .fail_marker
            .as_deref()
            .is_some_and(|m| text.contains(m))
        {
            Err(DeliveryError::Transport("connection reset".to_string()))
        } else if self.reject_markdown && format == TextFormat::Markdown {
            Err(DeliveryError::FormatRejected(
                "can't parse entities".to_string(),
            ))
        } else {
            Ok(())
        };

        lock(&self.sent).push(Sent {
            chat_id,
            text: text.to_string(),
            format,
            ok: outcome.is_ok(),
        });
        outcome
    }

    async fn send_chat_action(
        &self,
        _chat_id: ChatId,
        _action: ChatAction,
    ) -> std::result::Result<(), DeliveryError> {
        self.actions.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FakeAssistant
// ---------------------------------------------------------------------------

/// Assistant returning one scripted result for every prompt.
pub struct FakeAssistant {
    result: std::result::Result<String, ExecError>,
    delay: Duration,
    prompts: Mutex<Vec<String>>,
}

impl FakeAssistant {
    pub fn answering(text: &str) -> Self {
        Self::with_result(Ok(text.to_string()))
    }

    pub fn failing(err: ExecError) -> Self {
        Self::with_result(Err(err))
    }

    fn with_result(result: std::result::Result<String, ExecError>) -> Self {
        Self {
            result,
            delay: Duration::ZERO,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).clone()
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }
}

#[async_trait]
impl Assistant for FakeAssistant {
    async fn execute(&self, prompt: &str) -> std::result::Result<String, ExecError> {
        lock(&self.prompts).push(prompt.to_string());
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        self.result.clone()
    }
}

// ---------------------------------------------------------------------------
// FakeQueue / FakeSource
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct FakeQueue {
    fail: bool,
    jobs: Mutex<Vec<Job>>,
}

impl FakeQueue {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn jobs(&self) -> Vec<Job> {
        lock(&self.jobs).clone()
    }
}

#[async_trait]
impl JobQueue for FakeQueue {
    async fn enqueue(&self, job: &Job) -> Result<()> {
        if self.fail {
            return Err(Error::Queue("connection refused".to_string()));
        }
        lock(&self.jobs).push(job.clone());
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        if self.fail {
            return Err(Error::Queue("connection refused".to_string()));
        }
        Ok(())
    }
}

/// Serves raw payloads in order, then cancels `done` once drained.
pub struct FakeSource {
    pending: VecDeque<String>,
    claim_errors: usize,
    acked: Arc<Mutex<Vec<String>>>,
    done: CancellationToken,
}

impl FakeSource {
    pub fn new(payloads: impl IntoIterator<Item = String>, done: CancellationToken) -> Self {
        Self {
            pending: payloads.into_iter().collect(),
            claim_errors: 0,
            acked: Arc::new(Mutex::new(Vec::new())),
            done,
        }
    }

    /// Fail the first `n` claims.
    pub fn with_claim_errors(mut self, n: usize) -> Self {
        self.claim_errors = n;
        self
    }

    pub fn acked(&self) -> Arc<Mutex<Vec<String>>> {
        self.acked.clone()
    }
}

#[async_trait]
impl JobSource for FakeSource {
    async fn claim(&mut self, _wait: Duration) -> Result<Option<ClaimedJob>> {
        if self.claim_errors > 0 {
            self.claim_errors -= 1;
            return Err(Error::Queue("broken pipe".to_string()));
        }
        match self.pending.pop_front() {
            Some(raw) => Ok(Some(ClaimedJob::new(raw))),
            None => {
                self.done.cancel();
                Ok(None)
            }
        }
    }

    async fn ack(&mut self, claim: &ClaimedJob) -> Result<()> {
        lock(&self.acked).push(claim.raw().to_string());
        Ok(())
    }
}
