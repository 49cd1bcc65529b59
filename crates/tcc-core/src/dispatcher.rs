use std::{sync::Arc, time::Duration};

use tracing::{info, warn};

use crate::{
    command,
    dedup::Deduplicator,
    domain::{ChatId, UserId},
    messaging::sender::MessageSender,
    model::client::Assistant,
    queue::{Job, JobQueue},
    replies,
    security::AllowList,
    typing::start_typing,
    update::InboundUpdate,
};

/// Which branch handled an update.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DispatchOutcome {
    Duplicate,
    NoText,
    Welcome,
    Help,
    Denied,
    MissingPrompt,
    /// Inline execution finished and the reply was sent.
    Completed,
    Enqueued,
    EnqueueFailed,
    Ignored,
}

/// Where prompts go once they pass the gates.
pub enum Execution {
    /// Run the assistant now, with a typing indicator.
    Inline {
        assistant: Arc<dyn Assistant>,
        typing_interval: Duration,
    },
    /// Hand off to the job queue and acknowledge.
    Queued { queue: Arc<dyn JobQueue> },
}

pub struct Dispatcher {
    sender: Arc<MessageSender>,
    dedup: Deduplicator,
    acl: AllowList,
    direct_chat: bool,
    execution: Execution,
}

impl Dispatcher {
    pub fn new(
        sender: Arc<MessageSender>,
        acl: AllowList,
        direct_chat: bool,
        execution: Execution,
    ) -> Self {
        Self {
            sender,
            dedup: Deduplicator::default(),
            acl,
            direct_chat,
            execution,
        }
    }

    pub fn with_dedup(mut self, dedup: Deduplicator) -> Self {
        self.dedup = dedup;
        self
    }

    /// Handle one update. Never fails: every error becomes a chat reply or a log line.
    pub async fn handle(&self, update: InboundUpdate) -> DispatchOutcome {
        if self.dedup.seen(update.update_id) {
            info!(update_id = update.update_id.0, "duplicate update");
            return DispatchOutcome::Duplicate;
        }

        let Some(msg) = update.message.filter(|m| !m.text.is_empty()) else {
            return DispatchOutcome::NoText;
        };
        let (chat_id, user_id) = (msg.chat_id, msg.user_id);

        let parsed = command::parse(&msg.text);
        match parsed.command.as_str() {
            "/start" => {
                self.sender
                    .send(chat_id, &replies::welcome_text(self.direct_chat))
                    .await;
                DispatchOutcome::Welcome
            }
            "/help" => {
                self.sender
                    .send(chat_id, &replies::help_text(self.direct_chat))
                    .await;
                DispatchOutcome::Help
            }
            "/ask" => self.ask(chat_id, user_id, &parsed.argument).await,
            "" if self.direct_chat => self.ask(chat_id, user_id, &parsed.argument).await,
            _ => DispatchOutcome::Ignored,
        }
    }

    async fn ask(&self, chat_id: ChatId, user_id: UserId, argument: &str) -> DispatchOutcome {
        if !self.acl.is_allowed(user_id) {
            info!(chat_id = chat_id.0, user_id = user_id.0, "access denied");
            self.sender.send(chat_id, replies::DENIED).await;
            return DispatchOutcome::Denied;
        }

        let prompt = argument.trim();
        if prompt.is_empty() {
            self.sender.send(chat_id, replies::MISSING_PROMPT).await;
            return DispatchOutcome::MissingPrompt;
        }

        match &self.execution {
            Execution::Inline {
                assistant,
                typing_interval,
            } => {
                info!(
                    chat_id = chat_id.0,
                    user_id = user_id.0,
                    prompt_len = prompt.chars().count(),
                    "executing prompt"
                );
                let typing = start_typing(self.sender.messenger(), chat_id, *typing_interval);
                let result = assistant.execute(prompt).await;
                typing.stop().await;

                if let Err(e) = &result {
                    warn!(chat_id = chat_id.0, error = %e, "execution failed");
                }
                let reply = replies::outcome_message(&result);
                info!(chat_id = chat_id.0, output_len = reply.chars().count(), "replying");
                self.sender.send(chat_id, &reply).await;
                DispatchOutcome::Completed
            }
            Execution::Queued { queue } => {
                let job = Job::new(chat_id, user_id, prompt);
                match queue.enqueue(&job).await {
                    Ok(()) => {
                        info!(
                            chat_id = chat_id.0,
                            user_id = user_id.0,
                            prompt_len = prompt.chars().count(),
                            "job enqueued"
                        );
                        self.sender.send(chat_id, replies::ACCEPTED).await;
                        DispatchOutcome::Enqueued
                    }
                    Err(e) => {
                        warn!(chat_id = chat_id.0, error = %e, "enqueue failed");
                        self.sender.send(chat_id, replies::SYSTEM_ERROR).await;
                        DispatchOutcome::EnqueueFailed
                    }
                }
            }
        }
    }
}
