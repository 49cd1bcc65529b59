use std::{net::SocketAddr, sync::Arc};

use anyhow::Context;
use clap::{Parser, Subcommand};
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use tcc_claude_cli::ClaudeCliExecutor;
use tcc_core::{
    config::{Config, RunMode},
    dispatcher::{Dispatcher, Execution},
    messaging::sender::MessageSender,
    model::client::Assistant,
    queue::JobQueue,
    worker::Worker,
};
use tcc_redis::{RedisJobConsumer, RedisJobQueue};
use tcc_telegram::{
    build_bot,
    polling::run_polling,
    webhook::{self, WebhookState},
    Bot, TelegramMessenger,
};

/// TeleClaudeCode: ask Claude Code from Telegram.
#[derive(Parser, Debug)]
#[command(name = "tcc", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, Copy)]
enum Command {
    /// Long-poll Telegram and run prompts inline.
    Poll,
    /// Serve the Telegram webhook and enqueue prompts.
    Webhook,
    /// Consume queued prompts.
    Worker,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = Config::load()?;
    tcc_core::logging::init("tcc", &cfg.log_level)?;

    let command = cli.command.unwrap_or(match cfg.mode {
        RunMode::Polling => Command::Poll,
        RunMode::Webhook => Command::Webhook,
    });

    info!(
        env = %cfg.app_env,
        mode = %cfg.mode,
        command = ?command,
        token = %cfg.token_hint(),
        claude_bin = %cfg.claude_bin.display(),
        timeout_secs = cfg.claude_timeout.as_secs(),
        model = cfg.claude_model.as_deref().unwrap_or("(default)"),
        direct_chat = cfg.direct_chat,
        allowed_users = cfg.allowed_users.len(),
        "TeleClaudeCode starting"
    );
    if cfg.allowed_users.is_open() {
        warn!("TELEGRAM_ALLOWED_USER_IDS is empty: every user may run prompts");
    }

    let shutdown = CancellationToken::new();
    spawn_ctrl_c(shutdown.clone());

    match command {
        Command::Poll => poll(cfg, shutdown).await,
        Command::Webhook => serve_webhook(cfg, shutdown).await,
        Command::Worker => work(cfg, shutdown).await,
    }
}

fn spawn_ctrl_c(shutdown: CancellationToken) {
    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => info!("ctrl-c received, shutting down"),
            Err(e) => error!(error = %e, "failed to listen for ctrl-c"),
        }
        shutdown.cancel();
    });
}

fn sender(cfg: &Config, bot: Bot) -> Arc<MessageSender> {
    Arc::new(MessageSender::new(
        Arc::new(TelegramMessenger::new(bot)),
        cfg.chunk_limit,
    ))
}

fn assistant(cfg: &Config) -> Arc<dyn Assistant> {
    Arc::new(ClaudeCliExecutor::new(cfg.claude_cli_config()))
}

async fn poll(cfg: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let bot = build_bot(&cfg.telegram_bot_token)?;
    let dispatcher = Dispatcher::new(
        sender(&cfg, bot.clone()),
        cfg.allowed_users.clone(),
        cfg.direct_chat,
        Execution::Inline {
            assistant: assistant(&cfg),
            typing_interval: cfg.typing_interval,
        },
    );

    info!(poll_timeout_secs = cfg.poll_timeout.as_secs(), "polling mode");
    run_polling(bot, Arc::new(dispatcher), cfg.poll_timeout, shutdown)
        .await
        .context("telegram polling failed")
}

async fn serve_webhook(cfg: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let addr: SocketAddr = cfg
        .listen_addr()
        .parse()
        .with_context(|| format!("invalid listen address {}", cfg.listen_addr()))?;
    if cfg.webhook_secret.is_none() {
        warn!("TELEGRAM_WEBHOOK_SECRET is empty: webhook requests are not authenticated");
    }

    let queue: Arc<dyn JobQueue> = Arc::new(
        RedisJobQueue::connect(&cfg.redis_url, &cfg.queue_name)
            .await
            .with_context(|| format!("failed to connect to redis at {}", cfg.redis_url))?,
    );
    let bot = build_bot(&cfg.telegram_bot_token)?;
    let dispatcher = Dispatcher::new(
        sender(&cfg, bot),
        cfg.allowed_users.clone(),
        cfg.direct_chat,
        Execution::Queued {
            queue: queue.clone(),
        },
    );

    let app = webhook::router(WebhookState {
        dispatcher: Arc::new(dispatcher),
        secret: cfg.webhook_secret.clone(),
        queue,
    });
    webhook::serve(addr, app, shutdown).await
}

async fn work(cfg: Config, shutdown: CancellationToken) -> anyhow::Result<()> {
    let bot = build_bot(&cfg.telegram_bot_token)?;
    let worker = Arc::new(Worker::new(assistant(&cfg), sender(&cfg, bot)));

    let mut loops = Vec::with_capacity(cfg.worker_concurrency);
    for n in 0..cfg.worker_concurrency {
        let consumer_name = format!("{}-{n}", cfg.worker_name);
        let mut consumer = RedisJobConsumer::connect(&cfg.redis_url, &cfg.queue_name, &consumer_name)
            .await
            .with_context(|| format!("failed to connect to redis at {}", cfg.redis_url))?;
        consumer
            .recover()
            .await
            .with_context(|| format!("failed to recover jobs for {consumer_name}"))?;

        let worker = worker.clone();
        let shutdown = shutdown.clone();
        loops.push(tokio::spawn(async move {
            info!(consumer = %consumer_name, "consumer started");
            worker.run(consumer, shutdown).await;
        }));
    }

    info!(
        queue = %cfg.queue_name,
        concurrency = cfg.worker_concurrency,
        "worker mode"
    );
    for handle in loops {
        if let Err(e) = handle.await {
            error!(error = %e, "consumer task panicked");
        }
    }
    Ok(())
}
