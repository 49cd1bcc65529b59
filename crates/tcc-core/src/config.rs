use std::{fmt, path::PathBuf, str::FromStr, time::Duration};

use crate::{
    chunker::DEFAULT_CHUNK_LIMIT,
    errors::Error,
    model::types::{ClaudeCliConfig, PermissionMode},
    security::{AllowList, WebhookSecret},
    Result,
};

/// How inbound updates reach the bot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunMode {
    /// Long-poll `getUpdates`, execute inline.
    Polling,
    /// HTTP webhook, execution through the job queue.
    Webhook,
}

impl FromStr for RunMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "polling" | "poll" => Ok(RunMode::Polling),
            "webhook" => Ok(RunMode::Webhook),
            other => Err(Error::Config(format!(
                "MODE must be `polling` or `webhook`, got {other:?}"
            ))),
        }
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunMode::Polling => "polling",
            RunMode::Webhook => "webhook",
        })
    }
}

/// Typed process configuration.
#[derive(Clone, Debug)]
pub struct Config {
    // App
    pub app_env: String,
    pub app_host: String,
    pub app_port: u16,
    pub log_level: String,
    pub mode: RunMode,

    // Telegram
    pub telegram_bot_token: String,
    pub webhook_secret: Option<WebhookSecret>,
    pub allowed_users: AllowList,
    pub chunk_limit: usize,
    pub direct_chat: bool,
    pub poll_timeout: Duration,
    pub typing_interval: Duration,

    // Queue
    pub redis_url: String,
    pub queue_name: String,
    pub worker_name: String,
    pub worker_concurrency: usize,

    // Claude CLI
    pub claude_bin: PathBuf,
    pub claude_timeout: Duration,
    pub claude_max_output_chars: usize,
    pub claude_model: Option<String>,
    pub claude_permission_mode: Option<PermissionMode>,
    pub claude_max_budget_usd: Option<String>,
}

impl Config {
    /// Load from the process environment, after applying `.env` if present.
    ///
    /// Variables already set in the environment win over `.env`.
    pub fn load() -> Result<Self> {
        dotenv_outcome(dotenvy::dotenv())?;
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let vars = Vars { lookup: &lookup };

        let telegram_bot_token = vars.string("TELEGRAM_BOT_TOKEN").ok_or_else(|| {
            Error::Config("TELEGRAM_BOT_TOKEN is required".to_string())
        })?;

        let allowed_users =
            AllowList::parse_csv(&vars.string("TELEGRAM_ALLOWED_USER_IDS").unwrap_or_default())?;
        let webhook_secret = WebhookSecret::new(
            &vars.string("TELEGRAM_WEBHOOK_SECRET").unwrap_or_default(),
        );

        let claude_permission_mode = vars
            .string("CLAUDE_PERMISSION_MODE")
            .map(|s| s.parse::<PermissionMode>())
            .transpose()?;

        let claude_max_budget_usd = vars.string("CLAUDE_MAX_BUDGET_USD");
        if let Some(raw) = claude_max_budget_usd.as_deref() {
            match raw.parse::<f64>() {
                Ok(v) if v.is_finite() && v >= 0.0 => {}
                _ => {
                    return Err(Error::Config(format!(
                        "CLAUDE_MAX_BUDGET_USD must be a non-negative number, got {raw:?}"
                    )))
                }
            }
        }

        let worker_concurrency = vars.parse("CLAUDE_GLOBAL_CONCURRENCY", 4usize)?;
        if worker_concurrency == 0 {
            return Err(Error::Config(
                "CLAUDE_GLOBAL_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        Ok(Self {
            app_env: vars.string("APP_ENV").unwrap_or_else(|| "dev".to_string()),
            app_host: vars
                .string("APP_HOST")
                .unwrap_or_else(|| "0.0.0.0".to_string()),
            app_port: vars.parse("APP_PORT", 8080u16)?,
            log_level: vars
                .string("LOG_LEVEL")
                .unwrap_or_else(|| "info".to_string())
                .to_lowercase(),
            mode: vars.parse("MODE", RunMode::Polling)?,

            telegram_bot_token,
            webhook_secret,
            allowed_users,
            chunk_limit: vars
                .parse("TELEGRAM_CHUNK_LIMIT", DEFAULT_CHUNK_LIMIT)?
                .clamp(1, DEFAULT_CHUNK_LIMIT),
            direct_chat: vars.bool("DIRECT_CHAT", true)?,
            poll_timeout: Duration::from_secs(vars.parse("POLL_TIMEOUT_SEC", 30u64)?),
            typing_interval: Duration::from_secs(vars.parse("TYPING_INTERVAL_SEC", 4u64)?.max(1)),

            redis_url: vars
                .string("REDIS_URL")
                .unwrap_or_else(|| "redis://localhost:6379/0".to_string()),
            queue_name: vars
                .string("QUEUE_NAME")
                .unwrap_or_else(|| "teleclaudecode".to_string()),
            worker_name: vars
                .string("WORKER_NAME")
                .unwrap_or_else(|| "worker".to_string()),
            worker_concurrency,

            claude_bin: PathBuf::from(
                vars.string("CLAUDE_BIN")
                    .unwrap_or_else(|| "claude".to_string()),
            ),
            claude_timeout: Duration::from_secs(vars.parse("CLAUDE_TIMEOUT_SEC", 300u64)?),
            claude_max_output_chars: vars.parse("CLAUDE_MAX_OUTPUT_CHARS", 12_000usize)?,
            claude_model: vars.string("CLAUDE_MODEL"),
            claude_permission_mode,
            claude_max_budget_usd,
        })
    }

    pub fn claude_cli_config(&self) -> ClaudeCliConfig {
        ClaudeCliConfig {
            claude_bin: self.claude_bin.clone(),
            model: self.claude_model.clone(),
            permission_mode: self.claude_permission_mode,
            max_budget_usd: self.claude_max_budget_usd.clone(),
            timeout: self.claude_timeout,
            max_output_chars: self.claude_max_output_chars,
        }
    }

    /// `host:port` for the webhook listener.
    pub fn listen_addr(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    /// Last 6 chars of the bot token, for startup logs.
    pub fn token_hint(&self) -> String {
        let n = self.telegram_bot_token.chars().count();
        let tail: String = self
            .telegram_bot_token
            .chars()
            .skip(n.saturating_sub(6))
            .collect();
        format!("...{tail}")
    }
}

struct Vars<'a> {
    lookup: &'a dyn Fn(&str) -> Option<String>,
}

impl Vars<'_> {
    /// Trimmed value; unset and blank are both `None`.
    fn string(&self, key: &str) -> Option<String> {
        (self.lookup)(key)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.string(key) {
            None => Ok(default),
            Some(raw) => raw
                .parse::<T>()
                .map_err(|_| Error::Config(format!("invalid value for {key}: {raw:?}"))),
        }
    }

    fn bool(&self, key: &str, default: bool) -> Result<bool> {
        let Some(raw) = self.string(key) else {
            return Ok(default);
        };
        match raw.to_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            _ => Err(Error::Config(format!("invalid value for {key}: {raw:?}"))),
        }
    }
}

/// A missing `.env` is fine; a present but unreadable or malformed one is not.
fn dotenv_outcome<T>(result: std::result::Result<T, dotenvy::Error>) -> Result<()> {
    match result {
        Ok(_) => Ok(()),
        Err(e) if e.not_found() => Ok(()),
        Err(e) => Err(Error::Config(format!(".env: {e}"))),
    }
}
