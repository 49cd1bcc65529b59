use std::{path::PathBuf, str::FromStr, time::Duration};

use crate::errors::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PermissionMode {
    Default,
    AcceptEdits,
    BypassPermissions,
    Delegate,
    DontAsk,
    Plan,
}

impl PermissionMode {
    pub fn as_claude_cli_flag(self) -> &'static str {
        match self {
            PermissionMode::Default => "default",
            PermissionMode::AcceptEdits => "acceptEdits",
            PermissionMode::BypassPermissions => "bypassPermissions",
            PermissionMode::Delegate => "delegate",
            PermissionMode::DontAsk => "dontAsk",
            PermissionMode::Plan => "plan",
        }
    }
}

impl FromStr for PermissionMode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "default" => Ok(PermissionMode::Default),
            "acceptEdits" => Ok(PermissionMode::AcceptEdits),
            "bypassPermissions" => Ok(PermissionMode::BypassPermissions),
            "delegate" => Ok(PermissionMode::Delegate),
            "dontAsk" => Ok(PermissionMode::DontAsk),
            "plan" => Ok(PermissionMode::Plan),
            other => Err(Error::Config(format!("unknown permission mode: {other:?}"))),
        }
    }
}

/// How to invoke `claude -p`.
///
/// Optional flags are only emitted when set.
#[derive(Clone, Debug)]
pub struct ClaudeCliConfig {
    pub claude_bin: PathBuf,
    pub model: Option<String>,
    pub permission_mode: Option<PermissionMode>,
    /// Passed through verbatim to `--max-budget-usd`.
    pub max_budget_usd: Option<String>,
    pub timeout: Duration,
    pub max_output_chars: usize,
}

impl Default for ClaudeCliConfig {
    fn default() -> Self {
        Self {
            claude_bin: PathBuf::from("claude"),
            model: None,
            permission_mode: None,
            max_budget_usd: None,
            timeout: Duration::from_secs(300),
            max_output_chars: 12_000,
        }
    }
}

/// Why an assistant run produced no answer.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    #[error("claude timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("claude binary not found: {}", .0.display())]
    BinaryNotFound(PathBuf),

    #[error("claude exited with code {}: {stderr}", .code.map(|c| c.to_string()).unwrap_or_else(|| "?".to_string()))]
    NonZeroExit { code: Option<i32>, stderr: String },

    #[error("unexpected failure: {0}")]
    Unexpected(String),
}
