use std::path::PathBuf;

use async_trait::async_trait;

use super::types::{ClaudeCliConfig, ExecError};

/// Appended when stdout is cut at `max_output_chars`.
pub const TRUNCATION_MARKER: &str = "\n\n... (output truncated)";

/// Max chars of stderr carried by [`ExecError::NonZeroExit`].
pub const STDERR_EXCERPT_MAX: usize = 500;

/// The external assistant: one prompt in, one answer out.
///
/// No retries here; callers decide.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn execute(&self, prompt: &str) -> Result<String, ExecError>;
}

/// A concrete CLI invocation (used by the `claude` runner).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CliInvocation {
    pub program: PathBuf,
    pub args: Vec<String>,
}

/// Prompt adapter for Claude CLI.
#[derive(Clone, Debug)]
pub struct ClaudeCliPromptAdapter {
    pub cfg: ClaudeCliConfig,
}

impl ClaudeCliPromptAdapter {
    /// Build `claude -p [--model m] [--permission-mode p] [--max-budget-usd b] <prompt>`.
    pub fn build_invocation(&self, prompt: &str) -> CliInvocation {
        let mut args: Vec<String> = vec!["-p".to_string()];

        if let Some(model) = self.cfg.model.as_deref().filter(|m| !m.is_empty()) {
            args.push("--model".to_string());
            args.push(model.to_string());
        }
        if let Some(mode) = self.cfg.permission_mode {
            args.push("--permission-mode".to_string());
            args.push(mode.as_claude_cli_flag().to_string());
        }
        if let Some(budget) = self.cfg.max_budget_usd.as_deref().filter(|b| !b.is_empty()) {
            args.push("--max-budget-usd".to_string());
            args.push(budget.to_string());
        }

        // Prompt as the final positional argument.
        args.push(prompt.to_string());

        CliInvocation {
            program: self.cfg.claude_bin.clone(),
            args,
        }
    }
}

/// Trim stdout and cap it at `max_chars`.
pub fn finalize_stdout(raw: &str, max_chars: usize) -> String {
    let out = raw.trim();
    if out.chars().count() <= max_chars {
        return out.to_string();
    }
    let mut truncated = out.chars().take(max_chars).collect::<String>();
    truncated.push_str(TRUNCATION_MARKER);
    truncated
}

/// Trimmed stderr, at most [`STDERR_EXCERPT_MAX`] chars.
pub fn stderr_excerpt(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return "(no stderr)".to_string();
    }
    trimmed.chars().take(STDERR_EXCERPT_MAX).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::types::PermissionMode;
    use std::time::Duration;

    fn adapter(cfg: ClaudeCliConfig) -> ClaudeCliPromptAdapter {
        ClaudeCliPromptAdapter { cfg }
    }

    #[test]
    fn minimal_invocation_is_prompt_flag_plus_prompt() {
        let inv = adapter(ClaudeCliConfig::default()).build_invocation("explain GIL");
        assert_eq!(inv.program, PathBuf::from("claude"));
        assert_eq!(inv.args, vec!["-p", "explain GIL"]);
    }

    #[test]
    fn optional_flags_precede_prompt() {
        let inv = adapter(ClaudeCliConfig {
            claude_bin: PathBuf::from("/opt/claude"),
            model: Some("sonnet".to_string()),
            permission_mode: Some(PermissionMode::BypassPermissions),
            max_budget_usd: Some("1.0".to_string()),
            ..ClaudeCliConfig::default()
        })
        .build_invocation("--not-a-flag; rm -rf /");

        assert_eq!(
            inv.args,
            vec![
                "-p",
                "--model",
                "sonnet",
                "--permission-mode",
                "bypassPermissions",
                "--max-budget-usd",
                "1.0",
                "--not-a-flag; rm -rf /",
            ]
        );
    }

    #[test]
    fn empty_optional_values_are_skipped() {
        let inv = adapter(ClaudeCliConfig {
            model: Some(String::new()),
            max_budget_usd: Some(String::new()),
            ..ClaudeCliConfig::default()
        })
        .build_invocation("hi");
        assert_eq!(inv.args, vec!["-p", "hi"]);
    }

    #[test]
    fn stdout_is_trimmed_and_capped() {
        assert_eq!(finalize_stdout("  answer \n", 100), "answer");
        assert_eq!(
            finalize_stdout(&"x".repeat(12), 10),
            format!("{}{}", "x".repeat(10), TRUNCATION_MARKER)
        );
        assert_eq!(finalize_stdout(&"x".repeat(10), 10), "x".repeat(10));
    }

    #[test]
    fn stderr_excerpt_is_bounded() {
        assert_eq!(stderr_excerpt("  \n"), "(no stderr)");
        assert_eq!(stderr_excerpt(" boom \n"), "boom");
        assert_eq!(stderr_excerpt(&"e".repeat(900)).len(), STDERR_EXCERPT_MAX);
    }

    #[test]
    fn exec_error_messages_carry_detail() {
        assert_eq!(
            ExecError::Timeout(Duration::from_secs(120)).to_string(),
            "claude timed out after 120s"
        );
        assert_eq!(
            ExecError::NonZeroExit {
                code: Some(2),
                stderr: "bad flag".to_string()
            }
            .to_string(),
            "claude exited with code 2: bad flag"
        );
        assert_eq!(
            ExecError::BinaryNotFound(PathBuf::from("/nope/claude")).to_string(),
            "claude binary not found: /nope/claude"
        );
    }
}
