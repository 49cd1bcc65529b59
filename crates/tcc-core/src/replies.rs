//! Fixed chat replies and the execution-outcome mapping shared by the
//! inline dispatcher and the queue worker.

use crate::model::types::ExecError;

pub const DENIED: &str = "Access denied. Contact the admin.";
pub const MISSING_PROMPT: &str = "Please provide a question, e.g.: `/ask how to sort a list?`";
pub const ACCEPTED: &str = "Accepted, processing...";
pub const TIMEOUT: &str = "Timed out. Try a shorter question or retry later.";
pub const BINARY_NOT_FOUND: &str = "Claude Code binary not found. Check CLAUDE_BIN config.";
pub const SYSTEM_ERROR: &str = "System error. Please retry later.";

pub fn welcome_text(direct_chat: bool) -> String {
    let hint = if direct_chat {
        "Send any message directly"
    } else {
        "Use `/ask <question>`"
    };
    format!(
        "Welcome to TeleClaudeCode!\n\n\
         {hint} to query Claude Code.\n\
         Example: `How to read CSV in Python?`\n\n\
         Send `/help` for more info."
    )
}

pub fn help_text(direct_chat: bool) -> String {
    let mut lines = vec![
        "*TeleClaudeCode Help*\n",
        "- `/ask <question>` -- Ask Claude Code",
        "- `/start` -- Welcome message",
        "- `/help` -- This help\n",
    ];
    if direct_chat {
        lines.insert(1, "You can also just type your question directly!\n");
    }
    lines.extend([
        "*Examples:*",
        "`write a quicksort function`",
        "`explain Python GIL`",
    ]);
    lines.join("\n")
}

/// The one final message for an execution result.
pub fn outcome_message(result: &Result<String, ExecError>) -> String {
    match result {
        Ok(stdout) => stdout.clone(),
        Err(ExecError::Timeout(_)) => TIMEOUT.to_string(),
        Err(ExecError::BinaryNotFound(_)) => BINARY_NOT_FOUND.to_string(),
        Err(e @ ExecError::NonZeroExit { .. }) => format!("Error: {e}"),
        Err(ExecError::Unexpected(_)) => SYSTEM_ERROR.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::{path::PathBuf, time::Duration};

    #[test]
    fn welcome_names_product_and_hint() {
        let direct = welcome_text(true);
        assert!(direct.starts_with("Welcome to TeleClaudeCode!"));
        assert!(direct.contains("Send any message directly to query Claude Code."));

        let ask_only = welcome_text(false);
        assert!(ask_only.contains("Use `/ask <question>` to query Claude Code."));
    }

    #[test]
    fn help_mentions_direct_chat_only_when_enabled() {
        let on = help_text(true);
        let off = help_text(false);
        assert!(on.contains("type your question directly"));
        assert!(!off.contains("type your question directly"));
        for text in [&on, &off] {
            assert!(text.starts_with("*TeleClaudeCode Help*"));
            assert!(text.contains("`explain Python GIL`"));
        }
    }

    #[test]
    fn outcomes_map_to_fixed_texts() {
        assert_eq!(outcome_message(&Ok("42".to_string())), "42");
        assert_eq!(
            outcome_message(&Err(ExecError::Timeout(Duration::from_secs(1)))),
            TIMEOUT
        );
        assert_eq!(
            outcome_message(&Err(ExecError::BinaryNotFound(PathBuf::from("x")))),
            BINARY_NOT_FOUND
        );
        assert_eq!(
            outcome_message(&Err(ExecError::Unexpected("pipe closed".to_string()))),
            SYSTEM_ERROR
        );
    }

    #[test]
    fn non_zero_exit_carries_detail() {
        let msg = outcome_message(&Err(ExecError::NonZeroExit {
            code: Some(1),
            stderr: "rate limited".to_string(),
        }));
        assert_eq!(msg, "Error: claude exited with code 1: rate limited");
    }
}
