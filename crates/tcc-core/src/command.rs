/// Marker that starts a bot command.
pub const COMMAND_MARKER: char = '/';

/// A command token (`/ask`) plus its argument text.
///
/// `command` is empty for plain text; `argument` then carries the whole input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParsedCommand {
    pub command: String,
    pub argument: String,
}

impl ParsedCommand {
    pub fn is_command(&self) -> bool {
        !self.command.is_empty()
    }
}

/// Parse raw message text.
///
/// Telegram may send `/cmd@botname arg1 ...`; the mention suffix is dropped.
pub fn parse(text: &str) -> ParsedCommand {
    let text = text.trim();
    if !text.starts_with(COMMAND_MARKER) {
        return ParsedCommand {
            command: String::new(),
            argument: text.to_string(),
        };
    }

    let (token, rest) = match text.split_once(char::is_whitespace) {
        Some((token, rest)) => (token, rest.trim()),
        None => (text, ""),
    };

    let command = token
        .split('@')
        .next()
        .unwrap_or_default()
        .to_lowercase();

    ParsedCommand {
        command,
        argument: rest.to_string(),
    }
}
