/// Formatting requested for an outgoing text.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TextFormat {
    /// Telegram legacy Markdown.
    Markdown,
    /// No parse mode.
    Plain,
}

/// Outgoing "chat action" (typing indicator).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatAction {
    Typing,
}

/// A single outbound call failed.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    /// The platform could not parse the markup in the text.
    #[error("formatting rejected: {0}")]
    FormatRejected(String),

    #[error("delivery failed: {0}")]
    Transport(String),
}
