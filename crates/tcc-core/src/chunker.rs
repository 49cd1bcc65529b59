//! Split long text into Telegram-safe chunks.

/// Telegram's hard message limit.
pub const TELEGRAM_MESSAGE_LIMIT: usize = 4096;

/// Room kept for the `[i/N]\n` prefix line on multi-chunk messages.
pub const PREFIX_RESERVE: usize = 20;

/// Default chunk size handed to [`chunk`] by the sender.
pub const DEFAULT_CHUNK_LIMIT: usize = TELEGRAM_MESSAGE_LIMIT - PREFIX_RESERVE;

/// Split `text` into chunks of at most `limit` chars.
///
/// Text that already fits (including the empty string) comes back as a single
/// unchanged element. Otherwise each cut prefers the last newline in the
/// second half of the window, then the last space there, then a hard cut.
pub fn chunk(text: &str, limit: usize) -> Vec<String> {
    let limit = limit.max(1);
    if text.chars().count() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut rest = text;
    while !rest.is_empty() {
        if rest.chars().count() <= limit {
            chunks.push(rest.to_string());
            break;
        }

        let window_start = byte_offset(rest, limit / 2);
        let window_end = byte_offset(rest, limit);
        let window = &rest[window_start..window_end];

        let cut = match window.rfind('\n').map(|i| window_start + i) {
            // A newline at offset 0 would produce an empty chunk.
            Some(nl) if nl > 0 => nl,
            _ => match window.rfind(' ') {
                // Space stays with the chunk it ends.
                Some(sp) => window_start + sp + 1,
                None => window_end,
            },
        };

        chunks.push(rest[..cut].to_string());
        rest = rest[cut..].trim_start_matches('\n');
    }
    chunks
}

/// Byte offset of the `n`th char (or the end of `s`).
fn byte_offset(s: &str, n: usize) -> usize {
    s.char_indices().nth(n).map(|(i, _)| i).unwrap_or(s.len())
}
