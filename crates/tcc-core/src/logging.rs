use tracing_subscriber::{fmt, EnvFilter};

use crate::{errors::Error, Result};

/// Initialize tracing for a process.
///
/// `level` applies to our crates; everything else stays at `warn`.
/// Can be overridden with `RUST_LOG`.
pub fn init(service_name: &str, level: &str) -> Result<()> {
    let level = level.trim().to_lowercase();
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(format!(
            "warn,tcc={level},tcc_core={level},tcc_claude_cli={level},tcc_redis={level},tcc_telegram={level},{}={level}",
            service_name.replace('-', "_")
        ))
    });

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .try_init()
        .map_err(|e| Error::External(format!("failed to install tracing subscriber: {e}")))?;

    Ok(())
}
