/// Core error type for setup and adapter failures.
///
/// Adapter crates map their specific errors into this type. Failures on the
/// execution path have their own types (`ExecError`, `DeliveryError`) because
/// they are turned into chat replies instead of being propagated.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("config error: {0}")]
    Config(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("queue error: {0}")]
    Queue(String),

    #[error("external error: {0}")]
    External(String),
}

pub type Result<T> = std::result::Result<T, Error>;
