//! Outbound chat delivery (Telegram today, behind a port).

pub mod port;
pub mod sender;
pub mod types;
