//! Core dispatch + execution pipeline for TeleClaudeCode.
//!
//! This crate is framework-agnostic. Telegram, Redis and the Claude CLI live
//! behind ports (traits) implemented in adapter crates.

pub mod chunker;
pub mod command;
pub mod config;
pub mod dedup;
pub mod dispatcher;
pub mod domain;
pub mod errors;
pub mod logging;
pub mod messaging;
pub mod model;
pub mod queue;
pub mod replies;
pub mod security;
#[cfg(test)]
mod testing;
pub mod typing;
pub mod update;
pub mod worker;

pub use errors::{Error, Result};
