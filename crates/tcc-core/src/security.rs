use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::{domain::UserId, errors::Error, Result};

// ============== Authorization ==============

/// Static allow-list of Telegram user ids.
///
/// An empty list lets everyone in.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AllowList {
    users: HashSet<i64>,
}

impl AllowList {
    pub fn new(users: impl IntoIterator<Item = i64>) -> Self {
        Self {
            users: users.into_iter().collect(),
        }
    }

    /// Parse a comma-separated id list (`" 111 , 222 , "`).
    pub fn parse_csv(raw: &str) -> Result<Self> {
        let mut users = HashSet::new();
        for part in raw.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            let id = part.parse::<i64>().map_err(|_| {
                Error::Config(format!("invalid user id in allow-list: {part:?}"))
            })?;
            users.insert(id);
        }
        Ok(Self { users })
    }

    pub fn is_allowed(&self, user_id: UserId) -> bool {
        self.users.is_empty() || self.users.contains(&user_id.0)
    }

    pub fn is_open(&self) -> bool {
        self.users.is_empty()
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

// ============== Webhook Secret ==============

/// Header Telegram uses to echo the webhook secret.
pub const WEBHOOK_SECRET_HEADER: &str = "x-telegram-bot-api-secret-token";

/// Shared secret for the webhook transport.
///
/// Only the SHA-256 digest is kept; comparison is digest against digest.
#[derive(Clone)]
pub struct WebhookSecret {
    digest: Vec<u8>,
}

impl WebhookSecret {
    /// `None` for an empty secret (check disabled).
    pub fn new(secret: &str) -> Option<Self> {
        if secret.is_empty() {
            return None;
        }
        Some(Self {
            digest: sha256(secret.as_bytes()),
        })
    }

    pub fn verify(&self, presented: Option<&str>) -> bool {
        let Some(presented) = presented else {
            return false;
        };
        sha256(presented.as_bytes()) == self.digest
    }
}

impl std::fmt::Debug for WebhookSecret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("WebhookSecret(..)")
    }
}

fn sha256(bytes: &[u8]) -> Vec<u8> {
    Sha256::digest(bytes).to_vec()
}
