//! Refresh Session Entity
//!
//! One row per live refresh token. The row is keyed by the SHA-256 of the
//! token string; the token itself is never stored.

use chrono::{DateTime, Utc};
use platform::client::ClientMeta;
use platform::crypto::sha256_hex;

use crate::domain::value_object::tenant::AccountRef;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub token_hash: String,
    pub owner: AccountRef,
    pub user_agent: Option<String>,
    pub client_ip: Option<String>,
    pub issued_at: DateTime<Utc>,
    pub expires_at: Option<DateTime<Utc>>,
}

impl RefreshSession {
    pub fn new(
        refresh_token: &str,
        owner: AccountRef,
        meta: &ClientMeta,
        issued_at: DateTime<Utc>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            token_hash: token_digest(refresh_token),
            owner,
            user_agent: meta.user_agent.clone(),
            client_ip: meta.ip_string(),
            issued_at,
            expires_at,
        }
    }

    /// A row without `expires_at` never expires on its own
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|expires_at| expires_at <= now)
    }
}

/// Storage key for a refresh token
pub fn token_digest(refresh_token: &str) -> String {
    sha256_hex(refresh_token.as_bytes())
}
