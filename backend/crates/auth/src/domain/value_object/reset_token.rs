//! Password Reset Token
//!
//! 20 random bytes, hex-encoded, delivered by mail inside a URL. Only the
//! SHA-256 digest is stored.

use platform::crypto::{random_hex, sha256_hex};
use std::fmt;

use crate::error::AuthError;

const TOKEN_BYTES: usize = 20;

pub struct ResetToken(String);

impl ResetToken {
    pub fn generate() -> Self {
        Self(random_hex(TOKEN_BYTES))
    }

    /// Accept a token taken from a URL path
    pub fn parse(input: &str) -> Result<Self, AuthError> {
        let token = input.trim().to_ascii_lowercase();
        if token.len() != TOKEN_BYTES * 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(AuthError::InvalidResetToken);
        }
        Ok(Self(token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Storage form
    pub fn digest(&self) -> String {
        sha256_hex(self.0.as_bytes())
    }
}

impl fmt::Debug for ResetToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ResetToken([REDACTED])")
    }
}
