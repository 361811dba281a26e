//! Email Value Object
//!
//! Lower-cased, trimmed, shape-checked address. Ownership is proven
//! separately through the verification code.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuthError;

/// Maximum email length (RFC 5321)
const EMAIL_MAX_LENGTH: usize = 254;

/// Maximum local-part length (RFC 5321)
const LOCAL_PART_MAX_LENGTH: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// Normalize and validate user input
    pub fn parse(input: &str) -> Result<Self, AuthError> {
        let email = input.trim().to_lowercase();

        if email.is_empty() {
            return Err(AuthError::InvalidEmail("Email is required"));
        }
        if email.len() > EMAIL_MAX_LENGTH {
            return Err(AuthError::InvalidEmail("Email is too long"));
        }
        if !has_valid_shape(&email) {
            return Err(AuthError::InvalidEmail("Invalid email format"));
        }

        Ok(Self(email))
    }

    /// Value read back from storage, already normalized on the way in
    pub fn from_db(email: impl Into<String>) -> Self {
        Self(email.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Part before the `@`, used as a greeting fallback
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or_default()
    }
}

fn has_valid_shape(email: &str) -> bool {
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };

    if local.is_empty() || local.len() > LOCAL_PART_MAX_LENGTH || local.contains(char::is_whitespace)
    {
        return false;
    }

    if domain.contains('@') || !domain.contains('.') {
        return false;
    }

    domain
        .split('.')
        .all(|label| {
            !label.is_empty()
                && !label.starts_with('-')
                && !label.ends_with('-')
                && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
        })
}

impl FromStr for Email {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Email::parse(s)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
