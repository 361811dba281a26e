//! Verification Code Value Object
//!
//! Six-digit one-time code mailed to prove ownership of an email address.

use chrono::{DateTime, Utc};
use rand::Rng;
use std::fmt;

use crate::error::AuthError;

const CODE_MIN: u32 = 100_000;
const CODE_MAX: u32 = 999_999;

#[derive(Clone, PartialEq, Eq)]
pub struct VerificationCode(String);

impl VerificationCode {
    /// Fresh random code in `100000..=999999`
    pub fn generate() -> Self {
        let n = rand::rng().random_range(CODE_MIN..=CODE_MAX);
        Self(n.to_string())
    }

    /// Validate user input: exactly six ASCII digits, no leading zero
    pub fn parse(input: &str) -> Result<Self, AuthError> {
        let code = input.trim();
        let well_formed = code.len() == 6
            && code.bytes().all(|b| b.is_ascii_digit())
            && !code.starts_with('0');

        if !well_formed {
            return Err(AuthError::InvalidVerificationCode);
        }
        Ok(Self(code.to_string()))
    }

    pub fn from_db(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for VerificationCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VerificationCode(******)")
    }
}

/// A code that passed the throttle, with the counter values to persist
#[derive(Debug, Clone)]
pub struct IssuedCode {
    pub code: VerificationCode,
    pub expires_at: DateTime<Utc>,
    pub sent_at: DateTime<Utc>,
    /// Sends counted for `sent_at`'s calendar day
    pub daily_count: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_in_range() {
        for _ in 0..1_000 {
            let code = VerificationCode::generate();
            let n: u32 = code.as_str().parse().unwrap();
            assert!((CODE_MIN..=CODE_MAX).contains(&n));
        }
    }

    #[test]
    fn test_parse() {
        assert_eq!(VerificationCode::parse(" 123456 ").unwrap().as_str(), "123456");
        for bad in ["", "12345", "1234567", "12a456", "012345"] {
            assert!(VerificationCode::parse(bad).is_err(), "{bad:?}");
        }
    }

    #[test]
    fn test_debug_hides_code() {
        let code = VerificationCode::parse("654321").unwrap();
        assert!(!format!("{code:?}").contains("654321"));
    }
}
