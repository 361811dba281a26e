//! Account Entity
//!
//! One shape for both tenants. State changes are expressed as functions that
//! take the current value and return the next one; the caller writes the
//! result back through the repository.

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::crypto::constant_time_eq;
use platform::password::HashedPassword;

use crate::domain::value_object::{
    email::Email,
    reset_token::ResetToken,
    tenant::{AccountRef, TenantType},
    verification_code::{IssuedCode, VerificationCode},
};

#[derive(Debug, Clone)]
pub struct Account {
    pub id: AccountId,
    pub tenant: TenantType,
    pub email: Email,
    /// Person's name for consumers, shop name for merchants
    pub display_name: String,
    pub password_hash: HashedPassword,
    pub is_verified: bool,
    pub verification_code: Option<VerificationCode>,
    pub verification_code_expires_at: Option<DateTime<Utc>>,
    /// Codes issued since the last successful verification
    pub verification_attempt_count: u32,
    pub last_verification_sent_at: Option<DateTime<Utc>>,
    /// Resends on the calendar day of `last_verification_sent_at`
    pub daily_verification_sent_count: u32,
    /// SHA-256 of the outstanding reset token
    pub reset_token_hash: Option<String>,
    pub reset_token_expires_at: Option<DateTime<Utc>>,
    pub last_login_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// A freshly signed-up, unverified account holding its first code.
    ///
    /// The signup code stamps `last_verification_sent_at` (so the resend
    /// cooldown applies) but is not counted against the daily resend cap.
    pub fn register(
        tenant: TenantType,
        email: Email,
        display_name: String,
        password_hash: HashedPassword,
        code: &IssuedCode,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: AccountId::new(),
            tenant,
            email,
            display_name,
            password_hash,
            is_verified: false,
            verification_code: Some(code.code.clone()),
            verification_code_expires_at: Some(code.expires_at),
            verification_attempt_count: 1,
            last_verification_sent_at: Some(code.sent_at),
            daily_verification_sent_count: code.daily_count,
            reset_token_hash: None,
            reset_token_expires_at: None,
            last_login_at: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn reference(&self) -> AccountRef {
        AccountRef::new(self.tenant, self.id)
    }

    /// Name used in greetings
    pub fn greeting_name(&self) -> &str {
        if self.display_name.is_empty() {
            self.email.local_part()
        } else {
            &self.display_name
        }
    }

    pub fn verification_code_matches(&self, code: &VerificationCode, now: DateTime<Utc>) -> bool {
        match (&self.verification_code, self.verification_code_expires_at) {
            (Some(stored), Some(expires_at)) => {
                expires_at > now
                    && constant_time_eq(stored.as_str().as_bytes(), code.as_str().as_bytes())
            }
            _ => false,
        }
    }

    pub fn reset_token_matches(&self, digest: &str, now: DateTime<Utc>) -> bool {
        match (&self.reset_token_hash, self.reset_token_expires_at) {
            (Some(stored), Some(expires_at)) => {
                expires_at > now && constant_time_eq(stored.as_bytes(), digest.as_bytes())
            }
            _ => false,
        }
    }

    /// Replace the outstanding code after a throttle-approved resend
    pub fn with_verification_code(self, code: &IssuedCode, now: DateTime<Utc>) -> Self {
        Self {
            verification_code: Some(code.code.clone()),
            verification_code_expires_at: Some(code.expires_at),
            verification_attempt_count: self.verification_attempt_count.saturating_add(1),
            last_verification_sent_at: Some(code.sent_at),
            daily_verification_sent_count: code.daily_count,
            updated_at: now,
            ..self
        }
    }

    /// `Unverified -> Verified`; there is no way back
    pub fn verified(self, now: DateTime<Utc>) -> Self {
        Self {
            is_verified: true,
            verification_code: None,
            verification_code_expires_at: None,
            verification_attempt_count: 0,
            updated_at: now,
            ..self
        }
    }

    pub fn with_reset_token(
        self,
        token: &ResetToken,
        expires_at: DateTime<Utc>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            reset_token_hash: Some(token.digest()),
            reset_token_expires_at: Some(expires_at),
            updated_at: now,
            ..self
        }
    }

    pub fn without_reset_token(self, now: DateTime<Utc>) -> Self {
        Self {
            reset_token_hash: None,
            reset_token_expires_at: None,
            updated_at: now,
            ..self
        }
    }

    /// New password; any outstanding reset token dies with the old one
    pub fn with_password(self, password_hash: HashedPassword, now: DateTime<Utc>) -> Self {
        Self {
            password_hash,
            ..self.without_reset_token(now)
        }
    }

    pub fn logged_in(self, now: DateTime<Utc>) -> Self {
        Self {
            last_login_at: Some(now),
            updated_at: now,
            ..self
        }
    }
}
