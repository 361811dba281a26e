//! Domain Services
//!
//! Pure domain logic: when may a new verification code be issued, and when
//! does something issued now run out.

use chrono::{DateTime, Duration, Utc};
use platform::rate_limit::{ThrottleDecision, ThrottlePolicy};

use crate::domain::entity::account::Account;
use crate::domain::value_object::verification_code::{IssuedCode, VerificationCode};
use crate::error::{AuthError, AuthResult};

/// `now + ttl`, refusing instants chrono cannot represent
pub fn expiry_after(now: DateTime<Utc>, ttl: Duration) -> AuthResult<DateTime<Utc>> {
    now.checked_add_signed(ttl)
        .ok_or_else(|| AuthError::Internal(format!("expiry out of range: {now} + {ttl}")))
}

/// Cooldown + daily cap in front of verification code issuance
#[derive(Debug, Clone, Copy)]
pub struct VerificationThrottle {
    policy: ThrottlePolicy,
    code_ttl: Duration,
}

impl VerificationThrottle {
    pub fn new(cooldown: Duration, daily_limit: u32, code_ttl: Duration) -> Self {
        Self {
            policy: ThrottlePolicy::new(cooldown, daily_limit),
            code_ttl,
        }
    }

    pub fn decide(
        &self,
        last_sent_at: Option<DateTime<Utc>>,
        daily_count: u32,
        now: DateTime<Utc>,
    ) -> ThrottleDecision {
        self.policy.decide(last_sent_at, daily_count, now)
    }

    /// The code created at signup. Starts the cooldown, not the daily count.
    pub fn initial_code(&self, now: DateTime<Utc>) -> AuthResult<IssuedCode> {
        self.issue(now, 0)
    }

    /// A resend for `account`, if the throttle lets it through
    pub fn approve(&self, account: &Account, now: DateTime<Utc>) -> AuthResult<IssuedCode> {
        let decision = self.decide(
            account.last_verification_sent_at,
            account.daily_verification_sent_count,
            now,
        );

        match decision {
            ThrottleDecision::Allowed { daily_count } => self.issue(now, daily_count),
            ThrottleDecision::Cooldown { retry_after } => Err(AuthError::ResendCooldown {
                // round up so "0 seconds" is never shown
                retry_after_secs: (retry_after.num_milliseconds() + 999) / 1000,
            }),
            ThrottleDecision::DailyLimitReached => Err(AuthError::DailyResendLimit),
        }
    }

    fn issue(&self, now: DateTime<Utc>, daily_count: u32) -> AuthResult<IssuedCode> {
        Ok(IssuedCode {
            code: VerificationCode::generate(),
            expires_at: expiry_after(now, self.code_ttl)?,
            sent_at: now,
            daily_count,
        })
    }
}
