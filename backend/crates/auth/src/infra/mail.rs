//! Logging mail gateway
//!
//! Delivery belongs to an external transport. This adapter records each
//! outgoing mail as a structured event so the flows can run end to end.
//! Codes and reset links are redacted unless the gateway was built with
//! [`LogMailGateway::revealing_secrets`].

use crate::domain::mail::{MailError, MailGateway};
use crate::domain::value_object::{email::Email, verification_code::VerificationCode};

const REDACTED: &str = "[REDACTED]";

#[derive(Debug, Clone, Copy, Default)]
pub struct LogMailGateway {
    reveal_secrets: bool,
}

impl LogMailGateway {
    /// Recipient and mail kind only
    pub fn new() -> Self {
        Self::default()
    }

    /// Also logs codes and reset links. Local development only.
    pub fn revealing_secrets() -> Self {
        Self {
            reveal_secrets: true,
        }
    }

    fn shown<'a>(&self, secret: &'a str) -> &'a str {
        if self.reveal_secrets { secret } else { REDACTED }
    }
}

impl MailGateway for LogMailGateway {
    async fn send_verification_email(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> Result<(), MailError> {
        tracing::info!(to = %to, code = self.shown(code.as_str()), "Verification email");
        Ok(())
    }

    async fn send_welcome_email(&self, to: &Email, name: &str) -> Result<(), MailError> {
        tracing::info!(to = %to, name, "Welcome email");
        Ok(())
    }

    async fn send_password_reset_email(&self, to: &Email, reset_url: &str) -> Result<(), MailError> {
        tracing::info!(to = %to, reset_url = self.shown(reset_url), "Password reset email");
        Ok(())
    }

    async fn send_reset_success_email(&self, to: &Email) -> Result<(), MailError> {
        tracing::info!(to = %to, "Password reset confirmation email");
        Ok(())
    }
}
