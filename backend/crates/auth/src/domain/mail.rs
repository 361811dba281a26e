//! Outbound Mail Port
//!
//! Delivery transport is someone else's problem; the core only needs these
//! four messages to be attempted.

use thiserror::Error;

use crate::domain::value_object::{email::Email, verification_code::VerificationCode};

#[derive(Debug, Error)]
pub enum MailError {
    #[error("mail transport unavailable: {0}")]
    Unavailable(String),

    #[error("mail rejected for {recipient}: {reason}")]
    Rejected { recipient: String, reason: String },
}

#[trait_variant::make(MailGateway: Send)]
pub trait LocalMailGateway {
    async fn send_verification_email(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> Result<(), MailError>;

    async fn send_welcome_email(&self, to: &Email, name: &str) -> Result<(), MailError>;

    async fn send_password_reset_email(&self, to: &Email, reset_url: &str)
    -> Result<(), MailError>;

    async fn send_reset_success_email(&self, to: &Email) -> Result<(), MailError>;
}
