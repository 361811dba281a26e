//! Fire-and-forget mail dispatch
//!
//! Each send runs on its own task. The caller never waits for it and a
//! failure only produces a warning.

use std::future::Future;
use std::sync::Arc;

use crate::domain::mail::{MailError, MailGateway};
use crate::domain::value_object::{email::Email, verification_code::VerificationCode};

pub struct Notifier<M> {
    mailer: Arc<M>,
}

impl<M> Clone for Notifier<M> {
    fn clone(&self) -> Self {
        Self {
            mailer: self.mailer.clone(),
        }
    }
}

impl<M> Notifier<M>
where
    M: MailGateway + Sync + 'static,
{
    pub fn new(mailer: Arc<M>) -> Self {
        Self { mailer }
    }

    pub fn verification_code(&self, to: &Email, code: &VerificationCode) {
        let mailer = self.mailer.clone();
        let (to, code) = (to.clone(), code.clone());
        dispatch("verification", async move {
            mailer.send_verification_email(&to, &code).await
        });
    }

    pub fn welcome(&self, to: &Email, name: &str) {
        let mailer = self.mailer.clone();
        let (to, name) = (to.clone(), name.to_string());
        dispatch("welcome", async move {
            mailer.send_welcome_email(&to, &name).await
        });
    }

    pub fn password_reset(&self, to: &Email, reset_url: String) {
        let mailer = self.mailer.clone();
        let to = to.clone();
        dispatch("password_reset", async move {
            mailer.send_password_reset_email(&to, &reset_url).await
        });
    }

    pub fn reset_success(&self, to: &Email) {
        let mailer = self.mailer.clone();
        let to = to.clone();
        dispatch("reset_success", async move {
            mailer.send_reset_success_email(&to).await
        });
    }
}

fn dispatch<F>(mail: &'static str, send: F)
where
    F: Future<Output = Result<(), MailError>> + Send + 'static,
{
    tokio::spawn(async move {
        if let Err(e) = send.await {
            tracing::warn!(mail, error = %e, "Failed to send mail");
        }
    });
}
