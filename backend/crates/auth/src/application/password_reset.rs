//! Password Reset Use Cases
//!
//! `forgot` stores the digest of a fresh reset token and mails the link.
//! `reset` redeems that token exactly once.

use std::sync::Arc;

use platform::clock::SharedClock;
use platform::password::ClearTextPassword;

use crate::application::account_store::AccountStore;
use crate::application::config::AuthConfig;
use crate::application::notify::Notifier;
use crate::application::token_service::TokenService;
use crate::domain::mail::MailGateway;
use crate::domain::repository::{AccountRepository, RefreshSessionRepository};
use crate::domain::value_object::{email::Email, reset_token::ResetToken, tenant::TenantType};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Forgot Password
// ============================================================================

pub struct ForgotPasswordUseCase<A, M> {
    accounts: AccountStore<A>,
    notifier: Notifier<M>,
    config: Arc<AuthConfig>,
    clock: SharedClock,
}

impl<A, M> ForgotPasswordUseCase<A, M>
where
    A: AccountRepository,
    M: MailGateway + Sync + 'static,
{
    pub fn new(
        accounts: AccountStore<A>,
        notifier: Notifier<M>,
        config: Arc<AuthConfig>,
        clock: SharedClock,
    ) -> Self {
        Self {
            accounts,
            notifier,
            config,
            clock,
        }
    }

    /// Succeeds whether or not the address has an account
    pub async fn execute(&self, tenant: TenantType, email: &str) -> AuthResult<()> {
        let email = Email::parse(email)?;

        let Some(account) = self.accounts.find_by_email(tenant, &email).await? else {
            tracing::debug!(tenant = %tenant, "Password reset requested for unknown email");
            return Ok(());
        };

        let now = self.clock.now();
        let token = ResetToken::generate();
        let account = self
            .accounts
            .set_reset_token(account, &token, self.config.reset_token_ttl, now)
            .await?;

        let reset_url = self.config.reset_url(tenant, token.as_str());
        self.notifier.password_reset(&account.email, reset_url);

        tracing::info!(
            account_id = %account.id,
            tenant = %account.tenant,
            "Password reset token issued"
        );

        Ok(())
    }
}

// ============================================================================
// Reset Password
// ============================================================================

pub struct ResetPasswordInput {
    pub tenant: TenantType,
    pub token: String,
    pub password: String,
}

pub struct ResetPasswordUseCase<A, S, M> {
    accounts: AccountStore<A>,
    tokens: TokenService<S>,
    notifier: Notifier<M>,
    clock: SharedClock,
}

impl<A, S, M> ResetPasswordUseCase<A, S, M>
where
    A: AccountRepository,
    S: RefreshSessionRepository,
    M: MailGateway + Sync + 'static,
{
    pub fn new(
        accounts: AccountStore<A>,
        tokens: TokenService<S>,
        notifier: Notifier<M>,
        clock: SharedClock,
    ) -> Self {
        Self {
            accounts,
            tokens,
            notifier,
            clock,
        }
    }

    pub async fn execute(&self, input: ResetPasswordInput) -> AuthResult<()> {
        let token = ResetToken::parse(&input.token)?;
        let password = ClearTextPassword::new(input.password)?;

        // Only a live token is worth an Argon2 run
        self.accounts
            .find_by_reset_token(input.tenant, &token, self.clock.now())
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        // Hash before claiming so a hashing failure cannot burn the token
        let password_hash = self.accounts.hash_password(input.tenant, password).await?;

        let now = self.clock.now();
        let account = self
            .accounts
            .claim_reset_token(input.tenant, &token, now)
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        let account = self.accounts.set_password(account, password_hash, now).await?;
        let revoked = self.tokens.revoke_all(&account.reference()).await?;

        self.notifier.reset_success(&account.email);

        tracing::info!(
            account_id = %account.id,
            tenant = %account.tenant,
            sessions_revoked = revoked,
            "Password reset"
        );

        Ok(())
    }
}
