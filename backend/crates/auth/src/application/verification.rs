//! Email Verification Use Cases
//!
//! Redeeming a code flips the account to verified and signs it in.
//! Resending is gated by the verification throttle.

use platform::client::ClientMeta;
use platform::clock::SharedClock;

use crate::application::account_store::AccountStore;
use crate::application::notify::Notifier;
use crate::application::sign_in::SignedIn;
use crate::application::token_service::TokenService;
use crate::domain::mail::MailGateway;
use crate::domain::repository::{AccountRepository, RefreshSessionRepository};
use crate::domain::services::VerificationThrottle;
use crate::domain::value_object::{
    email::Email, tenant::TenantType, token_claims::TokenSubject,
    verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

// ============================================================================
// Verify Email
// ============================================================================

pub struct VerifyEmailUseCase<A, S, M> {
    accounts: AccountStore<A>,
    tokens: TokenService<S>,
    notifier: Notifier<M>,
    clock: SharedClock,
}

impl<A, S, M> VerifyEmailUseCase<A, S, M>
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

    pub async fn execute(
        &self,
        tenant: TenantType,
        code: &str,
        meta: &ClientMeta,
    ) -> AuthResult<SignedIn> {
        let code = VerificationCode::parse(code)?;
        let now = self.clock.now();

        let account = self
            .accounts
            .find_by_verification_code(tenant, &code, now)
            .await?
            .ok_or(AuthError::InvalidVerificationCode)?;

        let account = self.accounts.mark_verified(account, now).await?;
        self.notifier
            .welcome(&account.email, account.greeting_name());

        let tokens = self.tokens.issue_pair(&TokenSubject::from(&account))?;
        self.tokens
            .persist(account.reference(), &tokens.refresh_token, meta)
            .await?;

        tracing::info!(
            account_id = %account.id,
            tenant = %account.tenant,
            "Email verified"
        );

        Ok(SignedIn { account, tokens })
    }
}

// ============================================================================
// Resend Verification
// ============================================================================

pub struct ResendVerificationUseCase<A, M> {
    accounts: AccountStore<A>,
    notifier: Notifier<M>,
    throttle: VerificationThrottle,
    clock: SharedClock,
}

impl<A, M> ResendVerificationUseCase<A, M>
where
    A: AccountRepository,
    M: MailGateway + Sync + 'static,
{
    pub fn new(
        accounts: AccountStore<A>,
        notifier: Notifier<M>,
        throttle: VerificationThrottle,
        clock: SharedClock,
    ) -> Self {
        Self {
            accounts,
            notifier,
            throttle,
            clock,
        }
    }

    pub async fn execute(&self, tenant: TenantType, email: &str) -> AuthResult<()> {
        let email = Email::parse(email)?;

        let account = self
            .accounts
            .find_by_email(tenant, &email)
            .await?
            .ok_or(AuthError::AccountNotFound)?;

        if account.is_verified {
            return Err(AuthError::AlreadyVerified);
        }

        let now = self.clock.now();
        let code = self.throttle.approve(&account, now)?;
        let account = self
            .accounts
            .set_verification_code(account, &code, now)
            .await?;

        self.notifier.verification_code(&account.email, &code.code);

        tracing::info!(
            account_id = %account.id,
            tenant = %account.tenant,
            daily_count = account.daily_verification_sent_count,
            "Verification code resent"
        );

        Ok(())
    }
}
