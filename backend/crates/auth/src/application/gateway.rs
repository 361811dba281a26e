//! Auth Gateway
//!
//! The single entry point the HTTP layer talks to. Each operation builds its
//! use case from shared components and runs it to completion.

use std::sync::Arc;

use platform::client::ClientMeta;
use platform::clock::SharedClock;

use crate::application::account_store::AccountStore;
use crate::application::config::AuthConfig;
use crate::application::current_account::CurrentAccountUseCase;
use crate::application::notify::Notifier;
use crate::application::password_reset::{
    ForgotPasswordUseCase, ResetPasswordInput, ResetPasswordUseCase,
};
use crate::application::refresh::RefreshUseCase;
use crate::application::sign_in::{SignInInput, SignInUseCase, SignedIn};
use crate::application::sign_out::SignOutUseCase;
use crate::application::sign_up::{SignUpInput, SignUpUseCase};
use crate::application::token_service::{TokenPair, TokenService};
use crate::application::verification::{ResendVerificationUseCase, VerifyEmailUseCase};
use crate::domain::entity::account::Account;
use crate::domain::mail::MailGateway;
use crate::domain::repository::{AccountRepository, RefreshSessionRepository};
use crate::domain::value_object::tenant::{AccountRef, TenantType};
use crate::domain::value_object::token_claims::{TokenClaims, TokenKind};
use crate::error::{AuthError, AuthResult};

/// Storage backing both accounts and refresh sessions
pub trait AuthStore: AccountRepository + RefreshSessionRepository + Sync + 'static {}

impl<T> AuthStore for T where T: AccountRepository + RefreshSessionRepository + Sync + 'static {}

pub struct AuthGateway<R, M> {
    repo: Arc<R>,
    accounts: AccountStore<R>,
    tokens: TokenService<R>,
    notifier: Notifier<M>,
    config: Arc<AuthConfig>,
    clock: SharedClock,
}

impl<R, M> AuthGateway<R, M>
where
    R: AuthStore,
    M: MailGateway + Sync + 'static,
{
    pub fn new(repo: Arc<R>, mailer: Arc<M>, config: Arc<AuthConfig>, clock: SharedClock) -> Self {
        Self {
            accounts: AccountStore::new(
                repo.clone(),
                config.hash_cost(TenantType::Consumer),
                config.hash_cost(TenantType::Merchant),
            ),
            tokens: TokenService::new(repo.clone(), &config, clock.clone()),
            notifier: Notifier::new(mailer),
            repo,
            config,
            clock,
        }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub async fn signup(&self, input: SignUpInput, meta: &ClientMeta) -> AuthResult<SignedIn> {
        SignUpUseCase::new(
            self.accounts.clone(),
            self.tokens.clone(),
            self.notifier.clone(),
            self.config.throttle(),
            self.clock.clone(),
        )
        .execute(input, meta)
        .await
    }

    pub async fn login(&self, input: SignInInput, meta: &ClientMeta) -> AuthResult<SignedIn> {
        SignInUseCase::new(self.accounts.clone(), self.tokens.clone(), self.clock.clone())
            .execute(input, meta)
            .await
    }

    pub async fn verify_email(
        &self,
        tenant: TenantType,
        code: &str,
        meta: &ClientMeta,
    ) -> AuthResult<SignedIn> {
        VerifyEmailUseCase::new(
            self.accounts.clone(),
            self.tokens.clone(),
            self.notifier.clone(),
            self.clock.clone(),
        )
        .execute(tenant, code, meta)
        .await
    }

    pub async fn resend_verification(&self, tenant: TenantType, email: &str) -> AuthResult<()> {
        ResendVerificationUseCase::new(
            self.accounts.clone(),
            self.notifier.clone(),
            self.config.throttle(),
            self.clock.clone(),
        )
        .execute(tenant, email)
        .await
    }

    pub async fn forgot_password(&self, tenant: TenantType, email: &str) -> AuthResult<()> {
        ForgotPasswordUseCase::new(
            self.accounts.clone(),
            self.notifier.clone(),
            self.config.clone(),
            self.clock.clone(),
        )
        .execute(tenant, email)
        .await
    }

    pub async fn reset_password(&self, input: ResetPasswordInput) -> AuthResult<()> {
        ResetPasswordUseCase::new(
            self.accounts.clone(),
            self.tokens.clone(),
            self.notifier.clone(),
            self.clock.clone(),
        )
        .execute(input)
        .await
    }

    pub async fn refresh(
        &self,
        refresh_token: Option<&str>,
        meta: &ClientMeta,
    ) -> AuthResult<TokenPair> {
        RefreshUseCase::new(self.tokens.clone())
            .execute(refresh_token, meta)
            .await
    }

    pub async fn logout(&self, refresh_token: Option<&str>) -> AuthResult<()> {
        SignOutUseCase::new(self.tokens.clone())
            .execute(refresh_token)
            .await
    }

    pub async fn logout_all(&self, account: &AccountRef) -> AuthResult<u64> {
        SignOutUseCase::new(self.tokens.clone())
            .everywhere(account)
            .await
    }

    pub async fn delete_account(&self, account: &AccountRef) -> AuthResult<()> {
        CurrentAccountUseCase::new(self.accounts.clone(), self.tokens.clone())
            .delete(account)
            .await
    }

    pub async fn me(&self, account: &AccountRef) -> AuthResult<Account> {
        CurrentAccountUseCase::new(self.accounts.clone(), self.tokens.clone())
            .me(account)
            .await
    }

    /// Resolve a bearer access token
    pub fn authenticate(&self, access_token: &str) -> AuthResult<TokenClaims> {
        self.tokens
            .validate(access_token, TokenKind::Access)
            .ok_or(AuthError::InvalidToken)
    }

    /// Drop refresh sessions whose expiry has passed
    pub async fn cleanup_expired_sessions(&self) -> AuthResult<u64> {
        self.repo.cleanup_expired(self.clock.now()).await
    }
}
