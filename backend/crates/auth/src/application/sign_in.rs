//! Sign In Use Case
//!
//! Authenticates by email and password within one tenant and issues a token
//! pair.

use platform::client::ClientMeta;
use platform::clock::SharedClock;
use platform::password::ClearTextPassword;

use crate::application::account_store::AccountStore;
use crate::application::token_service::{TokenPair, TokenService};
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountRepository, RefreshSessionRepository};
use crate::domain::value_object::{email::Email, tenant::TenantType, token_claims::TokenSubject};
use crate::error::{AuthError, AuthResult};

/// Sign in input
pub struct SignInInput {
    pub tenant: TenantType,
    pub email: String,
    pub password: String,
}

/// An account together with a freshly persisted token pair
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub account: Account,
    pub tokens: TokenPair,
}

/// Sign in use case
pub struct SignInUseCase<A, S> {
    accounts: AccountStore<A>,
    tokens: TokenService<S>,
    clock: SharedClock,
}

impl<A, S> SignInUseCase<A, S>
where
    A: AccountRepository,
    S: RefreshSessionRepository,
{
    pub fn new(accounts: AccountStore<A>, tokens: TokenService<S>, clock: SharedClock) -> Self {
        Self {
            accounts,
            tokens,
            clock,
        }
    }

    pub async fn execute(&self, input: SignInInput, meta: &ClientMeta) -> AuthResult<SignedIn> {
        // Unknown email and wrong password both end as InvalidCredentials
        let email = Email::parse(&input.email).map_err(|_| AuthError::InvalidCredentials)?;
        let candidate = ClearTextPassword::candidate(input.password);

        let Some(account) = self.accounts.find_by_email(input.tenant, &email).await? else {
            self.accounts.dummy_verify(input.tenant, candidate).await?;
            return Err(AuthError::InvalidCredentials);
        };

        let check = self.accounts.verify_password(&account, candidate).await?;
        if !check.is_match() {
            return Err(AuthError::InvalidCredentials);
        }

        let now = self.clock.now();
        let account = self
            .accounts
            .record_login(account, check.into_upgraded_hash(), now)
            .await?;

        let tokens = self.tokens.issue_pair(&TokenSubject::from(&account))?;
        self.tokens
            .persist(account.reference(), &tokens.refresh_token, meta)
            .await?;

        tracing::info!(
            account_id = %account.id,
            tenant = %account.tenant,
            "Account signed in"
        );

        Ok(SignedIn { account, tokens })
    }
}
