//! Current Account Use Cases
//!
//! Operations on the account behind a validated access token.

use crate::application::account_store::AccountStore;
use crate::application::token_service::TokenService;
use crate::domain::entity::account::Account;
use crate::domain::repository::{AccountRepository, RefreshSessionRepository};
use crate::domain::value_object::tenant::AccountRef;
use crate::error::{AuthError, AuthResult};

pub struct CurrentAccountUseCase<A, S> {
    accounts: AccountStore<A>,
    tokens: TokenService<S>,
}

impl<A, S> CurrentAccountUseCase<A, S>
where
    A: AccountRepository,
    S: RefreshSessionRepository,
{
    pub fn new(accounts: AccountStore<A>, tokens: TokenService<S>) -> Self {
        Self { accounts, tokens }
    }

    /// Fresh read; the token may outlive the account by up to its TTL
    pub async fn me(&self, account: &AccountRef) -> AuthResult<Account> {
        self.accounts
            .find_by_id(account)
            .await?
            .ok_or(AuthError::AccountNotFound)
    }

    /// Delete the account, free its email and revoke every session
    pub async fn delete(&self, account: &AccountRef) -> AuthResult<()> {
        self.accounts.delete(account).await?;
        let revoked = self.tokens.revoke_all(account).await?;

        tracing::info!(
            account_id = %account.id,
            tenant = %account.tenant,
            sessions_revoked = revoked,
            "Account deleted"
        );

        Ok(())
    }
}
