//! Sign Out Use Cases
//!
//! Ending one session by its refresh token, or every session of an account.

use crate::application::token_service::TokenService;
use crate::domain::repository::RefreshSessionRepository;
use crate::domain::value_object::tenant::AccountRef;
use crate::error::AuthResult;

/// Sign out use case
pub struct SignOutUseCase<S> {
    tokens: TokenService<S>,
}

impl<S> SignOutUseCase<S>
where
    S: RefreshSessionRepository,
{
    pub fn new(tokens: TokenService<S>) -> Self {
        Self { tokens }
    }

    /// Idempotent: a missing or unknown token is not an error
    pub async fn execute(&self, refresh_token: Option<&str>) -> AuthResult<()> {
        let Some(refresh_token) = refresh_token.filter(|t| !t.is_empty()) else {
            return Ok(());
        };

        if self.tokens.revoke(refresh_token).await? {
            tracing::info!("Signed out");
        } else {
            tracing::debug!("Sign out for an unknown session");
        }
        Ok(())
    }

    /// Revoke every refresh session of `account`
    pub async fn everywhere(&self, account: &AccountRef) -> AuthResult<u64> {
        let revoked = self.tokens.revoke_all(account).await?;

        tracing::info!(
            account_id = %account.id,
            tenant = %account.tenant,
            sessions_revoked = revoked,
            "Signed out everywhere"
        );

        Ok(revoked)
    }
}
