//! Refresh Use Case
//!
//! Exchanges a refresh token for a new access token and a rotated refresh
//! token. The old token is consumed whether or not the exchange succeeds.

use platform::client::ClientMeta;

use crate::application::token_service::{TokenPair, TokenService};
use crate::domain::repository::RefreshSessionRepository;
use crate::domain::value_object::token_claims::TokenKind;
use crate::error::{AuthError, AuthResult};

pub struct RefreshUseCase<S> {
    tokens: TokenService<S>,
}

impl<S> RefreshUseCase<S>
where
    S: RefreshSessionRepository,
{
    pub fn new(tokens: TokenService<S>) -> Self {
        Self { tokens }
    }

    pub async fn execute(
        &self,
        refresh_token: Option<&str>,
        meta: &ClientMeta,
    ) -> AuthResult<TokenPair> {
        let refresh_token = refresh_token
            .filter(|t| !t.is_empty())
            .ok_or(AuthError::MissingRefreshToken)?;

        let claims = self
            .tokens
            .validate(refresh_token, TokenKind::Refresh)
            .ok_or(AuthError::InvalidToken)?;

        // A valid signature is not enough: the session row decides
        let rotation = self
            .tokens
            .rotate(refresh_token, &claims.subject(), meta)
            .await?;
        let access_token = self.tokens.issue_access(&rotation.subject)?;

        tracing::info!(
            account_id = %rotation.subject.account.id,
            tenant = %rotation.subject.account.tenant,
            "Refresh token rotated"
        );

        Ok(TokenPair {
            access_token,
            refresh_token: rotation.refresh_token,
        })
    }
}
