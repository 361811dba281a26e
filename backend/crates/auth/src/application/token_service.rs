//! Token Service
//!
//! Mints, validates, rotates and revokes access/refresh tokens. Tokens are
//! pure values; every bit of state lives in the refresh session store.

use std::sync::Arc;

use chrono::Duration;
use platform::client::ClientMeta;
use platform::clock::SharedClock;
use uuid::Uuid;

use crate::application::config::AuthConfig;
use crate::domain::entity::refresh_session::{RefreshSession, token_digest};
use crate::domain::repository::RefreshSessionRepository;
use crate::domain::services::expiry_after;
use crate::domain::value_object::tenant::AccountRef;
use crate::domain::value_object::token_claims::{TokenClaims, TokenKind, TokenSubject};
use crate::error::{AuthError, AuthResult};
use crate::infra::jwt::JwtCodec;

/// Access + refresh token minted together
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

/// Result of a successful rotation
#[derive(Debug, Clone)]
pub struct Rotation {
    pub refresh_token: String,
    /// Owner as recorded on the consumed session row
    pub subject: TokenSubject,
}

pub struct TokenService<S> {
    sessions: Arc<S>,
    codec: Arc<JwtCodec>,
    clock: SharedClock,
    access_ttl: Duration,
    refresh_ttl: Duration,
}

impl<S> Clone for TokenService<S> {
    fn clone(&self) -> Self {
        Self {
            sessions: self.sessions.clone(),
            codec: self.codec.clone(),
            clock: self.clock.clone(),
            access_ttl: self.access_ttl,
            refresh_ttl: self.refresh_ttl,
        }
    }
}

impl<S> TokenService<S>
where
    S: RefreshSessionRepository,
{
    pub fn new(sessions: Arc<S>, config: &AuthConfig, clock: SharedClock) -> Self {
        Self {
            sessions,
            codec: Arc::new(JwtCodec::hs256(config.jwt_secret())),
            clock,
            access_ttl: config.access_token_ttl,
            refresh_ttl: config.refresh_token_ttl,
        }
    }

    fn mint(&self, subject: &TokenSubject, kind: TokenKind, ttl: Duration) -> AuthResult<String> {
        let now = self.clock.now();
        let claims = TokenClaims {
            id: subject.account.id,
            email: subject.email.clone(),
            tenant: subject.account.tenant,
            kind,
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: expiry_after(now, ttl)?.timestamp(),
        };
        Ok(self.codec.encode(&claims)?)
    }

    /// Same claims, two lifetimes. Nothing is persisted.
    pub fn issue_pair(&self, subject: &TokenSubject) -> AuthResult<TokenPair> {
        Ok(TokenPair {
            access_token: self.mint(subject, TokenKind::Access, self.access_ttl)?,
            refresh_token: self.mint(subject, TokenKind::Refresh, self.refresh_ttl)?,
        })
    }

    pub fn issue_access(&self, subject: &TokenSubject) -> AuthResult<String> {
        self.mint(subject, TokenKind::Access, self.access_ttl)
    }

    /// Signature, kind and expiry. `None` for anything unusable.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Option<TokenClaims> {
        let claims = self.codec.decode(token).ok()?;
        if claims.kind != expected {
            return None;
        }
        if claims.exp <= self.clock.now().timestamp() {
            return None;
        }
        Some(claims)
    }

    /// Record a refresh token. Presenting the same token again only updates
    /// its device metadata.
    pub async fn persist(
        &self,
        owner: AccountRef,
        refresh_token: &str,
        meta: &ClientMeta,
    ) -> AuthResult<()> {
        let now = self.clock.now();
        let expires_at = expiry_after(now, self.refresh_ttl)?;
        let session = RefreshSession::new(refresh_token, owner, meta, now, Some(expires_at));
        self.sessions.upsert(&session).await
    }

    /// Consume `old_refresh_token` and hand out its successor.
    ///
    /// The successor belongs to whoever owned the consumed row; `claimed`
    /// only supplies the email. A missing row means the token was already
    /// rotated or revoked.
    pub async fn rotate(
        &self,
        old_refresh_token: &str,
        claimed: &TokenSubject,
        meta: &ClientMeta,
    ) -> AuthResult<Rotation> {
        let Some(session) = self.sessions.take(&token_digest(old_refresh_token)).await? else {
            tracing::warn!(
                account_id = %claimed.account.id,
                tenant = %claimed.account.tenant,
                "Refresh token replayed or unknown"
            );
            return Err(AuthError::RefreshTokenNotFound);
        };

        // Row is gone either way; an expired one just ends the chain.
        if session.is_expired(self.clock.now()) {
            return Err(AuthError::InvalidToken);
        }

        let subject = TokenSubject {
            account: session.owner,
            email: claimed.email.clone(),
        };
        let refresh_token = self.mint(&subject, TokenKind::Refresh, self.refresh_ttl)?;
        self.persist(session.owner, &refresh_token, meta).await?;

        Ok(Rotation {
            refresh_token,
            subject,
        })
    }

    /// Returns false when the token had no live session
    pub async fn revoke(&self, refresh_token: &str) -> AuthResult<bool> {
        self.sessions.remove(&token_digest(refresh_token)).await
    }

    pub async fn revoke_all(&self, owner: &AccountRef) -> AuthResult<u64> {
        self.sessions.delete_all_for_owner(owner).await
    }
}
