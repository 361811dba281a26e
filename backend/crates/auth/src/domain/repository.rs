//! Repository Traits
//!
//! Interfaces for data persistence. Implementations live in the
//! infrastructure layer.

use chrono::{DateTime, Utc};

use crate::domain::entity::{account::Account, refresh_session::RefreshSession};
use crate::domain::value_object::{
    email::Email,
    tenant::{AccountRef, TenantType},
    verification_code::VerificationCode,
};
use crate::error::AuthResult;

/// Account persistence for both tenants
#[trait_variant::make(AccountRepository: Send)]
pub trait LocalAccountRepository {
    /// Insert a new account. Fails with `EmailTaken` when the address is
    /// registered under either tenant.
    async fn insert(&self, account: &Account) -> AuthResult<()>;

    /// True when the address is registered under either tenant
    async fn email_exists(&self, email: &Email) -> AuthResult<bool>;

    async fn find_by_id(&self, account: &AccountRef) -> AuthResult<Option<Account>>;

    async fn find_by_email(&self, tenant: TenantType, email: &Email)
    -> AuthResult<Option<Account>>;

    /// Only matches a code whose expiry is after `now`
    async fn find_by_verification_code(
        &self,
        tenant: TenantType,
        code: &VerificationCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>>;

    /// The account holding a live reset token, left untouched
    async fn find_by_reset_token(
        &self,
        tenant: TenantType,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>>;

    /// Atomically clear a live reset token and return the account as it is
    /// afterwards. At most one caller can claim a given token.
    async fn claim_reset_token(
        &self,
        tenant: TenantType,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>>;

    async fn update(&self, account: &Account) -> AuthResult<()>;

    /// Remove the account and free its email. Returns false if absent.
    async fn delete(&self, account: &AccountRef) -> AuthResult<bool>;
}

/// Refresh session persistence
#[trait_variant::make(RefreshSessionRepository: Send)]
pub trait LocalRefreshSessionRepository {
    /// Insert, or refresh the device metadata of an existing row with the
    /// same token hash
    async fn upsert(&self, session: &RefreshSession) -> AuthResult<()>;

    /// Delete the row and hand it back. Concurrent callers with the same
    /// hash: exactly one gets `Some`.
    async fn take(&self, token_hash: &str) -> AuthResult<Option<RefreshSession>>;

    /// Returns false if no row existed
    async fn remove(&self, token_hash: &str) -> AuthResult<bool>;

    async fn delete_all_for_owner(&self, owner: &AccountRef) -> AuthResult<u64>;

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64>;
}
