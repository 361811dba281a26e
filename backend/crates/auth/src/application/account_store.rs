//! Account Store
//!
//! Account persistence plus password hashing for both tenants. Hashing and
//! verification run on the blocking pool.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use platform::password::{ClearTextPassword, HashCost, HashedPassword};

use crate::domain::entity::account::Account;
use crate::domain::repository::AccountRepository;
use crate::domain::services::expiry_after;
use crate::domain::value_object::{
    email::Email,
    reset_token::ResetToken,
    tenant::{AccountRef, TenantType},
    verification_code::{IssuedCode, VerificationCode},
};
use crate::error::{AuthError, AuthResult};

/// Profile fields supplied at signup
#[derive(Debug)]
pub struct NewAccount {
    pub tenant: TenantType,
    pub email: Email,
    pub display_name: String,
    pub password: ClearTextPassword,
}

/// Outcome of a password check
#[derive(Debug)]
pub enum PasswordCheck {
    Mismatch,
    Match,
    /// Correct, and re-hashed at the current cost
    MatchRehashed(HashedPassword),
}

impl PasswordCheck {
    pub fn is_match(&self) -> bool {
        !matches!(self, PasswordCheck::Mismatch)
    }

    pub fn into_upgraded_hash(self) -> Option<HashedPassword> {
        match self {
            PasswordCheck::MatchRehashed(hash) => Some(hash),
            _ => None,
        }
    }
}

pub struct AccountStore<A> {
    repo: Arc<A>,
    consumer_cost: HashCost,
    merchant_cost: HashCost,
}

impl<A> Clone for AccountStore<A> {
    fn clone(&self) -> Self {
        Self {
            repo: self.repo.clone(),
            consumer_cost: self.consumer_cost,
            merchant_cost: self.merchant_cost,
        }
    }
}

impl<A> AccountStore<A>
where
    A: AccountRepository,
{
    pub fn new(repo: Arc<A>, consumer_cost: HashCost, merchant_cost: HashCost) -> Self {
        Self {
            repo,
            consumer_cost,
            merchant_cost,
        }
    }

    fn cost(&self, tenant: TenantType) -> HashCost {
        match tenant {
            TenantType::Consumer => self.consumer_cost,
            TenantType::Merchant => self.merchant_cost,
        }
    }

    pub async fn email_exists(&self, email: &Email) -> AuthResult<bool> {
        self.repo.email_exists(email).await
    }

    /// Hash, build and insert. The email registry rejects duplicates across
    /// both tenants, even when two signups race past the pre-check.
    pub async fn create(
        &self,
        new: NewAccount,
        code: &IssuedCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Account> {
        let password_hash = self.hash_password(new.tenant, new.password).await?;
        let account = Account::register(
            new.tenant,
            new.email,
            new.display_name,
            password_hash,
            code,
            now,
        );
        self.repo.insert(&account).await?;
        Ok(account)
    }

    pub async fn hash_password(
        &self,
        tenant: TenantType,
        password: ClearTextPassword,
    ) -> AuthResult<HashedPassword> {
        let cost = self.cost(tenant);
        let hashed = tokio::task::spawn_blocking(move || password.hash(cost)).await??;
        Ok(hashed)
    }

    /// Verify a login candidate. A match against a hash weaker than the
    /// tenant's current cost also yields the upgraded hash.
    pub async fn verify_password(
        &self,
        account: &Account,
        candidate: ClearTextPassword,
    ) -> AuthResult<PasswordCheck> {
        let stored = account.password_hash.clone();
        let cost = self.cost(account.tenant);
        let check = tokio::task::spawn_blocking(move || {
            if !stored.verify(&candidate) {
                return Ok(PasswordCheck::Mismatch);
            }
            if stored.needs_rehash(cost) {
                return candidate.hash(cost).map(PasswordCheck::MatchRehashed);
            }
            Ok(PasswordCheck::Match)
        })
        .await??;
        Ok(check)
    }

    /// Burn the same time a real verification would
    pub async fn dummy_verify(
        &self,
        tenant: TenantType,
        candidate: ClearTextPassword,
    ) -> AuthResult<()> {
        let cost = self.cost(tenant);
        tokio::task::spawn_blocking(move || HashedPassword::dummy_verify(&candidate, cost))
            .await?;
        Ok(())
    }

    pub async fn find_by_id(&self, account: &AccountRef) -> AuthResult<Option<Account>> {
        self.repo.find_by_id(account).await
    }

    pub async fn find_by_email(
        &self,
        tenant: TenantType,
        email: &Email,
    ) -> AuthResult<Option<Account>> {
        self.repo.find_by_email(tenant, email).await
    }

    pub async fn find_by_verification_code(
        &self,
        tenant: TenantType,
        code: &VerificationCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        self.repo.find_by_verification_code(tenant, code, now).await
    }

    /// Holder of a live reset token; does not consume it
    pub async fn find_by_reset_token(
        &self,
        tenant: TenantType,
        token: &ResetToken,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        self.repo.find_by_reset_token(tenant, &token.digest(), now).await
    }

    /// Single-use: the token is cleared by the same statement that finds it
    pub async fn claim_reset_token(
        &self,
        tenant: TenantType,
        token: &ResetToken,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        self.repo.claim_reset_token(tenant, &token.digest(), now).await
    }

    pub async fn mark_verified(&self, account: Account, now: DateTime<Utc>) -> AuthResult<Account> {
        let account = account.verified(now);
        self.repo.update(&account).await?;
        Ok(account)
    }

    pub async fn set_verification_code(
        &self,
        account: Account,
        code: &IssuedCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Account> {
        let account = account.with_verification_code(code, now);
        self.repo.update(&account).await?;
        Ok(account)
    }

    pub async fn set_reset_token(
        &self,
        account: Account,
        token: &ResetToken,
        ttl: Duration,
        now: DateTime<Utc>,
    ) -> AuthResult<Account> {
        let account = account.with_reset_token(token, expiry_after(now, ttl)?, now);
        self.repo.update(&account).await?;
        Ok(account)
    }

    pub async fn clear_reset_token(&self, account: Account, now: DateTime<Utc>) -> AuthResult<Account> {
        let account = account.without_reset_token(now);
        self.repo.update(&account).await?;
        Ok(account)
    }

    pub async fn set_password(
        &self,
        account: Account,
        password_hash: HashedPassword,
        now: DateTime<Utc>,
    ) -> AuthResult<Account> {
        let account = account.with_password(password_hash, now);
        self.repo.update(&account).await?;
        Ok(account)
    }

    pub async fn record_login(
        &self,
        account: Account,
        upgraded_hash: Option<HashedPassword>,
        now: DateTime<Utc>,
    ) -> AuthResult<Account> {
        let mut account = account.logged_in(now);
        if let Some(password_hash) = upgraded_hash {
            account.password_hash = password_hash;
        }
        self.repo.update(&account).await?;
        Ok(account)
    }

    pub async fn delete(&self, account: &AccountRef) -> AuthResult<()> {
        if self.repo.delete(account).await? {
            Ok(())
        } else {
            Err(AuthError::AccountNotFound)
        }
    }
}
