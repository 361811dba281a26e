//! In-memory repository
//!
//! Same contract as the PostgreSQL repository, held in one mutex. Every
//! method finishes its critical section without awaiting, so `take` is as
//! atomic as the conditional delete it stands in for.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};

use crate::domain::entity::{account::Account, refresh_session::RefreshSession};
use crate::domain::repository::{AccountRepository, RefreshSessionRepository};
use crate::domain::value_object::{
    email::Email,
    tenant::{AccountRef, TenantType},
    verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

#[derive(Debug, Default)]
struct Tables {
    accounts: HashMap<AccountRef, Account>,
    /// Global email registry across both tenants
    emails: HashMap<String, AccountRef>,
    sessions: HashMap<String, RefreshSession>,
}

/// Clones share storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryAuthRepository {
    tables: Arc<Mutex<Tables>>,
}

impl InMemoryAuthRepository {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Live sessions of one owner
    pub fn session_count(&self, owner: &AccountRef) -> usize {
        self.lock()
            .sessions
            .values()
            .filter(|s| &s.owner == owner)
            .count()
    }

    /// Session row for a raw refresh token, if any
    pub fn session_for(&self, refresh_token: &str) -> Option<RefreshSession> {
        let hash = crate::domain::entity::refresh_session::token_digest(refresh_token);
        self.lock().sessions.get(&hash).cloned()
    }
}

impl AccountRepository for InMemoryAuthRepository {
    async fn insert(&self, account: &Account) -> AuthResult<()> {
        let mut tables = self.lock();
        if tables.emails.contains_key(account.email.as_str()) {
            return Err(AuthError::EmailTaken);
        }
        tables
            .emails
            .insert(account.email.as_str().to_string(), account.reference());
        tables.accounts.insert(account.reference(), account.clone());
        Ok(())
    }

    async fn email_exists(&self, email: &Email) -> AuthResult<bool> {
        Ok(self.lock().emails.contains_key(email.as_str()))
    }

    async fn find_by_id(&self, account: &AccountRef) -> AuthResult<Option<Account>> {
        Ok(self.lock().accounts.get(account).cloned())
    }

    async fn find_by_email(
        &self,
        tenant: TenantType,
        email: &Email,
    ) -> AuthResult<Option<Account>> {
        let tables = self.lock();
        let found = tables
            .emails
            .get(email.as_str())
            .filter(|r| r.tenant == tenant)
            .and_then(|r| tables.accounts.get(r))
            .cloned();
        Ok(found)
    }

    async fn find_by_verification_code(
        &self,
        tenant: TenantType,
        code: &VerificationCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        let found = self
            .lock()
            .accounts
            .values()
            .find(|a| a.tenant == tenant && a.verification_code_matches(code, now))
            .cloned();
        Ok(found)
    }

    async fn find_by_reset_token(
        &self,
        tenant: TenantType,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        let found = self
            .lock()
            .accounts
            .values()
            .find(|a| a.tenant == tenant && a.reset_token_matches(token_hash, now))
            .cloned();
        Ok(found)
    }

    async fn claim_reset_token(
        &self,
        tenant: TenantType,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        let mut tables = self.lock();
        let Some(key) = tables
            .accounts
            .values()
            .find(|a| a.tenant == tenant && a.reset_token_matches(token_hash, now))
            .map(Account::reference)
        else {
            return Ok(None);
        };

        let Some(current) = tables.accounts.remove(&key) else {
            return Ok(None);
        };
        let claimed = current.without_reset_token(now);
        tables.accounts.insert(key, claimed.clone());
        Ok(Some(claimed))
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        let mut tables = self.lock();
        match tables.accounts.get_mut(&account.reference()) {
            Some(slot) => {
                *slot = account.clone();
                Ok(())
            }
            None => Err(AuthError::AccountNotFound),
        }
    }

    async fn delete(&self, account: &AccountRef) -> AuthResult<bool> {
        let mut tables = self.lock();
        match tables.accounts.remove(account) {
            Some(removed) => {
                tables.emails.remove(removed.email.as_str());
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

impl RefreshSessionRepository for InMemoryAuthRepository {
    async fn upsert(&self, session: &RefreshSession) -> AuthResult<()> {
        let mut tables = self.lock();
        tables
            .sessions
            .entry(session.token_hash.clone())
            .and_modify(|existing| {
                existing.user_agent = session.user_agent.clone();
                existing.client_ip = session.client_ip.clone();
            })
            .or_insert_with(|| session.clone());
        Ok(())
    }

    async fn take(&self, token_hash: &str) -> AuthResult<Option<RefreshSession>> {
        Ok(self.lock().sessions.remove(token_hash))
    }

    async fn remove(&self, token_hash: &str) -> AuthResult<bool> {
        Ok(self.lock().sessions.remove(token_hash).is_some())
    }

    async fn delete_all_for_owner(&self, owner: &AccountRef) -> AuthResult<u64> {
        let mut tables = self.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| &s.owner != owner);
        Ok((before - tables.sessions.len()) as u64)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let mut tables = self.lock();
        let before = tables.sessions.len();
        tables.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - tables.sessions.len()) as u64)
    }
}
