//! PostgreSQL Repository Implementations
//!
//! Tables:
//! - `consumer_accounts` / `merchant_accounts`: same columns, one per tenant
//! - `account_emails`: global registry enforcing email uniqueness across both
//! - `refresh_sessions`: one row per live refresh token, keyed by its SHA-256

use chrono::{DateTime, Utc};
use kernel::id::AccountId;
use platform::password::HashedPassword;
use sqlx::PgPool;
use uuid::Uuid;

use crate::domain::entity::{account::Account, refresh_session::RefreshSession};
use crate::domain::repository::{AccountRepository, RefreshSessionRepository};
use crate::domain::value_object::{
    email::Email,
    tenant::{AccountRef, TenantType},
    verification_code::VerificationCode,
};
use crate::error::{AuthError, AuthResult};

const ACCOUNT_COLUMNS: &str = r#"
    account_id,
    email,
    display_name,
    password_hash,
    is_verified,
    verification_code,
    verification_code_expires_at,
    verification_attempt_count,
    last_verification_sent_at,
    daily_verification_sent_count,
    reset_token_hash,
    reset_token_expires_at,
    last_login_at,
    created_at,
    updated_at
"#;

const SESSION_COLUMNS: &str = r#"
    token_hash,
    account_id,
    account_type,
    user_agent,
    client_ip,
    issued_at,
    expires_at
"#;

fn account_table(tenant: TenantType) -> &'static str {
    match tenant {
        TenantType::Consumer => "consumer_accounts",
        TenantType::Merchant => "merchant_accounts",
    }
}

/// PostgreSQL-backed auth repository
#[derive(Clone)]
pub struct PgAuthRepository {
    pool: PgPool,
}

impl PgAuthRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

// ============================================================================
// Account Repository Implementation
// ============================================================================

impl AccountRepository for PgAuthRepository {
    async fn insert(&self, account: &Account) -> AuthResult<()> {
        let mut tx = self.pool.begin().await?;

        // The registry row goes first; its primary key is the cross-tenant
        // uniqueness guard.
        sqlx::query(
            "INSERT INTO account_emails (email, account_type, account_id) VALUES ($1, $2, $3)",
        )
        .bind(account.email.as_str())
        .bind(account.tenant.code())
        .bind(account.id.as_uuid())
        .execute(&mut *tx)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::EmailTaken,
            other => AuthError::Database(other),
        })?;

        let sql = format!(
            "INSERT INTO {} ({ACCOUNT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)",
            account_table(account.tenant)
        );
        bind_account(sqlx::query(&sql), account)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn email_exists(&self, email: &Email) -> AuthResult<bool> {
        let exists = sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS(SELECT 1 FROM account_emails WHERE email = $1)",
        )
        .bind(email.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }

    async fn find_by_id(&self, account: &AccountRef) -> AuthResult<Option<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} WHERE account_id = $1",
            account_table(account.tenant)
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(account.id.as_uuid())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account(account.tenant)).transpose()
    }

    async fn find_by_email(
        &self,
        tenant: TenantType,
        email: &Email,
    ) -> AuthResult<Option<Account>> {
        let sql = format!(
            "SELECT {ACCOUNT_COLUMNS} FROM {} WHERE email = $1",
            account_table(tenant)
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account(tenant)).transpose()
    }

    async fn find_by_verification_code(
        &self,
        tenant: TenantType,
        code: &VerificationCode,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        let sql = format!(
            r#"
            SELECT {ACCOUNT_COLUMNS} FROM {}
            WHERE verification_code = $1
              AND verification_code_expires_at > $2
            ORDER BY verification_code_expires_at DESC
            LIMIT 1
            "#,
            account_table(tenant)
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(code.as_str())
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account(tenant)).transpose()
    }

    async fn find_by_reset_token(
        &self,
        tenant: TenantType,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        let sql = format!(
            r#"
            SELECT {ACCOUNT_COLUMNS} FROM {}
            WHERE reset_token_hash = $1
              AND reset_token_expires_at > $2
            "#,
            account_table(tenant)
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        row.map(|r| r.into_account(tenant)).transpose()
    }

    async fn claim_reset_token(
        &self,
        tenant: TenantType,
        token_hash: &str,
        now: DateTime<Utc>,
    ) -> AuthResult<Option<Account>> {
        // Conditional update: of two concurrent claims, only one matches.
        let sql = format!(
            r#"
            UPDATE {} SET
                reset_token_hash = NULL,
                reset_token_expires_at = NULL,
                updated_at = $2
            WHERE reset_token_hash = $1
              AND reset_token_expires_at > $2
            RETURNING {ACCOUNT_COLUMNS}
            "#,
            account_table(tenant)
        );
        let row = sqlx::query_as::<_, AccountRow>(&sql)
            .bind(token_hash)
            .bind(now)
            .fetch_optional(&self.pool)
            .await?;

        match row {
            Some(r) => {
                tracing::debug!(tenant = %tenant, "Reset token claimed");
                Ok(Some(r.into_account(tenant)?))
            }
            None => Ok(None),
        }
    }

    async fn update(&self, account: &Account) -> AuthResult<()> {
        let sql = format!(
            r#"
            UPDATE {} SET
                email = $2,
                display_name = $3,
                password_hash = $4,
                is_verified = $5,
                verification_code = $6,
                verification_code_expires_at = $7,
                verification_attempt_count = $8,
                last_verification_sent_at = $9,
                daily_verification_sent_count = $10,
                reset_token_hash = $11,
                reset_token_expires_at = $12,
                last_login_at = $13,
                created_at = $14,
                updated_at = $15
            WHERE account_id = $1
            "#,
            account_table(account.tenant)
        );
        let result = bind_account(sqlx::query(&sql), account)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::AccountNotFound);
        }
        Ok(())
    }

    async fn delete(&self, account: &AccountRef) -> AuthResult<bool> {
        let mut tx = self.pool.begin().await?;

        let sql = format!(
            "DELETE FROM {} WHERE account_id = $1 RETURNING email",
            account_table(account.tenant)
        );
        let email = sqlx::query_scalar::<_, String>(&sql)
            .bind(account.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(email) = email else {
            return Ok(false);
        };

        sqlx::query("DELETE FROM account_emails WHERE email = $1")
            .bind(&email)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }
}

type PgQuery<'q> = sqlx::query::Query<'q, sqlx::Postgres, sqlx::postgres::PgArguments>;

/// Binds in `ACCOUNT_COLUMNS` order
fn bind_account<'q>(query: PgQuery<'q>, account: &'q Account) -> PgQuery<'q> {
    query
        .bind(account.id.as_uuid())
        .bind(account.email.as_str())
        .bind(&account.display_name)
        .bind(account.password_hash.as_phc_string())
        .bind(account.is_verified)
        .bind(account.verification_code.as_ref().map(VerificationCode::as_str))
        .bind(account.verification_code_expires_at)
        .bind(count_to_db(account.verification_attempt_count))
        .bind(account.last_verification_sent_at)
        .bind(count_to_db(account.daily_verification_sent_count))
        .bind(account.reset_token_hash.as_deref())
        .bind(account.reset_token_expires_at)
        .bind(account.last_login_at)
        .bind(account.created_at)
        .bind(account.updated_at)
}

fn count_to_db(count: u32) -> i32 {
    i32::try_from(count).unwrap_or(i32::MAX)
}

// ============================================================================
// Refresh Session Repository Implementation
// ============================================================================

impl RefreshSessionRepository for PgAuthRepository {
    async fn upsert(&self, session: &RefreshSession) -> AuthResult<()> {
        sqlx::query(&format!(
            r#"
            INSERT INTO refresh_sessions ({SESSION_COLUMNS})
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            ON CONFLICT (token_hash) DO UPDATE SET
                user_agent = EXCLUDED.user_agent,
                client_ip = EXCLUDED.client_ip
            "#
        ))
        .bind(&session.token_hash)
        .bind(session.owner.id.as_uuid())
        .bind(session.owner.tenant.code())
        .bind(session.user_agent.as_deref())
        .bind(session.client_ip.as_deref())
        .bind(session.issued_at)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn take(&self, token_hash: &str) -> AuthResult<Option<RefreshSession>> {
        // DELETE ... RETURNING: the row lock makes a second caller see nothing
        let row = sqlx::query_as::<_, SessionRow>(&format!(
            "DELETE FROM refresh_sessions WHERE token_hash = $1 RETURNING {SESSION_COLUMNS}"
        ))
        .bind(token_hash)
        .fetch_optional(&self.pool)
        .await?;

        row.map(SessionRow::into_session).transpose()
    }

    async fn remove(&self, token_hash: &str) -> AuthResult<bool> {
        let deleted = sqlx::query("DELETE FROM refresh_sessions WHERE token_hash = $1")
            .bind(token_hash)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok(deleted > 0)
    }

    async fn delete_all_for_owner(&self, owner: &AccountRef) -> AuthResult<u64> {
        let deleted = sqlx::query(
            "DELETE FROM refresh_sessions WHERE account_type = $1 AND account_id = $2",
        )
        .bind(owner.tenant.code())
        .bind(owner.id.as_uuid())
        .execute(&self.pool)
        .await?
        .rows_affected();

        Ok(deleted)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AuthResult<u64> {
        let deleted = sqlx::query("DELETE FROM refresh_sessions WHERE expires_at <= $1")
            .bind(now)
            .execute(&self.pool)
            .await?
            .rows_affected();

        tracing::debug!(sessions_deleted = deleted, "Cleaned up expired refresh sessions");

        Ok(deleted)
    }
}

// Internal row types for sqlx mapping

#[derive(sqlx::FromRow)]
struct AccountRow {
    account_id: Uuid,
    email: String,
    display_name: String,
    password_hash: String,
    is_verified: bool,
    verification_code: Option<String>,
    verification_code_expires_at: Option<DateTime<Utc>>,
    verification_attempt_count: i32,
    last_verification_sent_at: Option<DateTime<Utc>>,
    daily_verification_sent_count: i32,
    reset_token_hash: Option<String>,
    reset_token_expires_at: Option<DateTime<Utc>>,
    last_login_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl AccountRow {
    fn into_account(self, tenant: TenantType) -> AuthResult<Account> {
        let password_hash = HashedPassword::from_phc_string(self.password_hash)
            .map_err(|e| AuthError::Internal(format!("Invalid stored password hash: {e}")))?;

        Ok(Account {
            id: AccountId::from_uuid(self.account_id),
            tenant,
            email: Email::from_db(self.email),
            display_name: self.display_name,
            password_hash,
            is_verified: self.is_verified,
            verification_code: self.verification_code.map(VerificationCode::from_db),
            verification_code_expires_at: self.verification_code_expires_at,
            verification_attempt_count: u32::try_from(self.verification_attempt_count)
                .unwrap_or_default(),
            last_verification_sent_at: self.last_verification_sent_at,
            daily_verification_sent_count: u32::try_from(self.daily_verification_sent_count)
                .unwrap_or_default(),
            reset_token_hash: self.reset_token_hash,
            reset_token_expires_at: self.reset_token_expires_at,
            last_login_at: self.last_login_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct SessionRow {
    token_hash: String,
    account_id: Uuid,
    account_type: String,
    user_agent: Option<String>,
    client_ip: Option<String>,
    issued_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
}

impl SessionRow {
    fn into_session(self) -> AuthResult<RefreshSession> {
        let tenant = TenantType::from_code(&self.account_type).ok_or_else(|| {
            AuthError::Internal(format!("Invalid account_type: {}", self.account_type))
        })?;

        Ok(RefreshSession {
            token_hash: self.token_hash,
            owner: AccountRef::new(tenant, AccountId::from_uuid(self.account_id)),
            user_agent: self.user_agent,
            client_ip: self.client_ip,
            issued_at: self.issued_at,
            expires_at: self.expires_at,
        })
    }
}
