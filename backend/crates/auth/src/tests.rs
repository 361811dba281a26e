//! Scenario tests over in-memory storage, a manual clock and a recording
//! mailer.

use std::sync::{Arc, Mutex, PoisonError};

use axum::Router;
use axum::body::Body;
use axum::http::{Request, Response, StatusCode, header};
use chrono::{DateTime, Duration, TimeZone, Utc};
use platform::client::ClientMeta;
use platform::clock::ManualClock;
use platform::password::HashCost;
use serde_json::Value;
use tower::ServiceExt;

use crate::application::config::AuthConfig;
use crate::application::gateway::AuthGateway;
use crate::application::{ResetPasswordInput, SignInInput, SignUpInput, SignedIn};
use crate::domain::mail::{MailError, MailGateway};
use crate::domain::repository::AccountRepository;
use crate::domain::value_object::{
    email::Email, tenant::TenantType, verification_code::VerificationCode,
};
use crate::error::AuthError;
use crate::infra::mail::LogMailGateway;
use crate::infra::memory::InMemoryAuthRepository;
use crate::presentation::router::auth_router_generic;

const SECRET: &str = "scenario-secret-key-32-bytes-long!";

// ============================================================================
// Harness
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq)]
enum SentMail {
    Verification { to: String, code: String },
    Welcome { to: String, name: String },
    PasswordReset { to: String, url: String },
    ResetSuccess { to: String },
}

#[derive(Debug, Clone, Default)]
struct RecordingMailer {
    sent: Arc<Mutex<Vec<SentMail>>>,
}

impl RecordingMailer {
    fn record(&self, mail: SentMail) {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(mail);
    }

    fn sent(&self) -> Vec<SentMail> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn last_reset_token(&self) -> Option<String> {
        self.sent().into_iter().rev().find_map(|mail| match mail {
            SentMail::PasswordReset { url, .. } => url.rsplit('/').next().map(str::to_string),
            _ => None,
        })
    }
}

impl MailGateway for RecordingMailer {
    async fn send_verification_email(
        &self,
        to: &Email,
        code: &VerificationCode,
    ) -> Result<(), MailError> {
        self.record(SentMail::Verification {
            to: to.as_str().to_string(),
            code: code.as_str().to_string(),
        });
        Ok(())
    }

    async fn send_welcome_email(&self, to: &Email, name: &str) -> Result<(), MailError> {
        self.record(SentMail::Welcome {
            to: to.as_str().to_string(),
            name: name.to_string(),
        });
        Ok(())
    }

    async fn send_password_reset_email(&self, to: &Email, reset_url: &str) -> Result<(), MailError> {
        self.record(SentMail::PasswordReset {
            to: to.as_str().to_string(),
            url: reset_url.to_string(),
        });
        Ok(())
    }

    async fn send_reset_success_email(&self, to: &Email) -> Result<(), MailError> {
        self.record(SentMail::ResetSuccess {
            to: to.as_str().to_string(),
        });
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, Default)]
struct FailingMailer;

impl MailGateway for FailingMailer {
    async fn send_verification_email(
        &self,
        _to: &Email,
        _code: &VerificationCode,
    ) -> Result<(), MailError> {
        Err(MailError::Unavailable("smtp down".to_string()))
    }

    async fn send_welcome_email(&self, _to: &Email, _name: &str) -> Result<(), MailError> {
        Err(MailError::Unavailable("smtp down".to_string()))
    }

    async fn send_password_reset_email(&self, to: &Email, _url: &str) -> Result<(), MailError> {
        Err(MailError::Rejected {
            recipient: to.as_str().to_string(),
            reason: "mailbox full".to_string(),
        })
    }

    async fn send_reset_success_email(&self, _to: &Email) -> Result<(), MailError> {
        Err(MailError::Unavailable("smtp down".to_string()))
    }
}

fn t0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 5, 4, 9, 0, 0).unwrap()
}

fn test_config() -> AuthConfig {
    let mut config = AuthConfig::new(SECRET).unwrap();
    config.consumer_hash_cost = HashCost::MINIMAL;
    config.merchant_hash_cost = HashCost::MINIMAL;
    config
}

struct Harness<M> {
    gateway: Arc<AuthGateway<InMemoryAuthRepository, M>>,
    repo: InMemoryAuthRepository,
    clock: ManualClock,
}

fn harness_with<M>(mailer: M) -> Harness<M>
where
    M: MailGateway + Sync + 'static,
{
    harness_with_config(mailer, test_config())
}

fn harness_with_config<M>(mailer: M, config: AuthConfig) -> Harness<M>
where
    M: MailGateway + Sync + 'static,
{
    let repo = InMemoryAuthRepository::new();
    let clock = ManualClock::new(t0());
    let gateway = AuthGateway::new(
        Arc::new(repo.clone()),
        Arc::new(mailer),
        Arc::new(config),
        Arc::new(clock.clone()),
    );
    Harness {
        gateway: Arc::new(gateway),
        repo,
        clock,
    }
}

fn harness() -> (Harness<RecordingMailer>, RecordingMailer) {
    let mailer = RecordingMailer::default();
    (harness_with(mailer.clone()), mailer)
}

/// Let spawned mail tasks run
async fn settle() {
    for _ in 0..8 {
        tokio::task::yield_now().await;
    }
}

fn meta() -> ClientMeta {
    ClientMeta {
        ip: "203.0.113.7".parse().ok(),
        user_agent: Some("scenario".to_string()),
    }
}

fn signup_input(tenant: TenantType, email: &str) -> SignUpInput {
    SignUpInput {
        tenant,
        email: email.to_string(),
        password: "Secret123".to_string(),
        name: "Sam".to_string(),
    }
}

impl<M> Harness<M>
where
    M: MailGateway + Sync + 'static,
{
    async fn signup(&self, tenant: TenantType, email: &str) -> SignedIn {
        self.gateway
            .signup(signup_input(tenant, email), &meta())
            .await
            .unwrap()
    }

    async fn stored_code(&self, tenant: TenantType, email: &str) -> String {
        let account = self
            .repo
            .find_by_email(tenant, &Email::parse(email).unwrap())
            .await
            .unwrap()
            .unwrap();
        account.verification_code.unwrap().as_str().to_string()
    }

    async fn login(&self, tenant: TenantType, email: &str, password: &str) -> Result<SignedIn, AuthError> {
        self.gateway
            .login(
                SignInInput {
                    tenant,
                    email: email.to_string(),
                    password: password.to_string(),
                },
                &meta(),
            )
            .await
    }
}

// ============================================================================
// Signup / Login
// ============================================================================

#[tokio::test]
async fn test_signup_verify_refresh_replay_scenario() {
    let (h, _) = harness();

    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;
    assert!(!signed_up.account.is_verified);

    let code = h.stored_code(TenantType::Consumer, "a@x.com").await;
    let verified = h
        .gateway
        .verify_email(TenantType::Consumer, &code, &meta())
        .await
        .unwrap();
    assert!(verified.account.is_verified);
    assert!(verified.account.verification_code.is_none());

    let first = verified.tokens.refresh_token;
    let rotated = h.gateway.refresh(Some(&first), &meta()).await.unwrap();
    assert_ne!(rotated.refresh_token, first);
    assert!(h.gateway.authenticate(&rotated.access_token).is_ok());

    let replay = h.gateway.refresh(Some(&first), &meta()).await;
    assert!(matches!(replay, Err(AuthError::RefreshTokenNotFound)));
    assert_eq!(replay.unwrap_err().status_code(), 401);

    // The successor is still good
    assert!(h.gateway.refresh(Some(&rotated.refresh_token), &meta()).await.is_ok());
}

#[tokio::test]
async fn test_signup_persists_session_with_device_meta() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;

    let session = h.repo.session_for(&signed_up.tokens.refresh_token).unwrap();
    assert_eq!(session.owner, signed_up.account.reference());
    assert_eq!(session.user_agent.as_deref(), Some("scenario"));
    assert_eq!(session.client_ip.as_deref(), Some("203.0.113.7"));
    assert_eq!(session.expires_at, Some(t0() + Duration::days(30)));
}

#[tokio::test]
async fn test_signup_mails_the_stored_code() {
    let (h, mailer) = harness();
    h.signup(TenantType::Consumer, "a@x.com").await;
    settle().await;

    let code = h.stored_code(TenantType::Consumer, "a@x.com").await;
    assert_eq!(
        mailer.sent(),
        vec![SentMail::Verification {
            to: "a@x.com".to_string(),
            code,
        }]
    );
}

#[tokio::test]
async fn test_email_unique_across_tenants() {
    let (h, _) = harness();
    h.signup(TenantType::Merchant, "shop@x.com").await;

    let again = h
        .gateway
        .signup(signup_input(TenantType::Consumer, "SHOP@x.com"), &meta())
        .await;
    assert!(matches!(again, Err(AuthError::EmailTaken)));
}

#[tokio::test]
async fn test_signup_rejects_weak_password_and_blank_name() {
    let (h, _) = harness();

    let mut weak = signup_input(TenantType::Consumer, "a@x.com");
    weak.password = "short".to_string();
    let result = h.gateway.signup(weak, &meta()).await;
    assert!(matches!(result, Err(AuthError::PasswordPolicy(_))));

    let mut nameless = signup_input(TenantType::Consumer, "a@x.com");
    nameless.name = "   ".to_string();
    let result = h.gateway.signup(nameless, &meta()).await;
    assert!(matches!(result, Err(AuthError::InvalidInput(_))));
}

#[tokio::test]
async fn test_signup_survives_mail_failure() {
    let h = harness_with(FailingMailer);
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;
    settle().await;

    assert!(!signed_up.account.is_verified);
    assert!(h.repo.session_for(&signed_up.tokens.refresh_token).is_some());
}

#[tokio::test]
async fn test_login_failures_are_indistinguishable() {
    let (h, _) = harness();
    h.signup(TenantType::Consumer, "a@x.com").await;

    let wrong_password = h.login(TenantType::Consumer, "a@x.com", "Secret124").await;
    let unknown_email = h.login(TenantType::Consumer, "b@x.com", "Secret123").await;
    let wrong_tenant = h.login(TenantType::Merchant, "a@x.com", "Secret123").await;

    let messages: Vec<String> = [wrong_password, unknown_email, wrong_tenant]
        .into_iter()
        .map(|r| match r {
            Err(e @ AuthError::InvalidCredentials) => e.to_string(),
            other => panic!("expected InvalidCredentials, got {other:?}"),
        })
        .collect();
    assert!(messages.iter().all(|m| m == "Invalid credentials"));
}

#[tokio::test]
async fn test_login_records_last_login_and_issues_session() {
    let (h, _) = harness();
    h.signup(TenantType::Merchant, "shop@x.com").await;
    h.clock.advance(Duration::hours(2));

    let signed_in = h
        .login(TenantType::Merchant, "shop@x.com", "Secret123")
        .await
        .unwrap();
    assert_eq!(signed_in.account.last_login_at, Some(t0() + Duration::hours(2)));
    assert_eq!(h.repo.session_count(&signed_in.account.reference()), 2);
}

// ============================================================================
// Verification
// ============================================================================

#[tokio::test]
async fn test_verification_code_ttl_boundary() {
    let (h, _) = harness();
    h.signup(TenantType::Consumer, "early@x.com").await;
    h.signup(TenantType::Consumer, "late@x.com").await;
    let early = h.stored_code(TenantType::Consumer, "early@x.com").await;
    let late = h.stored_code(TenantType::Consumer, "late@x.com").await;

    h.clock.set(t0() + Duration::minutes(9) + Duration::seconds(59));
    assert!(
        h.gateway
            .verify_email(TenantType::Consumer, &early, &meta())
            .await
            .is_ok()
    );

    h.clock.set(t0() + Duration::minutes(10) + Duration::seconds(1));
    let expired = h
        .gateway
        .verify_email(TenantType::Consumer, &late, &meta())
        .await;
    assert!(matches!(expired, Err(AuthError::InvalidVerificationCode)));
}

#[tokio::test]
async fn test_verify_sends_welcome_and_code_is_single_use() {
    let (h, mailer) = harness();
    h.signup(TenantType::Merchant, "shop@x.com").await;
    let code = h.stored_code(TenantType::Merchant, "shop@x.com").await;

    h.gateway
        .verify_email(TenantType::Merchant, &code, &meta())
        .await
        .unwrap();
    settle().await;
    assert!(mailer.sent().contains(&SentMail::Welcome {
        to: "shop@x.com".to_string(),
        name: "Sam".to_string(),
    }));

    let again = h
        .gateway
        .verify_email(TenantType::Merchant, &code, &meta())
        .await;
    assert!(matches!(again, Err(AuthError::InvalidVerificationCode)));
}

#[tokio::test]
async fn test_verification_code_is_scoped_to_tenant() {
    let (h, _) = harness();
    h.signup(TenantType::Merchant, "shop@x.com").await;
    let code = h.stored_code(TenantType::Merchant, "shop@x.com").await;

    let result = h
        .gateway
        .verify_email(TenantType::Consumer, &code, &meta())
        .await;
    assert!(matches!(result, Err(AuthError::InvalidVerificationCode)));
}

#[tokio::test]
async fn test_resend_cooldown() {
    let (h, _) = harness();
    h.signup(TenantType::Consumer, "a@x.com").await;

    // Signup itself started the cooldown
    let too_soon = h
        .gateway
        .resend_verification(TenantType::Consumer, "a@x.com")
        .await;
    assert!(matches!(too_soon, Err(AuthError::ResendCooldown { .. })));

    h.clock.advance(Duration::seconds(61));
    h.gateway
        .resend_verification(TenantType::Consumer, "a@x.com")
        .await
        .unwrap();

    h.clock.advance(Duration::seconds(30));
    let second = h
        .gateway
        .resend_verification(TenantType::Consumer, "a@x.com")
        .await;
    match second {
        Err(e @ AuthError::ResendCooldown { retry_after_secs }) => {
            assert_eq!(retry_after_secs, 30);
            assert_eq!(e.status_code(), 400);
        }
        other => panic!("expected cooldown, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resend_daily_cap_resets_next_day() {
    let (h, mailer) = harness();
    h.signup(TenantType::Consumer, "a@x.com").await;

    for _ in 0..5 {
        h.clock.advance(Duration::seconds(61));
        h.gateway
            .resend_verification(TenantType::Consumer, "a@x.com")
            .await
            .unwrap();
    }

    h.clock.advance(Duration::seconds(61));
    let sixth = h
        .gateway
        .resend_verification(TenantType::Consumer, "a@x.com")
        .await;
    assert!(matches!(sixth, Err(AuthError::DailyResendLimit)));

    h.clock.set(Utc.with_ymd_and_hms(2026, 5, 5, 0, 0, 30).unwrap());
    h.gateway
        .resend_verification(TenantType::Consumer, "a@x.com")
        .await
        .unwrap();

    settle().await;
    let verification_mails = mailer
        .sent()
        .iter()
        .filter(|m| matches!(m, SentMail::Verification { .. }))
        .count();
    assert_eq!(verification_mails, 1 + 5 + 1);
}

#[tokio::test]
async fn test_resend_replaces_code() {
    let (h, _) = harness();
    h.signup(TenantType::Consumer, "a@x.com").await;
    let old = h.stored_code(TenantType::Consumer, "a@x.com").await;

    h.clock.advance(Duration::seconds(61));
    h.gateway
        .resend_verification(TenantType::Consumer, "a@x.com")
        .await
        .unwrap();
    let new = h.stored_code(TenantType::Consumer, "a@x.com").await;

    if old != new {
        let stale = h
            .gateway
            .verify_email(TenantType::Consumer, &old, &meta())
            .await;
        assert!(matches!(stale, Err(AuthError::InvalidVerificationCode)));
    }
    assert!(
        h.gateway
            .verify_email(TenantType::Consumer, &new, &meta())
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn test_resend_rejects_verified_and_unknown() {
    let (h, _) = harness();
    h.signup(TenantType::Consumer, "a@x.com").await;
    let code = h.stored_code(TenantType::Consumer, "a@x.com").await;
    h.gateway
        .verify_email(TenantType::Consumer, &code, &meta())
        .await
        .unwrap();

    let verified = h
        .gateway
        .resend_verification(TenantType::Consumer, "a@x.com")
        .await;
    assert!(matches!(verified, Err(AuthError::AlreadyVerified)));

    let unknown = h
        .gateway
        .resend_verification(TenantType::Consumer, "nobody@x.com")
        .await;
    assert!(matches!(unknown, Err(AuthError::AccountNotFound)));
}

// ============================================================================
// Password Reset
// ============================================================================

#[tokio::test]
async fn test_reset_token_is_single_use() {
    let (h, mailer) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;

    h.gateway
        .forgot_password(TenantType::Consumer, "a@x.com")
        .await
        .unwrap();
    settle().await;
    let token = mailer.last_reset_token().unwrap();
    assert_eq!(token.len(), 40);

    let reset = |token: String| ResetPasswordInput {
        tenant: TenantType::Consumer,
        token,
        password: "newpass1".to_string(),
    };

    h.gateway.reset_password(reset(token.clone())).await.unwrap();
    let second = h.gateway.reset_password(reset(token)).await;
    assert!(matches!(second, Err(AuthError::InvalidResetToken)));
    assert_eq!(second.unwrap_err().status_code(), 400);

    // Every device was signed out, and only the new password works
    assert_eq!(h.repo.session_count(&signed_up.account.reference()), 0);
    assert!(h.login(TenantType::Consumer, "a@x.com", "Secret123").await.is_err());
    assert!(h.login(TenantType::Consumer, "a@x.com", "newpass1").await.is_ok());

    settle().await;
    assert!(mailer.sent().contains(&SentMail::ResetSuccess {
        to: "a@x.com".to_string()
    }));
}

#[tokio::test]
async fn test_unknown_reset_token_rejected_before_hashing() {
    // A cost argon2 refuses: any hashing attempt would surface as a 500
    let mut config = test_config();
    config.merchant_hash_cost = HashCost {
        memory_kib: 0,
        iterations: 0,
        parallelism: 0,
    };
    let h = harness_with_config(RecordingMailer::default(), config);

    let result = h
        .gateway
        .reset_password(ResetPasswordInput {
            tenant: TenantType::Merchant,
            token: "ab".repeat(20),
            password: "newpass1".to_string(),
        })
        .await;

    assert!(matches!(result, Err(AuthError::InvalidResetToken)));
}

#[tokio::test]
async fn test_reset_url_points_at_client() {
    let (h, mailer) = harness();
    h.signup(TenantType::Merchant, "shop@x.com").await;

    h.gateway
        .forgot_password(TenantType::Merchant, "shop@x.com")
        .await
        .unwrap();
    settle().await;

    let url = mailer
        .sent()
        .into_iter()
        .find_map(|m| match m {
            SentMail::PasswordReset { url, .. } => Some(url),
            _ => None,
        })
        .unwrap();
    assert!(url.starts_with("http://localhost:5173/business/reset-password/"));
}

#[tokio::test]
async fn test_reset_token_expires() {
    let (h, mailer) = harness();
    h.signup(TenantType::Consumer, "a@x.com").await;
    h.gateway
        .forgot_password(TenantType::Consumer, "a@x.com")
        .await
        .unwrap();
    settle().await;
    let token = mailer.last_reset_token().unwrap();

    h.clock.advance(Duration::minutes(61));
    let result = h
        .gateway
        .reset_password(ResetPasswordInput {
            tenant: TenantType::Consumer,
            token,
            password: "newpass1".to_string(),
        })
        .await;
    assert!(matches!(result, Err(AuthError::InvalidResetToken)));
}

#[tokio::test]
async fn test_forgot_password_unknown_email_is_silent() {
    let (h, mailer) = harness();

    h.gateway
        .forgot_password(TenantType::Consumer, "nobody@x.com")
        .await
        .unwrap();
    settle().await;
    assert!(mailer.sent().is_empty());
}

// ============================================================================
// Sessions
// ============================================================================

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_refresh_has_exactly_one_winner() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;
    let token = signed_up.tokens.refresh_token;

    let attempts: Vec<_> = (0..2)
        .map(|_| {
            let gateway = h.gateway.clone();
            let token = token.clone();
            tokio::spawn(async move { gateway.refresh(Some(&token), &meta()).await })
        })
        .collect();

    let mut wins = 0;
    let mut replays = 0;
    for attempt in attempts {
        match attempt.await.unwrap() {
            Ok(_) => wins += 1,
            Err(AuthError::RefreshTokenNotFound) => replays += 1,
            Err(other) => panic!("unexpected error: {other:?}"),
        }
    }
    assert_eq!((wins, replays), (1, 1));
    assert_eq!(h.repo.session_count(&signed_up.account.reference()), 1);
}

#[tokio::test]
async fn test_refresh_keeps_merchant_tenant() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Merchant, "shop@x.com").await;

    let rotated = h
        .gateway
        .refresh(Some(&signed_up.tokens.refresh_token), &meta())
        .await
        .unwrap();
    let row = h.repo.session_for(&rotated.refresh_token).unwrap();
    assert_eq!(row.owner, signed_up.account.reference());

    let claims = h.gateway.authenticate(&rotated.access_token).unwrap();
    assert_eq!(claims.tenant, TenantType::Merchant);
}

#[tokio::test]
async fn test_refresh_rejects_access_token_and_absence() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;

    let with_access = h
        .gateway
        .refresh(Some(&signed_up.tokens.access_token), &meta())
        .await;
    assert!(matches!(with_access, Err(AuthError::InvalidToken)));

    let missing = h.gateway.refresh(None, &meta()).await;
    assert!(matches!(missing, Err(AuthError::MissingRefreshToken)));
}

#[tokio::test]
async fn test_expired_refresh_token_rejected() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;

    h.clock.advance(Duration::days(30) + Duration::seconds(1));
    let result = h
        .gateway
        .refresh(Some(&signed_up.tokens.refresh_token), &meta())
        .await;
    assert!(matches!(result, Err(AuthError::InvalidToken)));

    assert_eq!(h.gateway.cleanup_expired_sessions().await.unwrap(), 1);
}

#[tokio::test]
async fn test_logout_is_idempotent() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;
    let token = signed_up.tokens.refresh_token;

    h.gateway.logout(Some(&token)).await.unwrap();
    h.gateway.logout(Some(&token)).await.unwrap();
    h.gateway.logout(None).await.unwrap();

    let after = h.gateway.refresh(Some(&token), &meta()).await;
    assert!(matches!(after, Err(AuthError::RefreshTokenNotFound)));
}

#[tokio::test]
async fn test_logout_all_revokes_every_device() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;
    let second = h
        .login(TenantType::Consumer, "a@x.com", "Secret123")
        .await
        .unwrap();
    let owner = signed_up.account.reference();

    assert_eq!(h.gateway.logout_all(&owner).await.unwrap(), 2);
    for token in [signed_up.tokens.refresh_token, second.tokens.refresh_token] {
        let result = h.gateway.refresh(Some(&token), &meta()).await;
        assert!(matches!(result, Err(AuthError::RefreshTokenNotFound)));
    }
}

#[tokio::test]
async fn test_delete_account_frees_email_and_revokes_sessions() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;
    let owner = signed_up.account.reference();

    h.gateway.delete_account(&owner).await.unwrap();
    assert_eq!(h.repo.session_count(&owner), 0);
    assert!(matches!(h.gateway.me(&owner).await, Err(AuthError::AccountNotFound)));

    // Address is free again, for either tenant
    h.signup(TenantType::Merchant, "a@x.com").await;
}

// ============================================================================
// HTTP
// ============================================================================

fn app() -> Router {
    auth_router_generic(
        InMemoryAuthRepository::new(),
        RecordingMailer::default(),
        test_config(),
        Arc::new(ManualClock::new(t0())),
    )
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn with_bearer(method: &str, uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .body(Body::empty())
        .unwrap()
}

fn with_cookie(uri: &str, refresh_token: &str) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::COOKIE, format!("refreshToken={refresh_token}"))
        .body(Body::empty())
        .unwrap()
}

fn set_cookie(response: &Response<Body>) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

fn cookie_value(set_cookie: &str) -> String {
    set_cookie
        .split(';')
        .next()
        .and_then(|pair| pair.split_once('='))
        .map(|(_, value)| value.to_string())
        .unwrap_or_default()
}

async fn json_body(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Returns (access token, refresh token)
async fn http_signup(app: &Router, tenant: &str, email: &str) -> (String, String) {
    let response = app
        .clone()
        .oneshot(post_json(
            &format!("/{tenant}/signup"),
            serde_json::json!({ "email": email, "password": "Secret123", "name": "Sam" }),
        ))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let refresh = cookie_value(&set_cookie(&response));
    let body = json_body(response).await;
    (body["accessToken"].as_str().unwrap().to_string(), refresh)
}

#[tokio::test]
async fn test_http_signup_sets_refresh_cookie() {
    let app = app();
    let response = app
        .oneshot(post_json(
            "/business/signup",
            serde_json::json!({
                "email": "shop@x.com",
                "password": "Secret123",
                "businessName": "Bakery"
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("refreshToken="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(cookie.contains("; Secure"));

    let body = json_body(response).await;
    assert_eq!(body["success"], true);
    assert_eq!(body["user"]["type"], "business");
    assert_eq!(body["user"]["name"], "Bakery");
    assert!(body["accessToken"].is_string());
}

#[tokio::test]
async fn test_http_unknown_tenant_uses_error_envelope() {
    let response = app()
        .oneshot(post_json(
            "/admin/login",
            serde_json::json!({ "email": "a@x.com", "password": "Secret123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert!(body["message"].as_str().unwrap().contains("admin"));
}

#[tokio::test]
async fn test_http_bad_login_is_401_envelope() {
    let response = app()
        .oneshot(post_json(
            "/user/login",
            serde_json::json!({ "email": "a@x.com", "password": "Secret123" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Invalid credentials");
}

#[tokio::test]
async fn test_http_incomplete_body_is_400_envelope() {
    let response = app()
        .oneshot(post_json(
            "/user/login",
            serde_json::json!({ "email": "a@x.com" }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Malformed request body");
}

#[tokio::test]
async fn test_http_non_json_body_is_400_envelope() {
    let request = Request::builder()
        .method("POST")
        .uri("/business/signup")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let response = app().oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["message"], "Malformed request body");
}

#[tokio::test]
async fn test_http_me_requires_bearer() {
    let app = app();
    let (access, _) = http_signup(&app, "user", "a@x.com").await;

    let anonymous = app
        .clone()
        .oneshot(Request::builder().uri("/me").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(anonymous).await["success"], false);

    let garbage = app
        .clone()
        .oneshot(with_bearer("GET", "/me", "not-a-token"))
        .await
        .unwrap();
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);

    let response = app
        .oneshot(with_bearer("GET", "/me", &access))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["user"]["email"], "a@x.com");
    assert_eq!(body["user"]["type"], "user");
}

#[tokio::test]
async fn test_http_merchant_guard() {
    let app = app();
    let (consumer, _) = http_signup(&app, "user", "a@x.com").await;
    let (merchant, _) = http_signup(&app, "business", "shop@x.com").await;

    let forbidden = app
        .clone()
        .oneshot(with_bearer("GET", "/business/me", &consumer))
        .await
        .unwrap();
    assert_eq!(forbidden.status(), StatusCode::FORBIDDEN);

    let allowed = app
        .oneshot(with_bearer("GET", "/business/me", &merchant))
        .await
        .unwrap();
    assert_eq!(allowed.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_http_refresh_rotates_cookie() {
    let app = app();
    let (_, refresh) = http_signup(&app, "user", "a@x.com").await;

    let response = app
        .clone()
        .oneshot(with_cookie("/refresh", &refresh))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let rotated = cookie_value(&set_cookie(&response));
    assert!(!rotated.is_empty());
    assert_ne!(rotated, refresh);
    assert!(json_body(response).await["accessToken"].is_string());

    let replay = app
        .clone()
        .oneshot(with_cookie("/refresh", &refresh))
        .await
        .unwrap();
    assert_eq!(replay.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(json_body(replay).await["message"], "Refresh token not found");

    let missing = app
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/refresh")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_http_logout_clears_cookie() {
    let app = app();
    let (_, refresh) = http_signup(&app, "user", "a@x.com").await;

    let response = app
        .clone()
        .oneshot(with_cookie("/logout", &refresh))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let cookie = set_cookie(&response);
    assert!(cookie.starts_with("refreshToken=;"));
    assert!(cookie.contains("Max-Age=0"));

    let after = app
        .oneshot(with_cookie("/refresh", &refresh))
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_http_delete_account() {
    let app = app();
    let (access, refresh) = http_signup(&app, "user", "a@x.com").await;

    let response = app
        .clone()
        .oneshot(with_bearer("DELETE", "/account", &access))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let after = app
        .clone()
        .oneshot(with_cookie("/refresh", &refresh))
        .await
        .unwrap();
    assert_eq!(after.status(), StatusCode::UNAUTHORIZED);

    // Access token still verifies, but the account is gone
    let me = app
        .oneshot(with_bearer("GET", "/me", &access))
        .await
        .unwrap();
    assert_eq!(me.status(), StatusCode::NOT_FOUND);
}

// ============================================================================
// Logging
// ============================================================================

/// Formatted log output of the current thread
#[derive(Clone, Default)]
struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl CapturedLogs {
    /// INFO and above, until the guard drops
    fn install() -> (Self, tracing::subscriber::DefaultGuard) {
        let logs = Self::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_ansi(false)
            .without_time()
            .with_writer(move || writer.clone())
            .finish();
        (logs, tracing::subscriber::set_default(subscriber))
    }

    fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap_or_else(PoisonError::into_inner)).into_owned()
    }
}

#[tokio::test]
async fn test_rotation_and_logout_logged_at_info() {
    let (h, _) = harness();
    let signed_up = h.signup(TenantType::Consumer, "a@x.com").await;

    let (logs, _guard) = CapturedLogs::install();
    let rotated = h
        .gateway
        .refresh(Some(&signed_up.tokens.refresh_token), &meta())
        .await
        .unwrap();
    h.gateway.logout(Some(&rotated.refresh_token)).await.unwrap();

    let output = logs.contents();
    assert!(output.contains("Refresh token rotated"), "{output}");
    assert!(output.contains("Signed out"), "{output}");
}

#[tokio::test]
async fn test_log_mailer_keeps_codes_and_reset_links_out_of_logs() {
    let h = harness_with(LogMailGateway::new());
    let (logs, _guard) = CapturedLogs::install();

    h.signup(TenantType::Consumer, "a@x.com").await;
    h.gateway
        .forgot_password(TenantType::Consumer, "a@x.com")
        .await
        .unwrap();
    settle().await;

    let code = h.stored_code(TenantType::Consumer, "a@x.com").await;
    let output = logs.contents();
    assert!(output.contains("Verification email"), "{output}");
    assert!(output.contains("Password reset email"), "{output}");
    assert!(output.contains("[REDACTED]"), "{output}");
    assert!(!output.contains(&code), "{output}");
    assert!(!output.contains("reset-password/"), "{output}");
}
