//! HTTP Handlers

use std::sync::Arc;

use axum::Json;
use axum::extract::{Extension, Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::IntoResponse;
use platform::cookie::{extract_cookie, set_cookie_header};

use crate::application::gateway::{AuthGateway, AuthStore};
use crate::application::{ResetPasswordInput, SignInInput, SignUpInput, SignedIn};
use crate::domain::mail::MailGateway;
use crate::error::AuthResult;
use crate::presentation::dto::{
    AuthResponse, EmailRequest, LoginRequest, ResetPasswordRequest, SignUpRequest,
    VerifyEmailRequest,
};
use crate::presentation::extract::{ApiJson, ClientContext, Tenant};
use crate::presentation::middleware::AuthIdentity;

type CookieHeader = [(header::HeaderName, header::HeaderValue); 1];

/// Status, refresh cookie and body of a successful sign-in
type SignedInResponse = (StatusCode, CookieHeader, Json<AuthResponse>);

/// Shared state for auth handlers
pub struct AuthAppState<R, M> {
    pub gateway: Arc<AuthGateway<R, M>>,
}

impl<R, M> Clone for AuthAppState<R, M> {
    fn clone(&self) -> Self {
        Self {
            gateway: self.gateway.clone(),
        }
    }
}

impl<R, M> AuthAppState<R, M>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    /// `Set-Cookie` carrying a refresh token
    fn refresh_cookie(&self, refresh_token: &str) -> CookieHeader {
        let cookie = self.gateway.config().refresh_cookie();
        [(
            header::SET_COOKIE,
            set_cookie_header(&cookie.build_set_cookie(refresh_token)),
        )]
    }

    /// `Set-Cookie` that drops the refresh token
    fn clear_refresh_cookie(&self) -> CookieHeader {
        let cookie = self.gateway.config().refresh_cookie();
        [(
            header::SET_COOKIE,
            set_cookie_header(&cookie.build_delete_cookie()),
        )]
    }

    fn presented_refresh_token(&self, headers: &HeaderMap) -> Option<String> {
        extract_cookie(headers, &self.gateway.config().refresh_cookie_name)
    }

    /// Body with user + access token, cookie with the refresh token
    fn signed_in(&self, status: StatusCode, message: &str, signed_in: SignedIn) -> SignedInResponse {
        let cookie = self.refresh_cookie(&signed_in.tokens.refresh_token);
        let body = AuthResponse::message(message)
            .with_user(&signed_in.account)
            .with_access_token(signed_in.tokens.access_token);
        (status, cookie, Json(body))
    }
}

// ============================================================================
// Sign Up / Login
// ============================================================================

/// POST /api/auth/{tenant}/signup
pub async fn signup<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Tenant(tenant): Tenant,
    ClientContext(meta): ClientContext,
    ApiJson(req): ApiJson<SignUpRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let input = SignUpInput {
        tenant,
        email: req.email,
        password: req.password,
        name: req.name,
    };
    let signed_in = state.gateway.signup(input, &meta).await?;

    Ok(state.signed_in(
        StatusCode::CREATED,
        "Account created. Please verify your email.",
        signed_in,
    ))
}

/// POST /api/auth/{tenant}/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Tenant(tenant): Tenant,
    ClientContext(meta): ClientContext,
    ApiJson(req): ApiJson<LoginRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let input = SignInInput {
        tenant,
        email: req.email,
        password: req.password,
    };
    let signed_in = state.gateway.login(input, &meta).await?;

    Ok(state.signed_in(StatusCode::OK, "Login successful", signed_in))
}

// ============================================================================
// Email Verification
// ============================================================================

/// POST /api/auth/{tenant}/verify-email
pub async fn verify_email<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Tenant(tenant): Tenant,
    ClientContext(meta): ClientContext,
    ApiJson(req): ApiJson<VerifyEmailRequest>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let signed_in = state.gateway.verify_email(tenant, &req.code, &meta).await?;

    Ok(state.signed_in(StatusCode::OK, "Email verified successfully", signed_in))
}

/// POST /api/auth/{tenant}/resend-verification
pub async fn resend_verification<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Tenant(tenant): Tenant,
    ApiJson(req): ApiJson<EmailRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    state.gateway.resend_verification(tenant, &req.email).await?;

    Ok(Json(AuthResponse::message("Verification code sent")))
}

// ============================================================================
// Password Reset
// ============================================================================

/// POST /api/auth/{tenant}/forgot-password
pub async fn forgot_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Tenant(tenant): Tenant,
    ApiJson(req): ApiJson<EmailRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    state.gateway.forgot_password(tenant, &req.email).await?;

    Ok(Json(AuthResponse::message(
        "If an account exists for this email, a reset link has been sent",
    )))
}

/// POST /api/auth/{tenant}/reset-password/{token}
pub async fn reset_password<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Tenant(tenant): Tenant,
    Path((_, token)): Path<(String, String)>,
    ApiJson(req): ApiJson<ResetPasswordRequest>,
) -> AuthResult<Json<AuthResponse>>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let input = ResetPasswordInput {
        tenant,
        token,
        password: req.password,
    };
    state.gateway.reset_password(input).await?;

    Ok(Json(AuthResponse::message(
        "Password has been reset. Please log in again.",
    )))
}

// ============================================================================
// Refresh / Logout
// ============================================================================

/// POST /api/auth/refresh
pub async fn refresh<R, M>(
    State(state): State<AuthAppState<R, M>>,
    ClientContext(meta): ClientContext,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let presented = state.presented_refresh_token(&headers);
    let tokens = state.gateway.refresh(presented.as_deref(), &meta).await?;

    let cookie = state.refresh_cookie(&tokens.refresh_token);
    Ok((
        cookie,
        Json(AuthResponse::ok().with_access_token(tokens.access_token)),
    ))
}

/// POST /api/auth/logout
pub async fn logout<R, M>(
    State(state): State<AuthAppState<R, M>>,
    headers: HeaderMap,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let presented = state.presented_refresh_token(&headers);
    state.gateway.logout(presented.as_deref()).await?;

    Ok((
        state.clear_refresh_cookie(),
        Json(AuthResponse::message("Logged out")),
    ))
}

// ============================================================================
// Authenticated
// ============================================================================

/// GET /api/auth/me, GET /api/auth/business/me
pub async fn me<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(identity): Extension<AuthIdentity>,
) -> AuthResult<Json<AuthResponse>>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    let account = state.gateway.me(&identity.account).await?;

    Ok(Json(AuthResponse::ok().with_user(&account)))
}

/// POST /api/auth/logout-all
pub async fn logout_all<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(identity): Extension<AuthIdentity>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    state.gateway.logout_all(&identity.account).await?;

    Ok((
        state.clear_refresh_cookie(),
        Json(AuthResponse::message("Signed out from all devices")),
    ))
}

/// DELETE /api/auth/account
pub async fn delete_account<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Extension(identity): Extension<AuthIdentity>,
) -> AuthResult<impl IntoResponse>
where
    R: AuthStore + Send,
    M: MailGateway + Sync + 'static,
{
    state.gateway.delete_account(&identity.account).await?;

    Ok((
        state.clear_refresh_cookie(),
        Json(AuthResponse::message("Account deleted")),
    ))
}
