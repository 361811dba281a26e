//! Auth Error Types
//!
//! Auth-specific error variants that integrate with the unified
//! `kernel::error::AppError` envelope.

use axum::response::{IntoResponse, Response};
use kernel::error::{app_error::AppError, kind::ErrorKind};
use platform::password::{PasswordHashError, PasswordPolicyError};
use thiserror::Error;

use crate::infra::jwt::TokenError;

/// Auth-specific result type alias
pub type AuthResult<T> = Result<T, AuthError>;

#[derive(Debug, Error)]
pub enum AuthError {
    // --- input -------------------------------------------------------------
    #[error("{0}")]
    InvalidEmail(&'static str),

    #[error("{0}")]
    InvalidInput(&'static str),

    #[error("Unknown account type: {0}")]
    UnknownTenant(String),

    #[error("{0}")]
    PasswordPolicy(#[from] PasswordPolicyError),

    #[error("Email is already registered")]
    EmailTaken,

    // --- verification / reset ----------------------------------------------
    #[error("Invalid or expired verification code")]
    InvalidVerificationCode,

    #[error("Email is already verified")]
    AlreadyVerified,

    #[error("Please wait {retry_after_secs} seconds before requesting a new code")]
    ResendCooldown { retry_after_secs: i64 },

    #[error("Daily verification email limit reached")]
    DailyResendLimit,

    #[error("Invalid or expired reset token")]
    InvalidResetToken,

    // --- credentials / tokens ----------------------------------------------
    /// Unknown email and wrong password look the same from outside
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Access token missing")]
    MissingAccessToken,

    #[error("Refresh token missing")]
    MissingRefreshToken,

    #[error("Invalid or expired token")]
    InvalidToken,

    /// Already rotated or revoked: a replayed token ends up here
    #[error("Refresh token not found")]
    RefreshTokenNotFound,

    #[error("This operation is only available to business accounts")]
    MerchantOnly,

    #[error("Account not found")]
    AccountNotFound,

    // --- infrastructure ----------------------------------------------------
    #[error("Password hashing failed: {0}")]
    PasswordHash(#[from] PasswordHashError),

    #[error("Token signing failed: {0}")]
    Token(#[from] TokenError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthError {
    pub fn kind(&self) -> ErrorKind {
        use AuthError::*;
        match self {
            InvalidEmail(_)
            | InvalidInput(_)
            | UnknownTenant(_)
            | PasswordPolicy(_)
            | EmailTaken
            | InvalidVerificationCode
            | AlreadyVerified
            | ResendCooldown { .. }
            | DailyResendLimit
            | InvalidResetToken => ErrorKind::BadRequest,
            InvalidCredentials
            | MissingAccessToken
            | MissingRefreshToken
            | InvalidToken
            | RefreshTokenNotFound => ErrorKind::Unauthorized,
            MerchantOnly => ErrorKind::Forbidden,
            AccountNotFound => ErrorKind::NotFound,
            PasswordHash(_) | Token(_) | Database(_) | Internal(_) => {
                ErrorKind::InternalServerError
            }
        }
    }

    pub fn status_code(&self) -> u16 {
        self.kind().status_code()
    }

    /// Convert to the response envelope. Server-side failures never leak
    /// their text; debug builds attach the `Debug` rendering.
    pub fn to_app_error(&self) -> AppError {
        let kind = self.kind();
        let err = if kind.is_server_error() {
            AppError::new(kind, "Internal server error")
        } else {
            AppError::new(kind, self.to_string())
        };

        let err = match self {
            AuthError::ResendCooldown { .. } | AuthError::DailyResendLimit => {
                err.with_action("Check your inbox for the code already sent")
            }
            AuthError::MissingRefreshToken | AuthError::RefreshTokenNotFound => {
                err.with_action("Please log in again")
            }
            _ => err,
        };

        if cfg!(debug_assertions) {
            err.with_detail(format!("{self:?}"))
        } else {
            err
        }
    }

    /// Log once, at a level that matches who is at fault
    fn log(&self) {
        match self {
            AuthError::Database(e) => {
                tracing::error!(error = %e, "Auth database error");
            }
            AuthError::PasswordHash(e) => {
                tracing::error!(error = %e, "Password hashing error");
            }
            AuthError::Token(e) => {
                tracing::error!(error = %e, "Token signing error");
            }
            AuthError::Internal(msg) => {
                tracing::error!(message = %msg, "Auth internal error");
            }
            AuthError::InvalidCredentials => {
                tracing::warn!("Invalid login attempt");
            }
            AuthError::RefreshTokenNotFound => {
                tracing::warn!("Refresh token not found (rotated, revoked or replayed)");
            }
            _ => {
                tracing::debug!(error = %self, "Auth error");
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        self.log();
        self.to_app_error().into_response()
    }
}

impl From<tokio::task::JoinError> for AuthError {
    fn from(err: tokio::task::JoinError) -> Self {
        AuthError::Internal(format!("blocking task failed: {err}"))
    }
}
