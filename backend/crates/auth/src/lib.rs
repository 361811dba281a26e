//! Auth (Authentication) Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, repository traits, mail port
//! - `application/` - Use cases, token service, account store, gateway
//! - `infra/` - PostgreSQL and in-memory storage, JWT codec, mail adapter
//! - `presentation/` - HTTP handlers, DTOs, router, middleware
//!
//! ## Features
//! - Consumer (`user`) and merchant (`business`) accounts sharing one email space
//! - HS256 access tokens (15 min) and refresh tokens (30 days, HTTP-only cookie)
//! - Refresh token rotation; a consumed token is never accepted again
//! - Email verification codes behind a cooldown and a daily cap
//! - Single-use password reset tokens
//!
//! ## Security Model
//! - Passwords hashed with Argon2id, stronger parameters for merchants
//! - Refresh sessions stored by SHA-256 digest only
//! - Login never reveals whether an email is registered

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use application::config::AuthConfig;
pub use application::gateway::{AuthGateway, AuthStore};
pub use error::{AuthError, AuthResult};
pub use infra::{InMemoryAuthRepository, LogMailGateway, PgAuthRepository};
pub use presentation::router::{auth_router, auth_router_generic};

// Re-export kernel error types for unified error handling
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

// Convenience re-exports
pub mod config {
    pub use crate::application::config::*;
}

pub mod models {
    pub use crate::domain::entity::*;
    pub use crate::domain::value_object::*;
    pub use crate::presentation::dto::*;
}

pub mod middleware {
    pub use crate::presentation::middleware::*;
}
