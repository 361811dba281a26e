//! Domain Layer
//!
//! Entities, value objects, repository traits, the mail port and pure
//! domain services.

pub mod entity;
pub mod mail;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use entity::{account::Account, refresh_session::RefreshSession};
pub use mail::{MailError, MailGateway};
pub use repository::{AccountRepository, RefreshSessionRepository};
pub use services::VerificationThrottle;
