//! Infrastructure Layer
//!
//! Storage implementations, token encoding and the mail adapter.

pub mod jwt;
pub mod mail;
pub mod memory;
pub mod postgres;

pub use jwt::JwtCodec;
pub use mail::LogMailGateway;
pub use memory::InMemoryAuthRepository;
pub use postgres::PgAuthRepository;
