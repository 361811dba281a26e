//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations with no domain knowledge:
//! - Cryptographic utilities (SHA-256, random tokens, constant-time compare)
//! - Password policy and Argon2id hashing
//! - Cookie and client-metadata helpers
//! - Cooldown / daily-cap throttling decisions
//! - An injectable clock

pub mod client;
pub mod clock;
pub mod cookie;
pub mod crypto;
pub mod password;
pub mod rate_limit;
