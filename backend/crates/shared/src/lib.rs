//! Shared Kernel
//!
//! Vocabulary shared by every backend crate:
//! - Typed identifiers over UUID v4
//! - The error classification used to pick HTTP status codes
//! - `AppError`, the response-facing error envelope
//!
//! Nothing in here knows about accounts, tokens or tenants.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod kind;
}
pub mod id;
