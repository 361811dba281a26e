//! Value Object Module

pub mod email;
pub mod reset_token;
pub mod tenant;
pub mod token_claims;
pub mod verification_code;
