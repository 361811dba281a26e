//! Entity Module

pub mod account;
pub mod refresh_session;
