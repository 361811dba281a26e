//! Client identification utilities
//!
//! Pulls device metadata (IP, User-Agent) out of request headers. Used only
//! for bookkeeping on stored sessions, never for authorization.

use axum::http::{HeaderMap, header};
use std::net::IpAddr;

/// Longest User-Agent we keep; anything beyond is truncated
const USER_AGENT_MAX_LEN: usize = 512;

/// Device metadata recorded alongside a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientMeta {
    pub ip: Option<IpAddr>,
    pub user_agent: Option<String>,
}

impl ClientMeta {
    /// Collect metadata from headers plus the socket address, if known
    pub fn from_headers(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Self {
        let user_agent = headers
            .get(header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|ua| ua.chars().take(USER_AGENT_MAX_LEN).collect());

        Self {
            ip: extract_client_ip(headers, direct_ip),
            user_agent,
        }
    }

    /// IP as string (for database storage)
    pub fn ip_string(&self) -> Option<String> {
        self.ip.map(|ip| ip.to_string())
    }
}

/// Extract client IP address from headers
///
/// The first entry of `X-Forwarded-For` wins; otherwise the direct
/// connection address is used.
pub fn extract_client_ip(headers: &HeaderMap, direct_ip: Option<IpAddr>) -> Option<IpAddr> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|xff| xff.split(',').next())
        .and_then(|first| first.trim().parse::<IpAddr>().ok())
        .or(direct_ip)
}
