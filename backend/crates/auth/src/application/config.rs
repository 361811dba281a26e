//! Application Configuration
//!
//! Built once at startup and shared as `Arc<AuthConfig>`. Business logic
//! never reads the environment itself.

use std::fmt;

use chrono::Duration;
use platform::cookie::CookieConfig;
use platform::password::HashCost;
use thiserror::Error;

use crate::domain::services::VerificationThrottle;
use crate::domain::value_object::tenant::TenantType;

/// Re-export SameSite from platform
pub use platform::cookie::SameSite;

/// HS256 keys shorter than this are refused
pub const MIN_JWT_SECRET_LEN: usize = 32;

const MAX_VERIFICATION_TTL_MINUTES: i64 = 24 * 60;
const MAX_RESEND_COOLDOWN_SECONDS: i64 = 24 * 60 * 60;
const MAX_DAILY_RESEND_LIMIT: u32 = 100;
const MAX_RESET_TOKEN_TTL_MINUTES: i64 = 7 * 24 * 60;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("JWT_SECRET must be at least {} bytes", MIN_JWT_SECRET_LEN)]
    WeakSecret,
}

#[derive(Clone)]
pub struct AuthConfig {
    jwt_secret: Vec<u8>,
    pub access_token_ttl: Duration,
    pub refresh_token_ttl: Duration,
    pub verification_code_ttl: Duration,
    pub verification_resend_cooldown: Duration,
    pub verification_daily_limit: u32,
    pub reset_token_ttl: Duration,
    /// Frontend base URL; reset links point here
    pub client_url: String,
    pub refresh_cookie_name: String,
    pub cookie_secure: bool,
    pub cookie_same_site: SameSite,
    pub consumer_hash_cost: HashCost,
    pub merchant_hash_cost: HashCost,
}

impl AuthConfig {
    /// Defaults around a caller-supplied secret
    pub fn new(jwt_secret: impl Into<Vec<u8>>) -> Result<Self, ConfigError> {
        let jwt_secret = jwt_secret.into();
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::WeakSecret);
        }

        Ok(Self {
            jwt_secret,
            access_token_ttl: Duration::minutes(15),
            refresh_token_ttl: Duration::days(30),
            verification_code_ttl: Duration::minutes(10),
            verification_resend_cooldown: Duration::seconds(60),
            verification_daily_limit: 5,
            reset_token_ttl: Duration::minutes(60),
            client_url: "http://localhost:5173".to_string(),
            refresh_cookie_name: "refreshToken".to_string(),
            cookie_secure: true,
            cookie_same_site: SameSite::Lax,
            consumer_hash_cost: HashCost::STANDARD,
            merchant_hash_cost: HashCost::ELEVATED,
        })
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`AuthConfig::from_env`] over an arbitrary key/value source
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let secret = lookup("JWT_SECRET")
            .filter(|s| !s.is_empty())
            .ok_or(ConfigError::Missing("JWT_SECRET"))?;
        let mut config = Self::new(secret)?;

        if let Some(minutes) =
            parse_positive(&lookup, "VERIFICATION_TTL_MINUTES", MAX_VERIFICATION_TTL_MINUTES)?
        {
            config.verification_code_ttl = Duration::minutes(minutes);
        }
        if let Some(seconds) = parse_positive(
            &lookup,
            "VERIFICATION_RESEND_COOLDOWN_SECONDS",
            MAX_RESEND_COOLDOWN_SECONDS,
        )? {
            config.verification_resend_cooldown = Duration::seconds(seconds);
        }
        if let Some(limit) =
            parse_positive(&lookup, "VERIFICATION_DAILY_RESEND_LIMIT", MAX_DAILY_RESEND_LIMIT)?
        {
            config.verification_daily_limit = limit;
        }
        if let Some(minutes) =
            parse_positive(&lookup, "RESET_TOKEN_TTL_MINUTES", MAX_RESET_TOKEN_TTL_MINUTES)?
        {
            config.reset_token_ttl = Duration::minutes(minutes);
        }
        if let Some(url) = lookup("CLIENT_URL") {
            config.client_url = url.trim_end_matches('/').to_string();
        }

        let production = lookup("APP_ENV").is_some_and(|env| env.eq_ignore_ascii_case("production"));
        config.cookie_secure = production;

        Ok(config)
    }

    pub(crate) fn jwt_secret(&self) -> &[u8] {
        &self.jwt_secret
    }

    pub fn hash_cost(&self, tenant: TenantType) -> HashCost {
        match tenant {
            TenantType::Consumer => self.consumer_hash_cost,
            TenantType::Merchant => self.merchant_hash_cost,
        }
    }

    pub fn throttle(&self) -> VerificationThrottle {
        VerificationThrottle::new(
            self.verification_resend_cooldown,
            self.verification_daily_limit,
            self.verification_code_ttl,
        )
    }

    /// Attributes of the `refreshToken` cookie
    pub fn refresh_cookie(&self) -> CookieConfig {
        CookieConfig {
            name: self.refresh_cookie_name.clone(),
            secure: self.cookie_secure,
            http_only: true,
            same_site: self.cookie_same_site,
            path: "/".to_string(),
            max_age_secs: Some(self.refresh_token_ttl.num_seconds()),
        }
    }

    /// Link mailed for a password reset
    pub fn reset_url(&self, tenant: TenantType, token: &str) -> String {
        format!("{}/{}/reset-password/{}", self.client_url, tenant.code(), token)
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[REDACTED]")
            .field("access_token_ttl", &self.access_token_ttl)
            .field("refresh_token_ttl", &self.refresh_token_ttl)
            .field("verification_code_ttl", &self.verification_code_ttl)
            .field("verification_resend_cooldown", &self.verification_resend_cooldown)
            .field("verification_daily_limit", &self.verification_daily_limit)
            .field("reset_token_ttl", &self.reset_token_ttl)
            .field("client_url", &self.client_url)
            .field("cookie_secure", &self.cookie_secure)
            .finish_non_exhaustive()
    }
}

fn parse_var<F, T>(lookup: &F, var: &'static str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
    T::Err: fmt::Display,
{
    match lookup(var) {
        None => Ok(None),
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e: T::Err| ConfigError::Invalid {
                var,
                reason: e.to_string(),
            }),
    }
}

/// A numeric variable in `1..=max`
fn parse_positive<F, T>(lookup: &F, var: &'static str, max: T) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr + PartialOrd + From<u8> + fmt::Display,
    T::Err: fmt::Display,
{
    match parse_var::<F, T>(lookup, var)? {
        Some(value) if value < T::from(1) || value > max => Err(ConfigError::Invalid {
            var,
            reason: format!("must be between 1 and {max}"),
        }),
        parsed => Ok(parsed),
    }
}
