//! Tenant Value Objects
//!
//! Consumers and merchants share one auth shape; the tenant tag picks the
//! table, the hashing cost and the permission set.

use derive_more::Display;
use kernel::id::AccountId;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::AuthError;

/// Account kind. Serialized as the wire names `user` / `business`.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TenantType {
    #[display("user")]
    #[serde(rename = "user")]
    Consumer,
    #[display("business")]
    #[serde(rename = "business")]
    Merchant,
}

impl TenantType {
    /// Wire / database code
    #[inline]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Consumer => "user",
            Self::Merchant => "business",
        }
    }

    #[inline]
    pub const fn is_merchant(&self) -> bool {
        matches!(self, Self::Merchant)
    }

    /// Parse a stored code; `None` for anything unknown
    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "user" => Some(Self::Consumer),
            "business" => Some(Self::Merchant),
            _ => None,
        }
    }
}

impl FromStr for TenantType {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_code(s).ok_or_else(|| AuthError::UnknownTenant(s.to_string()))
    }
}

/// Tagged reference to one account: which table, which row
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AccountRef {
    pub tenant: TenantType,
    pub id: AccountId,
}

impl AccountRef {
    pub fn new(tenant: TenantType, id: AccountId) -> Self {
        Self { tenant, id }
    }
}
