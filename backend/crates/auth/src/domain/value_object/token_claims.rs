//! JWT claim set shared by access and refresh tokens

use kernel::id::AccountId;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::tenant::{AccountRef, TenantType};
use crate::domain::entity::account::Account;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    Access,
    Refresh,
}

/// `{ id, email, type, kind, jti, iat, exp }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    pub id: AccountId,
    pub email: String,
    #[serde(rename = "type")]
    pub tenant: TenantType,
    pub kind: TokenKind,
    /// Unique per token so two tokens minted in the same second differ
    pub jti: Uuid,
    pub iat: i64,
    pub exp: i64,
}

impl TokenClaims {
    pub fn owner(&self) -> AccountRef {
        AccountRef::new(self.tenant, self.id)
    }

    pub fn subject(&self) -> TokenSubject {
        TokenSubject {
            account: self.owner(),
            email: self.email.clone(),
        }
    }
}

/// Who a token is minted for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenSubject {
    pub account: AccountRef,
    pub email: String,
}

impl From<&Account> for TokenSubject {
    fn from(account: &Account) -> Self {
        Self {
            account: account.reference(),
            email: account.email.as_str().to_string(),
        }
    }
}
