//! HS256 JWT encoding and decoding.
//!
//! Expiry is deliberately not checked here: the token service compares
//! `exp` against its injected clock.

use std::fmt;

use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

use crate::domain::value_object::token_claims::TokenClaims;

#[derive(Debug, Error)]
pub enum TokenError {
    #[error("could not encode token: {0}")]
    Encode(#[source] jsonwebtoken::errors::Error),

    #[error("could not decode token: {0}")]
    Decode(#[source] jsonwebtoken::errors::Error),
}

pub struct JwtCodec {
    header: Header,
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
}

impl JwtCodec {
    pub fn hs256(secret: &[u8]) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;

        Self {
            header: Header::new(Algorithm::HS256),
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            validation,
        }
    }

    pub fn encode(&self, claims: &TokenClaims) -> Result<String, TokenError> {
        encode(&self.header, claims, &self.encoding).map_err(TokenError::Encode)
    }

    /// Signature and shape only
    pub fn decode(&self, token: &str) -> Result<TokenClaims, TokenError> {
        decode::<TokenClaims>(token, &self.decoding, &self.validation)
            .map(|data| data.claims)
            .map_err(TokenError::Decode)
    }
}

impl fmt::Debug for JwtCodec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtCodec")
            .field("algorithm", &self.header.alg)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_object::tenant::TenantType;
    use crate::domain::value_object::token_claims::TokenKind;
    use kernel::id::AccountId;
    use uuid::Uuid;

    fn claims(exp: i64) -> TokenClaims {
        TokenClaims {
            id: AccountId::new(),
            email: "a@x.com".to_string(),
            tenant: TenantType::Consumer,
            kind: TokenKind::Access,
            jti: Uuid::new_v4(),
            iat: 1_000,
            exp,
        }
    }

    #[test]
    fn test_encode_decode() {
        let codec = JwtCodec::hs256(b"test-secret-key-for-testing-only");
        let original = claims(2_000);
        let token = codec.encode(&original).unwrap();
        assert_eq!(codec.decode(&token).unwrap(), original);
    }

    #[test]
    fn test_expired_exp_still_decodes() {
        // exp in 1970: the clock check belongs to the caller
        let codec = JwtCodec::hs256(b"test-secret-key-for-testing-only");
        let token = codec.encode(&claims(10)).unwrap();
        assert!(codec.decode(&token).is_ok());
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let token = JwtCodec::hs256(b"test-secret-key-for-testing-only")
            .encode(&claims(2_000))
            .unwrap();
        let other = JwtCodec::hs256(b"another-secret-key-for-testing!!");
        assert!(matches!(other.decode(&token), Err(TokenError::Decode(_))));
    }

    #[test]
    fn test_garbage_rejected() {
        let codec = JwtCodec::hs256(b"test-secret-key-for-testing-only");
        assert!(codec.decode("not.a.jwt").is_err());
        assert!(codec.decode("").is_err());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = JwtCodec::hs256(b"test-secret-key-for-testing-only");
        let forged = codec.encode(&claims(9_999_999_999)).unwrap();
        let forged_payload = forged.split('.').nth(1).unwrap();
        let token = codec.encode(&claims(2_000)).unwrap();
        let mut parts: Vec<&str> = token.split('.').collect();
        parts[1] = forged_payload;
        assert!(codec.decode(&parts.join(".")).is_err());
    }
}
