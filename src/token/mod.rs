//! Bearer token issuance and validation.
//!
//! Tokens are compact JWS strings (three base64url segments) signed with
//! RS256. The [`TokenIssuer`] and [`TokenValidator`] share a
//! [`crate::config::TokenConfig`] and a [`crate::keys::KeyProvider`]; both
//! fetch the key pair per call so key rotation applies without a restart.

mod issuer;
mod validator;

pub use issuer::{IssueError, TokenIssuer};
pub use validator::{TokenValidator, ValidationError};

use serde::{Deserialize, Serialize};

/// Claims embedded in every issued token.
///
/// All fields are required; a token missing any of them does not parse.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: the identity's opaque unique id.
    pub sub: String,
    /// Unique token id (uuid v4), distinct per issuance.
    pub jti: String,
    /// Issuer.
    pub iss: String,
    /// Audience.
    pub aud: String,
    /// Issued-at, unix seconds.
    pub iat: i64,
    /// Expiry, unix seconds. Tokens are invalid at and after this instant.
    pub exp: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_claims_serde_round_trip() {
        let claims = Claims {
            sub: "user-1".to_string(),
            jti: "c56a4180-65aa-42ec-a945-5fd21dec0538".to_string(),
            iss: "auth-gateway".to_string(),
            aud: "auth-gateway-clients".to_string(),
            iat: 1_700_000_000,
            exp: 1_700_003_600,
        };

        let json = serde_json::to_string(&claims).unwrap();
        let parsed: Claims = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, claims);
    }

    #[test]
    fn test_claims_require_all_fields() {
        let missing_exp = r#"{
            "sub": "user-1",
            "jti": "id",
            "iss": "auth-gateway",
            "aud": "auth-gateway-clients",
            "iat": 1700000000
        }"#;
        assert!(serde_json::from_str::<Claims>(missing_exp).is_err());
    }
}
