//! Token validation against the current verification key.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, Validation, decode};
use tracing::debug;

use crate::config::TokenConfig;
use crate::keys::KeyProvider;

use super::Claims;

/// Validation failures, one per step of the validation chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// The token structure could not be parsed at all.
    MalformedToken,
    /// The signature does not verify against the current public key.
    InvalidSignature,
    /// The `iss` claim does not match the expected issuer.
    InvalidIssuer,
    /// The `aud` claim does not match the expected audience.
    InvalidAudience,
    /// The token is at or past its expiry. There is no grace window.
    Expired,
    /// The key provider could not supply a verification key. This is an
    /// internal condition, not a statement about the token.
    KeyUnavailable(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedToken => write!(f, "malformed token"),
            Self::InvalidSignature => write!(f, "invalid token signature"),
            Self::InvalidIssuer => write!(f, "token issuer mismatch"),
            Self::InvalidAudience => write!(f, "token audience mismatch"),
            Self::Expired => write!(f, "token expired"),
            Self::KeyUnavailable(msg) => write!(f, "verification key unavailable: {}", msg),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Verifies presented tokens: structure, signature, issuer, audience, expiry.
///
/// Validation is a short-circuiting chain in that order; each step maps to
/// its own [`ValidationError`]. It mutates nothing and is safe to call
/// concurrently and repeatedly on the same token.
pub struct TokenValidator {
    keys: Arc<dyn KeyProvider>,
    config: TokenConfig,
}

impl TokenValidator {
    /// Create a validator over the given key source and token policy.
    pub fn new(keys: Arc<dyn KeyProvider>, config: TokenConfig) -> Self {
        Self { keys, config }
    }

    /// Validate a token string and return its claims.
    ///
    /// The verification key is fetched from the provider on every call, so a
    /// rotated key applies immediately (and tokens signed with the previous
    /// key stop validating).
    pub fn validate(&self, token: &str) -> Result<Claims, ValidationError> {
        let pair = self
            .keys
            .key_pair()
            .map_err(|e| ValidationError::KeyUnavailable(e.to_string()))?;

        // The decode step checks structure and signature only. Issuer,
        // audience and expiry are checked explicitly below so each failure
        // surfaces as its own error, in chain order.
        let mut validation = Validation::new(Algorithm::RS256);
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.required_spec_claims = HashSet::new();

        let data = decode::<Claims>(token, pair.verification_key(), &validation).map_err(|e| {
            match e.kind() {
                ErrorKind::InvalidSignature | ErrorKind::InvalidAlgorithm => {
                    ValidationError::InvalidSignature
                }
                _ => ValidationError::MalformedToken,
            }
        })?;
        let claims = data.claims;

        if claims.iss != self.config.issuer {
            return Err(ValidationError::InvalidIssuer);
        }
        if claims.aud != self.config.audience {
            return Err(ValidationError::InvalidAudience);
        }
        if claims.exp <= Utc::now().timestamp() {
            return Err(ValidationError::Expired);
        }

        debug!(sub = %claims.sub, jti = %claims.jti, "token validated");
        Ok(claims)
    }
}
