//! Token issuance for authenticated identities.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use jsonwebtoken::{Algorithm, Header, encode};
use tracing::debug;
use uuid::Uuid;

use crate::config::TokenConfig;
use crate::keys::{KeyError, KeyProvider};
use crate::types::Identity;

use super::Claims;

/// Errors from token issuance.
#[derive(Debug)]
pub enum IssueError {
    /// The key provider could not supply a signing key.
    Key(KeyError),
    /// The claim set could not be signed.
    Signing(String),
}

impl fmt::Display for IssueError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(err) => write!(f, "signing key unavailable: {}", err),
            Self::Signing(msg) => write!(f, "token signing failed: {}", msg),
        }
    }
}

impl std::error::Error for IssueError {}

/// Builds and signs bearer tokens for authenticated identities.
///
/// Issuance has no side effects: nothing is stored, and validity of the
/// produced token is determined entirely by its signature and embedded
/// timestamps.
pub struct TokenIssuer {
    keys: Arc<dyn KeyProvider>,
    config: TokenConfig,
}

impl TokenIssuer {
    /// Create an issuer over the given key source and token policy.
    pub fn new(keys: Arc<dyn KeyProvider>, config: TokenConfig) -> Self {
        Self { keys, config }
    }

    /// The token policy this issuer stamps into claims.
    pub fn config(&self) -> &TokenConfig {
        &self.config
    }

    /// Issue a signed token asserting the given identity.
    ///
    /// The key pair is fetched from the provider on every call rather than
    /// cached, so a rotated key is used from the next issuance onward.
    pub fn issue(&self, identity: &Identity) -> Result<String, IssueError> {
        let pair = self.keys.key_pair().map_err(IssueError::Key)?;

        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: identity.id.as_str().to_owned(),
            jti: Uuid::new_v4().to_string(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
            iat: now,
            exp: now + self.config.ttl_seconds as i64,
        };

        let token = encode(&Header::new(Algorithm::RS256), &claims, pair.signing_key())
            .map_err(|e| IssueError::Signing(e.to_string()))?;

        debug!(sub = %claims.sub, jti = %claims.jti, "issued token");
        Ok(token)
    }
}
