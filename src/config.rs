//! Token policy configuration shared by the issuer and the validator.

use serde::{Deserialize, Serialize};

/// Default token lifetime in seconds (1 hour).
pub const DEFAULT_TOKEN_TTL_SECONDS: u64 = 3600;

/// Issuance and validation policy for bearer tokens.
///
/// The same config must back both the [`crate::TokenIssuer`] and the
/// [`crate::TokenValidator`] of a deployment, otherwise every issued token is
/// rejected with an issuer or audience mismatch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenConfig {
    /// Value of the `iss` claim on issued tokens, and the exact string
    /// expected during validation.
    pub issuer: String,
    /// Value of the `aud` claim on issued tokens, and the exact string
    /// expected during validation.
    pub audience: String,
    /// Token lifetime; `exp` is set to issuance time plus this value.
    #[serde(default = "default_ttl_seconds")]
    pub ttl_seconds: u64,
}

fn default_ttl_seconds() -> u64 {
    DEFAULT_TOKEN_TTL_SECONDS
}

impl TokenConfig {
    /// Create a config with the default token lifetime.
    pub fn new(issuer: impl Into<String>, audience: impl Into<String>) -> Self {
        Self {
            issuer: issuer.into(),
            audience: audience.into(),
            ttl_seconds: DEFAULT_TOKEN_TTL_SECONDS,
        }
    }

    /// Override the token lifetime.
    pub fn with_ttl_seconds(mut self, ttl_seconds: u64) -> Self {
        self.ttl_seconds = ttl_seconds;
        self
    }
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self::new("auth-gateway", "auth-gateway-clients")
    }
}
