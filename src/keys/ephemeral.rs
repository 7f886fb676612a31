//! In-memory key provider for tests and ephemeral deployments.

use super::{DEFAULT_KEY_BITS, KeyError, KeyProvider, SigningKeyPair};

/// Key provider backed by a pair generated at construction time.
///
/// Nothing is persisted: every instance holds its own fresh pair, so tokens
/// signed by one instance never validate against another, and all tokens are
/// invalidated when the process exits.
pub struct EphemeralKeyProvider {
    pair: SigningKeyPair,
}

impl EphemeralKeyProvider {
    /// Generate a fresh pair with the default modulus size.
    pub fn new() -> Result<Self, KeyError> {
        Self::with_bits(DEFAULT_KEY_BITS)
    }

    /// Generate a fresh pair with an explicit modulus size.
    pub fn with_bits(bits: usize) -> Result<Self, KeyError> {
        Ok(Self {
            pair: SigningKeyPair::generate(bits)?,
        })
    }

    /// Wrap an existing pair (test injection).
    pub fn from_pair(pair: SigningKeyPair) -> Self {
        Self { pair }
    }
}

impl KeyProvider for EphemeralKeyProvider {
    fn key_pair(&self) -> Result<SigningKeyPair, KeyError> {
        Ok(self.pair.clone())
    }
}
