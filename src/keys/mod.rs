//! Signing key material and pluggable key sources.
//!
//! A [`SigningKeyPair`] is a single owned value parsed from one RSA private
//! key; the signing and verification keys it exposes are two read projections
//! of the same material and can never diverge. [`KeyProvider`] abstracts over
//! where that material comes from (a file on disk, a pair generated in
//! memory, or a test-injected pair).

mod ephemeral;
mod file;

pub use ephemeral::EphemeralKeyProvider;
pub use file::FileKeyProvider;

use std::fmt;

use jsonwebtoken::{DecodingKey, EncodingKey};
use rsa::pkcs1::DecodeRsaPrivateKey;
use rsa::pkcs8::{DecodePrivateKey, EncodePrivateKey, EncodePublicKey, LineEnding};
use rsa::{RsaPrivateKey, RsaPublicKey};

/// Default modulus size for generated keys.
pub const DEFAULT_KEY_BITS: usize = 2048;

/// Errors from key loading, parsing, or generation.
#[derive(Debug, Clone)]
pub enum KeyError {
    /// The key source could not be read (missing file, IO failure).
    Unreadable(String),
    /// The key material could not be parsed as an RSA private key.
    InvalidKey(String),
    /// Key generation failed.
    Generation(String),
}

impl fmt::Display for KeyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unreadable(msg) => write!(f, "key source unreadable: {}", msg),
            Self::InvalidKey(msg) => write!(f, "invalid key material: {}", msg),
            Self::Generation(msg) => write!(f, "key generation failed: {}", msg),
        }
    }
}

impl std::error::Error for KeyError {}

/// Source of the RSA key pair used to sign and verify tokens.
///
/// Callers fetch the pair on every use rather than caching it, so a provider
/// whose backing material changed (e.g. a rotated key file) takes effect on
/// the next call without a restart.
pub trait KeyProvider: Send + Sync {
    /// Returns the key pair currently backing this provider.
    fn key_pair(&self) -> Result<SigningKeyPair, KeyError>;
}

/// An RSA key pair prepared for RS256 signing and verification.
///
/// Constructed from a single private-key PEM; the public half is derived from
/// the private key, never supplied separately.
#[derive(Clone)]
pub struct SigningKeyPair {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    public_pem: String,
}

impl SigningKeyPair {
    /// Parse a PEM-encoded RSA private key (PKCS#8 or PKCS#1) and derive the
    /// matching public key.
    pub fn from_private_pem(pem: &str) -> Result<Self, KeyError> {
        let private = match RsaPrivateKey::from_pkcs8_pem(pem) {
            Ok(key) => key,
            Err(_) => RsaPrivateKey::from_pkcs1_pem(pem)
                .map_err(|e| KeyError::InvalidKey(e.to_string()))?,
        };

        let public = RsaPublicKey::from(&private);
        let public_pem = public
            .to_public_key_pem(LineEnding::LF)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        let private_pkcs8 = private
            .to_pkcs8_pem(LineEnding::LF)
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        let encoding_key = EncodingKey::from_rsa_pem(private_pkcs8.as_bytes())
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;
        let decoding_key = DecodingKey::from_rsa_pem(public_pem.as_bytes())
            .map_err(|e| KeyError::InvalidKey(e.to_string()))?;

        Ok(Self {
            encoding_key,
            decoding_key,
            public_pem,
        })
    }

    /// Generate a fresh key pair with the given modulus size.
    pub fn generate(bits: usize) -> Result<Self, KeyError> {
        let pem = generate_private_key_pem(bits)?;
        Self::from_private_pem(&pem)
    }

    /// The private-key projection, used for signing.
    pub fn signing_key(&self) -> &EncodingKey {
        &self.encoding_key
    }

    /// The public-key projection, used for verification.
    pub fn verification_key(&self) -> &DecodingKey {
        &self.decoding_key
    }

    /// PEM encoding of the public key, for publishing to token consumers.
    pub fn public_key_pem(&self) -> &str {
        &self.public_pem
    }
}

impl fmt::Debug for SigningKeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Key material is deliberately not printable.
        f.debug_struct("SigningKeyPair").finish_non_exhaustive()
    }
}

/// Generate a new RSA private key and return it PEM-encoded (PKCS#8).
pub fn generate_private_key_pem(bits: usize) -> Result<String, KeyError> {
    let mut rng = rand::thread_rng();
    let private =
        RsaPrivateKey::new(&mut rng, bits).map_err(|e| KeyError::Generation(e.to_string()))?;
    let pem = private
        .to_pkcs8_pem(LineEnding::LF)
        .map_err(|e| KeyError::Generation(e.to_string()))?;
    Ok(pem.as_str().to_owned())
}
