//! File-backed key provider.

use std::fs;
use std::path::{Path, PathBuf};

use super::{KeyError, KeyProvider, SigningKeyPair};

/// Key provider that reads a PEM-encoded RSA private key from disk.
///
/// Construction loads and parses the file once so a missing or unparsable key
/// is reported before the service starts taking requests. After that the file
/// is re-read on every [`KeyProvider::key_pair`] call: replacing it on disk
/// rotates the signing key on the next issuance, no restart needed.
#[derive(Debug)]
pub struct FileKeyProvider {
    path: PathBuf,
}

impl FileKeyProvider {
    /// Create a provider for the given private-key file.
    ///
    /// # Errors
    /// Fails if the file cannot be read or does not contain a valid RSA
    /// private key. This is a fatal startup condition for callers.
    pub fn new(path: impl Into<PathBuf>) -> Result<Self, KeyError> {
        let path = path.into();
        Self::load(&path)?;
        Ok(Self { path })
    }

    /// The path this provider reads from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(path: &Path) -> Result<SigningKeyPair, KeyError> {
        let pem = fs::read_to_string(path)
            .map_err(|e| KeyError::Unreadable(format!("{}: {}", path.display(), e)))?;
        SigningKeyPair::from_private_pem(&pem)
    }
}

impl KeyProvider for FileKeyProvider {
    fn key_pair(&self) -> Result<SigningKeyPair, KeyError> {
        Self::load(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keys::{DEFAULT_KEY_BITS, generate_private_key_pem};

    #[test]
    fn test_loads_valid_key_file() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("private.pem");
        fs::write(&key_path, generate_private_key_pem(DEFAULT_KEY_BITS).unwrap()).unwrap();

        let provider = FileKeyProvider::new(&key_path).unwrap();
        let pair = provider.key_pair().unwrap();
        assert!(pair.public_key_pem().starts_with("-----BEGIN PUBLIC KEY-----"));
    }

    #[test]
    fn test_missing_file_fails_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let err = FileKeyProvider::new(dir.path().join("nope.pem")).unwrap_err();
        assert!(matches!(err, KeyError::Unreadable(_)));
    }

    #[test]
    fn test_garbage_file_fails_at_construction() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("private.pem");
        fs::write(&key_path, "definitely not a key").unwrap();

        let err = FileKeyProvider::new(&key_path).unwrap_err();
        assert!(matches!(err, KeyError::InvalidKey(_)));
    }

    #[test]
    fn test_rewriting_file_rotates_key() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("private.pem");
        fs::write(&key_path, generate_private_key_pem(DEFAULT_KEY_BITS).unwrap()).unwrap();

        let provider = FileKeyProvider::new(&key_path).unwrap();
        let before = provider.key_pair().unwrap().public_key_pem().to_owned();

        fs::write(&key_path, generate_private_key_pem(DEFAULT_KEY_BITS).unwrap()).unwrap();
        let after = provider.key_pair().unwrap().public_key_pem().to_owned();

        assert_ne!(before, after);
    }

    #[test]
    fn test_deleted_file_fails_per_call() {
        let dir = tempfile::tempdir().unwrap();
        let key_path = dir.path().join("private.pem");
        fs::write(&key_path, generate_private_key_pem(DEFAULT_KEY_BITS).unwrap()).unwrap();

        let provider = FileKeyProvider::new(&key_path).unwrap();
        fs::remove_file(&key_path).unwrap();

        let err = provider.key_pair().unwrap_err();
        assert!(matches!(err, KeyError::Unreadable(_)));
    }
}
