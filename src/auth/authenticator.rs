//! The authentication state machine: credential in, signed token out.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, warn};

use crate::store::{NewUser, StoreError, UserStore};
use crate::token::{IssueError, TokenIssuer};
use crate::types::{Email, FederatedProvider, Identity, PhoneNumber, Username};

use super::verifier::{FederatedVerifier, PhoneCodeVerifier};

/// A single authentication attempt's credential.
///
/// Ephemeral by contract: a value of this type lives for the duration of one
/// attempt and is never persisted.
#[derive(Debug, Clone)]
pub enum Credential {
    /// Local password login, looked up by email.
    Password { email: Email, password: String },
    /// Federated login via an external provider's token.
    Federated {
        provider: FederatedProvider,
        token: String,
    },
    /// Phone login with a delivered verification code.
    Phone { number: PhoneNumber, code: String },
}

/// Payload for registering a new identity.
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: Username,
    pub email: Email,
    pub password: String,
    pub phone_number: Option<PhoneNumber>,
}

/// Classified authentication failures.
///
/// Every variant maps to a rejected request, never a crash. How much detail
/// each variant may disclose at the boundary is decided by the orchestrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// Registration: an identity with this email already exists.
    DuplicateIdentity,
    /// Registration: the store refused to create the identity; the message
    /// carries the underlying reasons joined.
    RegistrationFailed(String),
    /// Login: the credential did not verify. Deliberately covers both
    /// "no such user" and "wrong secret" so callers cannot tell them apart.
    InvalidCredentials,
    /// Login: the external credential verified but no local identity is
    /// linked to it.
    IdentityNotFound,
    /// A collaborator failed; not the caller's fault.
    Internal(String),
}

impl fmt::Display for AuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateIdentity => write!(f, "email already exists"),
            Self::RegistrationFailed(reasons) => write!(f, "registration failed: {}", reasons),
            Self::InvalidCredentials => write!(f, "invalid credentials"),
            Self::IdentityNotFound => write!(f, "no identity linked to the verified credential"),
            Self::Internal(msg) => write!(f, "internal error: {}", msg),
        }
    }
}

impl std::error::Error for AuthError {}

impl From<StoreError> for AuthError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateIdentity,
            StoreError::PasswordRejected(reasons) => Self::RegistrationFailed(reasons.join(", ")),
            StoreError::Backend(msg) => Self::Internal(msg),
        }
    }
}

impl From<IssueError> for AuthError {
    fn from(err: IssueError) -> Self {
        Self::Internal(err.to_string())
    }
}

/// Verifies authentication attempts and issues tokens for the survivors.
///
/// Each request runs to exactly one terminal outcome; there is no partial
/// state to clean up if the caller abandons the attempt mid-way.
pub struct CredentialAuthenticator {
    store: Arc<dyn UserStore>,
    federated: Arc<dyn FederatedVerifier>,
    phone: Arc<dyn PhoneCodeVerifier>,
    issuer: TokenIssuer,
}

impl CredentialAuthenticator {
    /// Wire an authenticator from its collaborators.
    pub fn new(
        store: Arc<dyn UserStore>,
        federated: Arc<dyn FederatedVerifier>,
        phone: Arc<dyn PhoneCodeVerifier>,
        issuer: TokenIssuer,
    ) -> Self {
        Self {
            store,
            federated,
            phone,
            issuer,
        }
    }

    /// Register a new identity and return its first token.
    pub async fn register(&self, registration: Registration) -> Result<String, AuthError> {
        if self
            .store
            .find_by_email(&registration.email)
            .await?
            .is_some()
        {
            return Err(AuthError::DuplicateIdentity);
        }

        let new_user = NewUser {
            username: registration.username,
            email: registration.email,
            phone_number: registration.phone_number,
        };
        let identity = self.store.create_user(new_user, &registration.password).await?;

        debug!(user = %identity.id, "registered new identity");
        Ok(self.issuer.issue(&identity)?)
    }

    /// Verify a login credential and return a token on success.
    pub async fn login(&self, credential: Credential) -> Result<String, AuthError> {
        let identity = match credential {
            Credential::Password { email, password } => {
                self.password_login(&email, &password).await?
            }
            Credential::Federated { provider, token } => {
                self.federated_login(provider, &token).await?
            }
            Credential::Phone { number, code } => self.phone_login(&number, &code).await?,
        };

        Ok(self.issuer.issue(&identity)?)
    }

    async fn password_login(&self, email: &Email, password: &str) -> Result<Identity, AuthError> {
        // Unknown email and wrong password collapse into one error so the
        // outcome carries no existence signal.
        let Some(identity) = self.store.find_by_email(email).await? else {
            return Err(AuthError::InvalidCredentials);
        };
        if !self.store.check_password(email, password).await? {
            return Err(AuthError::InvalidCredentials);
        }
        Ok(identity)
    }

    async fn federated_login(
        &self,
        provider: FederatedProvider,
        token: &str,
    ) -> Result<Identity, AuthError> {
        let Some(external_id) = self.federated.verify(provider, token).await else {
            warn!(provider = %provider, "federated token rejected");
            return Err(AuthError::InvalidCredentials);
        };

        let Some(identity) = self.store.find_by_login(provider, &external_id).await? else {
            return Err(AuthError::IdentityNotFound);
        };
        Ok(identity)
    }

    async fn phone_login(&self, number: &PhoneNumber, code: &str) -> Result<Identity, AuthError> {
        if !self.phone.verify(number, code).await {
            return Err(AuthError::InvalidCredentials);
        }

        let Some(identity) = self.store.find_by_phone(number).await? else {
            return Err(AuthError::IdentityNotFound);
        };
        Ok(identity)
    }
}
