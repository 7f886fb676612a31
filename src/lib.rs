// Core modules
mod config;
mod keys;
mod store;
mod token;
mod types;

// Authentication flow
mod auth;
mod orchestrator;
pub mod server;


// Re-export key types and functions
pub use auth::{
    AuthError, Credential, CredentialAuthenticator, DisabledCodeVerifier,
    DisabledFederatedVerifier, FederatedVerifier, PhoneCodeVerifier, Registration,
    StaticCodeVerifier, StaticFederatedVerifier, VerifyFuture,
};
pub use config::{DEFAULT_TOKEN_TTL_SECONDS, TokenConfig};
pub use keys::{
    DEFAULT_KEY_BITS, EphemeralKeyProvider, FileKeyProvider, KeyError, KeyProvider,
    SigningKeyPair, generate_private_key_pem,
};
pub use orchestrator::{AuthOrchestrator, AuthRejection, AuthRequest, AuthResponse};
pub use store::{
    DatabaseConfig, Db, InMemoryUserStore, NewUser, PasswordPolicy, StoreError, StoreFuture,
    SurrealUserStore, UserStore, create_connection, ensure_schema,
};
pub use token::{Claims, IssueError, TokenIssuer, TokenValidator, ValidationError};
pub use types::{
    Email, ExternalUserId, FederatedProvider, Identity, PhoneNumber, UserId, Username,
};

use std::sync::Arc;

/// Convenience function to assemble a fully wired authentication service.
///
/// This builds the issuer and validator over the same key source and token
/// policy, wires the authenticator to the given collaborators, and returns
/// the ready-to-serve router.
pub fn create_service(
    keys: Arc<dyn KeyProvider>,
    store: Arc<dyn UserStore>,
    federated: Arc<dyn FederatedVerifier>,
    phone: Arc<dyn PhoneCodeVerifier>,
    config: TokenConfig,
) -> axum::Router {
    let issuer = TokenIssuer::new(keys.clone(), config.clone());
    let validator = TokenValidator::new(keys.clone(), config);
    let authenticator = CredentialAuthenticator::new(store, federated, phone, issuer);
    let orchestrator = AuthOrchestrator::new(authenticator, validator);
    server::create_router(orchestrator, keys)
}
