//! Credential verification and token issuance for authentication attempts.
//!
//! [`CredentialAuthenticator`] is the single component that turns a
//! credential into a signed token. External verification (federated provider
//! tokens, phone codes) and user lookup are injected capabilities, so the
//! dispatch logic never changes when a collaborator is swapped or stubbed.

mod authenticator;
mod verifier;

pub use authenticator::{AuthError, Credential, CredentialAuthenticator, Registration};
pub use verifier::{
    DisabledCodeVerifier, DisabledFederatedVerifier, FederatedVerifier, PhoneCodeVerifier,
    StaticCodeVerifier, StaticFederatedVerifier, VerifyFuture,
};
