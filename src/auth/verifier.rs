//! External verification capabilities for federated and phone logins.
//!
//! The real Facebook/Google/SMS integrations live outside this crate; what
//! lives here is the contract the authenticator dispatches through, plus a
//! fail-closed default and a fixed-table variant for tests and demos.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use tracing::debug;

use crate::types::{ExternalUserId, FederatedProvider, PhoneNumber};

/// Boxed future returned by verifier operations.
pub type VerifyFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Resolves a federated provider token to the provider-scoped external id.
pub trait FederatedVerifier: Send + Sync {
    /// Returns the external user id when the token verifies, `None` when the
    /// provider rejects it.
    fn verify(
        &self,
        provider: FederatedProvider,
        token: &str,
    ) -> VerifyFuture<'_, Option<ExternalUserId>>;
}

/// Checks a phone verification code.
pub trait PhoneCodeVerifier: Send + Sync {
    /// Returns `true` when the code matches the one delivered to the number.
    fn verify(&self, number: &PhoneNumber, code: &str) -> VerifyFuture<'_, bool>;
}

/// Federated verifier that rejects every token.
///
/// Default wiring when no provider integration is configured, so federated
/// login fails closed instead of accepting anything.
pub struct DisabledFederatedVerifier;

impl FederatedVerifier for DisabledFederatedVerifier {
    fn verify(
        &self,
        provider: FederatedProvider,
        _token: &str,
    ) -> VerifyFuture<'_, Option<ExternalUserId>> {
        debug!(provider = %provider, "federated login attempted with no verifier configured");
        Box::pin(async { None })
    }
}

/// Phone code verifier that rejects every code.
pub struct DisabledCodeVerifier;

impl PhoneCodeVerifier for DisabledCodeVerifier {
    fn verify(&self, number: &PhoneNumber, _code: &str) -> VerifyFuture<'_, bool> {
        debug!(number = %number, "phone login attempted with no verifier configured");
        Box::pin(async { false })
    }
}

/// Federated verifier backed by a fixed token table.
#[derive(Default)]
pub struct StaticFederatedVerifier {
    tokens: HashMap<(FederatedProvider, String), ExternalUserId>,
}

impl StaticFederatedVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a token the verifier will accept for the given provider.
    pub fn accept(
        mut self,
        provider: FederatedProvider,
        token: impl Into<String>,
        external_id: impl Into<ExternalUserId>,
    ) -> Self {
        self.tokens.insert((provider, token.into()), external_id.into());
        self
    }
}

impl FederatedVerifier for StaticFederatedVerifier {
    fn verify(
        &self,
        provider: FederatedProvider,
        token: &str,
    ) -> VerifyFuture<'_, Option<ExternalUserId>> {
        let resolved = self.tokens.get(&(provider, token.to_string())).cloned();
        Box::pin(async move { resolved })
    }
}

/// Phone code verifier backed by a fixed number → code table.
#[derive(Default)]
pub struct StaticCodeVerifier {
    codes: HashMap<String, String>,
}

impl StaticCodeVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the code the verifier will accept for the given number.
    pub fn accept(mut self, number: impl Into<String>, code: impl Into<String>) -> Self {
        self.codes.insert(number.into(), code.into());
        self
    }
}

impl PhoneCodeVerifier for StaticCodeVerifier {
    fn verify(&self, number: &PhoneNumber, code: &str) -> VerifyFuture<'_, bool> {
        let ok = self.codes.get(number.as_str()).is_some_and(|c| c == code);
        Box::pin(async move { ok })
    }
}
