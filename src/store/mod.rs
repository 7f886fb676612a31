//! User storage capability consumed by the authenticator.
//!
//! The authentication core never owns user persistence; it talks to a
//! [`UserStore`] trait object. Two implementations ship with the crate:
//! a SurrealDB-backed store used by the service binary and an in-memory
//! store for tests and ephemeral runs.

mod memory;
mod policy;
mod surreal;

pub use memory::InMemoryUserStore;
pub use policy::PasswordPolicy;
pub use surreal::{DatabaseConfig, Db, SurrealUserStore, create_connection, ensure_schema};

use std::fmt;
use std::future::Future;
use std::pin::Pin;

use crate::types::{
    Email, ExternalUserId, FederatedProvider, Identity, PhoneNumber, UserId, Username,
};

/// Boxed future returned by store operations, keeping the trait object-safe.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + Send + 'a>>;

/// Payload for creating a new user.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: Username,
    pub email: Email,
    pub phone_number: Option<PhoneNumber>,
}

/// Errors surfaced by user store operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A user with the given email already exists.
    DuplicateEmail,
    /// The password was rejected by the store's policy; one message per
    /// violated rule.
    PasswordRejected(Vec<String>),
    /// The storage backend failed.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::DuplicateEmail => write!(f, "email already exists"),
            Self::PasswordRejected(reasons) => {
                write!(f, "password rejected: {}", reasons.join(", "))
            }
            Self::Backend(msg) => write!(f, "storage backend error: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

/// User lookup and credential-check capability.
///
/// Implementations own consistency (email uniqueness, password policy) and
/// whatever verifier material they keep for passwords; callers only see
/// [`Identity`] values and yes/no password answers.
pub trait UserStore: Send + Sync {
    /// Create a user, enforcing email uniqueness and the password policy.
    fn create_user(&self, new_user: NewUser, password: &str) -> StoreFuture<'_, Identity>;

    /// Look up an identity by email.
    fn find_by_email(&self, email: &Email) -> StoreFuture<'_, Option<Identity>>;

    /// Look up an identity by phone number.
    fn find_by_phone(&self, phone: &PhoneNumber) -> StoreFuture<'_, Option<Identity>>;

    /// Look up the identity linked to a federated (provider, external id)
    /// pair, if any.
    fn find_by_login(
        &self,
        provider: FederatedProvider,
        external_id: &ExternalUserId,
    ) -> StoreFuture<'_, Option<Identity>>;

    /// Check a password attempt for the user with the given email.
    ///
    /// Returns `false` both for a wrong password and for an unknown email;
    /// callers must not be able to distinguish the two from this method.
    fn check_password(&self, email: &Email, password: &str) -> StoreFuture<'_, bool>;

    /// Link a federated (provider, external id) pair to an existing user.
    fn link_login(
        &self,
        user: &UserId,
        provider: FederatedProvider,
        external_id: &ExternalUserId,
    ) -> StoreFuture<'_, ()>;
}
