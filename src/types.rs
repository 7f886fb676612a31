//! NewType wrappers for strong typing throughout the service.
//!
//! These types prevent accidental mixing of semantically different strings
//! (e.g., passing an email where a phone number is expected).

use serde::{Deserialize, Serialize};
use std::fmt;

/// Macro to generate a NewType wrapper with standard trait implementations.
macro_rules! newtype_string {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Create a new instance.
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Get the inner value as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume and return the inner String.
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl From<String> for $name {
            fn from(s: String) -> Self {
                Self(s)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_string())
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl std::borrow::Borrow<str> for $name {
            fn borrow(&self) -> &str {
                &self.0
            }
        }
    };
}

newtype_string!(
    /// Opaque unique identifier of a local identity.
    ///
    /// Assigned by the user store at registration time and immutable
    /// afterwards. This is the value carried in a token's `sub` claim.
    UserId
);

newtype_string!(
    /// Display name chosen at registration.
    Username
);

newtype_string!(
    /// Email address used as the unique lookup key for password logins.
    ///
    /// Uniqueness is enforced by the user store, not by this type.
    Email
);

newtype_string!(
    /// Phone number in the caller-supplied format.
    ///
    /// Used as the lookup key for phone logins; no normalization is applied.
    PhoneNumber
);

newtype_string!(
    /// Provider-scoped identifier of a federated identity.
    ///
    /// This is the id the external provider (e.g. Facebook, Google) uses for
    /// the user, resolved by a [`crate::FederatedVerifier`]. It is only
    /// meaningful together with the provider that produced it.
    ExternalUserId
);

/// External identity providers supported by federated login.
///
/// Dispatch over providers is by this tag; each variant shares the same
/// verification and lookup contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FederatedProvider {
    Facebook,
    Google,
}

impl FederatedProvider {
    /// Stable lowercase name used as the storage key for login links.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Facebook => "facebook",
            Self::Google => "google",
        }
    }
}

impl fmt::Display for FederatedProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// An authenticated user identity as produced by the user store.
///
/// The id is immutable once assigned. Credentials are never part of an
/// identity; they exist only for the duration of a single attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: UserId,
    pub username: Username,
    pub email: Email,
    pub phone_number: Option<PhoneNumber>,
}
