//! In-memory user store for tests and ephemeral runs.

use std::sync::Mutex;

use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::types::{Email, ExternalUserId, FederatedProvider, Identity, PhoneNumber, UserId};

use super::{NewUser, PasswordPolicy, StoreError, StoreFuture, UserStore};

struct StoredUser {
    identity: Identity,
    password_salt: String,
    password_digest: String,
}

struct LoginLink {
    user_id: String,
    provider: FederatedProvider,
    external_id: String,
}

#[derive(Default)]
struct Inner {
    users: Vec<StoredUser>,
    logins: Vec<LoginLink>,
}

/// In-memory [`UserStore`] implementation.
///
/// Linear scans over a small vector; intended for tests and ephemeral runs,
/// not production traffic.
pub struct InMemoryUserStore {
    policy: PasswordPolicy,
    inner: Mutex<Inner>,
}

impl InMemoryUserStore {
    /// Create an empty store with the default password policy.
    pub fn new() -> Self {
        Self::with_policy(PasswordPolicy::default())
    }

    /// Create an empty store with an explicit password policy.
    pub fn with_policy(policy: PasswordPolicy) -> Self {
        Self {
            policy,
            inner: Mutex::new(Inner::default()),
        }
    }
}

impl Default for InMemoryUserStore {
    fn default() -> Self {
        Self::new()
    }
}

impl UserStore for InMemoryUserStore {
    fn create_user(&self, new_user: NewUser, password: &str) -> StoreFuture<'_, Identity> {
        let password = password.to_string();

        Box::pin(async move {
            let violations = self.policy.violations(&password);
            if !violations.is_empty() {
                return Err(StoreError::PasswordRejected(violations));
            }

            let mut inner = self.inner.lock().expect("store lock poisoned");
            if inner
                .users
                .iter()
                .any(|u| u.identity.email == new_user.email)
            {
                return Err(StoreError::DuplicateEmail);
            }

            let salt = Uuid::new_v4().simple().to_string();
            let digest = password_digest(&salt, &password);
            let identity = Identity {
                id: UserId::new(Uuid::new_v4().to_string()),
                username: new_user.username,
                email: new_user.email,
                phone_number: new_user.phone_number,
            };

            inner.users.push(StoredUser {
                identity: identity.clone(),
                password_salt: salt,
                password_digest: digest,
            });

            Ok(identity)
        })
    }

    fn find_by_email(&self, email: &Email) -> StoreFuture<'_, Option<Identity>> {
        let email = email.clone();
        Box::pin(async move {
            let inner = self.inner.lock().expect("store lock poisoned");
            Ok(inner
                .users
                .iter()
                .find(|u| u.identity.email == email)
                .map(|u| u.identity.clone()))
        })
    }

    fn find_by_phone(&self, phone: &PhoneNumber) -> StoreFuture<'_, Option<Identity>> {
        let phone = phone.clone();
        Box::pin(async move {
            let inner = self.inner.lock().expect("store lock poisoned");
            Ok(inner
                .users
                .iter()
                .find(|u| u.identity.phone_number.as_ref() == Some(&phone))
                .map(|u| u.identity.clone()))
        })
    }

    fn find_by_login(
        &self,
        provider: FederatedProvider,
        external_id: &ExternalUserId,
    ) -> StoreFuture<'_, Option<Identity>> {
        let external_id = external_id.as_str().to_string();

        Box::pin(async move {
            let inner = self.inner.lock().expect("store lock poisoned");
            let Some(link) = inner
                .logins
                .iter()
                .find(|l| l.provider == provider && l.external_id == external_id)
            else {
                return Ok(None);
            };

            Ok(inner
                .users
                .iter()
                .find(|u| u.identity.id.as_str() == link.user_id)
                .map(|u| u.identity.clone()))
        })
    }

    fn check_password(&self, email: &Email, password: &str) -> StoreFuture<'_, bool> {
        let email = email.clone();
        let password = password.to_string();

        Box::pin(async move {
            let inner = self.inner.lock().expect("store lock poisoned");
            let Some(user) = inner.users.iter().find(|u| u.identity.email == email) else {
                return Ok(false);
            };
            Ok(password_digest(&user.password_salt, &password) == user.password_digest)
        })
    }

    fn link_login(
        &self,
        user: &UserId,
        provider: FederatedProvider,
        external_id: &ExternalUserId,
    ) -> StoreFuture<'_, ()> {
        let user_id = user.as_str().to_string();
        let external_id = external_id.as_str().to_string();

        Box::pin(async move {
            let mut inner = self.inner.lock().expect("store lock poisoned");
            inner.logins.push(LoginLink {
                user_id,
                provider,
                external_id,
            });
            Ok(())
        })
    }
}

fn password_digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Username;

    fn new_user(email: &str, phone: Option<&str>) -> NewUser {
        NewUser {
            username: Username::new("testuser"),
            email: Email::new(email),
            phone_number: phone.map(PhoneNumber::new),
        }
    }

    #[tokio::test]
    async fn test_create_and_lookups() {
        let store = InMemoryUserStore::new();

        let created = store
            .create_user(new_user("a@example.com", Some("111")), "Test@1234")
            .await
            .unwrap();

        assert_eq!(
            store
                .find_by_email(&Email::new("a@example.com"))
                .await
                .unwrap()
                .unwrap()
                .id,
            created.id
        );
        assert_eq!(
            store
                .find_by_phone(&PhoneNumber::new("111"))
                .await
                .unwrap()
                .unwrap()
                .id,
            created.id
        );
        assert!(
            store
                .find_by_email(&Email::new("b@example.com"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_duplicate_and_policy() {
        let store = InMemoryUserStore::new();

        store
            .create_user(new_user("a@example.com", None), "Test@1234")
            .await
            .unwrap();
        assert_eq!(
            store
                .create_user(new_user("a@example.com", None), "Test@1234")
                .await
                .unwrap_err(),
            StoreError::DuplicateEmail
        );

        assert!(matches!(
            store
                .create_user(new_user("b@example.com", None), "short")
                .await
                .unwrap_err(),
            StoreError::PasswordRejected(_)
        ));
    }

    #[tokio::test]
    async fn test_password_checks() {
        let store = InMemoryUserStore::new();
        let email = Email::new("a@example.com");

        store
            .create_user(new_user("a@example.com", None), "Test@1234")
            .await
            .unwrap();

        assert!(store.check_password(&email, "Test@1234").await.unwrap());
        assert!(!store.check_password(&email, "Wrong@1234").await.unwrap());
        assert!(
            !store
                .check_password(&Email::new("missing@example.com"), "Test@1234")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_permissive_policy_skips_password_rules() {
        let store = InMemoryUserStore::with_policy(PasswordPolicy::permissive());

        store
            .create_user(new_user("a@example.com", None), "x")
            .await
            .unwrap();
        assert!(store.check_password(&Email::new("a@example.com"), "x").await.unwrap());
    }

    #[tokio::test]
    async fn test_login_links() {
        let store = InMemoryUserStore::new();
        let created = store
            .create_user(new_user("a@example.com", None), "Test@1234")
            .await
            .unwrap();

        let external = ExternalUserId::new("g-7");
        store
            .link_login(&created.id, FederatedProvider::Google, &external)
            .await
            .unwrap();

        assert_eq!(
            store
                .find_by_login(FederatedProvider::Google, &external)
                .await
                .unwrap()
                .unwrap()
                .id,
            created.id
        );
        assert!(
            store
                .find_by_login(FederatedProvider::Facebook, &external)
                .await
                .unwrap()
                .is_none()
        );
    }
}
