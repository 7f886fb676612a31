//! SurrealDB-backed user store.
//!
//! This is the store implementation used by the service binary. It runs
//! against any SurrealDB engine the `any` connector supports; the default
//! configuration uses the embedded in-memory engine so the binary works with
//! no external services.

use std::env;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use surrealdb::Surreal;
use surrealdb::engine::any::Any;
use surrealdb::opt::auth::Root;
use tracing::debug;
use uuid::Uuid;

use crate::types::{Email, ExternalUserId, FederatedProvider, Identity, PhoneNumber, UserId};

use super::{NewUser, PasswordPolicy, StoreError, StoreFuture, UserStore};

pub type Db = Surreal<Any>;

/// Connection settings for the user database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub namespace: String,
    pub database: String,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: env::var("SURREALDB_URL").unwrap_or_else(|_| "memory".to_string()),
            namespace: env::var("SURREALDB_NAMESPACE").unwrap_or_else(|_| "auth".to_string()),
            database: env::var("SURREALDB_DATABASE").unwrap_or_else(|_| "gateway".to_string()),
            username: env::var("SURREALDB_USERNAME").ok(),
            password: env::var("SURREALDB_PASSWORD").ok(),
        }
    }
}

pub async fn create_connection(config: DatabaseConfig) -> Result<Db> {
    let db = surrealdb::engine::any::connect(config.url).await?;

    // Sign in if credentials are provided
    if let (Some(username), Some(password)) = (config.username, config.password) {
        db.signin(Root {
            username: &username,
            password: &password,
        })
        .await?;
    }

    // Use the specified namespace and database
    db.use_ns(config.namespace).use_db(config.database).await?;

    Ok(db)
}

pub async fn ensure_schema(db: &Db) -> Result<()> {
    let schema_queries = vec![
        // User table. `user_id` is the opaque identity id handed out to the
        // rest of the system; the SurrealDB record id stays internal.
        "DEFINE TABLE user SCHEMAFULL;
         DEFINE FIELD user_id ON TABLE user TYPE string;
         DEFINE FIELD username ON TABLE user TYPE string;
         DEFINE FIELD email ON TABLE user TYPE string;
         DEFINE FIELD phone_number ON TABLE user TYPE option<string>;
         DEFINE FIELD password_salt ON TABLE user TYPE string;
         DEFINE FIELD password_digest ON TABLE user TYPE string;
         DEFINE FIELD created_at ON TABLE user VALUE time::now();
         DEFINE FIELD updated_at ON TABLE user VALUE time::now();",
        // Federated login links
        "DEFINE TABLE external_login SCHEMAFULL;
         DEFINE FIELD user_id ON TABLE external_login TYPE string;
         DEFINE FIELD provider ON TABLE external_login TYPE string;
         DEFINE FIELD external_id ON TABLE external_login TYPE string;
         DEFINE FIELD created_at ON TABLE external_login VALUE time::now();",
        // Indexes
        "DEFINE INDEX user_user_id ON TABLE user COLUMNS user_id UNIQUE;
         DEFINE INDEX user_email ON TABLE user COLUMNS email UNIQUE;
         DEFINE INDEX external_login_key ON TABLE external_login COLUMNS provider, external_id UNIQUE;",
    ];

    for query in schema_queries {
        db.query(query).await?;
    }

    Ok(())
}

/// Persisted user row.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct UserRecord {
    user_id: String,
    username: String,
    email: String,
    phone_number: Option<String>,
    password_salt: String,
    password_digest: String,
}

impl UserRecord {
    fn into_identity(self) -> Identity {
        Identity {
            id: UserId::new(self.user_id),
            username: self.username.into(),
            email: self.email.into(),
            phone_number: self.phone_number.map(PhoneNumber::new),
        }
    }
}

/// Persisted federated login link.
#[derive(Debug, Clone, Deserialize)]
struct LoginRecord {
    user_id: String,
}

/// User store over a SurrealDB connection.
pub struct SurrealUserStore {
    db: Db,
    policy: PasswordPolicy,
}

impl SurrealUserStore {
    /// Create a store with the default password policy.
    pub fn new(db: Db) -> Self {
        Self::with_policy(db, PasswordPolicy::default())
    }

    /// Create a store with an explicit password policy.
    pub fn with_policy(db: Db, policy: PasswordPolicy) -> Self {
        Self { db, policy }
    }

    async fn user_by_email(&self, email: &str) -> Result<Option<UserRecord>, StoreError> {
        let email = email.to_string();

        let mut res = self
            .db
            .query("SELECT * FROM user WHERE email = $email LIMIT 1")
            .bind(("email", email))
            .await
            .map_err(backend)?;

        let users: Vec<UserRecord> = res.take(0).map_err(backend)?;
        Ok(users.into_iter().next())
    }

    async fn user_by_user_id(&self, user_id: &str) -> Result<Option<UserRecord>, StoreError> {
        let user_id = user_id.to_string();

        let mut res = self
            .db
            .query("SELECT * FROM user WHERE user_id = $user_id LIMIT 1")
            .bind(("user_id", user_id))
            .await
            .map_err(backend)?;

        let users: Vec<UserRecord> = res.take(0).map_err(backend)?;
        Ok(users.into_iter().next())
    }
}

impl UserStore for SurrealUserStore {
    fn create_user(&self, new_user: NewUser, password: &str) -> StoreFuture<'_, Identity> {
        let password = password.to_string();

        Box::pin(async move {
            let violations = self.policy.violations(&password);
            if !violations.is_empty() {
                return Err(StoreError::PasswordRejected(violations));
            }

            if self.user_by_email(new_user.email.as_str()).await?.is_some() {
                return Err(StoreError::DuplicateEmail);
            }

            let user_id = Uuid::new_v4().to_string();
            let salt = Uuid::new_v4().simple().to_string();
            let digest = password_digest(&salt, &password);

            let query = r#"
                CREATE user CONTENT {
                    user_id: $user_id,
                    username: $username,
                    email: $email,
                    phone_number: $phone_number,
                    password_salt: $salt,
                    password_digest: $digest
                }
            "#;

            let mut res = self
                .db
                .query(query)
                .bind(("user_id", user_id.clone()))
                .bind(("username", new_user.username.as_str().to_string()))
                .bind(("email", new_user.email.as_str().to_string()))
                .bind((
                    "phone_number",
                    new_user.phone_number.as_ref().map(|p| p.as_str().to_string()),
                ))
                .bind(("salt", salt))
                .bind(("digest", digest))
                .await
                .map_err(backend)?;

            let created: Vec<UserRecord> = res.take(0).map_err(backend)?;
            let record = created
                .into_iter()
                .next()
                .ok_or_else(|| StoreError::Backend("user row was not created".to_string()))?;

            debug!(user = %record.user_id, "created user");
            Ok(record.into_identity())
        })
    }

    fn find_by_email(&self, email: &Email) -> StoreFuture<'_, Option<Identity>> {
        let email = email.as_str().to_string();
        Box::pin(async move {
            Ok(self
                .user_by_email(&email)
                .await?
                .map(UserRecord::into_identity))
        })
    }

    fn find_by_phone(&self, phone: &PhoneNumber) -> StoreFuture<'_, Option<Identity>> {
        let phone = phone.as_str().to_string();

        Box::pin(async move {
            let mut res = self
                .db
                .query("SELECT * FROM user WHERE phone_number = $phone LIMIT 1")
                .bind(("phone", phone))
                .await
                .map_err(backend)?;

            let users: Vec<UserRecord> = res.take(0).map_err(backend)?;
            Ok(users.into_iter().next().map(UserRecord::into_identity))
        })
    }

    fn find_by_login(
        &self,
        provider: FederatedProvider,
        external_id: &ExternalUserId,
    ) -> StoreFuture<'_, Option<Identity>> {
        let external_id = external_id.as_str().to_string();

        Box::pin(async move {
            let query = r#"
                SELECT * FROM external_login
                WHERE provider = $provider
                  AND external_id = $external_id
                LIMIT 1
            "#;

            let mut res = self
                .db
                .query(query)
                .bind(("provider", provider.as_str().to_string()))
                .bind(("external_id", external_id))
                .await
                .map_err(backend)?;

            let links: Vec<LoginRecord> = res.take(0).map_err(backend)?;
            let Some(link) = links.into_iter().next() else {
                return Ok(None);
            };

            Ok(self
                .user_by_user_id(&link.user_id)
                .await?
                .map(UserRecord::into_identity))
        })
    }

    fn check_password(&self, email: &Email, password: &str) -> StoreFuture<'_, bool> {
        let email = email.as_str().to_string();
        let password = password.to_string();

        Box::pin(async move {
            let Some(record) = self.user_by_email(&email).await? else {
                return Ok(false);
            };
            Ok(password_digest(&record.password_salt, &password) == record.password_digest)
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
            let query = r#"
                CREATE external_login CONTENT {
                    user_id: $user_id,
                    provider: $provider,
                    external_id: $external_id
                }
            "#;

            self.db
                .query(query)
                .bind(("user_id", user_id))
                .bind(("provider", provider.as_str().to_string()))
                .bind(("external_id", external_id))
                .await
                .map_err(backend)?;

            Ok(())
        })
    }
}

fn backend(err: surrealdb::Error) -> StoreError {
    StoreError::Backend(err.to_string())
}

/// Salted SHA-256 digest stored for password checks.
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

    async fn setup_test_store() -> SurrealUserStore {
        let config = DatabaseConfig {
            url: "memory".to_string(),
            ..Default::default()
        };
        let db = create_connection(config).await.unwrap();
        ensure_schema(&db).await.unwrap();
        SurrealUserStore::new(db)
    }

    fn new_user(email: &str, phone: Option<&str>) -> NewUser {
        NewUser {
            username: Username::new("testuser"),
            email: Email::new(email),
            phone_number: phone.map(PhoneNumber::new),
        }
    }

    #[tokio::test]
    async fn test_create_then_find_by_email() {
        let store = setup_test_store().await;

        let created = store
            .create_user(new_user("testuser@example.com", Some("1234567890")), "Test@1234")
            .await
            .unwrap();
        assert!(!created.id.as_str().is_empty());

        let found = store
            .find_by_email(&Email::new("testuser@example.com"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let store = setup_test_store().await;

        store
            .create_user(new_user("dup@example.com", None), "Test@1234")
            .await
            .unwrap();

        let err = store
            .create_user(new_user("dup@example.com", None), "Test@1234")
            .await
            .unwrap_err();
        assert_eq!(err, StoreError::DuplicateEmail);
    }

    #[tokio::test]
    async fn test_password_policy_enforced() {
        let store = setup_test_store().await;

        let err = store
            .create_user(new_user("weak@example.com", None), "abc")
            .await
            .unwrap_err();

        match err {
            StoreError::PasswordRejected(reasons) => assert!(!reasons.is_empty()),
            other => panic!("expected PasswordRejected, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_check_password() {
        let store = setup_test_store().await;
        let email = Email::new("pw@example.com");

        store
            .create_user(new_user("pw@example.com", None), "Test@1234")
            .await
            .unwrap();

        assert!(store.check_password(&email, "Test@1234").await.unwrap());
        assert!(!store.check_password(&email, "wrong").await.unwrap());
        assert!(
            !store
                .check_password(&Email::new("nobody@example.com"), "Test@1234")
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_find_by_phone() {
        let store = setup_test_store().await;

        let created = store
            .create_user(new_user("phone@example.com", Some("5551234567")), "Test@1234")
            .await
            .unwrap();

        let found = store
            .find_by_phone(&PhoneNumber::new("5551234567"))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        assert!(
            store
                .find_by_phone(&PhoneNumber::new("0000000000"))
                .await
                .unwrap()
                .is_none()
        );
    }

    #[tokio::test]
    async fn test_link_and_find_login() {
        let store = setup_test_store().await;

        let created = store
            .create_user(new_user("fed@example.com", None), "Test@1234")
            .await
            .unwrap();

        let external = ExternalUserId::new("fb-1001");
        store
            .link_login(&created.id, FederatedProvider::Facebook, &external)
            .await
            .unwrap();

        let found = store
            .find_by_login(FederatedProvider::Facebook, &external)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(found.id, created.id);

        // Same external id under a different provider is a different link.
        assert!(
            store
                .find_by_login(FederatedProvider::Google, &external)
                .await
                .unwrap()
                .is_none()
        );
    }
}
