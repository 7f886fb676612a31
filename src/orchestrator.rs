//! Request routing and boundary error translation.
//!
//! The orchestrator is the single entry point for authentication requests.
//! It holds no state of its own: it maps each request kind to the matching
//! [`CredentialAuthenticator`] or [`TokenValidator`] operation and translates
//! internal error kinds into the boundary's success/failure representation.

use tracing::{error, warn};

use crate::auth::{AuthError, Credential, CredentialAuthenticator, Registration};
use crate::token::{TokenValidator, ValidationError};
use crate::types::{Email, FederatedProvider, PhoneNumber, Username};

/// Inbound authentication request kinds.
#[derive(Debug, Clone)]
pub enum AuthRequest {
    Register {
        username: String,
        email: String,
        password: String,
        phone_number: Option<String>,
    },
    PasswordLogin {
        email: String,
        password: String,
    },
    FacebookLogin {
        access_token: String,
    },
    GoogleLogin {
        id_token: String,
    },
    PhoneLogin {
        phone_number: String,
        code: String,
    },
    Validate {
        token: String,
    },
}

/// Successful boundary outcomes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthResponse {
    /// A new identity was created; its first token is attached.
    Registered { token: String },
    /// A login attempt succeeded.
    LoggedIn { token: String },
    /// A presented token passed validation.
    Valid,
}

/// Classified boundary failures with their HTTP mapping.
///
/// The orchestrator deliberately flattens login failures into one
/// unauthorized message (no account-existence signal), while registration
/// duplicates stay disclosed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthRejection {
    /// 400 with the given error message.
    BadRequest(String),
    /// 401 with the given error message.
    Unauthorized(String),
    /// 500; the caller only sees a generic message, details go to the log.
    Internal,
}

impl AuthRejection {
    /// HTTP status code for this rejection.
    pub fn status(&self) -> u16 {
        match self {
            Self::BadRequest(_) => 400,
            Self::Unauthorized(_) => 401,
            Self::Internal => 500,
        }
    }

    /// Message for the response body's `error` field.
    pub fn message(&self) -> &str {
        match self {
            Self::BadRequest(msg) | Self::Unauthorized(msg) => msg,
            Self::Internal => "An unexpected error occurred.",
        }
    }
}

/// Routes authentication requests to the right component.
pub struct AuthOrchestrator {
    authenticator: CredentialAuthenticator,
    validator: TokenValidator,
}

impl AuthOrchestrator {
    pub fn new(authenticator: CredentialAuthenticator, validator: TokenValidator) -> Self {
        Self {
            authenticator,
            validator,
        }
    }

    /// Handle one request to its terminal outcome.
    pub async fn handle(&self, request: AuthRequest) -> Result<AuthResponse, AuthRejection> {
        match request {
            AuthRequest::Register {
                username,
                email,
                password,
                phone_number,
            } => {
                let registration = Registration {
                    username: Username::new(username),
                    email: Email::new(email),
                    password,
                    phone_number: phone_number.map(PhoneNumber::new),
                };
                let token = self
                    .authenticator
                    .register(registration)
                    .await
                    .map_err(reject_auth)?;
                Ok(AuthResponse::Registered { token })
            }
            AuthRequest::PasswordLogin { email, password } => {
                self.login(Credential::Password {
                    email: Email::new(email),
                    password,
                })
                .await
            }
            AuthRequest::FacebookLogin { access_token } => {
                self.login(Credential::Federated {
                    provider: FederatedProvider::Facebook,
                    token: access_token,
                })
                .await
            }
            AuthRequest::GoogleLogin { id_token } => {
                self.login(Credential::Federated {
                    provider: FederatedProvider::Google,
                    token: id_token,
                })
                .await
            }
            AuthRequest::PhoneLogin { phone_number, code } => {
                self.login(Credential::Phone {
                    number: PhoneNumber::new(phone_number),
                    code,
                })
                .await
            }
            AuthRequest::Validate { token } => {
                self.validator.validate(&token).map_err(reject_validation)?;
                Ok(AuthResponse::Valid)
            }
        }
    }

    async fn login(&self, credential: Credential) -> Result<AuthResponse, AuthRejection> {
        let token = self
            .authenticator
            .login(credential)
            .await
            .map_err(reject_auth)?;
        Ok(AuthResponse::LoggedIn { token })
    }
}

fn reject_auth(err: AuthError) -> AuthRejection {
    match err {
        AuthError::DuplicateIdentity => {
            AuthRejection::BadRequest("Email already exists.".to_string())
        }
        AuthError::RegistrationFailed(reasons) => {
            AuthRejection::BadRequest(format!("Registration failed: {}", reasons))
        }
        AuthError::InvalidCredentials | AuthError::IdentityNotFound => {
            warn!("login attempt rejected");
            AuthRejection::Unauthorized("Invalid credentials.".to_string())
        }
        AuthError::Internal(msg) => {
            error!("authentication failed internally: {}", msg);
            AuthRejection::Internal
        }
    }
}

fn reject_validation(err: ValidationError) -> AuthRejection {
    match err {
        ValidationError::MalformedToken => {
            AuthRejection::Unauthorized("Malformed token.".to_string())
        }
        ValidationError::KeyUnavailable(msg) => {
            error!("token validation failed internally: {}", msg);
            AuthRejection::Internal
        }
        other => {
            warn!("token rejected: {}", other);
            AuthRejection::Unauthorized("Invalid token.".to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{StaticCodeVerifier, StaticFederatedVerifier};
    use crate::config::TokenConfig;
    use crate::keys::EphemeralKeyProvider;
    use crate::store::InMemoryUserStore;
    use crate::token::TokenIssuer;
    use std::sync::{Arc, OnceLock};

    fn test_keys() -> Arc<EphemeralKeyProvider> {
        static KEYS: OnceLock<Arc<EphemeralKeyProvider>> = OnceLock::new();
        KEYS.get_or_init(|| Arc::new(EphemeralKeyProvider::new().unwrap()))
            .clone()
    }

    fn orchestrator() -> AuthOrchestrator {
        let config = TokenConfig::default();
        let issuer = TokenIssuer::new(test_keys(), config.clone());
        let authenticator = CredentialAuthenticator::new(
            Arc::new(InMemoryUserStore::new()),
            Arc::new(StaticFederatedVerifier::new()),
            Arc::new(StaticCodeVerifier::new()),
            issuer,
        );
        AuthOrchestrator::new(authenticator, TokenValidator::new(test_keys(), config))
    }

    fn register_request() -> AuthRequest {
        AuthRequest::Register {
            username: "testuser".to_string(),
            email: "testuser@example.com".to_string(),
            password: "Test@1234".to_string(),
            phone_number: Some("1234567890".to_string()),
        }
    }

    #[tokio::test]
    async fn test_register_login_validate_flow() {
        let orchestrator = orchestrator();

        let Ok(AuthResponse::Registered { token }) =
            orchestrator.handle(register_request()).await
        else {
            panic!("registration should succeed");
        };
        assert!(!token.is_empty());

        let Ok(AuthResponse::LoggedIn { token }) = orchestrator
            .handle(AuthRequest::PasswordLogin {
                email: "testuser@example.com".to_string(),
                password: "Test@1234".to_string(),
            })
            .await
        else {
            panic!("login should succeed");
        };

        assert_eq!(
            orchestrator.handle(AuthRequest::Validate { token }).await,
            Ok(AuthResponse::Valid)
        );
    }

    #[tokio::test]
    async fn test_duplicate_register_maps_to_disclosed_400() {
        let orchestrator = orchestrator();
        orchestrator.handle(register_request()).await.unwrap();

        let rejection = orchestrator.handle(register_request()).await.unwrap_err();
        assert_eq!(
            rejection,
            AuthRejection::BadRequest("Email already exists.".to_string())
        );
        assert_eq!(rejection.status(), 400);
    }

    #[tokio::test]
    async fn test_login_failures_share_one_401_body() {
        let orchestrator = orchestrator();
        orchestrator.handle(register_request()).await.unwrap();

        let unknown = orchestrator
            .handle(AuthRequest::PasswordLogin {
                email: "nobody@example.com".to_string(),
                password: "Test@1234".to_string(),
            })
            .await
            .unwrap_err();
        let wrong = orchestrator
            .handle(AuthRequest::PasswordLogin {
                email: "testuser@example.com".to_string(),
                password: "wrong".to_string(),
            })
            .await
            .unwrap_err();
        let federated = orchestrator
            .handle(AuthRequest::FacebookLogin {
                access_token: "anything".to_string(),
            })
            .await
            .unwrap_err();

        assert_eq!(unknown, wrong);
        assert_eq!(unknown, federated);
        assert_eq!(unknown.status(), 401);
        assert_eq!(unknown.message(), "Invalid credentials.");
    }

    #[tokio::test]
    async fn test_validate_distinguishes_malformed_from_invalid() {
        let orchestrator = orchestrator();

        let malformed = orchestrator
            .handle(AuthRequest::Validate {
                token: "invalid-token".to_string(),
            })
            .await
            .unwrap_err();
        assert_eq!(
            malformed,
            AuthRejection::Unauthorized("Malformed token.".to_string())
        );

        // Signed by a key pair the validator has never seen.
        let foreign_keys: Arc<EphemeralKeyProvider> =
            Arc::new(EphemeralKeyProvider::new().unwrap());
        let foreign_token = TokenIssuer::new(foreign_keys, TokenConfig::default())
            .issue(&crate::types::Identity {
                id: crate::types::UserId::new("user-1"),
                username: crate::types::Username::new("u"),
                email: crate::types::Email::new("u@example.com"),
                phone_number: None,
            })
            .unwrap();

        let invalid = orchestrator
            .handle(AuthRequest::Validate {
                token: foreign_token,
            })
            .await
            .unwrap_err();
        assert_eq!(
            invalid,
            AuthRejection::Unauthorized("Invalid token.".to_string())
        );
    }

    #[test]
    fn test_internal_rejection_hides_detail() {
        let rejection = reject_auth(AuthError::Internal("connection refused".to_string()));
        assert_eq!(rejection, AuthRejection::Internal);
        assert_eq!(rejection.status(), 500);
        assert_eq!(rejection.message(), "An unexpected error occurred.");
    }
}
