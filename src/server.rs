//! HTTP boundary for the authentication service.
//!
//! The transport layer stays thin: handlers deserialize the request shape,
//! hand an [`AuthRequest`] to the orchestrator, and render its outcome as the
//! boundary's JSON contract. No authentication logic lives here.

use std::sync::Arc;

use axum::{
    Router,
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
};
use serde::Deserialize;
use serde_json::{Value, json};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::keys::KeyProvider;
use crate::orchestrator::{AuthOrchestrator, AuthRejection, AuthRequest, AuthResponse};

/// Shared state behind every handler.
pub struct AppState {
    orchestrator: AuthOrchestrator,
    keys: Arc<dyn KeyProvider>,
}

type SharedState = Arc<AppState>;

/// Build the service router.
pub fn create_router(orchestrator: AuthOrchestrator, keys: Arc<dyn KeyProvider>) -> Router {
    let state = Arc::new(AppState { orchestrator, keys });

    Router::new()
        .route("/health", get(health_check))
        .route("/public-key", get(public_key))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/login/facebook", post(login_facebook))
        .route("/auth/login/google", post(login_google))
        .route("/auth/login/phone", post(login_phone))
        .route("/auth/validate", post(validate_token))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RegisterRequest {
    username: String,
    email: String,
    password: String,
    phone_number: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LoginRequest {
    email: String,
    password: String,
}

#[derive(Debug, Deserialize)]
struct PhoneLoginRequest {
    phone_number: String,
    code: String,
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339()
    }))
}

async fn public_key(State(state): State<SharedState>) -> Result<String, (StatusCode, Json<Value>)> {
    match state.keys.key_pair() {
        Ok(pair) => Ok(pair.public_key_pem().to_string()),
        Err(e) => {
            error!("public key unavailable: {}", e);
            Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({"error": "An unexpected error occurred."})),
            ))
        }
    }
}

async fn register(
    State(state): State<SharedState>,
    Json(req): Json<RegisterRequest>,
) -> (StatusCode, Json<Value>) {
    dispatch(
        &state,
        AuthRequest::Register {
            username: req.username,
            email: req.email,
            password: req.password,
            phone_number: req.phone_number,
        },
    )
    .await
}

async fn login(
    State(state): State<SharedState>,
    Json(req): Json<LoginRequest>,
) -> (StatusCode, Json<Value>) {
    dispatch(
        &state,
        AuthRequest::PasswordLogin {
            email: req.email,
            password: req.password,
        },
    )
    .await
}

async fn login_facebook(
    State(state): State<SharedState>,
    Json(access_token): Json<String>,
) -> (StatusCode, Json<Value>) {
    dispatch(&state, AuthRequest::FacebookLogin { access_token }).await
}

async fn login_google(
    State(state): State<SharedState>,
    Json(id_token): Json<String>,
) -> (StatusCode, Json<Value>) {
    dispatch(&state, AuthRequest::GoogleLogin { id_token }).await
}

async fn login_phone(
    State(state): State<SharedState>,
    Json(req): Json<PhoneLoginRequest>,
) -> (StatusCode, Json<Value>) {
    dispatch(
        &state,
        AuthRequest::PhoneLogin {
            phone_number: req.phone_number,
            code: req.code,
        },
    )
    .await
}

/// The token arrives as the raw request body, not wrapped in JSON.
async fn validate_token(
    State(state): State<SharedState>,
    token: String,
) -> (StatusCode, Json<Value>) {
    let token = token.trim().to_string();
    if token.is_empty() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"error": "Token is required."})),
        );
    }
    dispatch(&state, AuthRequest::Validate { token }).await
}

async fn dispatch(state: &AppState, request: AuthRequest) -> (StatusCode, Json<Value>) {
    match state.orchestrator.handle(request).await {
        Ok(response) => success_body(&response),
        Err(rejection) => rejection_body(&rejection),
    }
}

fn success_body(response: &AuthResponse) -> (StatusCode, Json<Value>) {
    let body = match response {
        AuthResponse::Registered { token } => json!({
            "message": "User registered successfully.",
            "token": token,
        }),
        AuthResponse::LoggedIn { token } => json!({"token": token}),
        AuthResponse::Valid => json!({"message": "Token is valid."}),
    };
    (StatusCode::OK, Json(body))
}

fn rejection_body(rejection: &AuthRejection) -> (StatusCode, Json<Value>) {
    let status =
        StatusCode::from_u16(rejection.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": rejection.message()})))
}
