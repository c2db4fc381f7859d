//! Authentication service routes

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use serde::Serialize;
use tracing::error;

use crate::{
    AppState,
    models::{LoginCredentials, RegisterRequest, UserView},
    service::AuthFlowError,
};

/// Envelope wrapping successful login responses
#[derive(Serialize)]
pub struct LoginResponse {
    pub status: &'static str,
    pub data: TokenData,
    pub message: &'static str,
    pub meta: ResponseMeta,
}

#[derive(Serialize)]
pub struct TokenData {
    pub token: String,
}

#[derive(Serialize)]
pub struct ResponseMeta {
    pub api_version: u32,
    pub request_type: &'static str,
}

impl LoginResponse {
    fn new(token: String) -> Self {
        Self {
            status: "success",
            data: TokenData { token },
            message: "Successfully login user",
            meta: ResponseMeta {
                api_version: 1,
                request_type: "Login",
            },
        }
    }
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/me", get(me))
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let database_up = common::database::health_check(&state.db_pool)
        .await
        .unwrap_or(false);

    Json(serde_json::json!({
        "status": if database_up { "ok" } else { "degraded" },
        "service": "auth-service",
        "database": database_up,
    }))
}

/// User registration endpoint
///
/// Validation failures come back as a field-to-messages map with nothing
/// persisted; success returns the created user (credentials stripped) and a
/// token so the user does not need a separate login.
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<impl IntoResponse, AuthFlowError> {
    let (user, token) = state.auth_service.register(payload).await?;

    let body = serde_json::json!({
        "user": UserView::from(user),
        "token": token,
    });
    Ok((StatusCode::CREATED, Json(body)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> Response {
    match state
        .auth_service
        .authenticate(&payload.username, &payload.password)
        .await
    {
        Ok(token) => (StatusCode::OK, Json(LoginResponse::new(token))).into_response(),
        Err(AuthFlowError::InvalidCredentials) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({"error": "invalid_credentials"})),
        )
            .into_response(),
        Err(e) => {
            error!("Login failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({"error": "could_not_create_token"})),
            )
                .into_response()
        }
    }
}

/// Authenticated identity endpoint
///
/// The bearer header is optional at the extractor level so a missing token
/// can be reported as its own wire error instead of a bare rejection.
pub async fn me(
    State(state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<impl IntoResponse, AuthFlowError> {
    let token = bearer.as_ref().map(|TypedHeader(auth)| auth.token());
    let user = state.auth_service.resolve_identity(token).await?;

    Ok(Json(serde_json::json!({ "user": UserView::from(user) })))
}

impl IntoResponse for AuthFlowError {
    fn into_response(self) -> Response {
        match self {
            AuthFlowError::Validation(errors) => {
                (StatusCode::BAD_REQUEST, Json(errors)).into_response()
            }
            AuthFlowError::InvalidCredentials => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({"error": "invalid_credentials"})),
            )
                .into_response(),
            AuthFlowError::TokenAbsent => (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!(["token_absent"])),
            )
                .into_response(),
            AuthFlowError::TokenExpired => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!(["token_expired"])),
            )
                .into_response(),
            AuthFlowError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                Json(serde_json::json!(["token_invalid"])),
            )
                .into_response(),
            AuthFlowError::UserNotFound => (
                StatusCode::NOT_FOUND,
                Json(serde_json::json!(["user_not_found"])),
            )
                .into_response(),
            AuthFlowError::Service(e) => {
                error!("Internal service error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({"error": "server_error"})),
                )
                    .into_response()
            }
        }
    }
}
