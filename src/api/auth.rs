use axum::{
    Json,
    extract::{ConnectInfo, FromRequestParts, Request, State, rejection::JsonRejection},
    http::{HeaderMap, request::Parts},
    middleware::Next,
    response::IntoResponse,
};
use serde::Deserialize;
use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;

use super::validation::{validate_credentials, validate_registration};
use super::{ApiError, ApiResponse, AppState, AuthData};

// ============================================================================
// Request Types
// ============================================================================

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

// ============================================================================
// Extractors
// ============================================================================

/// Identity of the calling client for rate limiting: the peer IP, or
/// `"unknown"` when the server was not started with connect info.
#[derive(Debug, Clone)]
pub struct ClientKey(pub String);

impl<S: Send + Sync> FromRequestParts<S> for ClientKey {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let ip = parts
            .extensions
            .get::<ConnectInfo<SocketAddr>>()
            .map(|ConnectInfo(addr)| addr.ip().to_string());

        Ok(Self(ip.unwrap_or_else(|| "unknown".to_string())))
    }
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware that accepts the user's token from either:
/// 1. `Authorization: Bearer <token>` header
/// 2. `X-Api-Key` header
///
/// On success the resolved [`UserInfo`](crate::services::UserInfo) is stored in
/// the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<impl IntoResponse, ApiError> {
    let token = extract_token(&headers).ok_or_else(ApiError::unauthorized)?;

    let user = state
        .auth_service()
        .verify_token(&token)
        .await?
        .ok_or_else(ApiError::unauthorized)?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

fn extract_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        let token = token.trim();
        if !token.is_empty() {
            return Some(token.to_string());
        }
    }

    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
        && !key_str.trim().is_empty()
    {
        return Some(key_str.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/register
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthData>>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    let registration = validate_registration(
        payload.name.as_deref(),
        payload.email.as_deref(),
        payload.password.as_deref(),
    )?;

    let grant = state
        .auth_service()
        .register(
            registration.name,
            registration.email,
            registration.password,
        )
        .await?;

    Ok(Json(ApiResponse::with_message(
        "User registered successfully",
        AuthData { data: grant },
    )))
}

/// POST /api/login
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AuthData>>, ApiError> {
    let Json(payload) = payload.map_err(|e| ApiError::validation(e.body_text()))?;

    let credentials =
        validate_credentials(payload.email.as_deref(), payload.password.as_deref())?;

    let grant = state
        .auth_service()
        .login(credentials.email, credentials.password)
        .await?;

    tracing::info!(user_id = grant.user.id, "User logged in");

    Ok(Json(ApiResponse::with_message(
        "Login successful",
        AuthData { data: grant },
    )))
}
