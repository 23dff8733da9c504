use axum::{
    Extension, Json,
    extract::{
        Path, Request, State,
        rejection::{JsonRejection, PathRejection},
    },
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, MeResponse, MessageResponse, UsersResponse};
use crate::models::user::{AuthUser, UserRef};
use crate::services::LoginResult;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    /// Registration code shared out-of-band
    #[serde(default)]
    pub auth: Option<String>,
}

// ============================================================================
// Middleware
// ============================================================================

/// Bearer token gate for protected routes.
///
/// A missing `Authorization: Bearer <token>` header is 401; a token that fails
/// signature or expiry checks is 403. On success the decoded [`AuthUser`] is
/// inserted into the request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = extract_bearer_token(&headers) else {
        return Err(ApiError::Unauthorized("Access token required".to_string()));
    };

    let user = state.tokens().verify(&token).map_err(|e| {
        tracing::debug!(error = %e, "Rejected bearer token");
        ApiError::InvalidToken("Invalid or expired token".to_string())
    })?;

    // Accounts can only disappear when deletion is enabled
    if state.config().auth.allow_user_deletion
        && state.store().get_user_by_id(user.id).await?.is_none()
    {
        tracing::debug!(user_id = user.id, "Token belongs to a deleted user");
        return Err(ApiError::InvalidToken(
            "Invalid or expired token".to_string(),
        ));
    }

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer <token>` header
fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let auth_header = headers.get(axum::http::header::AUTHORIZATION)?;
    let auth_str = auth_header.to_str().ok()?;
    let token = auth_str.strip_prefix("Bearer ")?.trim();

    (!token.is_empty()).then(|| token.to_string())
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/register
/// Create an account with the shared registration code; does not log in
pub async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Json(payload) = payload?;

    state
        .auth_service()
        .register(
            payload.username.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
            payload.auth.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(MessageResponse::new("User registered successfully")))
}

/// POST /auth/login
/// Authenticate with username and password, returns a bearer token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResult>, ApiError> {
    let Json(payload) = payload?;

    let result = state
        .auth_service()
        .login(
            payload.username.as_deref().unwrap_or_default(),
            payload.password.as_deref().unwrap_or_default(),
        )
        .await?;

    Ok(Json(result))
}

/// POST /auth/logout
/// Tokens are stateless; the client discards its copy
pub async fn logout(Extension(user): Extension<AuthUser>) -> Json<MessageResponse> {
    tracing::debug!("Logout acknowledged for user: {}", user.username);
    Json(MessageResponse::new("Logged out successfully"))
}

/// GET /auth/me
pub async fn me(Extension(user): Extension<AuthUser>) -> Json<MeResponse> {
    Json(MeResponse { user })
}

/// GET /auth
pub async fn list_users(
    State(state): State<Arc<AppState>>,
) -> Result<Json<UsersResponse>, ApiError> {
    let users = state.auth_service().list_users().await?;
    Ok(Json(UsersResponse { users }))
}

/// DELETE /auth/{username}
pub async fn delete_user_by_name(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    Path(username): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth_service()
        .delete_user(&caller, &UserRef::Username(username))
        .await?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}

/// DELETE /auth/id/{id}
pub async fn delete_user_by_id(
    State(state): State<Arc<AppState>>,
    Extension(caller): Extension<AuthUser>,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<MessageResponse>, ApiError> {
    let Path(id) = id?;

    state
        .auth_service()
        .delete_user(&caller, &UserRef::Id(id))
        .await?;

    Ok(Json(MessageResponse::new("User deleted successfully")))
}
