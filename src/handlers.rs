//! Authentication HTTP Handlers
//!
//! REST API endpoints for signup, login and the caller's own account.

use crate::error::AuthError;
use crate::extractors::AuthUser;
use crate::middleware::protect;
use crate::models::*;
use crate::service::AuthService;

use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use std::sync::Arc;

/// Shared auth service state
pub type AuthState = Arc<AuthService>;

// ============================================
// Route Builder
// ============================================

/// Create authentication routes
pub fn create_routes(auth_service: Arc<AuthService>) -> Router {
    // Public routes (no authentication required)
    let public = Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/login", post(login));

    // Protected routes (require a valid bearer token)
    let protected = protect(
        Router::new()
            .route("/auth/me", get(get_current_user))
            .route("/auth/change-password", post(change_password)),
        auth_service.verifier(),
    );

    Router::new()
        .merge(public)
        .merge(protected)
        .with_state(auth_service)
}

// ============================================
// Signup / Login
// ============================================

/// POST /auth/signup
///
/// Register a new account and return its first access token
pub async fn signup(
    State(auth): State<AuthState>,
    Json(req): Json<SignupRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = auth.signup(req).await?;

    Ok((StatusCode::CREATED, Json(response)))
}

/// POST /auth/login
///
/// Authenticate with email and password
pub async fn login(
    State(auth): State<AuthState>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let response = auth.login(req).await?;

    Ok(Json(response))
}

// ============================================
// Authenticated Account
// ============================================

/// GET /auth/me
///
/// Get current user profile
pub async fn get_current_user(
    State(auth): State<AuthState>,
    user: AuthUser,
) -> Result<impl IntoResponse, AuthError> {
    let profile = auth.current_user(user.id).await?;

    Ok(Json(serde_json::json!({ "user": profile })))
}

/// POST /auth/change-password
///
/// Change password for authenticated user
pub async fn change_password(
    State(auth): State<AuthState>,
    user: AuthUser,
    Json(req): Json<ChangePasswordRequest>,
) -> Result<impl IntoResponse, AuthError> {
    auth.change_password(user.id, req).await?;

    Ok(Json(MessageResponse::new("Password changed successfully.")))
}
