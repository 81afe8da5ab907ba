//! Authentication Error Types
//!
//! Centralized error handling for credential, token and account operations.
//! The variants keep the internal distinction (which check failed); the HTTP
//! rendering collapses them so a client cannot tell the causes apart.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use jsonwebtoken::errors::ErrorKind as JwtErrorKind;

/// Authentication errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Stored credential is malformed")]
    MalformedCredential,

    #[error("Token not found. Please provide a token.")]
    NoToken,

    #[error("Token is malformed")]
    MalformedToken,

    #[error("Token signature does not match")]
    InvalidSignature,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Signing key unavailable: {0}")]
    SigningFailure(String),

    #[error("Invalid or expired token.")]
    InvalidToken,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Email already registered")]
    EmailExists,

    #[error("User not found")]
    UserNotFound,

    #[error("Password must be at least {min_length} characters")]
    WeakPassword { min_length: usize },

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error")]
    Internal,
}

impl AuthError {
    /// True for every failure of token verification.
    pub fn is_token_failure(&self) -> bool {
        matches!(
            self,
            AuthError::MalformedToken
                | AuthError::InvalidSignature
                | AuthError::TokenExpired
                | AuthError::InvalidToken
        )
    }

    /// HTTP status this error renders with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::NoToken | AuthError::InvalidCredentials | AuthError::MalformedCredential => {
                StatusCode::UNAUTHORIZED
            }
            e if e.is_token_failure() => StatusCode::FORBIDDEN,
            AuthError::InvalidInput(_)
            | AuthError::WeakPassword { .. }
            | AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::EmailExists => StatusCode::CONFLICT,
            AuthError::UserNotFound => StatusCode::NOT_FOUND,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let (error_code, message) = match &self {
            AuthError::NoToken => ("no_token", self.to_string()),
            e if e.is_token_failure() => ("invalid_token", AuthError::InvalidToken.to_string()),
            AuthError::InvalidCredentials | AuthError::MalformedCredential => (
                "invalid_credentials",
                AuthError::InvalidCredentials.to_string(),
            ),
            AuthError::InvalidInput(msg) | AuthError::Validation(msg) => {
                ("validation_error", msg.clone())
            }
            AuthError::WeakPassword { .. } => ("weak_password", self.to_string()),
            AuthError::EmailExists => ("email_exists", self.to_string()),
            AuthError::UserNotFound => ("user_not_found", self.to_string()),
            _ => ("internal_error", "An internal error occurred".to_string()),
        };

        (
            status,
            Json(serde_json::json!({
                "error": error_code,
                "message": message
            })),
        )
            .into_response()
    }
}

impl From<sqlx::Error> for AuthError {
    fn from(err: sqlx::Error) -> Self {
        tracing::error!("Database error: {:?}", err);
        AuthError::Database(err.to_string())
    }
}

impl From<argon2::Error> for AuthError {
    fn from(err: argon2::Error) -> Self {
        tracing::error!("Key derivation error: {:?}", err);
        AuthError::Internal
    }
}

impl From<jsonwebtoken::errors::Error> for AuthError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        tracing::debug!("JWT error: {:?}", err);
        match err.kind() {
            JwtErrorKind::InvalidSignature => AuthError::InvalidSignature,
            JwtErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::MalformedToken,
        }
    }
}
