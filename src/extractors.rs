//! Authentication Extractors
//!
//! Axum extractors exposing the gate's decision to downstream handlers.

use crate::error::AuthError;
use crate::token::Claims;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated caller, as attached by [`require_auth`](crate::middleware::require_auth)
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub claims: Claims,
}

impl AuthUser {
    pub fn from_claims(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            claims,
        }
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only the gate attaches claims; a route outside it has no caller.
        match parts.extensions.get::<Claims>() {
            Some(claims) => Ok(AuthUser::from_claims(claims.clone())),
            None => {
                tracing::warn!(path = %parts.uri.path(), "AuthUser used on a route without the gate");
                Err(AuthError::NoToken)
            }
        }
    }
}
