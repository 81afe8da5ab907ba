//! Authorization Middleware
//!
//! The single choke point for protected routes. Each request moves in one
//! step from reading the `Authorization` header to one of four outcomes:
//! missing header, malformed header, unverified token, or authorized.
//! Missing and malformed headers share one 401 response; every verification
//! failure shares one 403 response. The precise reason is only logged.

use crate::error::AuthError;
use crate::token::{Claims, TokenVerifier};

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::{self as axum_middleware, Next},
    response::Response,
    Router,
};
use std::sync::Arc;

/// Authorization scheme accepted by the gate (case-sensitive)
pub const BEARER_SCHEME: &str = "Bearer";

/// Per-request outcome of the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthorizationDecision {
    Authorized(Claims),
    Rejected(AuthError),
}

impl AuthorizationDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, AuthorizationDecision::Authorized(_))
    }

    /// Why the request was rejected, if it was
    pub fn reason(&self) -> Option<&AuthError> {
        match self {
            AuthorizationDecision::Authorized(_) => None,
            AuthorizationDecision::Rejected(reason) => Some(reason),
        }
    }

    pub fn claims(&self) -> Option<&Claims> {
        match self {
            AuthorizationDecision::Authorized(claims) => Some(claims),
            AuthorizationDecision::Rejected(_) => None,
        }
    }
}

/// Split `"<scheme> <token>"` on the first space, requiring the bearer scheme
/// and a non-empty token with no leading whitespace
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.split_once(' ')?;
    if scheme != BEARER_SCHEME || token.is_empty() || token.starts_with(char::is_whitespace) {
        return None;
    }
    Some(token)
}

/// Decide whether a request carrying `header` may proceed
pub fn authorize(header: Option<&str>, verifier: &TokenVerifier) -> AuthorizationDecision {
    let Some(header) = header else {
        tracing::debug!(outcome = "missing_header", "Request rejected");
        return AuthorizationDecision::Rejected(AuthError::NoToken);
    };

    let Some(token) = bearer_token(header) else {
        tracing::debug!(outcome = "malformed_header", "Request rejected");
        return AuthorizationDecision::Rejected(AuthError::NoToken);
    };

    match verifier.verify(token) {
        Ok(claims) => AuthorizationDecision::Authorized(claims),
        Err(reason) => {
            tracing::debug!(outcome = "unverified", reason = %reason, "Request rejected");
            AuthorizationDecision::Rejected(reason)
        }
    }
}

/// Require an authenticated caller
///
/// Validates the bearer token and stores the [`Claims`] in request
/// extensions for [`AuthUser`](crate::extractors::AuthUser).
pub async fn require_auth(
    State(verifier): State<Arc<TokenVerifier>>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthError> {
    // A header that is not valid visible ASCII is treated like a malformed one.
    let header = req
        .headers()
        .get(AUTHORIZATION)
        .map(|h| h.to_str().unwrap_or_default());

    match authorize(header, &verifier) {
        AuthorizationDecision::Authorized(claims) => {
            req.extensions_mut().insert(claims);
            Ok(next.run(req).await)
        }
        AuthorizationDecision::Rejected(reason) => Err(reason),
    }
}

/// Put every route of `router` behind the gate
pub fn protect<S>(router: Router<S>, verifier: Arc<TokenVerifier>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router.route_layer(axum_middleware::from_fn_with_state(verifier, require_auth))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractors::AuthUser;
    use crate::token::{FixedClock, TokenIssuer};

    use axum::{body::Body, http::StatusCode, routing::get, Json};
    use tower::ServiceExt;

    const SECRET: &[u8] = b"gate-test-secret";
    const NOW: i64 = 1_700_000_000;
    const TTL: i64 = 3_600;

    struct Fixture {
        clock: Arc<FixedClock>,
        issuer: TokenIssuer,
        verifier: Arc<TokenVerifier>,
    }

    fn fixture() -> Fixture {
        let clock = Arc::new(FixedClock::new(NOW));
        let issuer = TokenIssuer::new(SECRET, TTL).unwrap().with_clock(clock.clone());
        let verifier = TokenVerifier::new(SECRET).unwrap().with_clock(clock.clone());
        Fixture {
            clock,
            issuer,
            verifier: Arc::new(verifier),
        }
    }

    fn bearer(token: &str) -> String {
        format!("Bearer {token}")
    }

    #[test]
    fn test_missing_header() {
        let f = fixture();
        let decision = authorize(None, &f.verifier);
        assert!(!decision.is_allowed());
        assert_eq!(decision.reason(), Some(&AuthError::NoToken));
    }

    #[test]
    fn test_wrong_scheme() {
        let f = fixture();
        let token = f.issuer.issue(&Claims::new(1, "Ada")).unwrap();

        for header in ["Basic abc", "bearer abc", "Token abc", "Bearer", "", token.as_str()] {
            assert_eq!(
                authorize(Some(header), &f.verifier).reason(),
                Some(&AuthError::NoToken),
                "header {header:?}"
            );
        }
        let lowercase = format!("bearer {token}");
        assert_eq!(
            authorize(Some(&lowercase), &f.verifier).reason(),
            Some(&AuthError::NoToken)
        );
    }

    #[test]
    fn test_empty_token() {
        let f = fixture();
        assert_eq!(
            authorize(Some("Bearer "), &f.verifier).reason(),
            Some(&AuthError::NoToken)
        );
    }

    #[test]
    fn test_extra_separator_is_malformed_header() {
        let f = fixture();
        let token = f.issuer.issue(&Claims::new(1, "Ada")).unwrap();

        for header in [
            format!("Bearer  {token}"),
            format!("Bearer \t{token}"),
            "Bearer  ".to_string(),
        ] {
            assert_eq!(
                authorize(Some(&header), &f.verifier).reason(),
                Some(&AuthError::NoToken),
                "header {header:?}"
            );
        }
    }

    #[test]
    fn test_expired_token() {
        let f = fixture();
        let token = f.issuer.issue(&Claims::new(1, "Ada")).unwrap();
        f.clock.advance(TTL);

        let decision = authorize(Some(&bearer(&token)), &f.verifier);
        assert_eq!(decision.reason(), Some(&AuthError::TokenExpired));
        assert_eq!(decision.reason().unwrap().status_code(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_tampered_signature() {
        let f = fixture();
        let token = f.issuer.issue(&Claims::new(1, "Ada")).unwrap();
        let forged = TokenIssuer::new(b"attacker-secret", TTL)
            .unwrap()
            .with_clock(f.clock.clone())
            .issue(&Claims::new(1, "Ada"))
            .unwrap();

        let (message, _) = token.rsplit_once('.').unwrap();
        let (_, forged_signature) = forged.rsplit_once('.').unwrap();
        let tampered = format!("{message}.{forged_signature}");

        let decision = authorize(Some(&bearer(&tampered)), &f.verifier);
        assert_eq!(decision.reason(), Some(&AuthError::InvalidSignature));
    }

    #[test]
    fn test_malformed_token() {
        let f = fixture();
        let decision = authorize(Some("Bearer not-a-token"), &f.verifier);
        assert_eq!(decision.reason(), Some(&AuthError::MalformedToken));
    }

    #[test]
    fn test_valid_token() {
        let f = fixture();
        let claims = Claims::new(5, "Grace");
        let token = f.issuer.issue(&claims).unwrap();

        let decision = authorize(Some(&bearer(&token)), &f.verifier);
        assert!(decision.is_allowed());
        assert_eq!(decision.claims(), Some(&claims));
        assert_eq!(decision.reason(), None);
    }

    // ============================================
    // Router-level behavior
    // ============================================

    async fn whoami(user: AuthUser) -> Json<Claims> {
        Json(user.claims)
    }

    fn app(verifier: Arc<TokenVerifier>) -> Router {
        protect(Router::new().route("/whoami", get(whoami)), verifier)
    }

    async fn call(router: Router, header: Option<String>) -> (StatusCode, serde_json::Value) {
        let mut builder = axum::http::Request::builder().uri("/whoami");
        if let Some(header) = header {
            builder = builder.header(AUTHORIZATION, header);
        }
        let response = router
            .oneshot(builder.body(Body::empty()).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_router_rejects_missing_header() {
        let f = fixture();
        let (status, body) = call(app(f.verifier.clone()), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "no_token");
    }

    #[tokio::test]
    async fn test_router_rejects_basic_scheme() {
        let f = fixture();
        let (status, body) = call(app(f.verifier.clone()), Some("Basic abc".into())).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "no_token");
    }

    #[tokio::test]
    async fn test_router_rejects_double_space_as_unauthorized() {
        let f = fixture();
        let token = f.issuer.issue(&Claims::new(1, "Ada")).unwrap();

        let header = format!("Bearer  {token}");
        let (status, body) = call(app(f.verifier.clone()), Some(header)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "no_token");
    }

    #[tokio::test]
    async fn test_router_hides_rejection_reason() {
        let f = fixture();
        let token = f.issuer.issue(&Claims::new(1, "Ada")).unwrap();

        let (status, bad_sig) = call(
            app(f.verifier.clone()),
            Some(bearer(&format!("{token}x"))),
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        f.clock.advance(TTL);
        let (status, expired) = call(app(f.verifier.clone()), Some(bearer(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        assert_eq!(bad_sig, expired);
        assert_eq!(expired["error"], "invalid_token");
    }

    #[tokio::test]
    async fn test_router_passes_claims_downstream() {
        let f = fixture();
        let claims = Claims::new(5, "Grace");
        let token = f.issuer.issue(&claims).unwrap();

        let (status, body) = call(app(f.verifier.clone()), Some(bearer(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sub"], 5);
        assert_eq!(body["name"], "Grace");
    }
}
