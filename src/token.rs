//! Bearer token issuance and verification.
//!
//! Tokens are compact HS256 JWS strings (`header.payload.signature`). The
//! payload is the [`Claims`] plus `iat` / `exp` in seconds since the epoch.
//! Expiry is checked here against an injectable [`Clock`] rather than by
//! `jsonwebtoken`, so there is no leeway and tests can pin time.

use crate::error::AuthError;
use crate::models::Account;

use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Identity carried inside a token
///
/// Only a stable id and a display name. Never build this by serializing an
/// account record: tokens are signed, not encrypted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (account id)
    pub sub: i64,
    /// Display name
    pub name: String,
}

impl Claims {
    pub fn new(sub: i64, name: impl Into<String>) -> Self {
        Self {
            sub,
            name: name.into(),
        }
    }

    pub fn for_account(account: &Account) -> Self {
        Self::new(account.id, account.name.clone())
    }
}

/// Wire payload: claims plus timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
struct TokenPayload {
    #[serde(flatten)]
    claims: Claims,
    iat: i64,
    exp: i64,
}

// ============================================
// Clock
// ============================================

/// Source of the current time in UTC seconds
pub trait Clock: Send + Sync {
    fn now(&self) -> i64;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// Manually driven clock for tests
#[derive(Debug, Default)]
pub struct FixedClock(AtomicI64);

impl FixedClock {
    pub fn new(now: i64) -> Self {
        Self(AtomicI64::new(now))
    }

    pub fn set(&self, now: i64) {
        self.0.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, secs: i64) {
        self.0.fetch_add(secs, Ordering::SeqCst);
    }
}

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0.load(Ordering::SeqCst)
    }
}

fn require_secret(secret: &[u8]) -> Result<(), AuthError> {
    if secret.is_empty() {
        return Err(AuthError::SigningFailure(
            "signing secret must not be empty".to_string(),
        ));
    }
    Ok(())
}

// ============================================
// Issuer
// ============================================

/// Signs tokens with the process-wide secret
pub struct TokenIssuer {
    key: EncodingKey,
    ttl: i64,
    clock: Arc<dyn Clock>,
}

impl TokenIssuer {
    /// Create an issuer; an empty secret is a [`AuthError::SigningFailure`]
    pub fn new(secret: &[u8], ttl_secs: i64) -> Result<Self, AuthError> {
        require_secret(secret)?;
        Ok(Self {
            key: EncodingKey::from_secret(secret),
            ttl: ttl_secs,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Token lifetime in seconds
    pub fn ttl(&self) -> i64 {
        self.ttl
    }

    /// Sign `claims` into a token expiring `ttl` seconds from now
    pub fn issue(&self, claims: &Claims) -> Result<String, AuthError> {
        let iat = self.clock.now();
        let exp = iat.checked_add(self.ttl).ok_or_else(|| {
            AuthError::SigningFailure(format!("token lifetime {}s overflows", self.ttl))
        })?;
        let payload = TokenPayload {
            claims: claims.clone(),
            iat,
            exp,
        };

        encode(&Header::new(Algorithm::HS256), &payload, &self.key).map_err(|e| {
            tracing::error!("Token signing failed: {:?}", e);
            AuthError::SigningFailure(e.to_string())
        })
    }
}

// ============================================
// Verifier
// ============================================

/// Checks signature and expiry of presented tokens
pub struct TokenVerifier {
    key: DecodingKey,
    validation: Validation,
    clock: Arc<dyn Clock>,
}

impl TokenVerifier {
    /// Create a verifier; an empty secret is a [`AuthError::SigningFailure`]
    pub fn new(secret: &[u8]) -> Result<Self, AuthError> {
        require_secret(secret)?;

        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp"]);

        Ok(Self {
            key: DecodingKey::from_secret(secret),
            validation,
            clock: Arc::new(SystemClock),
        })
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Verify a token and return its claims unchanged
    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        if token.split('.').count() != 3 {
            return Err(AuthError::MalformedToken);
        }

        let data = decode::<TokenPayload>(token, &self.key, &self.validation)?;

        if self.clock.now() >= data.claims.exp {
            return Err(AuthError::TokenExpired);
        }

        Ok(data.claims.claims)
    }
}
