//! RustPress Gate
//!
//! Credential hashing and bearer-token authorization for RustPress services:
//! - Argon2id password hashing with a per-credential salt
//! - Bounded key-derivation pool off the async executor
//! - HS256 token issuance and verification with an injectable clock
//! - Authorization middleware guarding protected routes
//! - Signup, login and password change endpoints
//!
//! # Configuration
//!
//! All configuration is loaded from environment variables:
//! - `ACCESS_TOKEN` - Secret key for signing tokens (required)
//! - `TOKEN_TTL` - Token lifetime in seconds (default: 86400)
//! - `ARGON2_MEMORY_COST` - Argon2 memory in KiB (default: 65536)
//! - `ARGON2_TIME_COST` - Argon2 iterations (default: 3)
//! - `ARGON2_PARALLELISM` - Argon2 lanes (default: 4)
//! - `HASH_CONCURRENCY` - Concurrent key derivations (default: CPU count)
//! - `MIN_PASSWORD_LENGTH` - Minimum password length (default: 6)
//! - `DATABASE_URL` - PostgreSQL connection string (optional)
//!
//! # Usage
//!
//! ```rust,ignore
//! use rustpress_gate::{AuthConfig, AuthService, InMemoryDirectory};
//!
//! let config = AuthConfig::from_env()?;
//! let service = Arc::new(AuthService::new(&config, Arc::new(InMemoryDirectory::new()))?);
//!
//! // Public signup/login plus gated /auth/me
//! let app = rustpress_gate::create_routes(service.clone());
//!
//! // Gate any other router with the same verifier
//! let posts = rustpress_gate::protect(posts_router, service.verifier());
//! ```

pub mod config;
pub mod directory;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod password;
pub mod pool;
pub mod service;
pub mod token;

// Re-export commonly used types
pub use config::{AuthConfig, ServerConfig};
pub use directory::{AccountDirectory, InMemoryDirectory, PgDirectory};
pub use error::AuthError;
pub use extractors::AuthUser;
pub use handlers::{create_routes, AuthState};
pub use middleware::{authorize, protect, require_auth, AuthorizationDecision};
pub use models::*;
pub use password::{Credential, CredentialHasher, KdfParams};
pub use pool::HashingPool;
pub use service::AuthService;
pub use token::{Claims, Clock, FixedClock, SystemClock, TokenIssuer, TokenVerifier};
