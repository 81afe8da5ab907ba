//! Gate Configuration
//!
//! All configuration values are loaded from environment variables once at
//! startup. The signing secret is required; every other value has a default.

use crate::error::AuthError;
use crate::password::KdfParams;
use std::env;
use std::fmt;
use std::str::FromStr;

/// Default token lifetime: 24 hours.
const DEFAULT_TOKEN_TTL: i64 = 86_400;
/// Default minimum password length.
const DEFAULT_MIN_PASSWORD_LENGTH: usize = 6;
/// Longest accepted token lifetime: ten years.
const MAX_TOKEN_TTL: i64 = 10 * 365 * 86_400;
/// Secrets shorter than this are accepted but reported at startup.
const RECOMMENDED_SECRET_LENGTH: usize = 32;

/// Authentication configuration loaded from environment
#[derive(Clone)]
pub struct AuthConfig {
    /// HMAC secret for signing tokens (from ACCESS_TOKEN env var)
    pub signing_secret: String,

    /// Token lifetime in seconds (from TOKEN_TTL env var)
    pub token_ttl: i64,

    /// Argon2 cost parameters (from ARGON2_MEMORY_COST, ARGON2_TIME_COST, ARGON2_PARALLELISM)
    pub kdf: KdfParams,

    /// Maximum concurrent key derivations (from HASH_CONCURRENCY env var)
    pub hash_concurrency: usize,

    /// Minimum password length (from MIN_PASSWORD_LENGTH env var)
    pub min_password_length: usize,
}

impl AuthConfig {
    /// Load configuration from environment variables
    ///
    /// Fails with [`AuthError::SigningFailure`] when `ACCESS_TOKEN` is unset or
    /// empty; the process must not serve traffic in that state.
    pub fn from_env() -> Result<Self, AuthError> {
        let signing_secret = env::var("ACCESS_TOKEN")
            .ok()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| {
                AuthError::SigningFailure("ACCESS_TOKEN environment variable must be set".into())
            })?;

        let defaults = KdfParams::default();

        Ok(Self {
            signing_secret,
            token_ttl: env_or("TOKEN_TTL", DEFAULT_TOKEN_TTL),
            kdf: KdfParams {
                memory_kib: env_or("ARGON2_MEMORY_COST", defaults.memory_kib),
                iterations: env_or("ARGON2_TIME_COST", defaults.iterations),
                parallelism: env_or("ARGON2_PARALLELISM", defaults.parallelism),
            },
            hash_concurrency: env_or("HASH_CONCURRENCY", default_hash_concurrency()),
            min_password_length: env_or("MIN_PASSWORD_LENGTH", DEFAULT_MIN_PASSWORD_LENGTH),
        })
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), AuthError> {
        if self.signing_secret.is_empty() {
            return Err(AuthError::SigningFailure(
                "ACCESS_TOKEN must not be empty".to_string(),
            ));
        }

        if self.signing_secret.len() < RECOMMENDED_SECRET_LENGTH {
            tracing::warn!(
                length = self.signing_secret.len(),
                "ACCESS_TOKEN is shorter than {} bytes",
                RECOMMENDED_SECRET_LENGTH
            );
        }

        if self.token_ttl <= 0 || self.token_ttl > MAX_TOKEN_TTL {
            return Err(AuthError::Config(format!(
                "TOKEN_TTL must be between 1 and {MAX_TOKEN_TTL} seconds"
            )));
        }

        if self.hash_concurrency == 0 {
            return Err(AuthError::Config(
                "HASH_CONCURRENCY must be at least 1".to_string(),
            ));
        }

        if self.min_password_length == 0 {
            return Err(AuthError::Config(
                "MIN_PASSWORD_LENGTH must be at least 1".to_string(),
            ));
        }

        self.kdf.validate()
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("signing_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("kdf", &self.kdf)
            .field("hash_concurrency", &self.hash_concurrency)
            .field("min_password_length", &self.min_password_length)
            .finish()
    }
}

/// HTTP listener configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Postgres connection string; the in-memory directory is used when absent
    pub database_url: Option<String>,
}

impl ServerConfig {
    pub fn from_env() -> Self {
        Self {
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
            port: env_or("PORT", 3275),
            database_url: env::var("DATABASE_URL").ok().filter(|s| !s.is_empty()),
        }
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn default_hash_concurrency() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(4)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> AuthConfig {
        AuthConfig {
            signing_secret: "a".repeat(32),
            token_ttl: 86_400,
            kdf: KdfParams::default(),
            hash_concurrency: 2,
            min_password_length: 6,
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(test_config().validate().is_ok());
    }

    #[test]
    fn test_empty_secret_is_signing_failure() {
        let config = AuthConfig {
            signing_secret: String::new(),
            ..test_config()
        };

        assert!(matches!(
            config.validate(),
            Err(AuthError::SigningFailure(_))
        ));
    }

    #[test]
    fn test_short_secret_is_accepted() {
        let config = AuthConfig {
            signing_secret: "short".to_string(),
            ..test_config()
        };

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_non_positive_ttl_rejected() {
        let config = AuthConfig {
            token_ttl: 0,
            ..test_config()
        };

        assert!(matches!(config.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_oversized_ttl_rejected() {
        let config = AuthConfig {
            token_ttl: i64::MAX,
            ..test_config()
        };
        assert!(matches!(config.validate(), Err(AuthError::Config(_))));

        let config = AuthConfig {
            token_ttl: MAX_TOKEN_TTL,
            ..test_config()
        };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_concurrency_rejected() {
        let config = AuthConfig {
            hash_concurrency: 0,
            ..test_config()
        };

        assert!(matches!(config.validate(), Err(AuthError::Config(_))));
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = AuthConfig {
            signing_secret: "super-secret-value-that-must-not-leak".to_string(),
            ..test_config()
        };

        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("super-secret"));
        assert!(rendered.contains("<redacted>"));
    }
}
