//! Authentication Service
//!
//! Signup, login and password change. Composes the account directory, the
//! bounded hashing pool and the token issuer.

use crate::config::AuthConfig;
use crate::directory::AccountDirectory;
use crate::error::AuthError;
use crate::models::*;
use crate::password::{Credential, CredentialHasher, DIGEST_LEN, SALT_LEN};
use crate::pool::HashingPool;
use crate::token::{Claims, Clock, SystemClock, TokenIssuer, TokenVerifier};

use std::sync::Arc;
use validator::Validate;

/// Authentication service
pub struct AuthService {
    directory: Arc<dyn AccountDirectory>,
    hashing: HashingPool,
    issuer: TokenIssuer,
    verifier: Arc<TokenVerifier>,
    min_password_length: usize,
    /// Stand-in credential verified when a login email is unknown
    dummy_credential: String,
}

impl AuthService {
    /// Create a new authentication service
    pub fn new(config: &AuthConfig, directory: Arc<dyn AccountDirectory>) -> Result<Self, AuthError> {
        Self::with_clock(config, directory, Arc::new(SystemClock))
    }

    /// Create a service whose tokens use `clock`
    pub fn with_clock(
        config: &AuthConfig,
        directory: Arc<dyn AccountDirectory>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, AuthError> {
        config.validate()?;

        let secret = config.signing_secret.as_bytes();
        let issuer = TokenIssuer::new(secret, config.token_ttl)?.with_clock(Arc::clone(&clock));
        let verifier = TokenVerifier::new(secret)?.with_clock(clock);
        let hashing = HashingPool::new(CredentialHasher::new(config.kdf), config.hash_concurrency);

        Ok(Self {
            directory,
            hashing,
            issuer,
            verifier: Arc::new(verifier),
            min_password_length: config.min_password_length,
            dummy_credential: Credential {
                salt: vec![0u8; SALT_LEN],
                digest: vec![0u8; DIGEST_LEN],
            }
            .to_string(),
        })
    }

    /// Verifier shared with the authorization gate
    pub fn verifier(&self) -> Arc<TokenVerifier> {
        Arc::clone(&self.verifier)
    }

    pub fn directory(&self) -> &Arc<dyn AccountDirectory> {
        &self.directory
    }

    // ============================================
    // Password Policy
    // ============================================

    fn validate_password(&self, password: &str) -> Result<(), AuthError> {
        if password.chars().count() < self.min_password_length {
            return Err(AuthError::WeakPassword {
                min_length: self.min_password_length,
            });
        }
        Ok(())
    }

    /// Check `password` against the account's stored credential
    ///
    /// A corrupt stored credential is logged and reported like a wrong password.
    async fn check_password(&self, account: &Account, password: &str) -> Result<bool, AuthError> {
        match self
            .hashing
            .verify(password.to_string(), account.credential.clone())
            .await
        {
            Err(AuthError::MalformedCredential) => {
                tracing::error!(user_id = account.id, "Stored credential is malformed");
                Ok(false)
            }
            other => other,
        }
    }

    fn token_response(&self, message: &str, account: &Account) -> Result<TokenResponse, AuthError> {
        let access_token = self.issuer.issue(&Claims::for_account(account))?;
        Ok(TokenResponse::bearer(message, access_token, self.issuer.ttl()))
    }

    // ============================================
    // Signup / Login
    // ============================================

    /// Register a new account and issue its first token
    pub async fn signup(&self, req: SignupRequest) -> Result<TokenResponse, AuthError> {
        req.validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;
        self.validate_password(&req.password)?;

        if self.directory.find_by_email(&req.email).await?.is_some() {
            return Err(AuthError::EmailExists);
        }

        let credential = self.hashing.hash(req.password).await?;

        let account = self
            .directory
            .create(NewAccount {
                email: req.email,
                name: req.name,
                credential: credential.to_string(),
            })
            .await?;

        tracing::info!(user_id = account.id, "Account created");

        self.token_response("Successfully signed up.", &account)
    }

    /// Authenticate an account and issue a token
    pub async fn login(&self, req: LoginRequest) -> Result<TokenResponse, AuthError> {
        req.validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let Some(account) = self.directory.find_by_email(&req.email).await? else {
            self.hashing
                .verify(req.password, self.dummy_credential.clone())
                .await?;
            return Err(AuthError::InvalidCredentials);
        };

        if !self.check_password(&account, &req.password).await? {
            tracing::info!(user_id = account.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = account.id, "Login succeeded");

        self.token_response("Successfully logged in.", &account)
    }

    // ============================================
    // Password Management
    // ============================================

    /// Change password for an authenticated account
    pub async fn change_password(
        &self,
        user_id: i64,
        req: ChangePasswordRequest,
    ) -> Result<(), AuthError> {
        req.validate()
            .map_err(|e| AuthError::Validation(e.to_string()))?;

        let account = self
            .directory
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        if !self.check_password(&account, &req.current_password).await? {
            return Err(AuthError::InvalidCredentials);
        }

        self.validate_password(&req.new_password)?;

        let credential = self.hashing.hash(req.new_password).await?;
        self.directory
            .update_credential(account.id, &credential.to_string())
            .await?;

        tracing::info!(user_id = account.id, "Password changed");
        Ok(())
    }

    /// Public profile of an account
    pub async fn current_user(&self, user_id: i64) -> Result<AccountResponse, AuthError> {
        let account = self
            .directory
            .find_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;
        Ok(account.into())
    }
}
