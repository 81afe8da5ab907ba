//! Bounded Key-Derivation Pool
//!
//! Argon2 is deliberately slow and memory hungry. Every derivation is moved
//! onto the blocking thread pool and gated by a semaphore so that request
//! handlers never stall the async workers and a burst of logins cannot run an
//! unbounded number of derivations at once.

use crate::error::AuthError;
use crate::password::{Credential, CredentialHasher};

use std::sync::Arc;
use tokio::sync::Semaphore;

/// Runs [`CredentialHasher`] work off the async executor with a concurrency cap
#[derive(Debug, Clone)]
pub struct HashingPool {
    hasher: Arc<CredentialHasher>,
    permits: Arc<Semaphore>,
    max_concurrency: usize,
}

impl HashingPool {
    /// Create a pool allowing at most `max_concurrency` derivations at once
    pub fn new(hasher: CredentialHasher, max_concurrency: usize) -> Self {
        let max_concurrency = max_concurrency.max(1);
        Self {
            hasher: Arc::new(hasher),
            permits: Arc::new(Semaphore::new(max_concurrency)),
            max_concurrency,
        }
    }

    pub fn max_concurrency(&self) -> usize {
        self.max_concurrency
    }

    /// Derivations that can start right now without waiting
    pub fn available(&self) -> usize {
        self.permits.available_permits()
    }

    /// Hash a password on the blocking pool
    pub async fn hash(&self, password: String) -> Result<Credential, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        self.run(move || hasher.hash(&password)).await
    }

    /// Verify a password against stored credential text on the blocking pool
    pub async fn verify(&self, password: String, stored: String) -> Result<bool, AuthError> {
        let hasher = Arc::clone(&self.hasher);
        self.run(move || hasher.verify(&password, &stored)).await
    }

    async fn run<T, F>(&self, job: F) -> Result<T, AuthError>
    where
        F: FnOnce() -> Result<T, AuthError> + Send + 'static,
        T: Send + 'static,
    {
        let permit = Arc::clone(&self.permits).acquire_owned().await.map_err(|_| {
            tracing::error!("Hashing pool semaphore closed");
            AuthError::Internal
        })?;

        // The permit lives with the blocking job, so a dropped caller does not
        // free a slot while its derivation is still running.
        tokio::task::spawn_blocking(move || {
            let _permit = permit;
            job()
        })
        .await
        .map_err(|e| {
            tracing::error!("Key derivation task failed: {:?}", e);
            AuthError::Internal
        })?
    }
}
