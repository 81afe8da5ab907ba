//! Account Directory
//!
//! Persistent store of account records. The gate only needs lookups by email
//! and id, account creation, and credential replacement. Email uniqueness is
//! enforced here, not by the callers.

use crate::error::AuthError;
use crate::models::{Account, NewAccount};

use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Storage backend for account records
#[async_trait]
pub trait AccountDirectory: Send + Sync {
    /// Find an account by email (case-insensitive)
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError>;

    /// Find an account by id
    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AuthError>;

    /// Create an account; fails with [`AuthError::EmailExists`] if the email is taken
    async fn create(&self, account: NewAccount) -> Result<Account, AuthError>;

    /// Replace the stored credential text of an account
    async fn update_credential(&self, id: i64, credential: &str) -> Result<(), AuthError>;
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

// ============================================
// In-memory directory
// ============================================

#[derive(Debug, Default)]
struct Accounts {
    next_id: i64,
    by_id: HashMap<i64, Account>,
}

/// Process-local directory for development and tests
#[derive(Debug, Default)]
pub struct InMemoryDirectory {
    accounts: RwLock<Accounts>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.accounts.read().await.by_id.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AccountDirectory for InMemoryDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let email = normalize_email(email);
        let accounts = self.accounts.read().await;
        Ok(accounts.by_id.values().find(|a| a.email == email).cloned())
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AuthError> {
        Ok(self.accounts.read().await.by_id.get(&id).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        let email = normalize_email(&account.email);
        let mut accounts = self.accounts.write().await;

        if accounts.by_id.values().any(|a| a.email == email) {
            return Err(AuthError::EmailExists);
        }

        accounts.next_id += 1;
        let created = Account {
            id: accounts.next_id,
            email,
            name: account.name,
            credential: account.credential,
            created_at: Utc::now(),
        };
        accounts.by_id.insert(created.id, created.clone());

        Ok(created)
    }

    async fn update_credential(&self, id: i64, credential: &str) -> Result<(), AuthError> {
        let mut accounts = self.accounts.write().await;
        let account = accounts.by_id.get_mut(&id).ok_or(AuthError::UserNotFound)?;
        account.credential = credential.to_string();
        Ok(())
    }
}

// ============================================
// Postgres directory
// ============================================

/// Postgres-backed directory
#[derive(Debug, Clone)]
pub struct PgDirectory {
    db: PgPool,
}

impl PgDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Get reference to the database pool
    pub fn db(&self) -> &PgPool {
        &self.db
    }

    /// Create the users table if it does not exist
    pub async fn migrate(&self) -> Result<(), AuthError> {
        tracing::info!("Running account directory migrations");

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id BIGSERIAL PRIMARY KEY,
                email VARCHAR(255) NOT NULL UNIQUE,
                name VARCHAR(50) NOT NULL,
                password VARCHAR(255) NOT NULL,
                created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
            );
            "#,
        )
        .execute(&self.db)
        .await?;

        tracing::info!("Account directory migrations completed");
        Ok(())
    }
}

const ACCOUNT_COLUMNS: &str = "id, email, name, password, created_at";

#[async_trait]
impl AccountDirectory for PgDirectory {
    async fn find_by_email(&self, email: &str) -> Result<Option<Account>, AuthError> {
        let account = sqlx::query_as(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(normalize_email(email))
        .fetch_optional(&self.db)
        .await?;
        Ok(account)
    }

    async fn find_by_id(&self, id: i64) -> Result<Option<Account>, AuthError> {
        let account = sqlx::query_as(&format!("SELECT {ACCOUNT_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&self.db)
            .await?;
        Ok(account)
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AuthError> {
        let result = sqlx::query_as::<_, Account>(&format!(
            "INSERT INTO users (email, name, password) VALUES ($1, $2, $3) RETURNING {ACCOUNT_COLUMNS}"
        ))
        .bind(normalize_email(&account.email))
        .bind(&account.name)
        .bind(&account.credential)
        .fetch_one(&self.db)
        .await;

        match result {
            Ok(created) => Ok(created),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => Err(AuthError::EmailExists),
            Err(e) => Err(e.into()),
        }
    }

    async fn update_credential(&self, id: i64, credential: &str) -> Result<(), AuthError> {
        let result = sqlx::query("UPDATE users SET password = $1 WHERE id = $2")
            .bind(credential)
            .bind(id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn new_account(email: &str) -> NewAccount {
        NewAccount {
            email: email.to_string(),
            name: "Ada".to_string(),
            credential: "c2FsdHNhbHRzYWx0:ZGlnZXN0".to_string(),
        }
    }

    #[tokio::test]
    async fn test_create_and_find() {
        let directory = InMemoryDirectory::new();
        assert!(directory.is_empty().await);

        let created = directory.create(new_account("Ada@Example.com")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.email, "ada@example.com");

        let by_email = directory.find_by_email("ADA@example.com").await.unwrap();
        assert_eq!(by_email.map(|a| a.id), Some(created.id));

        let by_id = directory.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");

        assert!(directory.find_by_id(99).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let directory = InMemoryDirectory::new();
        directory.create(new_account("ada@example.com")).await.unwrap();

        let result = directory.create(new_account(" ADA@example.com ")).await;
        assert_eq!(result.unwrap_err(), AuthError::EmailExists);
        assert_eq!(directory.len().await, 1);
    }

    #[tokio::test]
    async fn test_update_credential() {
        let directory = InMemoryDirectory::new();
        let created = directory.create(new_account("ada@example.com")).await.unwrap();

        directory.update_credential(created.id, "bmV3c2FsdHNhbHQ:bmV3").await.unwrap();
        let updated = directory.find_by_id(created.id).await.unwrap().unwrap();
        assert_eq!(updated.credential, "bmV3c2FsdHNhbHQ:bmV3");

        let missing = directory.update_credential(42, "x:y").await;
        assert_eq!(missing, Err(AuthError::UserNotFound));
    }
}
