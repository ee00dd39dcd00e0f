//! Credential store interface
//!
//! Abstracts the durable storage for user and API-key records. The store is
//! a remote service from this crate's point of view; persistence mechanics
//! live elsewhere. Lookups return `None` for absent rows - transport
//! failures are `StoreError::Backend` and never masquerade as "not found".

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::apikey::ApiKey;
use crate::user::User;

/// Result type for store operations
pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// Errors surfaced by a credential store backend
#[derive(Debug, Error)]
pub enum StoreError {
    /// A uniqueness constraint was violated
    #[error("duplicate {entity}: {key}")]
    Duplicate {
        /// Kind of entity that collided
        entity: &'static str,
        /// Conflicting key
        key: String,
    },

    /// Transport or backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Create a Duplicate error
    pub fn duplicate(entity: &'static str, key: impl Into<String>) -> Self {
        Self::Duplicate {
            entity,
            key: key.into(),
        }
    }

    /// Create a Backend error
    pub fn backend(message: impl Into<String>) -> Self {
        Self::Backend(message.into())
    }
}

/// Durable storage for user and API-key records
///
/// Every call is a potential suspension point against a remote service;
/// callers cancel by dropping the future.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    // Users

    /// Insert a new user; fails with `Duplicate` if the email is taken
    async fn create_user(&self, user: &User) -> StoreResult<()>;

    /// Get user by ID
    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>>;

    /// Get user by normalized email
    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Set the user's last-login timestamp to now
    async fn update_last_login(&self, id: Uuid) -> StoreResult<()>;

    // API keys

    /// Insert a new API key; fails with `Duplicate` if the digest is taken
    async fn create_api_key(&self, key: &ApiKey) -> StoreResult<()>;

    /// Get a key by its secret digest
    async fn get_api_key_by_hash(&self, key_hash: &str) -> StoreResult<Option<ApiKey>>;

    /// Get a key by ID
    async fn get_api_key_by_id(&self, id: Uuid) -> StoreResult<Option<ApiKey>>;

    /// List a user's keys, newest first
    async fn list_api_keys_by_user(&self, user_id: Uuid) -> StoreResult<Vec<ApiKey>>;

    /// Set `revoked_at` on a key
    ///
    /// Returns `false` when the key does not exist or is already revoked;
    /// revocation is one-way and never cleared.
    async fn revoke_api_key(&self, id: Uuid) -> StoreResult<bool>;

    /// Set the key's last-used timestamp to now
    async fn update_api_key_last_used(&self, id: Uuid) -> StoreResult<()>;

    /// Physically delete a key
    ///
    /// Rarely used; revocation is the normal retirement path. Returns
    /// `false` when the key does not exist.
    async fn delete_api_key(&self, id: Uuid) -> StoreResult<bool>;
}
