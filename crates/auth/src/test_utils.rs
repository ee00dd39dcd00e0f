//! Test utilities
//!
//! Real in-memory implementations of the credential store and revocation
//! registry, plus helpers for minting tokens with arbitrary expiries. These
//! exercise the same code paths as production backends - prefer them over
//! mocks.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{Algorithm, EncodingKey, Header, encode};
use uuid::Uuid;

use crate::apikey::ApiKey;
use crate::claims::{AUDIENCE, Claims, ISSUER, TokenKind};
use crate::error::{AuthError, Result};
use crate::revocation::RevocationRegistry;
use crate::store::{CredentialStore, StoreError, StoreResult};
use crate::user::User;

/// In-memory credential store
#[derive(Default)]
pub struct MemoryCredentialStore {
    users: Mutex<Vec<User>>,
    keys: Mutex<Vec<ApiKey>>,
}

impl MemoryCredentialStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create_user(&self, user: &User) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == user.email) {
            return Err(StoreError::duplicate("user", user.email.clone()));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn get_user_by_id(&self, id: Uuid) -> StoreResult<Option<User>> {
        Ok(self.users.lock().unwrap().iter().find(|u| u.id == id).cloned())
    }

    async fn get_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn update_last_login(&self, id: Uuid) -> StoreResult<()> {
        let mut users = self.users.lock().unwrap();
        if let Some(user) = users.iter_mut().find(|u| u.id == id) {
            let now = Utc::now();
            user.last_login_at = Some(now);
            user.updated_at = now;
        }
        Ok(())
    }

    async fn create_api_key(&self, key: &ApiKey) -> StoreResult<()> {
        let mut keys = self.keys.lock().unwrap();
        if keys.iter().any(|k| k.key_hash == key.key_hash) {
            return Err(StoreError::duplicate("api key", key.key_hash.clone()));
        }
        keys.push(key.clone());
        Ok(())
    }

    async fn get_api_key_by_hash(&self, key_hash: &str) -> StoreResult<Option<ApiKey>> {
        Ok(self
            .keys
            .lock()
            .unwrap()
            .iter()
            .find(|k| k.key_hash == key_hash)
            .cloned())
    }

    async fn get_api_key_by_id(&self, id: Uuid) -> StoreResult<Option<ApiKey>> {
        Ok(self.keys.lock().unwrap().iter().find(|k| k.id == id).cloned())
    }

    async fn list_api_keys_by_user(&self, user_id: Uuid) -> StoreResult<Vec<ApiKey>> {
        let mut keys: Vec<ApiKey> = self
            .keys
            .lock()
            .unwrap()
            .iter()
            .filter(|k| k.user_id == user_id)
            .cloned()
            .collect();
        keys.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(keys)
    }

    async fn revoke_api_key(&self, id: Uuid) -> StoreResult<bool> {
        let mut keys = self.keys.lock().unwrap();
        match keys.iter_mut().find(|k| k.id == id && k.revoked_at.is_none()) {
            Some(key) => {
                let now = Utc::now();
                key.revoked_at = Some(now);
                key.updated_at = now;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn update_api_key_last_used(&self, id: Uuid) -> StoreResult<()> {
        let mut keys = self.keys.lock().unwrap();
        if let Some(key) = keys.iter_mut().find(|k| k.id == id) {
            let now = Utc::now();
            key.last_used_at = Some(now);
            key.updated_at = now;
        }
        Ok(())
    }

    async fn delete_api_key(&self, id: Uuid) -> StoreResult<bool> {
        let mut keys = self.keys.lock().unwrap();
        let before = keys.len();
        keys.retain(|k| k.id != id);
        Ok(keys.len() < before)
    }
}

/// In-memory revocation registry with real TTL expiry
#[derive(Default)]
pub struct MemoryRevocationRegistry {
    entries: Mutex<HashMap<String, Instant>>,
}

impl MemoryRevocationRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RevocationRegistry for MemoryRevocationRegistry {
    async fn blacklist(&self, token: &str, ttl: Duration) -> Result<()> {
        self.entries
            .lock()
            .unwrap()
            .insert(token.to_string(), Instant::now() + ttl);
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        entries.retain(|_, deadline| *deadline > now);
        Ok(entries.contains_key(token))
    }
}

/// Revocation registry whose backing store is unreachable
///
/// Every call fails with an internal error - for testing that registry
/// outages propagate instead of reading as "not blacklisted".
#[derive(Default)]
pub struct UnreachableRevocationRegistry;

#[async_trait]
impl RevocationRegistry for UnreachableRevocationRegistry {
    async fn blacklist(&self, _token: &str, _ttl: Duration) -> Result<()> {
        Err(AuthError::internal("registry unreachable"))
    }

    async fn is_blacklisted(&self, _token: &str) -> Result<bool> {
        Err(AuthError::internal("registry unreachable"))
    }
}

/// Sign a token for a user with full control over kind and expiry
///
/// Expiry may be negative to mint an already-expired token; the signature
/// is real, so the full validation path is exercised.
pub fn issue_token_with_expiry(
    secret: &[u8],
    user: &User,
    kind: TokenKind,
    expires_in: chrono::Duration,
) -> String {
    let now = Utc::now();
    let claims = Claims {
        subject: user.id.to_string(),
        email: match kind {
            TokenKind::Access => user.email.clone(),
            TokenKind::Refresh => String::new(),
        },
        name: String::new(),
        organization_id: None,
        role: String::new(),
        tier: String::new(),
        scope: String::new(),
        issued_at: now.timestamp(),
        expires_at: (now + expires_in).timestamp(),
        issuer: ISSUER.to_string(),
        audience: match kind {
            TokenKind::Access => Some(AUDIENCE.to_string()),
            TokenKind::Refresh => None,
        },
        kind,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret),
    )
    .expect("failed to sign test token")
}
