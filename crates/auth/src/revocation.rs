//! Refresh token revocation registry
//!
//! A TTL-backed set recording refresh tokens that must no longer be honored.
//! Entries carry a TTL equal to the token's remaining lifetime, so they
//! expire exactly when the token would anyway and never need explicit
//! deletion. Backed by a shared key-value store with native TTL support;
//! lookup failures propagate as errors rather than reading as "not
//! blacklisted".

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::debug;

use crate::error::{AuthError, Result};

/// Registry key for a refresh token
fn registry_key(token: &str) -> String {
    format!("blacklist:{}", token)
}

/// TTL-backed set of revoked refresh tokens
#[async_trait]
pub trait RevocationRegistry: Send + Sync {
    /// Mark a refresh token unusable for `ttl`
    async fn blacklist(&self, token: &str, ttl: Duration) -> Result<()>;

    /// Whether a refresh token has been blacklisted
    async fn is_blacklisted(&self, token: &str) -> Result<bool>;
}

/// Revocation registry backed by Redis
///
/// Uses `SET ... EX` for entries and `EXISTS` for lookups; Redis expires
/// entries natively.
#[derive(Clone)]
pub struct RedisRevocationRegistry {
    conn: redis::aio::ConnectionManager,
}

impl std::fmt::Debug for RedisRevocationRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedisRevocationRegistry").finish()
    }
}

impl RedisRevocationRegistry {
    /// Connect to a Redis instance, e.g. `redis://127.0.0.1:6379`
    ///
    /// The connection manager reconnects automatically on failure.
    pub async fn connect(url: &str) -> Result<Self> {
        let client = redis::Client::open(url)
            .map_err(|e| AuthError::internal(format!("invalid registry url: {}", e)))?;
        let conn = client
            .get_connection_manager()
            .await
            .map_err(|e| AuthError::internal(format!("registry connection failed: {}", e)))?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl RevocationRegistry for RedisRevocationRegistry {
    async fn blacklist(&self, token: &str, ttl: Duration) -> Result<()> {
        let mut conn = self.conn.clone();
        let seconds = ttl.as_secs().max(1);
        conn.set_ex::<_, _, ()>(registry_key(token), 1u8, seconds)
            .await
            .map_err(|e| AuthError::internal(format!("registry write failed: {}", e)))?;
        debug!(ttl_secs = seconds, "refresh token blacklisted");
        Ok(())
    }

    async fn is_blacklisted(&self, token: &str) -> Result<bool> {
        let mut conn = self.conn.clone();
        conn.exists(registry_key(token))
            .await
            .map_err(|e| AuthError::internal(format!("registry lookup failed: {}", e)))
    }
}
