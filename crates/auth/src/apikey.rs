//! API key records and secret generation
//!
//! API keys are opaque bearer secrets for machine clients. The full secret
//! is composed as `{prefix}_{environment}_sk_{random}` and returned to the
//! caller exactly once at creation; only a SHA-256 digest and a truncated
//! display prefix are ever stored, so the secret is unrecoverable afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tier::KeyEnvironment;
use crate::user::User;

/// Random bytes drawn per secret
pub const SECRET_RANDOM_BYTES: usize = 32;

/// Length of the non-secret display prefix
pub const DISPLAY_PREFIX_LEN: usize = 20;

/// An API key record
///
/// The secret digest is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiKey {
    /// Key ID
    pub id: Uuid,
    /// Owning user
    pub user_id: Uuid,
    /// Organization the key belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    /// Human-readable label
    pub name: String,
    /// Truncated, non-secret prefix for UI listing
    pub key_prefix: String,
    /// SHA-256 hex digest of the full secret (unique across all keys)
    #[serde(skip_serializing, default)]
    pub key_hash: String,
    /// Scopes granted to this key
    pub scopes: Vec<String>,
    /// Environment tag
    pub environment: KeyEnvironment,
    /// When the key was last used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_used_at: Option<DateTime<Utc>>,
    /// When the key expires (None = never)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Source IPs allowed to present this key (enforced at the edge)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_allowlist: Option<Vec<String>>,
    /// Rate limit (requests per window), derived from the owner's tier
    pub rate_limit: u32,
    /// When the key was created
    pub created_at: DateTime<Utc>,
    /// When the key was last updated
    pub updated_at: DateTime<Utc>,
    /// When the key was revoked - once set, never cleared
    #[serde(skip_serializing_if = "Option::is_none")]
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Parameters for creating an API key
#[derive(Debug, Clone)]
pub struct NewApiKey {
    /// Human-readable label
    pub name: String,
    /// Environment tag
    pub environment: KeyEnvironment,
    /// Scopes to grant
    pub scopes: Vec<String>,
    /// Optional expiry
    pub expires_at: Option<DateTime<Utc>>,
    /// Optional IP allowlist
    pub ip_allowlist: Option<Vec<String>>,
}

impl NewApiKey {
    /// Create parameters with just a label and environment
    pub fn new(name: impl Into<String>, environment: KeyEnvironment, scopes: Vec<String>) -> Self {
        Self {
            name: name.into(),
            environment,
            scopes,
            expires_at: None,
            ip_allowlist: None,
        }
    }
}

impl ApiKey {
    /// Create a new key for a user (returns the full secret and the record)
    ///
    /// The secret must be shown to the caller once and never stored. The
    /// rate limit comes from the owner's tier; the organization linkage is
    /// inherited from the owner.
    pub fn create(user: &User, prefix: &str, params: NewApiKey) -> (String, Self) {
        let secret = generate_secret(prefix, params.environment);
        let key_prefix = display_prefix(&secret);
        let key_hash = hash_secret(&secret);
        let now = Utc::now();

        let key = Self {
            id: Uuid::new_v4(),
            user_id: user.id,
            organization_id: user.organization_id,
            name: params.name,
            key_prefix,
            key_hash,
            scopes: params.scopes,
            environment: params.environment,
            last_used_at: None,
            expires_at: params.expires_at,
            ip_allowlist: params.ip_allowlist,
            rate_limit: user.tier.rate_limit(),
            created_at: now,
            updated_at: now,
            revoked_at: None,
        };

        (secret, key)
    }

    /// Whether the expiry has passed
    pub fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(expires) => expires < Utc::now(),
            None => false,
        }
    }

    /// Whether the key has been revoked
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Whether the key may authenticate a request
    ///
    /// A revoked or expired key is never usable, even when the digest still
    /// matches a stored row.
    pub fn is_usable(&self) -> bool {
        !self.is_revoked() && !self.is_expired()
    }
}

/// Generate a full API key secret
///
/// Format: `{prefix}_{environment}_sk_{urlsafe-base64(32 random bytes)}`,
/// e.g. `fv_live_sk_<43 chars>`.
pub fn generate_secret(prefix: &str, environment: KeyEnvironment) -> String {
    use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
    use rand::Rng;

    let mut rng = rand::rng();
    let random_bytes: [u8; SECRET_RANDOM_BYTES] = rng.random();
    format!(
        "{}_{}_sk_{}",
        prefix,
        environment,
        URL_SAFE_NO_PAD.encode(random_bytes)
    )
}

/// Truncated display prefix of a secret (first 20 chars plus ellipsis)
pub fn display_prefix(secret: &str) -> String {
    let head: String = secret.chars().take(DISPLAY_PREFIX_LEN).collect();
    format!("{}...", head)
}

/// Hash an API key secret using SHA-256
///
/// SHA-256 rather than Argon2: the secret is high-entropy (256 bits), keys
/// are checked on every request, and the digest doubles as the lookup key.
pub fn hash_secret(secret: &str) -> String {
    use sha2::{Digest, Sha256};
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}
