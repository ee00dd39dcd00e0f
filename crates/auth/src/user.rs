//! User account records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::tier::{Role, Tier};

/// A user account
///
/// The password hash is never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// User ID
    pub id: Uuid,
    /// Email address (unique, stored normalized)
    pub email: String,
    /// Argon2 password hash
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    /// Display name
    pub name: String,
    /// Organization this user belongs to, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<Uuid>,
    /// User's role
    pub role: Role,
    /// Account plan tier
    pub tier: Tier,
    /// Whether the email address has been verified
    pub email_verified: bool,
    /// Whether multi-factor auth is enabled (verification flow lives elsewhere)
    pub mfa_enabled: bool,
    /// When the account was created
    pub created_at: DateTime<Utc>,
    /// When the account was last updated
    pub updated_at: DateTime<Utc>,
    /// When the user last logged in
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_login_at: Option<DateTime<Utc>>,
}

impl User {
    /// Create a new account record with registration defaults
    ///
    /// New accounts start as `Owner` on the `Free` tier, unverified.
    pub fn new(email: impl Into<String>, password_hash: impl Into<String>, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash: password_hash.into(),
            name: name.into(),
            organization_id: None,
            role: Role::Owner,
            tier: Tier::Free,
            email_verified: false,
            mfa_enabled: false,
            created_at: now,
            updated_at: now,
            last_login_at: None,
        }
    }
}

/// Normalize an email address for storage and lookup
///
/// Emails are matched case-insensitively with surrounding whitespace ignored.
pub fn normalize_email(raw: &str) -> String {
    raw.trim().to_lowercase()
}
