//! Session token claims
//!
//! Wire layout of the signed token payload. Access tokens carry the full
//! identity plus a space-joined scope string; refresh tokens carry only the
//! subject, issuer, and timestamps.

use chrono::{TimeZone, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use uuid::Uuid;

use crate::error::{AuthError, Result};
use crate::tier::{Role, Tier};

/// Issuer claim on every token
pub const ISSUER: &str = "forensivision";

/// Audience claim on access tokens
pub const AUDIENCE: &str = "forensivision-api";

/// Kind tag distinguishing the two token types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenKind {
    /// Short-lived token proving identity for a single request window
    Access,
    /// Long-lived token exchanged for a fresh pair, single-use
    Refresh,
}

impl TokenKind {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        }
    }
}

impl std::fmt::Display for TokenKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Decoded session token payload
///
/// Every field except the subject defaults to empty when absent, so access
/// and refresh tokens share one claim shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID) - the only mandatory claim
    #[serde(rename = "sub")]
    pub subject: String,

    /// User email (access tokens only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,

    /// Display name (access tokens only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub name: String,

    /// Organization ID, if the user belongs to one
    #[serde(rename = "org_id", default, skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,

    /// User's role (access tokens only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub role: String,

    /// Account tier (access tokens only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub tier: String,

    /// Space-joined scope list (access tokens only)
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub scope: String,

    /// Issued at (Unix timestamp)
    #[serde(rename = "iat")]
    pub issued_at: i64,

    /// Expiration time (Unix timestamp)
    #[serde(rename = "exp")]
    pub expires_at: i64,

    /// Issuer
    #[serde(rename = "iss", default, skip_serializing_if = "String::is_empty")]
    pub issuer: String,

    /// Audience (access tokens only)
    #[serde(rename = "aud", default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,

    /// Token kind tag
    #[serde(rename = "type")]
    pub kind: TokenKind,
}

impl Claims {
    /// Subject parsed as a user ID
    pub fn subject_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.subject).map_err(|_| AuthError::InvalidToken)
    }

    /// Scope string split into individual scopes
    pub fn scopes(&self) -> Vec<String> {
        self.scope
            .split_whitespace()
            .map(str::to_string)
            .collect()
    }

    /// Parsed role (defaults to Viewer when absent or unknown)
    pub fn parsed_role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Viewer)
    }

    /// Parsed tier, if the claim holds a known tier
    pub fn parsed_tier(&self) -> Option<Tier> {
        Tier::parse(&self.tier)
    }

    /// Remaining lifetime from now, floored at one second
    ///
    /// Used as the blacklist TTL so a revocation entry self-expires exactly
    /// when the token would anyway.
    pub fn remaining_lifetime(&self) -> Duration {
        let now = Utc::now().timestamp();
        Duration::from_secs(self.expires_at.saturating_sub(now).max(1) as u64)
    }

    /// Whether the expiry timestamp has passed
    pub fn is_expired(&self) -> bool {
        match Utc.timestamp_opt(self.expires_at, 0).single() {
            Some(exp) => exp < Utc::now(),
            None => true,
        }
    }
}
