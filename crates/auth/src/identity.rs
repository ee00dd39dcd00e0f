//! Authenticated identity
//!
//! The uniform result of authenticating a bearer credential, whichever kind
//! it turned out to be: who the caller is, what scopes they hold, and which
//! credential path proved it.

use serde::Serialize;
use uuid::Uuid;

use crate::apikey::ApiKey;
use crate::claims::Claims;
use crate::error::Result;
use crate::tier::{Role, Tier};
use crate::user::User;

/// Which credential kind authenticated the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    /// Signed session access token
    AccessToken,
    /// Opaque API key
    ApiKey,
}

impl AuthMethod {
    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AccessToken => "access_token",
            Self::ApiKey => "api_key",
        }
    }
}

impl std::fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Authenticated caller identity with granted scopes
#[derive(Debug, Clone, Serialize)]
pub struct AuthIdentity {
    /// User ID
    pub user_id: Uuid,
    /// Email address (empty for API keys of deleted-email accounts)
    pub email: String,
    /// Display name
    pub name: String,
    /// Organization, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization_id: Option<String>,
    /// Role claim as presented (string-typed on the wire)
    pub role: String,
    /// Tier claim as presented
    pub tier: String,
    /// Granted scopes
    pub scopes: Vec<String>,
    /// Credential path that authenticated the caller
    pub method: AuthMethod,
}

impl AuthIdentity {
    /// Build an identity from validated access-token claims
    pub fn from_claims(claims: &Claims) -> Result<Self> {
        Ok(Self {
            user_id: claims.subject_id()?,
            email: claims.email.clone(),
            name: claims.name.clone(),
            organization_id: claims.organization_id.clone(),
            role: claims.role.clone(),
            tier: claims.tier.clone(),
            scopes: claims.scopes(),
            method: AuthMethod::AccessToken,
        })
    }

    /// Build an identity from a validated API key and its owner
    ///
    /// Scopes come from the key, not from the owner's tier - a key grants
    /// exactly what it was created with.
    pub fn from_api_key(key: &ApiKey, user: &User) -> Self {
        Self {
            user_id: user.id,
            email: user.email.clone(),
            name: user.name.clone(),
            organization_id: key.organization_id.map(|id| id.to_string()),
            role: user.role.as_str().to_string(),
            tier: user.tier.as_str().to_string(),
            scopes: key.scopes.clone(),
            method: AuthMethod::ApiKey,
        }
    }

    /// Parsed role (defaults to Viewer when unknown)
    pub fn parsed_role(&self) -> Role {
        Role::parse(&self.role).unwrap_or(Role::Viewer)
    }

    /// Parsed tier, if known
    pub fn parsed_tier(&self) -> Option<Tier> {
        Tier::parse(&self.tier)
    }

    /// Whether a scope was granted
    pub fn has_scope(&self, scope: &str) -> bool {
        self.scopes.iter().any(|s| s == scope)
    }
}
