//! Account tiers, roles, and scope policy
//!
//! Static policy tables: each tier maps to a default scope set and a rate
//! limit. Tiers form an ordered hierarchy for scope inclusion:
//!
//! - `Free` - analysis and result reads only
//! - `Creator` - adds usage visibility
//! - `Professional` - adds exports and webhooks
//! - `Business` / `Enterprise` - add billing (currently identical)
//!
//! The tables are plain `match` arms, immutable for the process lifetime.
//! Unknown tier strings fall back to the base (creator) scope set for scopes
//! and to the free rate limit for rate limits - two deliberately independent
//! fallbacks, never to an empty grant.

use std::fmt;

use serde::{Deserialize, Serialize};

// Scope catalogue (closed set)

/// Read analysis jobs and their status
pub const SCOPE_ANALYZE_READ: &str = "analyze:read";
/// Submit analysis jobs
pub const SCOPE_ANALYZE_WRITE: &str = "analyze:write";
/// Read analysis results
pub const SCOPE_RESULTS_READ: &str = "results:read";
/// Export analysis results
pub const SCOPE_RESULTS_EXPORT: &str = "results:export";
/// Manage webhook endpoints
pub const SCOPE_WEBHOOKS_MANAGE: &str = "webhooks:manage";
/// Read usage metering
pub const SCOPE_USAGE_READ: &str = "usage:read";
/// Read billing data
pub const SCOPE_BILLING_READ: &str = "billing:read";
/// Change billing data
pub const SCOPE_BILLING_WRITE: &str = "billing:write";
/// Full administrative access
pub const SCOPE_ADMIN_ALL: &str = "admin:*";

/// Account plan tier (ordered hierarchy)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    /// Entry plan
    Free = 0,
    /// Individual creators
    Creator = 1,
    /// Professional users
    Professional = 2,
    /// Teams
    Business = 3,
    /// Large organizations
    Enterprise = 4,
}

impl Tier {
    /// Parse tier from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "free" => Some(Self::Free),
            "creator" => Some(Self::Creator),
            "professional" => Some(Self::Professional),
            "business" => Some(Self::Business),
            "enterprise" => Some(Self::Enterprise),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Free => "free",
            Self::Creator => "creator",
            Self::Professional => "professional",
            Self::Business => "business",
            Self::Enterprise => "enterprise",
        }
    }

    /// Default scopes granted to this tier
    ///
    /// Each tier's set is a superset of the previous tier's.
    pub fn default_scopes(self) -> Vec<&'static str> {
        match self {
            Self::Free => vec![SCOPE_ANALYZE_READ, SCOPE_ANALYZE_WRITE, SCOPE_RESULTS_READ],
            Self::Creator => base_scopes(),
            Self::Professional => {
                let mut scopes = base_scopes();
                scopes.extend([SCOPE_RESULTS_EXPORT, SCOPE_WEBHOOKS_MANAGE]);
                scopes
            }
            Self::Business | Self::Enterprise => {
                let mut scopes = base_scopes();
                scopes.extend([
                    SCOPE_RESULTS_EXPORT,
                    SCOPE_WEBHOOKS_MANAGE,
                    SCOPE_BILLING_READ,
                    SCOPE_BILLING_WRITE,
                ]);
                scopes
            }
        }
    }

    /// Rate limit for this tier (requests per window)
    pub fn rate_limit(self) -> u32 {
        match self {
            Self::Free => 20,
            Self::Creator => 60,
            Self::Professional => 300,
            Self::Business => 1000,
            Self::Enterprise => 5000,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Base scope set shared from the creator tier upwards
fn base_scopes() -> Vec<&'static str> {
    vec![
        SCOPE_ANALYZE_READ,
        SCOPE_ANALYZE_WRITE,
        SCOPE_RESULTS_READ,
        SCOPE_USAGE_READ,
    ]
}

/// Default scopes for a tier string
///
/// Unknown tiers fall back to the base (creator) scope set, never to empty.
pub fn scopes_for(tier: &str) -> Vec<&'static str> {
    match Tier::parse(tier) {
        Some(tier) => tier.default_scopes(),
        None => base_scopes(),
    }
}

/// Rate limit for a tier string
///
/// Unknown tiers fall back to the free rate limit.
pub fn rate_limit_for(tier: &str) -> u32 {
    match Tier::parse(tier) {
        Some(tier) => tier.rate_limit(),
        None => Tier::Free.rate_limit(),
    }
}

/// User role in an account
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Account owner
    Owner,
    /// Account administrator
    Admin,
    /// Runs analyses, reads results
    Analyst,
    /// Read-only access
    Viewer,
    /// Machine access only, no dashboard login
    ApiOnly,
}

impl Role {
    /// Parse role from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "owner" => Some(Self::Owner),
            "admin" => Some(Self::Admin),
            "analyst" => Some(Self::Analyst),
            "viewer" => Some(Self::Viewer),
            "api_only" => Some(Self::ApiOnly),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Owner => "owner",
            Self::Admin => "admin",
            Self::Analyst => "analyst",
            Self::Viewer => "viewer",
            Self::ApiOnly => "api_only",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Environment tag for API keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyEnvironment {
    /// Production keys
    Live,
    /// Test keys
    Test,
}

impl KeyEnvironment {
    /// Parse environment from string
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "live" => Some(Self::Live),
            "test" => Some(Self::Test),
            _ => None,
        }
    }

    /// Convert to string
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Live => "live",
            Self::Test => "test",
        }
    }
}

impl fmt::Display for KeyEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
