//! Forensivision - Authentication
//!
//! Credential and token management for the multi-tenant API platform:
//! password login, short-lived session tokens paired with long-lived
//! revocable refresh tokens, and long-lived API keys for machine clients.
//!
//! # Two Credential Kinds
//!
//! ## Session tokens
//!
//! Signed compact tokens (HMAC-SHA256) minted as a pair on login:
//! a 15-minute access token carrying identity, role, tier, and scopes, and a
//! 7-day refresh token carrying only the subject. Refresh tokens are
//! single-use - exchanging one blacklists it in a TTL-backed revocation
//! registry.
//!
//! ## API keys
//!
//! Opaque bearer secrets for machine-to-machine access:
//! ```text
//! fv_live_sk_y1hT...43 url-safe chars...
//! ```
//! Only a SHA-256 digest is stored; the full secret is shown once at
//! creation and unrecoverable afterwards.
//!
//! # Scopes and Tiers
//!
//! Each account tier maps to a default scope set and a rate limit; API keys
//! carry their own scope list fixed at creation. See [`tier`] for the
//! tables.
//!
//! [`AuthService`] composes everything; [`validate_bearer`] authenticates a
//! credential of either kind behind one call.
//!
//! [`validate_bearer`]: AuthService::validate_bearer

mod apikey;
mod claims;
mod error;
mod identity;
mod last_used;
pub mod password;
mod revocation;
mod service;
mod store;
pub mod tier;
mod token;
mod user;
mod validator;

/// Test utilities: in-memory store and registry, token minting helpers
pub mod test_utils;

// Errors
pub use error::{AuthError, Result};

// Models
pub use apikey::{
    ApiKey, DISPLAY_PREFIX_LEN, NewApiKey, SECRET_RANDOM_BYTES, display_prefix, generate_secret,
    hash_secret,
};
pub use user::{User, normalize_email};

// Policy
pub use tier::{KeyEnvironment, Role, Tier, rate_limit_for, scopes_for};

// Token codec
pub use claims::{AUDIENCE, Claims, ISSUER, TokenKind};
pub use token::{DEFAULT_ACCESS_TTL, DEFAULT_REFRESH_TTL, TokenCodec, TokenPair};

// Credential store interface
pub use store::{CredentialStore, StoreError, StoreResult};

// Revocation registry
pub use revocation::{RedisRevocationRegistry, RevocationRegistry};

// Background last-used updates
pub use last_used::{LastUsedHandle, LastUsedUpdater};

// Bearer credential dispatch
pub use identity::{AuthIdentity, AuthMethod};
pub use validator::{AccessTokenValidator, ApiKeyValidator, CredentialValidator};

// Orchestrator
pub use service::{AuthService, AuthServiceConfig};
