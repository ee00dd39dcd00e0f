//! Session token codec
//!
//! Mints and validates the two session token kinds from one user record:
//! a short-lived access token carrying the full identity and scope string,
//! and a long-lived refresh token carrying only the subject. Both are signed
//! with a single shared secret using HMAC-SHA256; the algorithm is pinned on
//! decode, so a token signed with anything else fails validation.

use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::Serialize;
use tracing::debug;

use crate::claims::{AUDIENCE, Claims, ISSUER, TokenKind};
use crate::error::{AuthError, Result};
use crate::user::User;

/// Default access token lifetime
pub const DEFAULT_ACCESS_TTL: StdDuration = StdDuration::from_secs(15 * 60);

/// Default refresh token lifetime
pub const DEFAULT_REFRESH_TTL: StdDuration = StdDuration::from_secs(7 * 24 * 60 * 60);

/// A freshly minted token pair
///
/// Ephemeral - never persisted server-side. The refresh token's only
/// server-side trace is a revocation entry once it is rotated out.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    /// Signed access token
    pub access_token: String,
    /// Signed refresh token
    pub refresh_token: String,
    /// Token type label for the Authorization header
    pub token_type: String,
    /// Access token lifetime in seconds
    pub expires_in: i64,
    /// Absolute access token expiry
    pub expires_at: DateTime<Utc>,
}

/// Signs, parses, and verifies session tokens
pub struct TokenCodec {
    encoding_key: EncodingKey,
    access_validation: Validation,
    refresh_validation: Validation,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    access_ttl: StdDuration,
    refresh_ttl: StdDuration,
}

impl std::fmt::Debug for TokenCodec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenCodec")
            .field("algorithm", &"HS256")
            .field("issuer", &self.issuer)
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish()
    }
}

impl TokenCodec {
    /// Create a codec with default lifetimes, issuer, and audience
    ///
    /// # Panics
    ///
    /// Panics if the signing secret is less than 32 bytes.
    pub fn new(secret: &[u8]) -> Self {
        assert!(
            secret.len() >= 32,
            "token signing secret must be at least 32 bytes"
        );

        let mut codec = Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            access_validation: Validation::new(Algorithm::HS256),
            refresh_validation: Validation::new(Algorithm::HS256),
            issuer: ISSUER.to_string(),
            audience: AUDIENCE.to_string(),
            access_ttl: DEFAULT_ACCESS_TTL,
            refresh_ttl: DEFAULT_REFRESH_TTL,
        };
        codec.rebuild_validations();
        codec
    }

    /// Set the access token lifetime
    pub fn with_access_ttl(mut self, ttl: StdDuration) -> Self {
        self.access_ttl = ttl;
        self
    }

    /// Set the refresh token lifetime
    pub fn with_refresh_ttl(mut self, ttl: StdDuration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    /// Set the issuer claim
    pub fn with_issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self.rebuild_validations();
        self
    }

    /// Set the audience claim for access tokens
    pub fn with_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self.rebuild_validations();
        self
    }

    /// Refresh token lifetime (used as the fallback blacklist TTL)
    pub fn refresh_ttl(&self) -> StdDuration {
        self.refresh_ttl
    }

    fn rebuild_validations(&mut self) {
        // Only HS256 is accepted; a token whose header names any other
        // algorithm fails before signature verification.
        let mut access = Validation::new(Algorithm::HS256);
        access.validate_exp = true;
        access.set_required_spec_claims(&["exp"]);
        access.set_issuer(&[&self.issuer]);
        access.set_audience(&[&self.audience]);
        self.access_validation = access;

        let mut refresh = Validation::new(Algorithm::HS256);
        refresh.validate_exp = true;
        refresh.set_required_spec_claims(&["exp"]);
        refresh.set_issuer(&[&self.issuer]);
        // Refresh tokens carry no audience claim.
        refresh.validate_aud = false;
        self.refresh_validation = refresh;
    }

    /// Mint an access/refresh pair for a user
    pub fn issue_pair(&self, user: &User, scopes: &[&str]) -> Result<TokenPair> {
        let now = Utc::now();
        let access_expiry = now + to_chrono(self.access_ttl)?;
        let refresh_expiry = now + to_chrono(self.refresh_ttl)?;

        let access_claims = Claims {
            subject: user.id.to_string(),
            email: user.email.clone(),
            name: user.name.clone(),
            organization_id: user.organization_id.map(|id| id.to_string()),
            role: user.role.as_str().to_string(),
            tier: user.tier.as_str().to_string(),
            scope: scopes.join(" "),
            issued_at: now.timestamp(),
            expires_at: access_expiry.timestamp(),
            issuer: self.issuer.clone(),
            audience: Some(self.audience.clone()),
            kind: TokenKind::Access,
        };

        let refresh_claims = Claims {
            subject: user.id.to_string(),
            email: String::new(),
            name: String::new(),
            organization_id: None,
            role: String::new(),
            tier: String::new(),
            scope: String::new(),
            issued_at: now.timestamp(),
            expires_at: refresh_expiry.timestamp(),
            issuer: self.issuer.clone(),
            audience: None,
            kind: TokenKind::Refresh,
        };

        let access_token = self.sign(&access_claims)?;
        let refresh_token = self.sign(&refresh_claims)?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: "Bearer".to_string(),
            expires_in: self.access_ttl.as_secs() as i64,
            expires_at: access_expiry,
        })
    }

    /// Validate a token of the expected kind and return its claims
    ///
    /// Fails with `TokenExpired` when the expiry has passed, `InvalidToken`
    /// when the signature, structure, or kind tag mismatches.
    pub fn validate(&self, token: &str, expected: TokenKind) -> Result<Claims> {
        let validation = match expected {
            TokenKind::Access => &self.access_validation,
            TokenKind::Refresh => &self.refresh_validation,
        };

        let data = decode::<Claims>(token, &self.decoding_key, validation).map_err(|e| {
            debug!(kind = %expected, error = ?e, "token validation failed");
            match e.kind() {
                jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => AuthError::InvalidToken,
            }
        })?;

        let claims = data.claims;
        if claims.kind != expected {
            return Err(AuthError::InvalidToken);
        }

        Ok(claims)
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key)
            .map_err(|e| AuthError::internal(format!("failed to sign token: {}", e)))
    }
}

fn to_chrono(ttl: StdDuration) -> Result<Duration> {
    Duration::from_std(ttl).map_err(|e| AuthError::internal(format!("invalid token ttl: {}", e)))
}
