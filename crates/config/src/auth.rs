//! Authentication configuration
//!
//! Token signing, lifetimes, and API key settings for the auth service.

use std::time::Duration;

use serde::Deserialize;

/// Authentication configuration
///
/// # Example
///
/// ```toml
/// [auth]
/// jwt_secret = "your-secret-key-at-least-32-characters-long"
/// access_token_ttl = "15m"
/// refresh_token_ttl = "7d"
/// api_key_prefix = "fv"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Token signing secret (required, at least 32 characters)
    pub jwt_secret: Option<String>,

    /// Access token lifetime
    /// Default: 15 minutes
    #[serde(with = "humantime_serde")]
    pub access_token_ttl: Duration,

    /// Refresh token lifetime
    /// Default: 7 days
    #[serde(with = "humantime_serde")]
    pub refresh_token_ttl: Duration,

    /// Issuer claim on minted tokens
    /// Default: "forensivision"
    pub issuer: String,

    /// Audience claim on minted access tokens
    /// Default: "forensivision-api"
    pub audience: String,

    /// Prefix for generated API key secrets
    /// Default: "fv"
    pub api_key_prefix: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: None,
            access_token_ttl: Duration::from_secs(15 * 60),
            refresh_token_ttl: Duration::from_secs(7 * 24 * 60 * 60),
            issuer: "forensivision".to_string(),
            audience: "forensivision-api".to_string(),
            api_key_prefix: "fv".to_string(),
        }
    }
}

impl AuthConfig {
    /// Get the signing secret as bytes, if set
    pub fn jwt_secret_bytes(&self) -> Option<&[u8]> {
        self.jwt_secret.as_ref().map(|s| s.as_bytes())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        let secret = self
            .jwt_secret
            .as_ref()
            .ok_or("auth.jwt_secret is required")?;
        if secret.len() < 32 {
            return Err("auth.jwt_secret must be at least 32 characters".to_string());
        }
        if self.access_token_ttl.is_zero() {
            return Err("auth.access_token_ttl must be non-zero".to_string());
        }
        if self.refresh_token_ttl <= self.access_token_ttl {
            return Err(
                "auth.refresh_token_ttl must be longer than auth.access_token_ttl".to_string(),
            );
        }
        if self.api_key_prefix.is_empty() || !self.api_key_prefix.chars().all(|c| c.is_ascii_lowercase()) {
            return Err("auth.api_key_prefix must be lowercase ascii".to_string());
        }
        Ok(())
    }
}
