//! Revocation registry configuration

use serde::Deserialize;

/// Revocation registry (Redis) configuration
///
/// # Example
///
/// ```toml
/// [registry]
/// url = "redis://127.0.0.1:6379"
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// Redis connection URL
    /// Default: "redis://127.0.0.1:6379"
    pub url: String,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            url: "redis://127.0.0.1:6379".to_string(),
        }
    }
}

impl RegistryConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if !self.url.starts_with("redis://") && !self.url.starts_with("rediss://") {
            return Err(format!(
                "registry.url must be a redis:// or rediss:// url, got '{}'",
                self.url
            ));
        }
        Ok(())
    }
}
