//! Forensivision - Configuration
//!
//! TOML-based configuration loading with sensible defaults. A minimal config
//! only needs the signing secret - everything else has a working default.
//!
//! # Parsing
//!
//! Use the `FromStr` trait to parse configuration:
//!
//! ```
//! use fv_config::Config;
//! use std::str::FromStr;
//!
//! let config = Config::from_str(
//!     "[auth]\njwt_secret = \"a-secret-that-is-at-least-32-chars\"",
//! )
//! .unwrap();
//! assert!(config.validate().is_ok());
//! ```
//!
//! # Example Full Config
//!
//! ```toml
//! [auth]
//! jwt_secret = "a-secret-that-is-at-least-32-chars"
//! access_token_ttl = "15m"
//! refresh_token_ttl = "7d"
//! api_key_prefix = "fv"
//!
//! [registry]
//! url = "redis://127.0.0.1:6379"
//!
//! [log]
//! level = "info"
//! format = "json"
//! ```

mod auth;
mod error;
mod logging;
mod registry;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::Deserialize;

pub use auth::AuthConfig;
pub use error::{ConfigError, Result};
pub use logging::{LogConfig, LogFormat, LogLevel};
pub use registry::RegistryConfig;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Authentication settings
    pub auth: AuthConfig,

    /// Revocation registry settings
    pub registry: RegistryConfig,

    /// Logging settings
    pub log: LogConfig,
}

impl Config {
    /// Load configuration from a file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .map_err(|e| ConfigError::io_error(path.display().to_string(), e))?;
        contents.parse()
    }

    /// Validate every section
    pub fn validate(&self) -> Result<()> {
        self.auth.validate().map_err(ConfigError::invalid)?;
        self.registry.validate().map_err(ConfigError::invalid)?;
        Ok(())
    }
}

impl FromStr for Config {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Ok(toml::from_str(s)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_minimal_config() {
        let config: Config = "[auth]\njwt_secret = \"a-secret-that-is-at-least-32-chars\""
            .parse()
            .unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.registry.url, "redis://127.0.0.1:6379");
        assert_eq!(config.log.level, LogLevel::Info);
    }

    #[test]
    fn test_full_config() {
        let toml = r#"
[auth]
jwt_secret = "a-secret-that-is-at-least-32-chars"
access_token_ttl = "10m"
refresh_token_ttl = "14d"
api_key_prefix = "fv"

[registry]
url = "rediss://cache.internal:6380"

[log]
level = "warn"
format = "json"
"#;
        let config: Config = toml.parse().unwrap();
        assert!(config.validate().is_ok());
        assert_eq!(config.auth.access_token_ttl, Duration::from_secs(10 * 60));
        assert_eq!(config.registry.url, "rediss://cache.internal:6380");
        assert_eq!(config.log.format, LogFormat::Json);
    }

    #[test]
    fn test_empty_config_fails_validation() {
        let config: Config = "".parse().unwrap();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("jwt_secret"));
    }

    #[test]
    fn test_unknown_section_rejected() {
        let result: Result<Config> = "[surprise]\nkey = 1".parse();
        assert!(result.is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load("/nonexistent/forensivision.toml");
        assert!(matches!(result, Err(ConfigError::IoError { .. })));
    }
}
