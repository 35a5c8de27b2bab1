//! Client configuration.
//!
//! Configuration is read from TOML and can be overridden from the
//! environment:
//!
//! ```
//! use gradian_client::config::ClientConfig;
//!
//! let config = ClientConfig::from_toml_str(r#"
//!     base_url = "https://app.example.com"
//!     ui_language = "fa"
//! "#).unwrap();
//!
//! assert_eq!(config.base_url, "https://app.example.com");
//! assert_eq!(config.default_language, "en");
//! ```

use std::env;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::i18n::{LanguageContext, FALLBACK_LANGUAGE};

/// Environment variable overriding [`ClientConfig::base_url`].
pub const BASE_URL_ENV: &str = "GRADIAN_BASE_URL";

/// Environment variable overriding [`ClientConfig::ui_language`].
pub const LANGUAGE_ENV: &str = "GRADIAN_LANGUAGE";

/// Configuration for a client session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the backend, without a trailing slash
    pub base_url: String,
    /// Current UI language
    pub ui_language: String,
    /// Language used when the UI language has no variant
    pub default_language: String,
    /// Lifetime of cached agent configuration, in seconds
    pub cache_ttl_secs: u64,
    /// Interval between health polls, in seconds
    pub health_poll_interval_secs: u64,
    /// Per-request timeout, in seconds
    pub request_timeout_secs: u64,
    /// Id of the signed-in user, sent with discussion queries
    pub current_user_id: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:3000".to_string(),
            ui_language: FALLBACK_LANGUAGE.to_string(),
            default_language: FALLBACK_LANGUAGE.to_string(),
            cache_ttl_secs: 5,
            health_poll_interval_secs: 30,
            request_timeout_secs: 60,
            current_user_id: None,
        }
    }
}

impl ClientConfig {
    /// Parse configuration from a TOML document.
    pub fn from_toml_str(input: &str) -> Result<Self> {
        let config: ClientConfig =
            toml::from_str(input).map_err(|e| Error::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {e}", path.display())))?;
        Self::from_toml_str(&input)
    }

    /// Apply `GRADIAN_BASE_URL` and `GRADIAN_LANGUAGE` overrides.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(|key| env::var(key).ok())
    }

    /// Apply overrides from any variable source.
    ///
    /// Blank values are ignored. The base URL loses surrounding whitespace
    /// and trailing slashes.
    pub fn with_overrides(mut self, var: impl Fn(&str) -> Option<String>) -> Self {
        let set = |key: &str| var(key).filter(|value| !value.trim().is_empty());
        if let Some(url) = set(BASE_URL_ENV) {
            self.base_url = url.trim().trim_end_matches('/').to_string();
        }
        if let Some(language) = set(LANGUAGE_ENV) {
            self.ui_language = language.trim().to_string();
        }
        self
    }

    /// Check that the configuration is usable.
    pub fn validate(&self) -> Result<()> {
        url::Url::parse(&self.base_url)
            .map_err(|e| Error::Config(format!("Invalid base_url '{}': {e}", self.base_url)))?;
        if self.health_poll_interval_secs == 0 {
            return Err(Error::Config(
                "health_poll_interval_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The language context derived from this configuration.
    pub fn languages(&self) -> LanguageContext {
        LanguageContext::new(&self.ui_language, &self.default_language)
    }

    /// Cache lifetime as a [`Duration`].
    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_secs)
    }

    /// Health poll interval as a [`Duration`].
    pub fn health_poll_interval(&self) -> Duration {
        Duration::from_secs(self.health_poll_interval_secs)
    }

    /// Request timeout as a [`Duration`].
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.cache_ttl(), Duration::from_secs(5));
        assert_eq!(config.languages(), LanguageContext::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_from_toml_partial() {
        let config = ClientConfig::from_toml_str(
            r#"
            base_url = "https://gradian.example.com"
            default_language = "fa"
            current_user_id = "user-1"
            "#,
        )
        .unwrap();

        assert_eq!(config.default_language, "fa");
        assert_eq!(config.ui_language, "en");
        assert_eq!(config.current_user_id.as_deref(), Some("user-1"));
        assert_eq!(config.health_poll_interval_secs, 30);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = ClientConfig::from_toml_str(r#"base_url = "not a url""#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_zero_poll_interval_rejected() {
        let err = ClientConfig::from_toml_str("health_poll_interval_secs = 0").unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_overrides_trim_values() {
        let config = ClientConfig::default().with_overrides(vars(&[
            (BASE_URL_ENV, "  https://staging.example.com/// "),
            (LANGUAGE_ENV, " fa\n"),
        ]));
        assert_eq!(config.base_url, "https://staging.example.com");
        assert_eq!(config.ui_language, "fa");
    }

    #[test]
    fn test_blank_overrides_ignored() {
        let original = ClientConfig::from_toml_str(
            r#"
            base_url = "https://gradian.example.com"
            ui_language = "de"
            "#,
        )
        .unwrap();
        let config = original
            .clone()
            .with_overrides(vars(&[(BASE_URL_ENV, ""), (LANGUAGE_ENV, "   ")]));
        assert_eq!(config, original);

        let untouched = original.clone().with_overrides(|_| None);
        assert_eq!(untouched, original);
    }

    #[test]
    fn test_malformed_toml() {
        assert!(ClientConfig::from_toml_str("base_url = ").is_err());
    }
}
