//! Client configuration.

use thiserror::Error;
use url::Url;

use crate::endpoint::Environment;
use crate::trust::TrustPolicy;

/// Header carrying `Environment::api_key` unless configured otherwise.
pub const DEFAULT_API_KEY_HEADER: &str = "x-api-key";

/// Everything a `RequestClient` needs besides its collaborators.
/// Read-only once the client is built.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub environment: Environment,
    /// When false the client emits no log records at all.
    pub logging_enabled: bool,
    pub trust: TrustPolicy,
    pub api_key_header: String,
}

impl ClientConfig {
    pub fn new(environment: Environment) -> Self {
        Self {
            environment,
            logging_enabled: true,
            trust: TrustPolicy::default(),
            api_key_header: DEFAULT_API_KEY_HEADER.to_string(),
        }
    }

    pub fn with_logging(mut self, enabled: bool) -> Self {
        self.logging_enabled = enabled;
        self
    }

    pub fn with_trust(mut self, trust: TrustPolicy) -> Self {
        self.trust = trust;
        self
    }

    pub fn with_api_key_header(mut self, name: impl Into<String>) -> Self {
        self.api_key_header = name.into();
        self
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("environment variable {0} is not set")]
    Missing(String),

    #[error("environment variable {var} is not a valid URL: {source}")]
    InvalidUrl {
        var: String,
        #[source]
        source: url::ParseError,
    },
}

impl Environment {
    /// Read `{prefix}_BASE_URL` (required) and `{prefix}_API_KEY` (optional).
    pub fn from_env(prefix: &str) -> Result<Self, ConfigError> {
        let url_var = format!("{prefix}_BASE_URL");
        let raw = std::env::var(&url_var).map_err(|_| ConfigError::Missing(url_var.clone()))?;
        let base_url = Url::parse(&raw).map_err(|source| ConfigError::InvalidUrl {
            var: url_var,
            source,
        })?;
        let api_key = std::env::var(format!("{prefix}_API_KEY")).unwrap_or_default();
        Ok(Self { base_url, api_key })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = ClientConfig::new(Environment::new("https://api.example.com", "").unwrap());
        assert!(config.logging_enabled);
        assert!(config.trust.is_empty());
        assert_eq!(config.api_key_header, "x-api-key");
    }

    #[test]
    fn from_env_reads_prefixed_vars() {
        std::env::set_var("CFG_TEST_A_BASE_URL", "https://api.example.com/v2");
        std::env::set_var("CFG_TEST_A_API_KEY", "k-123");
        let env = Environment::from_env("CFG_TEST_A").unwrap();
        assert_eq!(env.base_url.as_str(), "https://api.example.com/v2");
        assert_eq!(env.api_key, "k-123");
    }

    #[test]
    fn from_env_missing_url() {
        let err = Environment::from_env("CFG_TEST_UNSET").unwrap_err();
        assert!(matches!(err, ConfigError::Missing(var) if var == "CFG_TEST_UNSET_BASE_URL"));
    }

    #[test]
    fn from_env_rejects_bad_url() {
        std::env::set_var("CFG_TEST_B_BASE_URL", "not a url");
        let err = Environment::from_env("CFG_TEST_B").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidUrl { .. }));
    }
}
