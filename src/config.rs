//! Configuration module for the learner portal client
//!
//! This module handles all configuration loading from TOML files,
//! environment variables, and provides structured configuration types.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Main application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortalConfig {
    /// Backend base URLs and request settings
    pub api: ApiConfig,

    /// Client-side query cache settings
    #[serde(default)]
    pub cache: CacheConfig,

    /// Transaction status polling settings
    #[serde(default)]
    pub polling: PollingConfig,

    /// Feature flags the loaders branch on
    #[serde(default)]
    pub features: FeatureFlags,

    /// Login/redirect settings for unauthenticated requests
    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// LMS base URL (enrollment, enterprise-learner, select-active)
    pub lms_base_url: String,

    /// Course discovery base URL
    pub discovery_api_base_url: String,

    /// Enterprise catalog service base URL
    pub enterprise_catalog_api_base_url: String,

    /// Enterprise access (policy / can-redeem) service base URL
    pub enterprise_access_base_url: String,

    /// Request timeout in seconds
    #[serde(default = "default_request_timeout")]
    pub timeout_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Staleness window for cached query data, in seconds
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PollingConfig {
    /// Fixed interval between transaction status polls, in milliseconds
    #[serde(default = "default_poll_interval_ms")]
    pub interval_ms: u64,

    /// Maximum number of status polls per redemption before giving up
    #[serde(default = "default_max_poll_attempts")]
    pub max_attempts: u32,
}

impl PollingConfig {
    /// Poll interval as a [`Duration`]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureFlags {
    /// Redirect straight to the academy detail page when a customer has
    /// exactly one academy
    #[serde(default)]
    pub enable_one_academy_redirect: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Login URL unauthenticated requests are redirected to
    #[serde(default = "default_login_url")]
    pub login_url: String,
}

// Default value functions
fn default_request_timeout() -> u64 { 30 }
fn default_stale_secs() -> u64 { 60 }
fn default_poll_interval_ms() -> u64 { 1000 }
fn default_max_poll_attempts() -> u32 { 300 }
fn default_login_url() -> String { "http://localhost:18000/login".to_string() }

impl Default for CacheConfig {
    fn default() -> Self {
        Self { stale_secs: default_stale_secs() }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_poll_interval_ms(),
            max_attempts: default_max_poll_attempts(),
        }
    }
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self { enable_one_academy_redirect: false }
    }
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self { login_url: default_login_url() }
    }
}

impl PortalConfig {
    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: PortalConfig = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load configuration with environment variable overrides
    pub fn from_file_with_env(path: &str) -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        let mut config = Self::from_file(path)?;
        if let Ok(url) = std::env::var("LMS_BASE_URL") {
            config.api.lms_base_url = url;
        }
        if let Ok(url) = std::env::var("DISCOVERY_API_BASE_URL") {
            config.api.discovery_api_base_url = url;
        }
        if let Ok(url) = std::env::var("ENTERPRISE_CATALOG_API_BASE_URL") {
            config.api.enterprise_catalog_api_base_url = url;
        }
        if let Ok(url) = std::env::var("ENTERPRISE_ACCESS_BASE_URL") {
            config.api.enterprise_access_base_url = url;
        }
        Ok(config)
    }
}

impl Default for PortalConfig {
    fn default() -> Self {
        Self {
            api: ApiConfig {
                lms_base_url: "http://localhost:18000".to_string(),
                discovery_api_base_url: "http://localhost:18381".to_string(),
                enterprise_catalog_api_base_url: "http://localhost:18160".to_string(),
                enterprise_access_base_url: "http://localhost:18270".to_string(),
                timeout_secs: default_request_timeout(),
            },
            cache: CacheConfig::default(),
            polling: PollingConfig::default(),
            features: FeatureFlags::default(),
            auth: AuthConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_documented_windows() {
        let config = PortalConfig::default();
        assert_eq!(config.cache.stale_secs, 60);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.polling.interval(), Duration::from_secs(1));
        assert_eq!(config.polling.max_attempts, 300);
        assert!(!config.features.enable_one_academy_redirect);
    }

    #[test]
    fn loads_minimal_toml_with_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[api]
lms_base_url = "https://lms.example.com"
discovery_api_base_url = "https://discovery.example.com"
enterprise_catalog_api_base_url = "https://catalog.example.com"
enterprise_access_base_url = "https://access.example.com"

[polling]
max_attempts = 10
"#
        )
        .unwrap();

        let config = PortalConfig::from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.api.lms_base_url, "https://lms.example.com");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.polling.max_attempts, 10);
        assert_eq!(config.polling.interval_ms, 1000);
        assert_eq!(config.cache.stale_secs, 60);
    }
}
