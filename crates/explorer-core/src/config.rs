//! Explorer configuration
//!
//! A [`Config`] is a plain value; [`ConfigStore`] is the shared handle that
//! request senders and the dispatcher read from. Writes through the store
//! are visible to every later read.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

/// Base URL used when none is configured
pub const DEFAULT_BASE_URL: &str = "https://www.googleapis.com";

/// Path of the directory listing all APIs
pub const DIRECTORY_REQUEST_PATH: &str = "/discovery/v1/apis";

/// Header carrying the client user agent on every request
pub const USER_AGENT_HEADER: &str = "X-JavaScript-User-Agent";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const DEFAULT_USER_AGENT: &str = concat!("google-api-rust-client/", env!("CARGO_PKG_VERSION"));

/// Explorer settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Config {
    /// Base URL all request paths are relative to
    pub base_url: String,
    /// API key appended to requests as `key` (empty = omitted)
    pub api_key: String,
    /// User agent sent in [`USER_AGENT_HEADER`]
    pub user_agent: String,
    /// OAuth token used only when fetching discovery documents
    pub discovery_auth_token: Option<String>,
    /// Timeout applied to requests dispatched after it is set
    pub timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: String::new(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            discovery_auth_token: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl Config {
    /// Create default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Prefix the user agent with an application name
    pub fn set_application_name(&mut self, application_name: &str) {
        self.user_agent = format!("{} {}", application_name, self.user_agent);
    }

    /// Full URL of the directory listing
    pub fn directory_url(&self) -> String {
        format!("{}{}", self.base_url, DIRECTORY_REQUEST_PATH)
    }

    /// Full URL of the REST discovery document for an API
    pub fn discovery_url(&self, name: &str, version: &str) -> String {
        format!(
            "{}{}",
            self.base_url,
            discovery::discovery_rest_path(name, version)
        )
    }
}

/// Shared, lock-guarded configuration handle
#[derive(Debug, Clone, Default)]
pub struct ConfigStore {
    inner: Arc<RwLock<Config>>,
}

impl ConfigStore {
    /// Create a store holding the given settings
    pub fn new(config: Config) -> Self {
        Self {
            inner: Arc::new(RwLock::new(config)),
        }
    }

    /// Copy of the current settings
    pub fn snapshot(&self) -> Config {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Apply a change to the settings
    pub fn update<F: FnOnce(&mut Config)>(&self, f: F) {
        let mut config = self.inner.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut config);
        debug!("Updated explorer config (base URL {})", config.base_url);
    }

    pub fn set_base_url(&self, base_url: impl Into<String>) {
        let base_url = base_url.into();
        self.update(|c| c.base_url = base_url);
    }

    pub fn set_api_key(&self, api_key: impl Into<String>) {
        let api_key = api_key.into();
        self.update(|c| c.api_key = api_key);
    }

    pub fn set_application_name(&self, application_name: &str) {
        self.update(|c| c.set_application_name(application_name));
    }

    pub fn set_discovery_auth_token(&self, token: Option<String>) {
        self.update(|c| c.discovery_auth_token = token);
    }

    pub fn set_timeout(&self, timeout: Duration) {
        self.update(|c| c.timeout = timeout);
    }

    pub fn base_url(&self) -> String {
        self.snapshot().base_url
    }

    pub fn api_key(&self) -> String {
        self.snapshot().api_key
    }

    pub fn timeout(&self) -> Duration {
        self.snapshot().timeout
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::new();

        assert_eq!(config.base_url, "https://www.googleapis.com");
        assert!(config.api_key.is_empty());
        assert!(config.user_agent.starts_with("google-api-rust-client/"));
        assert!(config.discovery_auth_token.is_none());
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn test_application_name_prefixes_user_agent() {
        let mut config = Config::new();
        config.set_application_name("my-app");

        assert_eq!(config.user_agent, format!("my-app {}", DEFAULT_USER_AGENT));
    }

    #[test]
    fn test_urls() {
        let config = Config {
            base_url: "https://example.com".to_string(),
            ..Default::default()
        };

        assert_eq!(config.directory_url(), "https://example.com/discovery/v1/apis");
        assert_eq!(
            config.discovery_url("tasks", "v1"),
            "https://example.com/discovery/v1/apis/tasks/v1/rest"
        );
    }

    #[test]
    fn test_store_writes_visible_to_clones() {
        let store = ConfigStore::default();
        let reader = store.clone();

        store.set_api_key("ABC");
        store.set_base_url("https://example.com");
        store.set_timeout(Duration::from_millis(250));

        assert_eq!(reader.api_key(), "ABC");
        assert_eq!(reader.base_url(), "https://example.com");
        assert_eq!(reader.timeout(), Duration::from_millis(250));
    }

    #[test]
    fn test_snapshot_is_detached() {
        let store = ConfigStore::default();
        let before = store.snapshot();

        store.set_discovery_auth_token(Some("token".to_string()));

        assert!(before.discovery_auth_token.is_none());
        assert_eq!(
            store.snapshot().discovery_auth_token.as_deref(),
            Some("token")
        );
    }

    #[test]
    fn test_config_deserialize_partial() {
        let config: Config = serde_json::from_str(r#"{"apiKey": "xyz"}"#).unwrap();
        assert_eq!(config.api_key, "xyz");
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
    }
}
