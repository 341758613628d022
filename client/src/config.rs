//! Client configuration.
//!
//! Values come from the environment with sensible defaults; tests build
//! configs directly with the `with_*` methods.

use crate::error::{ClientError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Default API gateway base URL.
pub const DEFAULT_API_URL: &str = "http://localhost:8000/api";

/// Runtime configuration for [`crate::StayClient`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Base URL every API path is appended to (no trailing slash).
    pub api_base_url: String,

    /// Directory holding the persisted session.
    pub storage_dir: PathBuf,

    /// `User-Agent` header sent with every request.
    pub user_agent: String,

    /// `tracing` filter used by the binary.
    pub log_level: String,
}

impl ClientConfig {
    /// Create a configuration for the given API base URL.
    pub fn new(api_base_url: impl Into<String>) -> Self {
        Self {
            api_base_url: normalize_base_url(api_base_url.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// | variable | field |
    /// |---|---|
    /// | `STAYBOOK_API_URL` | `api_base_url` |
    /// | `STAYBOOK_STORAGE_DIR` | `storage_dir` |
    /// | `STAYBOOK_USER_AGENT` | `user_agent` |
    /// | `RUST_LOG` | `log_level` |
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();

        Self {
            api_base_url: env::var("STAYBOOK_API_URL")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map_or(defaults.api_base_url, normalize_base_url),
            storage_dir: env::var("STAYBOOK_STORAGE_DIR")
                .ok()
                .filter(|value| !value.trim().is_empty())
                .map_or(defaults.storage_dir, PathBuf::from),
            user_agent: env::var("STAYBOOK_USER_AGENT").unwrap_or(defaults.user_agent),
            log_level: env::var("RUST_LOG").unwrap_or(defaults.log_level),
        }
    }

    /// Set the API base URL.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = normalize_base_url(url.into());
        self
    }

    /// Set the storage directory.
    #[must_use]
    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Set the user agent.
    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Set the log filter.
    #[must_use]
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Join an API path onto the base URL.
    #[must_use]
    pub fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.api_base_url, path.trim_start_matches('/'))
    }

    /// Check the configuration before use.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] when the base URL is empty or not http(s).
    pub fn validate(&self) -> Result<()> {
        let url = self.api_base_url.trim();
        if url.is_empty() {
            return Err(ClientError::validation("API base URL must not be empty"));
        }
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(ClientError::validation(format!(
                "API base URL must start with http:// or https://, got {url}"
            )));
        }
        Ok(())
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_URL.to_string(),
            storage_dir: default_storage_dir(),
            user_agent: format!("staybook-client/{}", env!("CARGO_PKG_VERSION")),
            log_level: "info".to_string(),
        }
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir().map_or_else(|| PathBuf::from(".staybook"), |dir| dir.join("staybook"))
}
