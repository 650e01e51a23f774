//! Configuration loading for twablet-sync.
//!
//! Configuration is loaded from a TOML file (default: `twablet.toml`).
//!
//! ```toml
//! [api]
//! base_url = "https://api.twitter.com/1.1/"
//! request_timeout_secs = 30
//!
//! [consumer]
//! key = "..."
//! secret = "..."
//!
//! [account]
//! name = "..."
//! user_id = "..."
//! screen_name = "..."
//! token = "..."
//! token_secret = "..."
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use twablet_sync_types::Account;

use crate::oauth::ConsumerCredentials;

/// Root configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClientConfig {
    /// API endpoint configuration.
    #[serde(default)]
    pub api: ApiConfig,
    /// Application credentials.
    #[serde(default)]
    pub consumer: ConsumerCredentials,
    /// Authorized account, if one is configured.
    #[serde(default)]
    pub account: Option<Account>,
}

/// API endpoint configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Base URL joined with every endpoint path (default: Twitter v1.1).
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds (default: 30).
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// `User-Agent` header value.
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

// Default value functions
fn default_base_url() -> String {
    "https://api.twitter.com/1.1/".to_string()
}

fn default_request_timeout_secs() -> u64 {
    30
}

fn default_user_agent() -> String {
    concat!("twablet-sync/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout_secs(),
            user_agent: default_user_agent(),
        }
    }
}

impl ClientConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadError {
            path: path.to_path_buf(),
            source: e,
        })?;

        toml::from_str(&content).map_err(|e| ConfigError::ParseError {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError {
            path: PathBuf::from("<inline>"),
            source: e,
        })
    }

    /// Check that consumer credentials and a valid account are present.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.consumer.is_valid() {
            return Err(ConfigError::MissingCredentials("consumer key and secret"));
        }
        match &self.account {
            Some(account) if account.is_valid() => Ok(()),
            _ => Err(ConfigError::MissingCredentials("account")),
        }
    }
}

/// Configuration error types.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Failed to read configuration file.
    #[error("failed to read config file {path}: {source}")]
    ReadError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
    /// Failed to parse configuration file.
    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        /// Path to the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },
    /// Required credentials are absent or incomplete.
    #[error("missing credentials: {0}")]
    MissingCredentials(&'static str),
}
