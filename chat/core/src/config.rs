//! Client Configuration
//!
//! Configuration for the chat client, loaded with the following
//! priority (highest first):
//! 1. Environment variables
//! 2. TOML configuration file
//! 3. Default values
//!
//! The configuration file follows the XDG Base Directory specification:
//! `$XDG_CONFIG_HOME/ragchat/config.toml` (typically
//! `~/.config/ragchat/config.toml`).
//!
//! # Example Configuration
//!
//! ```toml
//! base_url = "http://localhost:9380"
//! api_key = "ragflow-xxxx"
//! user_id = "visitor-17"
//! session_name = "new session"
//! request_timeout_secs = 600
//! page_size = 10
//! ```
//!
//! # Environment Variables
//!
//! - `RAGCHAT_BASE_URL`: backend base URL
//! - `RAGCHAT_API_KEY`: bearer token
//! - `RAGCHAT_USER_ID`: user identifier attached to sessions
//! - `RAGCHAT_SESSION_NAME`: name for newly created sessions
//! - `RAGCHAT_TIMEOUT_SECS`: whole-request timeout in seconds
//! - `RAGCHAT_PAGE_SIZE`: rows per page for listings

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),
}

/// Resolved client configuration
#[derive(Clone, Debug)]
pub struct ClientConfig {
    /// Backend base URL
    pub base_url: String,
    /// Bearer token sent on every request
    pub api_key: String,
    /// Optional user identifier attached to created sessions
    pub user_id: Option<String>,
    /// Name given to newly created sessions
    pub session_name: String,
    /// Whole-request timeout in seconds (streams included)
    pub request_timeout_secs: u64,
    /// Rows per page for session/assistant listings
    pub page_size: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9380".to_string(),
            api_key: String::new(),
            user_id: None,
            session_name: "new session".to_string(),
            request_timeout_secs: 600,
            page_size: 10,
        }
    }
}

impl ClientConfig {
    /// Create configuration from environment variables over defaults
    #[must_use]
    pub fn from_env() -> Self {
        apply_env(Self::default())
    }
}

/// On-disk configuration file shape; every field optional
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientToml {
    /// Backend base URL
    pub base_url: Option<String>,
    /// Bearer token
    pub api_key: Option<String>,
    /// User identifier attached to sessions
    pub user_id: Option<String>,
    /// Name for newly created sessions
    pub session_name: Option<String>,
    /// Whole-request timeout in seconds
    pub request_timeout_secs: Option<u64>,
    /// Rows per page for listings
    pub page_size: Option<u32>,
}

impl ClientToml {
    /// Overlay these file values onto a base configuration
    fn apply(self, mut config: ClientConfig) -> ClientConfig {
        if let Some(base_url) = self.base_url {
            config.base_url = base_url;
        }
        if let Some(api_key) = self.api_key {
            config.api_key = api_key;
        }
        if self.user_id.is_some() {
            config.user_id = self.user_id;
        }
        if let Some(session_name) = self.session_name {
            config.session_name = session_name;
        }
        if let Some(timeout) = self.request_timeout_secs {
            config.request_timeout_secs = timeout;
        }
        if let Some(page_size) = self.page_size {
            config.page_size = page_size;
        }
        config
    }
}

/// Default configuration file path under the XDG config directory
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("ragchat").join("config.toml"))
}

/// Load configuration from the default path (if present) with
/// environment overrides
pub fn load_config() -> Result<ClientConfig, ConfigError> {
    match default_config_path() {
        Some(path) if path.exists() => load_config_from_path(&path),
        _ => Ok(ClientConfig::from_env()),
    }
}

/// Load configuration from a specific file with environment overrides
pub fn load_config_from_path(path: &Path) -> Result<ClientConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadError {
        path: path.to_path_buf(),
        source,
    })?;
    let file: ClientToml = toml::from_str(&content)?;
    Ok(apply_env(file.apply(ClientConfig::default())))
}

/// Overlay environment variables onto a configuration
fn apply_env(mut config: ClientConfig) -> ClientConfig {
    if let Ok(base_url) = std::env::var("RAGCHAT_BASE_URL") {
        config.base_url = base_url;
    }
    if let Ok(api_key) = std::env::var("RAGCHAT_API_KEY") {
        config.api_key = api_key;
    }
    if let Ok(user_id) = std::env::var("RAGCHAT_USER_ID") {
        config.user_id = Some(user_id);
    }
    if let Ok(session_name) = std::env::var("RAGCHAT_SESSION_NAME") {
        config.session_name = session_name;
    }
    if let Ok(timeout) = std::env::var("RAGCHAT_TIMEOUT_SECS") {
        if let Ok(timeout) = timeout.parse() {
            config.request_timeout_secs = timeout;
        }
    }
    if let Ok(page_size) = std::env::var("RAGCHAT_PAGE_SIZE") {
        if let Ok(page_size) = page_size.parse() {
            config.page_size = page_size;
        }
    }
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.base_url, "http://localhost:9380");
        assert_eq!(config.session_name, "new session");
        assert_eq!(config.request_timeout_secs, 600);
        assert_eq!(config.page_size, 10);
        assert!(config.user_id.is_none());
    }

    #[test]
    fn test_file_values_overlay_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "base_url = \"http://chat.example.com\"\napi_key = \"k1\"\npage_size = 25"
        )
        .unwrap();

        let config = load_config_from_path(file.path()).unwrap();
        assert_eq!(config.base_url, "http://chat.example.com");
        assert_eq!(config.api_key, "k1");
        assert_eq!(config.page_size, 25);
        // untouched fields keep their defaults
        assert_eq!(config.session_name, "new session");
    }

    #[test]
    fn test_malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "base_url = [not toml").unwrap();

        match load_config_from_path(file.path()) {
            Err(ConfigError::ParseError(_)) => {}
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file_is_a_read_error() {
        match load_config_from_path(Path::new("/nonexistent/ragchat.toml")) {
            Err(ConfigError::ReadError { path, .. }) => {
                assert!(path.ends_with("ragchat.toml"));
            }
            other => panic!("expected read error, got {other:?}"),
        }
    }
}
