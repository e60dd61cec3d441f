//! Chat Configuration
//!
//! Layered configuration: built-in defaults, then an optional TOML file, then
//! `DUPLEX_CHAT_*` environment overrides.
//!
//! ```toml
//! completion_url = "https://openrouter.ai/api/v1/chat/completions"
//! model = "openai/gpt-3.5-turbo"
//! origin = "https://chat.example.com"
//! socket_port = 8090
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{DEFAULT_COMPLETION_URL, DEFAULT_MODEL};
use crate::credentials::DEFAULT_CREDENTIAL_KEY;
use crate::transport::{SocketConfig, TransportError, DEFAULT_SOCKET_PORT, DEFAULT_TERMINATOR};

/// Application directory name under the user's config dir
pub const APP_DIR: &str = "duplex-chat";

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file {path:?}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The file is not valid TOML for this schema
    #[error("Failed to parse config file {path:?}: {source}")]
    Parse {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: toml::de::Error,
    },
}

/// Chat client configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Completion endpoint URL
    pub completion_url: String,
    /// Completion model identifier
    pub model: String,
    /// Completion request timeout in milliseconds
    pub request_timeout_ms: u64,
    /// Hosting origin the socket URL is derived from
    pub origin: String,
    /// Streaming socket port
    pub socket_port: u16,
    /// Marker that ends a streamed reply
    pub terminator: String,
    /// Socket connection timeout in milliseconds
    pub connect_timeout_ms: u64,
    /// Key the credential is stored under
    pub credential_key: String,
    /// Credential file (None = per-user default)
    pub credentials_path: Option<PathBuf>,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            completion_url: DEFAULT_COMPLETION_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            request_timeout_ms: 120_000,
            origin: "http://localhost".to_string(),
            socket_port: DEFAULT_SOCKET_PORT,
            terminator: DEFAULT_TERMINATOR.to_string(),
            connect_timeout_ms: 5000,
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
            credentials_path: None,
        }
    }
}

impl ChatConfig {
    /// Apply `DUPLEX_CHAT_*` environment overrides
    ///
    /// Environment variables:
    /// - `DUPLEX_CHAT_COMPLETION_URL`: completion endpoint
    /// - `DUPLEX_CHAT_MODEL`: completion model
    /// - `DUPLEX_CHAT_ORIGIN`: hosting origin for the socket URL
    /// - `DUPLEX_CHAT_SOCKET_PORT`: socket port
    /// - `DUPLEX_CHAT_TERMINATOR`: end-of-reply marker
    /// - `DUPLEX_CHAT_CREDENTIALS`: credential file path
    pub fn apply_env(&mut self) {
        self.apply_overrides(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary variable lookup
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("DUPLEX_CHAT_COMPLETION_URL") {
            self.completion_url = url;
        }
        if let Some(model) = lookup("DUPLEX_CHAT_MODEL") {
            self.model = model;
        }
        if let Some(origin) = lookup("DUPLEX_CHAT_ORIGIN") {
            self.origin = origin;
        }
        if let Some(port) = lookup("DUPLEX_CHAT_SOCKET_PORT").and_then(|v| v.parse().ok()) {
            self.socket_port = port;
        }
        if let Some(terminator) = lookup("DUPLEX_CHAT_TERMINATOR") {
            self.terminator = terminator;
        }
        if let Some(path) = lookup("DUPLEX_CHAT_CREDENTIALS") {
            self.credentials_path = Some(PathBuf::from(path));
        }
    }

    /// Completion request timeout
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Streaming socket configuration derived from the origin
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if `origin` cannot be parsed.
    pub fn socket_config(&self) -> Result<SocketConfig, TransportError> {
        Ok(SocketConfig::from_origin(&self.origin, self.socket_port)?
            .with_connect_timeout(Duration::from_millis(self.connect_timeout_ms)))
    }

    /// Credential file location
    #[must_use]
    pub fn credentials_file(&self) -> Option<PathBuf> {
        self.credentials_path
            .clone()
            .or_else(|| dirs::config_dir().map(|dir| dir.join(APP_DIR).join("credentials.toml")))
    }
}

/// Default config file location (`$XDG_CONFIG_HOME/duplex-chat/config.toml`)
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(APP_DIR).join("config.toml"))
}

/// Load configuration from a specific TOML file
///
/// # Errors
///
/// Returns [`ConfigError::Io`] if the file cannot be read and
/// [`ConfigError::Parse`] if it is not valid configuration TOML.
pub fn load_config_from_path(path: &Path) -> Result<ChatConfig, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load configuration.
///
/// An explicit path must exist. Without one, the default path is used when
/// present and built-in defaults otherwise.
///
/// # Errors
///
/// Fails like [`load_config_from_path`] for whichever file is read.
pub fn load_config(path: Option<&Path>) -> Result<ChatConfig, ConfigError> {
    if let Some(path) = path {
        return load_config_from_path(path);
    }

    match default_config_path() {
        Some(default) if default.exists() => {
            tracing::debug!(path = ?default, "Loading default config file");
            load_config_from_path(&default)
        }
        _ => Ok(ChatConfig::default()),
    }
}
