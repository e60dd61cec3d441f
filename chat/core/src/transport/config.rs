//! Socket Configuration
//!
//! The streaming socket lives next to the page that hosts the chat: same
//! host, fixed alternate port, and a secure scheme only when the origin is
//! secure.

use std::time::Duration;

use reqwest::Url;
use serde::{Deserialize, Serialize};

use super::traits::TransportError;

/// Default port of the streaming socket
pub const DEFAULT_SOCKET_PORT: u16 = 8090;

/// Streaming socket configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketConfig {
    /// Full WebSocket URL (e.g. `ws://localhost:8090`)
    pub url: String,
    /// Connection timeout in milliseconds
    pub connect_timeout_ms: u64,
}

impl Default for SocketConfig {
    fn default() -> Self {
        Self {
            url: format!("ws://localhost:{DEFAULT_SOCKET_PORT}"),
            connect_timeout_ms: 5000,
        }
    }
}

impl SocketConfig {
    /// Derive the socket configuration from the hosting origin
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidUrl`] if the origin has no host or
    /// does not parse.
    pub fn from_origin(origin: &str, port: u16) -> Result<Self, TransportError> {
        Ok(Self {
            url: socket_url_for_origin(origin, port)?,
            ..Default::default()
        })
    }

    /// Set the connection timeout
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Connection timeout as a duration
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

/// Build the socket URL for an origin such as `https://chat.example.com`.
///
/// `https` maps to `wss`; anything else maps to `ws`.
///
/// # Errors
///
/// Returns [`TransportError::InvalidUrl`] if the origin has no host or does
/// not parse.
pub fn socket_url_for_origin(origin: &str, port: u16) -> Result<String, TransportError> {
    let parsed =
        Url::parse(origin).map_err(|e| TransportError::InvalidUrl(format!("{origin}: {e}")))?;
    let host = parsed
        .host_str()
        .ok_or_else(|| TransportError::InvalidUrl(format!("{origin}: missing host")))?;
    let scheme = if parsed.scheme() == "https" { "wss" } else { "ws" };

    Ok(format!("{scheme}://{host}:{port}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insecure_origin() {
        let url = socket_url_for_origin("http://localhost:3000", DEFAULT_SOCKET_PORT).unwrap();
        assert_eq!(url, "ws://localhost:8090");
    }

    #[test]
    fn test_secure_origin() {
        let url = socket_url_for_origin("https://chat.example.com/app", 8090).unwrap();
        assert_eq!(url, "wss://chat.example.com:8090");
    }

    #[test]
    fn test_ipv6_origin() {
        let url = socket_url_for_origin("http://[::1]:5173", 9000).unwrap();
        assert_eq!(url, "ws://[::1]:9000");
    }

    #[test]
    fn test_invalid_origin() {
        let result = socket_url_for_origin("not a url", 8090);
        assert!(matches!(result, Err(TransportError::InvalidUrl(_))));
    }

    #[test]
    fn test_from_origin_defaults() {
        let config = SocketConfig::from_origin("http://10.0.0.5", 8090)
            .unwrap()
            .with_connect_timeout(Duration::from_secs(2));
        assert_eq!(config.url, "ws://10.0.0.5:8090");
        assert_eq!(config.connect_timeout(), Duration::from_secs(2));
    }
}
