//! Transport Traits
//!
//! The error taxonomy shared by both transports, and the trait the submission
//! controller uses to talk to a streaming socket.

use async_trait::async_trait;
use thiserror::Error;

use super::listener::FragmentListener;

/// Errors raised by either transport
///
/// These never reach a surface: the controller converts every one of them
/// into an assistant message carrying a fixed error text.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The socket is not in an open state
    #[error("Transport unavailable: socket is not open")]
    Unavailable,

    /// The completion endpoint answered with a non-success status
    #[error("Endpoint returned {status}: {body}")]
    Status {
        /// HTTP status code
        status: u16,
        /// Response body (best effort)
        body: String,
    },

    /// The request could not be performed
    #[error("Request failed: {0}")]
    Request(String),

    /// Establishing the socket connection failed
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    /// Writing to the socket failed
    #[error("Send failed: {0}")]
    SendFailed(String),

    /// The socket closed while a reply was expected
    #[error("Connection closed")]
    ConnectionClosed,

    /// Operation not valid in the current state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// A URL could not be derived or parsed
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
}

/// A long-lived bidirectional text socket
///
/// At most one fragment listener is attached at any time. Attaching a new
/// listener replaces the previous one; dropping a listener detaches it.
#[async_trait]
pub trait StreamSocket: Send + Sync {
    /// Whether the socket is open and ready to send
    fn is_open(&self) -> bool;

    /// Send one raw text frame
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Unavailable`] when the socket is not open, or
    /// [`TransportError::SendFailed`] when the frame cannot be queued.
    async fn send_text(&self, text: &str) -> Result<(), TransportError>;

    /// Install the fragment listener, replacing any existing one
    fn attach_listener(&self) -> FragmentListener;

    /// Remove the current listener, if any
    fn detach_listener(&self);

    /// Whether a listener is currently attached
    fn has_listener(&self) -> bool;
}
