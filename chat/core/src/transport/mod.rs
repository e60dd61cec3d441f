//! Streaming Transport
//!
//! The persistent socket transport that delivers an assistant reply as a
//! sequence of text fragments ending with a terminator marker.
//!
//! # Pieces
//!
//! - [`WebSocketClient`]: owned connection shared across the chat session
//! - [`ListenerSlot`] / [`FragmentListener`]: scoped, single-listener
//!   registration for incoming frames
//! - [`FragmentDecoder`]: separates the terminator marker from payload
//! - [`StreamSocket`]: the seam the submission controller talks to, so the
//!   controller can be tested without a network

pub mod config;
pub mod frame;
pub mod listener;
pub mod traits;
pub mod websocket;

// Re-exports for convenience
pub use config::{socket_url_for_origin, SocketConfig, DEFAULT_SOCKET_PORT};
pub use frame::{Fragment, FragmentDecoder, DEFAULT_TERMINATOR};
pub use listener::{FragmentListener, ListenerSlot, StreamItem};
pub use traits::{StreamSocket, TransportError};
pub use websocket::WebSocketClient;
