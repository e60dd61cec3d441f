//! Chat Core - Dual-Transport Chat Client Logic
//!
//! This crate holds the chat client's logic, independent of any UI. A surface
//! (terminal, GUI, test harness) feeds it submissions and renders the
//! [`ChatUpdate`]s it publishes.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                         UI Surface                            │
//! │            submit(text)  ▼          ▲  ChatUpdate             │
//! └──────────────────────────┼──────────┼─────────────────────────┘
//!                            │          │
//! ┌──────────────────────────┼──────────┼─────────────────────────┐
//! │                 SubmissionController                          │
//! │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────────┐ │
//! │  │ Conversation │  │  Credential  │──▶  select_transport    │ │
//! │  │    State     │  │    Store     │  └──────────┬───────────┘ │
//! │  └──────────────┘  └──────────────┘             │             │
//! │             ┌───────────────────────────────────┴──────┐      │
//! │             ▼                                          ▼      │
//! │  ┌─────────────────────┐              ┌──────────────────────┐│
//! │  │  CompletionBackend  │              │     StreamSocket     ││
//! │  │ (one HTTP request)  │              │ (fragments + [END])  ││
//! │  └─────────────────────┘              └──────────────────────┘│
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Quick Start
//!
//! ```ignore
//! use std::sync::Arc;
//! use chat_core::{
//!     ChatConfig, ControllerConfig, FileCredentialStore, OpenRouterBackend,
//!     SubmissionController, WebSocketClient,
//! };
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = ChatConfig::default();
//!     let backend = OpenRouterBackend::from_config(&config)?;
//!     let mut socket = WebSocketClient::from_config(&config.socket_config()?);
//!     socket.connect().await?;
//!
//!     let (tx, mut rx) = mpsc::channel(100);
//!     let store = FileCredentialStore::new("credentials.toml");
//!     let mut controller = SubmissionController::new(
//!         backend, socket, Arc::new(store), ControllerConfig::from(&config), tx,
//!     );
//!
//!     controller.submit(Some("Hello")).await;
//!     while controller.next_stream_event().await.is_some() {}
//!
//!     while let Ok(update) = rx.try_recv() {
//!         // Render update
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Single-shot completion transport (OpenRouter)
//! - [`transport`]: Streaming socket transport and fragment framing
//! - [`selector`]: Transport choice from the stored credential
//! - [`session`]: Conversation log and the streaming reducer
//! - [`controller`]: Submission orchestration
//! - [`credentials`]: Local credential stores
//! - [`config`]: Layered configuration
//! - [`messages`]: Message types and surface updates

#![warn(missing_docs)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod config;
pub mod controller;
pub mod credentials;
pub mod messages;
pub mod selector;
pub mod session;
pub mod transport;

// Re-exports for convenience
pub use backend::{
    CompletionBackend, CompletionRequest, CompletionResponse, OpenRouterBackend, DEFAULT_MODEL,
};
pub use config::{default_config_path, load_config, load_config_from_path, ChatConfig, ConfigError};
pub use controller::{ControllerConfig, StreamEvent, Submission, SubmissionController};
pub use credentials::{
    CredentialError, CredentialStore, FileCredentialStore, MemoryCredentialStore,
    DEFAULT_CREDENTIAL_KEY,
};
pub use messages::{
    ChatMessage, ChatUpdate, MessageId, MessageRole, SubmissionState, COMPLETION_ERROR_TEXT,
    SOCKET_ERROR_TEXT, SOCKET_UNAVAILABLE_TEXT,
};
pub use selector::{select_transport, TransportKind};
pub use session::{ChatTurn, Conversation};
pub use transport::{
    FragmentDecoder, SocketConfig, StreamItem, StreamSocket, TransportError, WebSocketClient,
    DEFAULT_TERMINATOR,
};
