//! Completion Backend Integration
//!
//! Single-shot access to an assistant service: the whole conversation goes
//! out in one request and one finished reply comes back.
//!
//! # Available Backends
//!
//! - **OpenRouter**: OpenAI-compatible chat completions (default)
//!
//! # Usage
//!
//! ```ignore
//! use chat_core::backend::{CompletionBackend, CompletionRequest, OpenRouterBackend};
//!
//! let backend = OpenRouterBackend::from_config(&config)?;
//! let request = CompletionRequest::new("openai/gpt-3.5-turbo", turns, api_key);
//! let reply = backend.complete(&request).await?;
//! ```

mod openrouter;
mod traits;

pub use openrouter::{extract_reply, OpenRouterBackend, DEFAULT_COMPLETION_URL};
pub use traits::{CompletionBackend, CompletionRequest, CompletionResponse, DEFAULT_MODEL};
