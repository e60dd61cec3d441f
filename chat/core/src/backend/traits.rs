//! Completion Backend Traits
//!
//! Trait definitions for single-shot completion backends. The controller
//! sends the whole conversation and gets one finished reply back; the
//! provider-specific wire format stays inside the implementation.

use async_trait::async_trait;

use crate::session::ChatTurn;
use crate::transport::TransportError;

/// Default completion model
pub const DEFAULT_MODEL: &str = "openai/gpt-3.5-turbo";

/// A single-shot completion request
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    /// Model identifier (backend-specific)
    pub model: String,
    /// Ordered conversation, ending with the new user turn
    pub messages: Vec<ChatTurn>,
    /// Bearer credential
    pub credential: String,
}

impl CompletionRequest {
    /// Create a new request
    #[must_use]
    pub fn new(
        model: impl Into<String>,
        messages: Vec<ChatTurn>,
        credential: impl Into<String>,
    ) -> Self {
        Self {
            model: model.into(),
            messages,
            credential: credential.into(),
        }
    }
}

/// Finished reply from a completion backend
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CompletionResponse {
    /// Reply text (empty when the body carried none)
    pub content: String,
    /// Model that was asked
    pub model: String,
    /// Round-trip time in milliseconds
    pub duration_ms: Option<u64>,
}

/// Completion backend trait
///
/// Implement this trait to add support for different completion providers.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Get the backend name (e.g., "OpenRouter")
    fn name(&self) -> &str;

    /// Send the request and wait for the complete reply.
    ///
    /// A non-success status is an error. A body without reply text is not:
    /// it yields an empty `content`.
    ///
    /// # Errors
    ///
    /// Returns a [`TransportError`] when the request cannot be sent, the
    /// status is not a success, or the body is not JSON.
    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageRole;

    #[test]
    fn test_completion_request_new() {
        let turns = vec![ChatTurn {
            role: MessageRole::User,
            content: "Hello".to_string(),
        }];
        let request = CompletionRequest::new(DEFAULT_MODEL, turns, "sk-test");

        assert_eq!(request.model, "openai/gpt-3.5-turbo");
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.credential, "sk-test");
    }
}
