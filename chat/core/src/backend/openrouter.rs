//! OpenRouter Backend Implementation
//!
//! Single-shot completion backend for OpenAI-compatible chat completion
//! endpoints (OpenRouter by default).
//!
//! # Wire format
//!
//! One `POST` carrying `{ model, messages: [{role, content}], stream: false }`
//! with a bearer credential. The reply text lives at
//! `choices[0].message.content`.

use std::time::{Duration, Instant};

use async_trait::async_trait;

use super::traits::{CompletionBackend, CompletionRequest, CompletionResponse};
use crate::config::ChatConfig;
use crate::transport::TransportError;

/// Default completion endpoint
pub const DEFAULT_COMPLETION_URL: &str = "https://openrouter.ai/api/v1/chat/completions";

/// OpenRouter completion client
#[derive(Clone)]
pub struct OpenRouterBackend {
    /// Completion endpoint URL
    endpoint: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OpenRouterBackend {
    /// Create a backend for the given endpoint
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the HTTP client cannot be built.
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, TransportError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| TransportError::Request(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            endpoint: endpoint.into(),
            http_client,
        })
    }

    /// Create from `ChatConfig`
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Request`] if the HTTP client cannot be built.
    pub fn from_config(config: &ChatConfig) -> Result<Self, TransportError> {
        Self::new(config.completion_url.clone(), config.request_timeout())
    }

    /// The completion endpoint
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn request_body(request: &CompletionRequest) -> serde_json::Value {
        serde_json::json!({
            "model": request.model,
            "messages": request.messages,
            "stream": false,
        })
    }
}

/// Pull the reply text out of a response body.
///
/// Malformed or unexpected bodies yield an empty string.
#[must_use]
pub fn extract_reply(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|data| {
            data.pointer("/choices/0/message/content")
                .and_then(serde_json::Value::as_str)
                .map(String::from)
        })
        .unwrap_or_default()
}

#[async_trait]
impl CompletionBackend for OpenRouterBackend {
    fn name(&self) -> &'static str {
        "OpenRouter"
    }

    async fn complete(
        &self,
        request: &CompletionRequest,
    ) -> Result<CompletionResponse, TransportError> {
        let start = Instant::now();

        let response = self
            .http_client
            .post(&self.endpoint)
            .bearer_auth(&request.credential)
            .json(&Self::request_body(request))
            .send()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(TransportError::Status { status, body });
        }

        let body = response
            .text()
            .await
            .map_err(|e| TransportError::Request(e.to_string()))?;
        let content = extract_reply(&body);
        if content.is_empty() {
            tracing::debug!(endpoint = %self.endpoint, "Completion body carried no reply text");
        }

        Ok(CompletionResponse {
            content,
            model: request.model.clone(),
            duration_ms: u64::try_from(start.elapsed().as_millis()).ok(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::MessageRole;
    use crate::session::ChatTurn;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_extract_reply() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":"hi"}}]}"#;
        assert_eq!(extract_reply(body), "hi");
    }

    #[test]
    fn test_extract_reply_malformed() {
        assert_eq!(extract_reply(""), "");
        assert_eq!(extract_reply("<html>oops</html>"), "");
        assert_eq!(extract_reply(r#"{"choices":[]}"#), "");
        assert_eq!(extract_reply(r#"{"choices":[{"message":{"content":null}}]}"#), "");
    }

    #[test]
    fn test_request_body() {
        let request = CompletionRequest::new(
            "openai/gpt-3.5-turbo",
            vec![ChatTurn {
                role: MessageRole::User,
                content: "Hello".to_string(),
            }],
            "sk-test",
        );

        assert_eq!(
            OpenRouterBackend::request_body(&request),
            serde_json::json!({
                "model": "openai/gpt-3.5-turbo",
                "messages": [{"role": "user", "content": "Hello"}],
                "stream": false,
            })
        );
    }

    #[test]
    fn test_from_config() {
        let backend = OpenRouterBackend::from_config(&ChatConfig::default()).unwrap();
        assert_eq!(backend.endpoint(), DEFAULT_COMPLETION_URL);
        assert_eq!(backend.name(), "OpenRouter");
    }
}
