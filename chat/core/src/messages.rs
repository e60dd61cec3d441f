//! Chat Messages
//!
//! Message types shared by the conversation log, the transports, and any UI
//! surface that renders the conversation.
//!
//! # Design Philosophy
//!
//! The controller is the only writer of conversation state. Surfaces are pure
//! renderers: they receive [`ChatUpdate`]s describing what changed and never
//! mutate messages themselves.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Content of the assistant message shown when the completion endpoint fails
pub const COMPLETION_ERROR_TEXT: &str = "[OpenRouter API error]";

/// Content of the assistant message shown when the socket is not open
pub const SOCKET_UNAVAILABLE_TEXT: &str = "[WebSocket not connected]";

/// Content of the assistant message shown when the socket fails mid-exchange
pub const SOCKET_ERROR_TEXT: &str = "[WebSocket error]";

/// Correlation identifier for a message
///
/// Random UUID v4, unique for the session and never reused.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

impl MessageId {
    /// Generate a new unique message ID
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for MessageId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for MessageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Who authored a message
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// User input
    User,
    /// Assistant reply
    Assistant,
}

impl MessageRole {
    /// Wire name of the role
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

/// A single entry of the conversation
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Correlation identifier
    pub id: MessageId,
    /// Who sent this message
    pub role: MessageRole,
    /// Message text
    pub content: String,
    /// User message this reply answers
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reply_to: Option<MessageId>,
}

impl ChatMessage {
    /// Create a message with an explicit ID
    #[must_use]
    pub fn new(id: MessageId, role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            id,
            role,
            content: content.into(),
            reply_to: None,
        }
    }

    /// Link this message to the message it answers
    #[must_use]
    pub fn with_reply_to(mut self, id: MessageId) -> Self {
        self.reply_to = Some(id);
        self
    }

    /// Create a user message with a fresh ID
    #[must_use]
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(MessageId::new(), MessageRole::User, content)
    }

    /// Create an assistant message with a fresh ID
    #[must_use]
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(MessageId::new(), MessageRole::Assistant, content)
    }

    /// Whether this message was written by the assistant
    #[must_use]
    pub fn is_assistant(&self) -> bool {
        self.role == MessageRole::Assistant
    }
}

/// Submission controller state
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SubmissionState {
    /// Ready for a new submission
    #[default]
    Idle,
    /// An exchange is in flight (request outstanding or stream listening)
    Sending,
    /// A transport failure is being converted into an error message
    Erroring,
}

/// Updates published from the controller to a UI surface
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChatUpdate {
    /// A message was appended to the conversation
    MessageAppended {
        /// The new message
        message: ChatMessage,
    },

    /// The message at `index` was replaced (streamed reply grew)
    MessageReplaced {
        /// Position in the conversation
        index: usize,
        /// The replacement message
        message: ChatMessage,
    },

    /// The pending-submission flag changed
    Pending {
        /// New flag value
        pending: bool,
    },

    /// The controller changed state
    State {
        /// New state
        state: SubmissionState,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_id_unique() {
        let id1 = MessageId::new();
        let id2 = MessageId::new();
        assert_ne!(id1, id2);
        assert_eq!(id1.0.len(), 36);
    }

    #[test]
    fn test_role_serialization() {
        let json = serde_json::to_string(&MessageRole::Assistant).unwrap();
        assert_eq!(json, "\"assistant\"");
        assert_eq!(MessageRole::User.as_str(), "user");
    }

    #[test]
    fn test_message_constructors() {
        let user = ChatMessage::user("Hello");
        assert_eq!(user.role, MessageRole::User);
        assert!(!user.is_assistant());

        let reply = ChatMessage::assistant("Hi");
        assert!(reply.is_assistant());
        assert_ne!(user.id, reply.id);
        assert_eq!(reply.reply_to, None);
    }

    #[test]
    fn test_reply_link_serialization() {
        let user = ChatMessage::user("Hello");
        let reply = ChatMessage::assistant("Hi").with_reply_to(user.id.clone());
        assert_eq!(reply.reply_to.as_ref(), Some(&user.id));

        let json = serde_json::to_value(&reply).unwrap();
        assert_eq!(json["reply_to"], serde_json::json!(user.id.0));

        // Unlinked messages omit the field
        let json = serde_json::to_value(&user).unwrap();
        assert!(json.get("reply_to").is_none());
        let back: ChatMessage = serde_json::from_value(json).unwrap();
        assert_eq!(back, user);
    }
}
