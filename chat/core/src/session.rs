//! Conversation State
//!
//! The ordered log of exchanged messages. Insertion order is display order is
//! chronological order. This log is what surfaces render and what the
//! completion transport sends as context.
//!
//! A conversation lives for one chat session and is never persisted.

use serde::{Deserialize, Serialize};

use crate::messages::{ChatMessage, MessageId, MessageRole};

/// A role/content pair sent to the completion endpoint (IDs stripped)
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatTurn {
    /// Who sent this turn
    pub role: MessageRole,
    /// Turn text
    pub content: String,
}

impl From<&ChatMessage> for ChatTurn {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

/// How a fragment was folded into the conversation
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Applied {
    /// A new assistant message was appended
    Appended,
    /// The last message was replaced with the accumulated content
    Replaced,
}

/// Ordered, append-mostly message log
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ChatMessage>,
}

impl Conversation {
    /// Create an empty conversation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its ID
    pub fn push(&mut self, message: ChatMessage) -> MessageId {
        let id = message.id.clone();
        self.messages.push(message);
        id
    }

    /// Append a user message with a fresh ID
    pub fn push_user(&mut self, content: impl Into<String>) -> MessageId {
        self.push(ChatMessage::user(content))
    }

    /// Append an assistant message with a fresh ID
    pub fn push_assistant(&mut self, content: impl Into<String>) -> MessageId {
        self.push(ChatMessage::assistant(content))
    }

    /// Fold one streamed fragment into the conversation.
    ///
    /// If the last message is the assistant reply identified by `reply_id`,
    /// it is replaced by a new message with the same ID and the fragment
    /// appended to its content. Otherwise a new assistant message carrying
    /// `reply_id` is appended. Either way the reply is linked to `reply_to`.
    pub fn apply_fragment(
        &mut self,
        reply_id: &MessageId,
        reply_to: Option<&MessageId>,
        fragment: &str,
    ) -> Applied {
        let (content, applied) = match self.messages.last() {
            Some(last) if last.is_assistant() && &last.id == reply_id => {
                (format!("{}{}", last.content, fragment), Applied::Replaced)
            }
            _ => (fragment.to_string(), Applied::Appended),
        };

        let mut message = ChatMessage::new(reply_id.clone(), MessageRole::Assistant, content);
        message.reply_to = reply_to.cloned();

        match applied {
            Applied::Replaced => {
                if let Some(last) = self.messages.last_mut() {
                    *last = message;
                }
            }
            Applied::Appended => self.messages.push(message),
        }
        applied
    }

    /// All messages in display order
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recent message
    #[must_use]
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    /// Get message by ID
    #[must_use]
    pub fn get(&self, id: &MessageId) -> Option<&ChatMessage> {
        self.messages.iter().find(|m| &m.id == id)
    }

    /// Number of messages
    #[must_use]
    pub fn len(&self) -> usize {
        self.messages.len()
    }

    /// Whether the conversation has no messages
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// History as role/content pairs for the completion endpoint
    #[must_use]
    pub fn turns(&self) -> Vec<ChatTurn> {
        self.messages.iter().map(ChatTurn::from).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_conversation_order() {
        let mut conversation = Conversation::new();
        assert!(conversation.is_empty());

        let user_id = conversation.push_user("Hello");
        conversation.push_assistant("Hi there");

        assert_eq!(conversation.len(), 2);
        assert_eq!(conversation.messages()[0].id, user_id);
        assert_eq!(conversation.last().unwrap().content, "Hi there");
    }

    #[test]
    fn test_fragments_accumulate_into_one_message() {
        let mut conversation = Conversation::new();
        let user_id = conversation.push_user("Say hello");
        let reply_id = MessageId::new();

        assert_eq!(
            conversation.apply_fragment(&reply_id, Some(&user_id), "He"),
            Applied::Appended
        );
        assert_eq!(
            conversation.apply_fragment(&reply_id, Some(&user_id), "llo"),
            Applied::Replaced
        );

        assert_eq!(conversation.len(), 2);
        let reply = conversation.get(&reply_id).unwrap();
        assert_eq!(reply.role, MessageRole::Assistant);
        assert_eq!(reply.content, "Hello");
        assert_eq!(reply.reply_to, Some(user_id));
    }

    #[test]
    fn test_fragment_after_other_assistant_message_appends() {
        let mut conversation = Conversation::new();
        conversation.push_user("First");
        let earlier = conversation.push_assistant("Earlier reply");
        let reply_id = MessageId::new();

        assert_eq!(conversation.apply_fragment(&reply_id, None, "New"), Applied::Appended);

        assert_eq!(conversation.len(), 3);
        assert_eq!(conversation.get(&earlier).unwrap().content, "Earlier reply");
        assert_eq!(conversation.last().unwrap().id, reply_id);
    }

    #[test]
    fn test_turns_strip_ids() {
        let mut conversation = Conversation::new();
        conversation.push_user("Question");
        conversation.push_assistant("Answer");

        assert_eq!(
            conversation.turns(),
            vec![
                ChatTurn {
                    role: MessageRole::User,
                    content: "Question".to_string(),
                },
                ChatTurn {
                    role: MessageRole::Assistant,
                    content: "Answer".to_string(),
                },
            ]
        );

        let json = serde_json::to_value(&conversation.turns()[0]).unwrap();
        assert_eq!(json, serde_json::json!({"role": "user", "content": "Question"}));
    }
}
