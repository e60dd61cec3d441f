//! Line-oriented rendering of chat updates
//!
//! A streamed reply grows in place: only the new tail of each replacement is
//! written, and the line is closed when the exchange ends.

use chat_core::{ChatUpdate, MessageRole, SubmissionState};

/// Shown while a reply is pending
pub const WAITING: &str = "(waiting for reply...)";

/// Assistant message currently being written
#[derive(Debug, Clone, Copy)]
struct OpenReply {
    /// Index in the conversation
    index: usize,
    /// Bytes of content already written
    written: usize,
}

/// Turns updates into terminal text
#[derive(Debug, Default)]
pub struct Renderer {
    /// Messages seen so far
    count: usize,
    open: Option<OpenReply>,
}

impl Renderer {
    /// Create a renderer for an empty conversation
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Text to write for one update (may be empty)
    pub fn render(&mut self, update: &ChatUpdate) -> String {
        match update {
            ChatUpdate::MessageAppended { message } => {
                let index = self.count;
                self.count += 1;

                // The user already sees their own line
                if message.role == MessageRole::User {
                    return self.close();
                }

                let mut out = self.close();
                out.push_str(&format!("{}: {}", message.role.as_str(), message.content));
                self.open = Some(OpenReply {
                    index,
                    written: message.content.len(),
                });
                out
            }
            ChatUpdate::MessageReplaced { index, message } => match self.open {
                Some(open)
                    if open.index == *index
                        && message.content.len() >= open.written
                        && message.content.is_char_boundary(open.written) =>
                {
                    let tail = message.content[open.written..].to_string();
                    self.open = Some(OpenReply {
                        index: *index,
                        written: message.content.len(),
                    });
                    tail
                }
                _ => {
                    let mut out = self.close();
                    out.push_str(&format!("{}: {}", message.role.as_str(), message.content));
                    self.open = Some(OpenReply {
                        index: *index,
                        written: message.content.len(),
                    });
                    out
                }
            },
            ChatUpdate::State {
                state: SubmissionState::Idle,
            } => self.close(),
            ChatUpdate::Pending { .. } | ChatUpdate::State { .. } => String::new(),
        }
    }

    /// Transient status for stderr, if the update warrants one
    #[must_use]
    pub fn status(update: &ChatUpdate) -> Option<&'static str> {
        match update {
            ChatUpdate::Pending { pending: true } => Some(WAITING),
            _ => None,
        }
    }

    fn close(&mut self) -> String {
        match self.open.take() {
            Some(_) => "\n".to_string(),
            None => String::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::{ChatMessage, MessageId};
    use pretty_assertions::assert_eq;

    fn render_all(updates: &[ChatUpdate]) -> String {
        let mut renderer = Renderer::new();
        updates.iter().map(|u| renderer.render(u)).collect()
    }

    #[test]
    fn test_completion_reply() {
        let out = render_all(&[
            ChatUpdate::State {
                state: SubmissionState::Sending,
            },
            ChatUpdate::MessageAppended {
                message: ChatMessage::user("Hello"),
            },
            ChatUpdate::Pending { pending: true },
            ChatUpdate::MessageAppended {
                message: ChatMessage::assistant("hi"),
            },
            ChatUpdate::Pending { pending: false },
            ChatUpdate::State {
                state: SubmissionState::Idle,
            },
        ]);
        assert_eq!(out, "assistant: hi\n");
    }

    #[test]
    fn test_streamed_reply_grows_in_place() {
        let id = MessageId::new();
        let partial = |text: &str| ChatMessage::new(id.clone(), MessageRole::Assistant, text);

        let out = render_all(&[
            ChatUpdate::MessageAppended {
                message: ChatMessage::user("Hi"),
            },
            ChatUpdate::MessageAppended {
                message: partial("He"),
            },
            ChatUpdate::MessageReplaced {
                index: 1,
                message: partial("Hello"),
            },
            ChatUpdate::MessageReplaced {
                index: 1,
                message: partial("Hello!"),
            },
            ChatUpdate::State {
                state: SubmissionState::Idle,
            },
        ]);
        assert_eq!(out, "assistant: Hello!\n");
    }

    #[test]
    fn test_waiting_status() {
        assert_eq!(
            Renderer::status(&ChatUpdate::Pending { pending: true }),
            Some(WAITING)
        );
        assert_eq!(Renderer::status(&ChatUpdate::Pending { pending: false }), None);
        assert_eq!(
            Renderer::status(&ChatUpdate::MessageAppended {
                message: ChatMessage::assistant("hi"),
            }),
            None
        );
    }

    #[test]
    fn test_error_after_partial_reply() {
        let out = render_all(&[
            ChatUpdate::MessageAppended {
                message: ChatMessage::user("Hi"),
            },
            ChatUpdate::MessageAppended {
                message: ChatMessage::assistant("Par"),
            },
            ChatUpdate::State {
                state: SubmissionState::Erroring,
            },
            ChatUpdate::MessageAppended {
                message: ChatMessage::assistant("[WebSocket error]"),
            },
            ChatUpdate::State {
                state: SubmissionState::Idle,
            },
        ]);
        assert_eq!(out, "assistant: Par\nassistant: [WebSocket error]\n");
    }
}
