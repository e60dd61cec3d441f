//! Submission Controller
//!
//! The orchestrator between a UI surface and the two transports. It:
//! - accepts a user submission and appends it to the conversation at once
//! - guards against overlapping exchanges with the pending-submission flag
//! - picks a transport from the stored credential
//! - folds the reply (one-shot or streamed) back into the conversation
//! - publishes every change to the surface as a [`ChatUpdate`]
//!
//! # State machine
//!
//! ```text
//! Idle ──submit──▶ Sending ──reply / terminator──▶ Idle
//!                     │
//!                     └──transport failure──▶ Erroring ──▶ Idle
//! ```
//!
//! Transport failures never escape: each becomes an assistant message with a
//! fixed error text, and the pending flag is cleared on every exit path.
//!
//! # Streaming
//!
//! A streamed reply arrives after [`SubmissionController::submit`] returns.
//! Drive it with [`SubmissionController::next_stream_event`] (await the next
//! fragment) or [`SubmissionController::poll_streaming`] (drain whatever has
//! arrived without waiting). Inside a `tokio::select!`, race the cancel-safe
//! [`SubmissionController::recv_stream_item`] and apply the item afterwards
//! with [`SubmissionController::apply_stream_item`].
//!
//! State changes never wait on the surface: updates are queued first and
//! delivered afterwards, so an interrupted delivery cannot leave the
//! exchange half applied.

use std::collections::VecDeque;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::backend::{CompletionBackend, CompletionRequest, DEFAULT_MODEL};
use crate::config::ChatConfig;
use crate::credentials::{CredentialStore, DEFAULT_CREDENTIAL_KEY};
use crate::messages::{
    ChatMessage, ChatUpdate, MessageId, SubmissionState, COMPLETION_ERROR_TEXT,
    SOCKET_ERROR_TEXT, SOCKET_UNAVAILABLE_TEXT,
};
use crate::selector::{select_transport, TransportKind};
use crate::session::{Applied, Conversation};
use crate::transport::{
    FragmentDecoder, FragmentListener, StreamItem, StreamSocket, DEFAULT_TERMINATOR,
};

/// Controller configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Completion model identifier
    pub model: String,
    /// Key the credential is read from
    pub credential_key: String,
    /// Marker that ends a streamed reply
    pub terminator: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            credential_key: DEFAULT_CREDENTIAL_KEY.to_string(),
            terminator: DEFAULT_TERMINATOR.to_string(),
        }
    }
}

impl From<&ChatConfig> for ControllerConfig {
    fn from(config: &ChatConfig) -> Self {
        Self {
            model: config.model.clone(),
            credential_key: config.credential_key.clone(),
            terminator: config.terminator.clone(),
        }
    }
}

/// Outcome of a submission attempt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// Nothing happened: empty text, or an exchange is already pending
    Ignored,
    /// The completion transport answered and the reply was appended
    Completed,
    /// Sent over the socket; the reply arrives as stream events
    Streaming,
    /// A transport failure was turned into an error message
    Failed,
}

/// What one delivered stream item did
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StreamEvent {
    /// A fragment was folded into the reply
    Fragment,
    /// The terminator arrived; the exchange is over
    Completed,
    /// The stream failed; an error message was appended
    Failed,
}

/// In-progress streamed reply
struct FragmentAccumulator {
    /// ID every fragment of this reply is written under
    reply_id: MessageId,
    /// User message the reply answers
    reply_to: MessageId,
    /// Listener registration, detached on drop
    listener: FragmentListener,
}

/// Drives one chat session over either transport
pub struct SubmissionController<B: CompletionBackend, S: StreamSocket> {
    /// Configuration
    config: ControllerConfig,
    /// Single-shot completion transport
    backend: B,
    /// Streaming socket transport
    socket: S,
    /// Where the credential is read from
    credentials: Arc<dyn CredentialStore>,
    /// Conversation log
    conversation: Conversation,
    /// Input buffer
    draft: String,
    /// Pending-submission flag
    pending: bool,
    /// Current state
    state: SubmissionState,
    /// Streamed reply being assembled
    accumulator: Option<FragmentAccumulator>,
    /// Splits the terminator from fragment payloads
    decoder: FragmentDecoder,
    /// Updates not yet accepted by the surface channel
    outbox: VecDeque<ChatUpdate>,
    /// Channel to the UI surface
    tx: mpsc::Sender<ChatUpdate>,
}

impl<B: CompletionBackend, S: StreamSocket> SubmissionController<B, S> {
    /// Create a controller with an empty conversation
    #[must_use]
    pub fn new(
        backend: B,
        socket: S,
        credentials: Arc<dyn CredentialStore>,
        config: ControllerConfig,
        tx: mpsc::Sender<ChatUpdate>,
    ) -> Self {
        let decoder = FragmentDecoder::new(config.terminator.clone());
        Self {
            config,
            backend,
            socket,
            credentials,
            conversation: Conversation::new(),
            draft: String::new(),
            pending: false,
            state: SubmissionState::Idle,
            accumulator: None,
            decoder,
            outbox: VecDeque::new(),
            tx,
        }
    }

    /// All messages in display order
    #[must_use]
    pub fn messages(&self) -> &[ChatMessage] {
        self.conversation.messages()
    }

    /// The conversation log
    #[must_use]
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Whether an exchange is pending (new submissions are ignored)
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Current state
    #[must_use]
    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Whether a streamed reply is still being assembled
    #[must_use]
    pub fn is_streaming(&self) -> bool {
        self.accumulator.is_some()
    }

    /// The input buffer
    #[must_use]
    pub fn draft(&self) -> &str {
        &self.draft
    }

    /// Replace the input buffer
    pub fn set_draft(&mut self, text: impl Into<String>) {
        self.draft = text.into();
    }

    /// The streaming socket
    #[must_use]
    pub fn socket(&self) -> &S {
        &self.socket
    }

    /// The streaming socket, mutably (e.g. to reconnect)
    pub fn socket_mut(&mut self) -> &mut S {
        &mut self.socket
    }

    /// The credential store
    #[must_use]
    pub fn credentials(&self) -> &Arc<dyn CredentialStore> {
        &self.credentials
    }

    /// Submit a message.
    ///
    /// Uses `text` when non-empty, otherwise the input buffer. Ignored when
    /// the resulting text is empty or an exchange is pending.
    ///
    /// Not cancel-safe: a completion request dropped mid-flight leaves the
    /// exchange pending. Run it to completion.
    pub async fn submit(&mut self, text: Option<&str>) -> Submission {
        self.flush().await;

        if self.pending {
            tracing::debug!("Submission ignored: exchange already pending");
            return Submission::Ignored;
        }

        let text = match text {
            Some(text) if !text.is_empty() => text.to_string(),
            _ => self.draft.clone(),
        };
        if text.is_empty() {
            return Submission::Ignored;
        }

        self.set_state(SubmissionState::Sending);
        self.draft.clear();
        let user_id = self.append(ChatMessage::user(text.clone()));
        self.set_pending(true);

        // Stop listening to whatever an earlier exchange left behind
        if self.accumulator.take().is_some() {
            tracing::debug!("Abandoned unfinished streamed reply");
        }
        self.socket.detach_listener();

        // The user message reaches the surface before any transport call
        self.flush().await;

        let credential = self.credentials.get(&self.config.credential_key);
        let kind = select_transport(credential.as_deref());
        tracing::debug!(user_id = %user_id, transport = ?kind, "Submitting message");

        let outcome = match kind {
            TransportKind::Completion => {
                self.run_completion(credential.unwrap_or_default(), user_id)
                    .await
            }
            TransportKind::Stream => self.start_stream(&text, user_id).await,
        };

        self.flush().await;
        outcome
    }

    /// Wait for the next stream item without applying it.
    ///
    /// Cancel-safe: dropping the future before it resolves loses nothing, so
    /// it can race other branches of a `tokio::select!`. Hand the item to
    /// [`Self::apply_stream_item`] once the select has finished.
    ///
    /// Returns `None` when no streamed reply is in progress.
    pub async fn recv_stream_item(&mut self) -> Option<StreamItem> {
        let accumulator = self.accumulator.as_mut()?;
        Some(accumulator.listener.recv().await)
    }

    /// Apply one stream item and publish the resulting updates.
    ///
    /// Conversation state is updated before anything is published, so a
    /// cancelled call only delays its updates until the next call.
    ///
    /// Returns `None` when no streamed reply is in progress.
    pub async fn apply_stream_item(&mut self, item: StreamItem) -> Option<StreamEvent> {
        let event = self.handle_stream_item(item);
        self.flush().await;
        event
    }

    /// Wait for the next stream item and apply it.
    ///
    /// Returns `None` when no streamed reply is in progress.
    pub async fn next_stream_event(&mut self) -> Option<StreamEvent> {
        let item = self.recv_stream_item().await?;
        self.apply_stream_item(item).await
    }

    /// Apply every stream item that has already arrived.
    ///
    /// Call this regularly to process incoming fragments.
    /// Returns true if there was activity.
    pub async fn poll_streaming(&mut self) -> bool {
        let mut activity = false;

        while let Some(accumulator) = self.accumulator.as_mut() {
            let Some(item) = accumulator.listener.try_recv() else {
                break;
            };
            activity = true;
            self.handle_stream_item(item);
        }

        self.flush().await;
        activity
    }

    async fn run_completion(&mut self, credential: String, user_id: MessageId) -> Submission {
        let request =
            CompletionRequest::new(&self.config.model, self.conversation.turns(), credential);

        let outcome = match self.backend.complete(&request).await {
            Ok(response) => {
                tracing::debug!(
                    model = %response.model,
                    duration_ms = ?response.duration_ms,
                    "Completion received"
                );
                self.append(ChatMessage::assistant(response.content).with_reply_to(user_id));
                Submission::Completed
            }
            Err(e) => {
                tracing::warn!(backend = self.backend.name(), error = %e, "Completion failed");
                self.fail(COMPLETION_ERROR_TEXT, user_id);
                Submission::Failed
            }
        };

        self.finish();
        outcome
    }

    async fn start_stream(&mut self, text: &str, user_id: MessageId) -> Submission {
        if !self.socket.is_open() {
            tracing::warn!("Streaming socket is not open");
            self.fail(SOCKET_UNAVAILABLE_TEXT, user_id);
            self.finish();
            return Submission::Failed;
        }

        // Listen before sending so a fast reply cannot slip past
        let listener = self.socket.attach_listener();
        if let Err(e) = self.socket.send_text(text).await {
            drop(listener);
            tracing::warn!(error = %e, "Socket send failed");
            self.fail(SOCKET_ERROR_TEXT, user_id);
            self.finish();
            return Submission::Failed;
        }

        let reply_id = MessageId::new();
        tracing::debug!(user_id = %user_id, reply_id = %reply_id, "Awaiting streamed reply");
        self.accumulator = Some(FragmentAccumulator {
            reply_id,
            reply_to: user_id,
            listener,
        });

        Submission::Streaming
    }

    /// Fold one stream item into the conversation; queues updates only
    fn handle_stream_item(&mut self, item: StreamItem) -> Option<StreamEvent> {
        let (reply_id, reply_to) = self
            .accumulator
            .as_ref()
            .map(|accumulator| (accumulator.reply_id.clone(), accumulator.reply_to.clone()))?;

        let raw = match item {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!(reply_id = %reply_id, error = %e, "Stream ended without terminator");
                self.accumulator = None;
                self.fail(SOCKET_ERROR_TEXT, reply_to);
                self.finish();
                return Some(StreamEvent::Failed);
            }
        };

        let fragment = self.decoder.decode(&raw);
        if !fragment.payload.is_empty() {
            let applied =
                self.conversation
                    .apply_fragment(&reply_id, Some(&reply_to), &fragment.payload);
            if let Some(message) = self.conversation.last().cloned() {
                let update = match applied {
                    Applied::Appended => ChatUpdate::MessageAppended { message },
                    Applied::Replaced => ChatUpdate::MessageReplaced {
                        index: self.conversation.len() - 1,
                        message,
                    },
                };
                self.outbox.push_back(update);
            }
        }

        // Input re-enables as soon as the reply starts arriving
        self.set_pending(false);

        if fragment.terminal {
            tracing::debug!(reply_id = %reply_id, "Streamed reply complete");
            self.accumulator = None;
            self.set_state(SubmissionState::Idle);
            return Some(StreamEvent::Completed);
        }

        Some(StreamEvent::Fragment)
    }

    /// Convert a transport failure into a visible message
    fn fail(&mut self, text: &str, reply_to: MessageId) {
        self.set_state(SubmissionState::Erroring);
        self.append(ChatMessage::assistant(text).with_reply_to(reply_to));
    }

    fn finish(&mut self) {
        self.set_pending(false);
        self.set_state(SubmissionState::Idle);
    }

    fn append(&mut self, message: ChatMessage) -> MessageId {
        let id = self.conversation.push(message.clone());
        self.outbox.push_back(ChatUpdate::MessageAppended { message });
        id
    }

    fn set_pending(&mut self, pending: bool) {
        if self.pending != pending {
            self.pending = pending;
            self.outbox.push_back(ChatUpdate::Pending { pending });
        }
    }

    fn set_state(&mut self, state: SubmissionState) {
        if self.state != state {
            self.state = state;
            self.outbox.push_back(ChatUpdate::State { state });
        }
    }

    /// Deliver queued updates to the surface, oldest first.
    ///
    /// An update leaves the queue only once the channel has taken it, so a
    /// cancelled flush resumes where it stopped.
    async fn flush(&mut self) {
        while let Some(update) = self.outbox.front().cloned() {
            if let Err(e) = self.tx.send(update).await {
                tracing::warn!("Failed to send update to surface: {}", e);
                self.outbox.clear();
                return;
            }
            self.outbox.pop_front();
        }
    }
}
