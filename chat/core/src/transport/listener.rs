//! Fragment Listener Registration
//!
//! A socket delivers every incoming frame to at most one listener. The
//! registration is scoped: a [`FragmentListener`] detaches itself when
//! dropped, and attaching a new listener cuts off the previous one, so frames
//! buffered for an abandoned exchange are discarded with it.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::mpsc;

use super::traits::TransportError;

/// One delivery to a listener: a raw text frame, or the error that ended the stream
pub type StreamItem = Result<String, TransportError>;

#[derive(Default)]
struct SlotState {
    next_id: u64,
    active: Option<(u64, mpsc::UnboundedSender<StreamItem>)>,
}

/// Shared registration point between a socket's reader and its listener
#[derive(Clone, Default)]
pub struct ListenerSlot {
    inner: Arc<Mutex<SlotState>>,
}

impl ListenerSlot {
    /// Create an empty slot
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new listener, replacing the current one
    #[must_use]
    pub fn attach(&self) -> FragmentListener {
        let (tx, rx) = mpsc::unbounded_channel();
        let mut state = self.inner.lock();
        let id = state.next_id;
        state.next_id += 1;
        if state.active.replace((id, tx)).is_some() {
            tracing::debug!(listener = id, "Replaced previous fragment listener");
        }

        FragmentListener {
            id,
            rx,
            slot: self.clone(),
        }
    }

    /// Detach whatever listener is attached
    pub fn detach(&self) {
        if let Some((id, _)) = self.inner.lock().active.take() {
            tracing::debug!(listener = id, "Detached fragment listener");
        }
    }

    /// Whether a listener is attached
    #[must_use]
    pub fn is_attached(&self) -> bool {
        self.inner.lock().active.is_some()
    }

    /// Deliver an item to the attached listener.
    ///
    /// Returns false when nobody is listening; the item is dropped.
    pub fn deliver(&self, item: StreamItem) -> bool {
        let mut state = self.inner.lock();
        let Some((_, tx)) = state.active.as_ref() else {
            return false;
        };
        if tx.send(item).is_ok() {
            return true;
        }
        state.active = None;
        false
    }

    fn release(&self, id: u64) {
        let mut state = self.inner.lock();
        if matches!(state.active, Some((active, _)) if active == id) {
            state.active = None;
        }
    }
}

/// Receiving end of a listener registration
///
/// Dropping it detaches the listener from its socket.
pub struct FragmentListener {
    id: u64,
    rx: mpsc::UnboundedReceiver<StreamItem>,
    slot: ListenerSlot,
}

impl FragmentListener {
    /// Wait for the next item.
    ///
    /// Once the listener has been replaced or detached and its buffer is
    /// drained, this yields [`TransportError::ConnectionClosed`].
    pub async fn recv(&mut self) -> StreamItem {
        self.rx
            .recv()
            .await
            .unwrap_or(Err(TransportError::ConnectionClosed))
    }

    /// Take the next buffered item without waiting
    pub fn try_recv(&mut self) -> Option<StreamItem> {
        match self.rx.try_recv() {
            Ok(item) => Some(item),
            Err(mpsc::error::TryRecvError::Empty) => None,
            Err(mpsc::error::TryRecvError::Disconnected) => {
                Some(Err(TransportError::ConnectionClosed))
            }
        }
    }
}

impl Drop for FragmentListener {
    fn drop(&mut self) {
        self.slot.release(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deliver_without_listener() {
        let slot = ListenerSlot::new();
        assert!(!slot.is_attached());
        assert!(!slot.deliver(Ok("lost".to_string())));
    }

    #[test]
    fn test_deliver_to_listener() {
        let slot = ListenerSlot::new();
        let mut listener = slot.attach();
        assert!(slot.is_attached());

        assert!(slot.deliver(Ok("He".to_string())));
        assert!(slot.deliver(Ok("llo".to_string())));

        assert_eq!(listener.try_recv(), Some(Ok("He".to_string())));
        assert_eq!(tokio_test::block_on(listener.recv()), Ok("llo".to_string()));
        assert_eq!(listener.try_recv(), None);
    }

    #[test]
    fn test_drop_detaches() {
        let slot = ListenerSlot::new();
        let listener = slot.attach();
        drop(listener);

        assert!(!slot.is_attached());
        assert!(!slot.deliver(Ok("late".to_string())));
    }

    #[test]
    fn test_attach_replaces_previous() {
        let slot = ListenerSlot::new();
        let mut first = slot.attach();
        slot.deliver(Ok("for first".to_string()));

        let mut second = slot.attach();
        slot.deliver(Ok("for second".to_string()));

        // The first listener keeps only what was buffered before replacement
        assert_eq!(first.try_recv(), Some(Ok("for first".to_string())));
        assert_eq!(first.try_recv(), Some(Err(TransportError::ConnectionClosed)));
        assert_eq!(second.try_recv(), Some(Ok("for second".to_string())));

        // Dropping the stale listener must not detach its replacement
        drop(first);
        assert!(slot.is_attached());
    }

    #[test]
    fn test_detach_closes_listener() {
        let slot = ListenerSlot::new();
        let mut listener = slot.attach();
        slot.detach();

        assert!(!slot.is_attached());
        assert_eq!(
            tokio_test::block_on(listener.recv()),
            Err(TransportError::ConnectionClosed)
        );
    }
}
