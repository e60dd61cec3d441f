//! WebSocket Client Transport
//!
//! Client side of the streaming socket. One connection is shared by the
//! whole chat session. A reader task forwards every incoming text frame to
//! the currently attached fragment listener; a writer task owns the sink and
//! sends one raw text frame per submission.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::{Sink, SinkExt, StreamExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};

use super::config::SocketConfig;
use super::listener::{FragmentListener, ListenerSlot};
use super::traits::{StreamSocket, TransportError};

/// Client-side WebSocket transport
pub struct WebSocketClient {
    /// Socket URL
    url: String,
    /// Connection timeout
    connect_timeout: Duration,
    /// Channel to the writer task
    out_tx: Option<mpsc::Sender<String>>,
    /// Reader task handle
    reader: Option<JoinHandle<()>>,
    /// Whether the socket is open
    connected: Arc<AtomicBool>,
    /// Registration point for the fragment listener
    listeners: ListenerSlot,
}

impl WebSocketClient {
    /// Create a disconnected client for the given URL
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout: Duration::from_secs(5),
            out_tx: None,
            reader: None,
            connected: Arc::new(AtomicBool::new(false)),
            listeners: ListenerSlot::new(),
        }
    }

    /// Create a disconnected client from configuration
    #[must_use]
    pub fn from_config(config: &SocketConfig) -> Self {
        let mut client = Self::new(config.url.clone());
        client.connect_timeout = config.connect_timeout();
        client
    }

    /// The socket URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Open the connection
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::InvalidState`] if already connected, or
    /// [`TransportError::ConnectionFailed`] if the handshake fails or times out.
    pub async fn connect(&mut self) -> Result<(), TransportError> {
        if self.connected.load(Ordering::SeqCst) {
            return Err(TransportError::InvalidState("Already connected".to_string()));
        }

        let connect = connect_async(self.url.as_str());
        let (stream, _) = tokio::time::timeout(self.connect_timeout, connect)
            .await
            .map_err(|_| {
                TransportError::ConnectionFailed(format!("Timed out connecting to {}", self.url))
            })?
            .map_err(|e| {
                TransportError::ConnectionFailed(format!("Failed to connect to {}: {e}", self.url))
            })?;

        let (sink, mut source) = stream.split();
        let (out_tx, out_rx) = mpsc::channel::<String>(100);

        self.connected.store(true, Ordering::SeqCst);

        // Reader: socket -> attached listener
        let connected_read = Arc::clone(&self.connected);
        let listeners = self.listeners.clone();
        let reader = tokio::spawn(async move {
            while let Some(frame) = source.next().await {
                match frame {
                    Ok(Message::Text(text)) => {
                        if !listeners.deliver(Ok(text)) {
                            tracing::debug!("Dropped frame: no listener attached");
                        }
                    }
                    Ok(Message::Binary(bytes)) => {
                        let text = String::from_utf8_lossy(&bytes).into_owned();
                        listeners.deliver(Ok(text));
                    }
                    Ok(Message::Close(frame)) => {
                        tracing::info!(frame = ?frame, "Socket closed by server");
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!(error = %e, "Socket read error");
                        listeners.deliver(Err(TransportError::ConnectionFailed(e.to_string())));
                        break;
                    }
                }
            }

            connected_read.store(false, Ordering::SeqCst);
            listeners.deliver(Err(TransportError::ConnectionClosed));
            tracing::info!("Disconnected from streaming socket");
        });

        // Writer: outgoing submissions -> socket
        tokio::spawn(write_frames(
            sink,
            out_rx,
            Arc::clone(&self.connected),
            self.listeners.clone(),
        ));

        self.out_tx = Some(out_tx);
        self.reader = Some(reader);

        tracing::info!(url = %self.url, "Connected to streaming socket");

        Ok(())
    }

    /// Close the connection and stop the background tasks
    pub fn disconnect(&mut self) {
        self.connected.store(false, Ordering::SeqCst);
        self.out_tx = None;
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
        self.listeners.detach();
    }
}

/// Forward outgoing text to the sink until the channel closes or a write fails.
///
/// A failed write marks the socket closed and is reported to the attached
/// listener, so an exchange waiting on the reply ends instead of hanging.
async fn write_frames<W>(
    mut sink: W,
    mut out_rx: mpsc::Receiver<String>,
    connected: Arc<AtomicBool>,
    listeners: ListenerSlot,
) where
    W: Sink<Message> + Unpin,
    W::Error: std::fmt::Display,
{
    while let Some(text) = out_rx.recv().await {
        if let Err(e) = sink.send(Message::Text(text)).await {
            tracing::warn!(error = %e, "Socket write error");
            connected.store(false, Ordering::SeqCst);
            listeners.deliver(Err(TransportError::SendFailed(e.to_string())));
            break;
        }
    }

    let _ = sink.close().await;
}

impl Drop for WebSocketClient {
    fn drop(&mut self) {
        if let Some(reader) = self.reader.take() {
            reader.abort();
        }
    }
}

#[async_trait]
impl StreamSocket for WebSocketClient {
    fn is_open(&self) -> bool {
        self.connected.load(Ordering::SeqCst) && self.out_tx.is_some()
    }

    async fn send_text(&self, text: &str) -> Result<(), TransportError> {
        if !self.is_open() {
            return Err(TransportError::Unavailable);
        }

        match self.out_tx {
            Some(ref tx) => tx
                .send(text.to_string())
                .await
                .map_err(|_| TransportError::SendFailed("Channel closed".to_string())),
            None => Err(TransportError::Unavailable),
        }
    }

    fn attach_listener(&self) -> FragmentListener {
        self.listeners.attach()
    }

    fn detach_listener(&self) {
        self.listeners.detach();
    }

    fn has_listener(&self) -> bool {
        self.listeners.is_attached()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::net::TcpListener;

    #[tokio::test]
    async fn test_new_client_is_closed() {
        let client = WebSocketClient::new("ws://127.0.0.1:1");
        assert!(!client.is_open());
        assert!(!client.has_listener());
        assert_eq!(client.url(), "ws://127.0.0.1:1");
    }

    #[tokio::test]
    async fn test_send_when_closed() {
        let client = WebSocketClient::new("ws://127.0.0.1:1");
        let result = client.send_text("hello").await;
        assert_eq!(result, Err(TransportError::Unavailable));
    }

    #[tokio::test]
    async fn test_connect_refused() {
        // Bind then drop to get a port nobody listens on
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let mut client = WebSocketClient::new(format!("ws://{addr}"));
        let result = client.connect().await;

        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
        assert!(!client.is_open());
    }

    #[tokio::test]
    async fn test_write_failure_reaches_listener() {
        let sink = Box::pin(futures::sink::unfold((), |(), _frame: Message| async {
            Err::<(), _>(std::io::Error::other("broken pipe"))
        }));
        let (out_tx, out_rx) = mpsc::channel(4);
        let connected = Arc::new(AtomicBool::new(true));
        let slot = ListenerSlot::new();
        let mut listener = slot.attach();

        let writer = tokio::spawn(write_frames(
            sink,
            out_rx,
            Arc::clone(&connected),
            slot.clone(),
        ));
        out_tx.send("Hi".to_string()).await.unwrap();

        let item = tokio::time::timeout(Duration::from_secs(2), listener.recv())
            .await
            .unwrap();
        assert_eq!(item, Err(TransportError::SendFailed("broken pipe".to_string())));
        assert!(!connected.load(Ordering::SeqCst));

        // The writer stops after the first failure
        tokio::time::timeout(Duration::from_secs(2), writer)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_echo_roundtrip() {
        let server = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = server.local_addr().unwrap();

        tokio::spawn(async move {
            let (stream, _) = server.accept().await.unwrap();
            let mut ws = tokio_tungstenite::accept_async(stream).await.unwrap();
            while let Some(Ok(Message::Text(text))) = ws.next().await {
                ws.send(Message::Text(format!("echo:{text}"))).await.unwrap();
            }
        });

        let mut client = WebSocketClient::new(format!("ws://{addr}"));
        client.connect().await.unwrap();
        assert!(client.is_open());

        let mut listener = client.attach_listener();
        client.send_text("ping").await.unwrap();

        let reply = tokio::time::timeout(Duration::from_secs(2), listener.recv())
            .await
            .unwrap();
        assert_eq!(reply, Ok("echo:ping".to_string()));

        drop(listener);
        assert!(!client.has_listener());

        client.disconnect();
        assert!(!client.is_open());
    }
}
