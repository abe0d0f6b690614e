//! In-memory [`Connection`] backed by unbounded tokio channels.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use roomhub_protocol::Message;
use tokio::sync::mpsc;

use crate::{Connection, ConnectionEvent, ConnectionId, EventReceiver, TransportError};

/// Counter for generating unique connection IDs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// State shared by both ends of one channel connection.
struct Shared {
    id: ConnectionId,
    closed: AtomicBool,
    events: mpsc::UnboundedSender<ConnectionEvent>,
}

impl Shared {
    /// Marks the connection closed. Only the first call emits
    /// `Disconnected`.
    fn close(&self) {
        if !self.closed.swap(true, Ordering::AcqRel) {
            tracing::debug!(id = %self.id, "channel connection closed");
            let _ = self.events.send(ConnectionEvent::Disconnected);
        }
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }
}

/// Server side of an in-memory connection.
pub struct ChannelConnection {
    shared: Arc<Shared>,
    endpoint: String,
    outbound: mpsc::UnboundedSender<Message>,
}

impl ChannelConnection {
    /// Creates a connected pair.
    ///
    /// Returns the server-side connection, the event stream the room
    /// system should consume, and the client end used to drive it.
    pub fn pair(endpoint: impl Into<String>) -> (Self, EventReceiver, ClientEnd) {
        let id = ConnectionId::new(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed));
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        let (out_tx, out_rx) = mpsc::unbounded_channel();

        let shared = Arc::new(Shared {
            id,
            closed: AtomicBool::new(false),
            events: events_tx,
        });

        let conn = Self {
            shared: Arc::clone(&shared),
            endpoint: endpoint.into(),
            outbound: out_tx,
        };
        let client = ClientEnd {
            shared,
            outbound: out_rx,
        };
        (conn, events_rx, client)
    }

    /// `true` once either side has disconnected.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }
}

impl Connection for ChannelConnection {
    fn send(&self, message: &Message) -> Result<(), TransportError> {
        if self.shared.is_closed() {
            return Err(TransportError::ConnectionClosed(self.shared.id));
        }
        self.outbound
            .send(message.clone())
            .map_err(|_| TransportError::ConnectionClosed(self.shared.id))
    }

    fn disconnect(&self) {
        self.shared.close();
    }

    fn id(&self) -> ConnectionId {
        self.shared.id
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Client side of an in-memory connection.
///
/// Dropping it counts as the peer going away.
pub struct ClientEnd {
    shared: Arc<Shared>,
    outbound: mpsc::UnboundedReceiver<Message>,
}

impl ClientEnd {
    /// Delivers a message to the server as if it arrived off the wire.
    pub fn send(&self, message: Message) -> Result<(), TransportError> {
        if self.shared.is_closed() {
            return Err(TransportError::ConnectionClosed(self.shared.id));
        }
        self.shared
            .events
            .send(ConnectionEvent::Message(message))
            .map_err(|_| TransportError::ConnectionClosed(self.shared.id))
    }

    /// Hangs up from the client side.
    pub fn disconnect(&self) {
        self.shared.close();
    }

    /// Waits for the next message the server sent.
    ///
    /// Returns `None` once the server side is dropped and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<Message> {
        self.outbound.recv().await
    }

    /// Returns the next already-queued message, if any.
    pub fn try_recv(&mut self) -> Option<Message> {
        self.outbound.try_recv().ok()
    }

    /// Takes every message queued so far.
    pub fn drain(&mut self) -> Vec<Message> {
        let mut out = Vec::new();
        while let Ok(msg) = self.outbound.try_recv() {
            out.push(msg);
        }
        out
    }

    /// `true` once either side has disconnected.
    pub fn is_closed(&self) -> bool {
        self.shared.is_closed()
    }

    /// The id of the connection this end belongs to.
    pub fn id(&self) -> ConnectionId {
        self.shared.id
    }
}

impl Drop for ClientEnd {
    fn drop(&mut self) {
        self.shared.close();
    }
}
