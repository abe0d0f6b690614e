//! Transport abstraction layer for Roomhub.
//!
//! The room core never touches sockets. It talks to a [`Connection`]
//! (send, disconnect, identity) and consumes that connection's
//! [`ConnectionEvent`]s from an [`EventReceiver`]. Any transport that can
//! provide those two things can host rooms.
//!
//! [`ChannelConnection`] is an in-memory implementation backed by tokio
//! channels. It is what embedding applications and tests use; a network
//! transport would wrap its socket tasks in the same shape.

mod channel;
mod error;

pub use channel::{ChannelConnection, ClientEnd};
pub use error::TransportError;

use std::fmt;

use roomhub_protocol::Message;
use tokio::sync::mpsc;

/// Opaque identifier for a connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    /// Creates a new `ConnectionId` from a raw `u64`.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Returns the underlying `u64` value.
    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// Something the transport tells the room system about a connection.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionEvent {
    /// A framed message arrived from the peer.
    Message(Message),
    /// The connection is gone. Always the last event for a connection.
    Disconnected,
}

/// Per-connection event stream, delivered in transport order.
pub type EventReceiver = mpsc::UnboundedReceiver<ConnectionEvent>;

/// A single client connection as seen by the room system.
///
/// Object safe so routers can hold `Arc<dyn Connection>`. `send` only
/// queues; it never blocks on the network.
pub trait Connection: Send + Sync + 'static {
    /// Queues a message for delivery to the peer.
    fn send(&self, message: &Message) -> Result<(), TransportError>;

    /// Closes the connection. The transport follows up with exactly one
    /// [`ConnectionEvent::Disconnected`] on the event stream.
    fn disconnect(&self);

    /// Returns the unique identifier for this connection.
    fn id(&self) -> ConnectionId;

    /// A human-readable description of the remote end (address, label).
    fn endpoint(&self) -> &str;
}
