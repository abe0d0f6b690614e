use crate::ConnectionId;

/// Errors that can occur in the transport layer.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    /// The connection was closed, locally or by the peer.
    #[error("connection {0} closed")]
    ConnectionClosed(ConnectionId),
}
