//! Error types for the room layer.

use roomhub_protocol::RoomId;

/// Errors that can occur during room and registry operations.
///
/// A rejected join is not an error: it is reported as `false` plus a
/// `joinDenied` message to the session.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room is registered under this id.
    #[error("room {0} not found")]
    NotFound(RoomId),

    /// The room exists but is of a different kind than requested.
    #[error("room {room_id} is not a {expected}")]
    TypeMismatch {
        room_id: RoomId,
        expected: &'static str,
    },

    /// A room is already registered under this id.
    #[error("room {0} already exists")]
    AlreadyExists(RoomId),

    /// The operation is not allowed in the room's current state, or on
    /// the lobby at all.
    #[error("invalid room operation: {0}")]
    InvalidOperation(String),
}
