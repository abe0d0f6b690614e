//! Error types for the session layer.

use roomhub_protocol::{RoomId, SessionId};

/// Errors that can occur while admitting a session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// The session's very first join (into the lobby) was rejected, so the
    /// registration was abandoned and no router exists for it.
    #[error("registration of {session} aborted: could not join room {room}")]
    OperationAborted {
        /// The id that was allocated for the abandoned session.
        session: SessionId,
        /// The room that refused it.
        room: RoomId,
    },
}
