//! Unified error type for Roomhub.

use roomhub_protocol::ProtocolError;
use roomhub_room::RoomError;
use roomhub_session::SessionError;
use roomhub_transport::TransportError;

/// Top-level error that wraps all crate-specific errors.
///
/// When using the `roomhub` meta-crate, you deal with this single error
/// type instead of importing errors from each sub-crate. The `#[from]`
/// attribute on each variant generates the `From` impls, so `?` converts
/// sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum HubError {
    /// A transport-level error (send on a closed connection).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A message argument was missing or of the wrong type.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session could not be admitted.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// A room or registry operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),
}
