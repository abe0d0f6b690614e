//! The seam between sessions and rooms.

use std::sync::Arc;

use roomhub_protocol::{Message, RoomId, SessionId};

use crate::SessionHandle;

/// What a session needs from the room it is in.
///
/// Implemented by the room crate for every room kind. Object safe, so a
/// session can hold whatever room it was moved into as a [`RoomRef`].
pub trait RoomPort: Send + Sync + 'static {
    /// The id the room is registered under.
    fn id(&self) -> &RoomId;

    /// Process-unique number of this room instance. A room recreated under
    /// the same id gets a new one.
    fn instance(&self) -> u64;

    /// `true` while the room admits joins and dispatches messages.
    fn is_open(&self) -> bool;

    /// Number of sessions currently admitted.
    fn member_count(&self) -> usize;

    /// Tries to admit the session. Returns `false` (and notifies the
    /// session) if the room is closed or refuses it.
    fn join(&self, session: &SessionHandle) -> bool;

    /// Removes the session if it is a member. No-op otherwise.
    fn leave(&self, session: SessionId);

    /// Hands a message from a member to the room. Messages from
    /// non-members are dropped.
    fn dispatch(&self, session: SessionId, message: &Message);
}

/// Shared, type-erased reference to a room.
pub type RoomRef = Arc<dyn RoomPort>;
