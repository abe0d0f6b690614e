//! A session's membership in one room.

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};

use roomhub_protocol::{Message, SessionId};
use roomhub_session::{RoomRef, SessionHandle};
use roomhub_transport::TransportError;

use crate::lock;

/// A member of a room, as room logic sees it.
///
/// Wraps the session handle plus a state slot `S` owned by the room kind.
/// Cheap to clone; clones share the state slot. A new `User` (and a fresh
/// `S::default()`) is built for every join, so state never leaks from one
/// room into the next.
pub struct User<S> {
    session: SessionHandle,
    state: Arc<Mutex<S>>,
}

impl<S: Default> User<S> {
    pub(crate) fn new(session: SessionHandle) -> Self {
        Self {
            session,
            state: Arc::new(Mutex::new(S::default())),
        }
    }
}

impl<S> User<S> {
    /// The member's session id.
    pub fn id(&self) -> SessionId {
        self.session.id()
    }

    /// Sends a message to this member only.
    pub fn send(&self, message: &Message) -> Result<(), TransportError> {
        self.session.send(message)
    }

    /// Closes the member's connection. The room leave follows when the
    /// transport reports the disconnect.
    pub fn disconnect(&self) {
        self.session.disconnect();
    }

    /// Moves the member to another room. See
    /// [`SessionHandle::move_to_room`].
    pub fn move_to_room(&self, room: &RoomRef) -> bool {
        self.session.move_to_room(room)
    }

    /// Locks this member's application state.
    ///
    /// Do not hold the guard across a broadcast or a move.
    pub fn state(&self) -> MutexGuard<'_, S> {
        lock(&self.state)
    }

    /// The underlying session handle.
    pub fn session(&self) -> &SessionHandle {
        &self.session
    }
}

impl<S> Clone for User<S> {
    fn clone(&self) -> Self {
        Self {
            session: self.session.clone(),
            state: Arc::clone(&self.state),
        }
    }
}

impl<S> fmt::Debug for User<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("User").field("id", &self.id()).finish()
    }
}
