//! The per-session handle and the move protocol.
//!
//! A [`SessionHandle`] is the single owner of "which room is this session
//! in". Rooms keep a clone of it inside each `User`, so room logic can
//! send to, disconnect, or move a session through the same handle the
//! router uses.
//!
//! # Locking
//!
//! Two mutexes per session:
//!
//! - `moving` is held for the whole of a move or a disconnect. At most one
//!   of them is in flight per session, so two concurrent moves cannot both
//!   land in different rooms, and a disconnect always observes the room
//!   the session actually ended up in.
//! - `current` guards the room reference itself and is only ever held for
//!   a read or a swap, never across a room call.
//!
//! A move runs the target room's join hooks and the old room's leave hooks
//! while `moving` is held. Those hooks may move other sessions. A hook that
//! tries to move the session being moved is detected (the holder's thread
//! id is recorded next to `moving`) and the nested move returns `false`.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::{self, ThreadId};

use roomhub_protocol::{Message, SessionId};
use roomhub_transport::{Connection, TransportError};

use crate::{lock, RoomRef};

struct SessionInner {
    id: SessionId,
    connection: Arc<dyn Connection>,
    current: Mutex<Option<RoomRef>>,
    moving: Mutex<()>,
    /// Thread holding `moving`, if any.
    mover: Mutex<Option<ThreadId>>,
    disconnected: AtomicBool,
}

/// Holds `moving` and clears the recorded mover on drop.
struct MoveGuard<'a> {
    _moving: MutexGuard<'a, ()>,
    mover: &'a Mutex<Option<ThreadId>>,
}

impl Drop for MoveGuard<'_> {
    fn drop(&mut self) {
        *lock(self.mover) = None;
    }
}

/// Shared handle to one session. Cheap to clone.
#[derive(Clone)]
pub struct SessionHandle {
    inner: Arc<SessionInner>,
}

impl SessionHandle {
    /// Creates a handle that is not in any room yet.
    ///
    /// Normally only [`SessionManager`](crate::SessionManager) does this;
    /// a handle only becomes routable once it has been moved into a room.
    pub fn new(id: SessionId, connection: Arc<dyn Connection>) -> Self {
        Self {
            inner: Arc::new(SessionInner {
                id,
                connection,
                current: Mutex::new(None),
                moving: Mutex::new(()),
                mover: Mutex::new(None),
                disconnected: AtomicBool::new(false),
            }),
        }
    }

    /// The session's process-unique id.
    pub fn id(&self) -> SessionId {
        self.inner.id
    }

    /// The underlying transport connection.
    pub fn connection(&self) -> &Arc<dyn Connection> {
        &self.inner.connection
    }

    /// Queues a message for this session's client.
    pub fn send(&self, message: &Message) -> Result<(), TransportError> {
        self.inner.connection.send(message)
    }

    /// Asks the transport to close this session's connection.
    ///
    /// The room leave happens later, when the transport delivers the
    /// disconnected event to the router.
    pub fn disconnect(&self) {
        self.inner.connection.disconnect();
    }

    /// The room that currently owns this session.
    ///
    /// `None` only before the first successful move and after disconnect.
    pub fn current_room(&self) -> Option<RoomRef> {
        lock(&self.inner.current).clone()
    }

    /// `true` once the disconnected event has been processed.
    pub fn is_disconnected(&self) -> bool {
        self.inner.disconnected.load(Ordering::Acquire)
    }

    /// Moves this session into `room`.
    ///
    /// Joins the new room first. Only if that join succeeds is the current
    /// room swapped and the old room left, so a failed move leaves the
    /// session exactly where it was, and a successful one never leaves it
    /// without a room.
    ///
    /// Returns `false` if the room rejected the join (closed, policy, or
    /// already a member), the session has disconnected, or this is called
    /// from a room hook that is itself part of moving this session.
    pub fn move_to_room(&self, room: &RoomRef) -> bool {
        let session_id = self.inner.id;
        let Some(_moving) = self.begin_move() else {
            tracing::debug!(%session_id, room_id = %room.id(), "move refused, session already moving on this thread");
            return false;
        };

        if self.is_disconnected() {
            tracing::debug!(%session_id, room_id = %room.id(), "move refused, session disconnected");
            return false;
        }

        if !room.join(self) {
            tracing::debug!(%session_id, room_id = %room.id(), "move rejected by target room");
            return false;
        }

        let previous = lock(&self.inner.current).replace(Arc::clone(room));
        if let Some(old) = previous {
            tracing::debug!(
                %session_id,
                from = %old.id(),
                to = %room.id(),
                "session moved"
            );
            old.leave(session_id);
        }
        true
    }

    /// Takes `moving`, or `None` if this thread already holds it.
    fn begin_move(&self) -> Option<MoveGuard<'_>> {
        let me = thread::current().id();
        if *lock(&self.inner.mover) == Some(me) {
            return None;
        }
        let moving = lock(&self.inner.moving);
        *lock(&self.inner.mover) = Some(me);
        Some(MoveGuard {
            _moving: moving,
            mover: &self.inner.mover,
        })
    }

    /// Routes an inbound message to the current room.
    pub(crate) fn on_message(&self, message: &Message) {
        if self.is_disconnected() {
            return;
        }
        let room = self.current_room();
        match room {
            Some(room) => room.dispatch(self.inner.id, message),
            None => tracing::trace!(session_id = %self.inner.id, "message before first room, dropped"),
        }
    }

    /// Leaves the current room and makes the handle inert.
    ///
    /// Returns `false` if the session was already disconnected.
    pub(crate) fn on_disconnected(&self) -> bool {
        let Some(_moving) = self.begin_move() else {
            tracing::debug!(session_id = %self.inner.id, "nested disconnect ignored");
            return false;
        };
        if self.inner.disconnected.swap(true, Ordering::AcqRel) {
            return false;
        }
        let room = lock(&self.inner.current).take();
        if let Some(room) = room {
            tracing::debug!(session_id = %self.inner.id, room_id = %room.id(), "session disconnected");
            room.leave(self.inner.id);
        }
        true
    }
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("id", &self.inner.id)
            .field("connection", &self.inner.connection.id())
            .field("disconnected", &self.is_disconnected())
            .finish()
    }
}
