//! A single room: membership, lifecycle, and hook dispatch.
//!
//! # Locking
//!
//! Each room has one mutex around its lifecycle state and member map. It is
//! held only to read or update those two fields, never across a hook or a
//! send, so hooks can freely call back into the room. When the registry
//! and a room are both involved, the registry is locked first. No hook
//! runs with the registry locked either.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex, Weak};
use std::thread::{self, ThreadId};

use roomhub_protocol::{JOIN_DENIED, Message, RoomId, SessionId};
use roomhub_session::{RoomPort, SessionHandle};

use crate::registry::RegistryShared;
use crate::{RoomError, RoomInfo, RoomLogic, RoomRegistry, RoomState, User, lock};

/// Counter for room instance numbers.
static NEXT_ROOM_INSTANCE: AtomicU64 = AtomicU64::new(1);

struct RoomInner<S> {
    state: RoomState,
    members: HashMap<SessionId, User<S>>,
}

/// A room of kind `L`.
///
/// Rooms are created by the [`RoomRegistry`] and always live behind an
/// `Arc`. Sessions reach a room through its [`RoomPort`] implementation;
/// room logic reaches it through the `&Room<L>` every hook receives.
pub struct Room<L: RoomLogic> {
    id: RoomId,
    instance: u64,
    pinned: bool,
    logic: L,
    inner: Mutex<RoomInner<L::UserState>>,
    /// Signalled when `Created` ends.
    activated: Condvar,
    /// Thread that builds the room and runs `on_create`.
    creator: ThreadId,
    registry: Weak<RegistryShared>,
}

impl<L: RoomLogic> Room<L> {
    pub(crate) fn new(id: RoomId, logic: L, pinned: bool, registry: Weak<RegistryShared>) -> Self {
        Self {
            id,
            instance: NEXT_ROOM_INSTANCE.fetch_add(1, Ordering::Relaxed),
            pinned,
            logic,
            inner: Mutex::new(RoomInner {
                state: RoomState::Created,
                members: HashMap::new(),
            }),
            activated: Condvar::new(),
            creator: thread::current().id(),
            registry,
        }
    }

    /// Runs `on_create` and opens the room.
    ///
    /// Called with no registry lock held. The room is already registered,
    /// so `on_create` may look it up or create companion rooms.
    pub(crate) fn activate(&self) {
        self.logic.on_create(self);
        let mut inner = lock(&self.inner);
        if inner.state.can_transition_to(RoomState::Open) {
            inner.state = RoomState::Open;
        }
        drop(inner);
        self.activated.notify_all();
        tracing::info!(room_id = %self.id, instance = self.instance, pinned = self.pinned, "room created");
    }

    /// Blocks until `on_create` has finished on the creating thread.
    ///
    /// Returns at once on the creating thread itself, so `on_create` can
    /// look up its own room without waiting on itself.
    pub(crate) fn await_activation(&self) {
        if thread::current().id() == self.creator {
            return;
        }
        let mut inner = lock(&self.inner);
        while inner.state == RoomState::Created {
            inner = self
                .activated
                .wait(inner)
                .unwrap_or_else(std::sync::PoisonError::into_inner);
        }
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    /// The id this room is registered under.
    pub fn id(&self) -> &RoomId {
        &self.id
    }

    /// Process-unique instance number.
    pub fn instance(&self) -> u64 {
        self.instance
    }

    /// `true` for the registry's lobby, which can never be closed by
    /// room logic.
    pub fn is_pinned(&self) -> bool {
        self.pinned
    }

    /// Current lifecycle state.
    pub fn state(&self) -> RoomState {
        lock(&self.inner).state
    }

    /// `true` while the room admits joins and dispatches messages.
    pub fn is_open(&self) -> bool {
        self.state().is_joinable()
    }

    /// Number of current members.
    pub fn member_count(&self) -> usize {
        lock(&self.inner).members.len()
    }

    /// `true` if the session is a member.
    pub fn contains(&self, session: SessionId) -> bool {
        lock(&self.inner).members.contains_key(&session)
    }

    /// Point-in-time snapshot of the members, in no particular order.
    pub fn users(&self) -> Vec<User<L::UserState>> {
        lock(&self.inner).members.values().cloned().collect()
    }

    /// The member with this session id, if any.
    pub fn user(&self, session: SessionId) -> Option<User<L::UserState>> {
        lock(&self.inner).members.get(&session).cloned()
    }

    /// The registry this room belongs to, if it is still alive.
    pub fn registry(&self) -> Option<RoomRegistry> {
        self.registry.upgrade().map(RoomRegistry::from_shared)
    }

    /// This room's logic value.
    pub fn logic(&self) -> &L {
        &self.logic
    }

    /// Metadata snapshot.
    pub fn info(&self) -> RoomInfo {
        let inner = lock(&self.inner);
        RoomInfo {
            room_id: self.id.clone(),
            state: inner.state,
            members: inner.members.len(),
            pinned: self.pinned,
        }
    }

    // -----------------------------------------------------------------------
    // Delivery
    // -----------------------------------------------------------------------

    /// Sends `message` to every current member.
    ///
    /// Uses a snapshot, so a member joining or leaving mid-broadcast either
    /// gets the message or not, but the broadcast itself is unaffected.
    pub fn broadcast(&self, message: &Message) {
        self.send_to_members(message, None);
    }

    /// Sends `message` to every current member except `skip`.
    pub fn broadcast_except(&self, message: &Message, skip: SessionId) {
        self.send_to_members(message, Some(skip));
    }

    fn send_to_members(&self, message: &Message, skip: Option<SessionId>) {
        let users = self.users();
        tracing::trace!(room_id = %self.id, kind = message.kind(), members = users.len(), "broadcast");
        for user in users.iter().filter(|u| Some(u.id()) != skip) {
            if let Err(e) = user.send(message) {
                tracing::trace!(room_id = %self.id, session_id = %user.id(), error = %e, "broadcast send failed");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Closes the room.
    ///
    /// Evicts (disconnects) every member, runs `on_destroy`, and removes
    /// this instance from the registry. Evicted members do not get
    /// `on_leave`.
    ///
    /// # Errors
    /// [`RoomError::InvalidOperation`] for the lobby, or if the room is not
    /// open (already closing or closed).
    pub fn close(&self) -> Result<(), RoomError> {
        if self.pinned {
            return Err(RoomError::InvalidOperation(format!(
                "the lobby room {} may not be closed",
                self.id
            )));
        }
        let evicted = self.begin_close(false)?;
        self.finish_close(evicted, true);
        Ok(())
    }

    /// Closes regardless of the pin, without touching the registry.
    /// Used by registry shutdown, which has already dropped the entry.
    pub(crate) fn shut_down(&self) {
        if let Ok(evicted) = self.begin_close(false) {
            self.finish_close(evicted, false);
        }
    }

    /// Moves `Open → Closing` and takes the members out.
    ///
    /// With `only_if_empty`, fails when a member joined since the caller
    /// last looked.
    fn begin_close(&self, only_if_empty: bool) -> Result<Vec<User<L::UserState>>, RoomError> {
        let mut inner = lock(&self.inner);
        if !inner.state.can_transition_to(RoomState::Closing) {
            return Err(RoomError::InvalidOperation(format!(
                "room {} is {}, not open",
                self.id, inner.state
            )));
        }
        if only_if_empty && !inner.members.is_empty() {
            return Err(RoomError::InvalidOperation(format!(
                "room {} is no longer empty",
                self.id
            )));
        }
        inner.state = RoomState::Closing;
        Ok(inner.members.drain().map(|(_, user)| user).collect())
    }

    fn finish_close(&self, evicted: Vec<User<L::UserState>>, unregister: bool) {
        for user in &evicted {
            user.disconnect();
        }
        self.logic.on_destroy(self);
        lock(&self.inner).state = RoomState::Closed;

        if unregister {
            if let Some(registry) = self.registry.upgrade() {
                registry.remove_instance(&self.id, self.instance);
            }
        }
        tracing::info!(
            room_id = %self.id,
            instance = self.instance,
            evicted = evicted.len(),
            "room destroyed"
        );
    }

    /// Closes the room after the last leave, if the logic agrees.
    fn close_if_empty(&self) {
        if self.pinned || !self.is_open() || self.member_count() > 0 {
            return;
        }
        if !self.logic.should_close_when_empty(self) {
            return;
        }
        match self.begin_close(true) {
            Ok(evicted) => self.finish_close(evicted, true),
            Err(e) => tracing::debug!(room_id = %self.id, reason = %e, "empty-room close skipped"),
        }
    }

    fn deny(&self, user: &User<L::UserState>) {
        tracing::debug!(room_id = %self.id, session_id = %user.id(), "join denied");
        if let Err(e) = user.send(&Message::new(JOIN_DENIED)) {
            tracing::debug!(session_id = %user.id(), error = %e, "could not deliver joinDenied");
        }
    }
}

impl<L: RoomLogic> RoomPort for Room<L> {
    fn id(&self) -> &RoomId {
        &self.id
    }

    fn instance(&self) -> u64 {
        self.instance
    }

    fn is_open(&self) -> bool {
        Room::is_open(self)
    }

    fn member_count(&self) -> usize {
        Room::member_count(self)
    }

    fn join(&self, session: &SessionHandle) -> bool {
        let session_id = session.id();
        let user = User::new(session.clone());

        let admissible = self.is_open() && !self.contains(session_id);
        if !admissible || !self.logic.allow_join(self, &user) {
            self.deny(&user);
            return false;
        }

        // The hook ran unlocked; state and membership may have changed.
        let inserted = {
            let mut inner = lock(&self.inner);
            if inner.state.is_joinable() && !inner.members.contains_key(&session_id) {
                inner.members.insert(session_id, user.clone());
                Some(inner.members.len())
            } else {
                None
            }
        };
        let Some(members) = inserted else {
            self.deny(&user);
            return false;
        };

        tracing::debug!(room_id = %self.id, %session_id, members, "session joined");
        self.logic.on_join(self, &user);
        true
    }

    fn leave(&self, session: SessionId) {
        let removed = lock(&self.inner).members.remove(&session);
        let Some(user) = removed else {
            return;
        };
        tracing::debug!(room_id = %self.id, session_id = %session, "session left");
        self.logic.on_leave(self, &user);
        self.close_if_empty();
    }

    fn dispatch(&self, session: SessionId, message: &Message) {
        let user = {
            let inner = lock(&self.inner);
            if inner.state.is_joinable() {
                inner.members.get(&session).cloned()
            } else {
                None
            }
        };
        match user {
            Some(user) => self.logic.on_message(self, &user, message),
            None => tracing::trace!(
                room_id = %self.id,
                session_id = %session,
                kind = message.kind(),
                "message from non-member dropped"
            ),
        }
    }
}

impl<L: RoomLogic> fmt::Debug for Room<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = lock(&self.inner);
        f.debug_struct("Room")
            .field("id", &self.id)
            .field("instance", &self.instance)
            .field("pinned", &self.pinned)
            .field("state", &inner.state)
            .field("members", &inner.members.len())
            .finish()
    }
}
