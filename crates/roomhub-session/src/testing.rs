//! Test doubles shared by this crate's unit tests.

use std::collections::HashSet;
use std::sync::{Arc, Mutex};
use std::sync::atomic::{AtomicU64, Ordering};

use roomhub_protocol::{Message, RoomId, SessionId};
use roomhub_transport::{ChannelConnection, ClientEnd};

use crate::{lock, RoomPort, RoomRef, SessionHandle};

static NEXT_INSTANCE: AtomicU64 = AtomicU64::new(1);

/// Builds a session handle over a fresh channel connection.
pub(crate) fn handle(id: u64) -> (SessionHandle, ClientEnd) {
    let (conn, _events, client) = ChannelConnection::pair(format!("test-{id}"));
    (SessionHandle::new(SessionId(id), Arc::new(conn)), client)
}

/// Ordered record of room calls, shareable across rooms.
#[derive(Clone, Default)]
pub(crate) struct Journal(Arc<Mutex<Vec<String>>>);

impl Journal {
    pub(crate) fn entries(&self) -> Vec<String> {
        lock(&self.0).clone()
    }

    fn push(&self, entry: String) {
        lock(&self.0).push(entry);
    }
}

/// Minimal room: a member set and an accept/reject switch.
pub(crate) struct FakeRoom {
    id: RoomId,
    instance: u64,
    accepts: bool,
    members: Mutex<HashSet<SessionId>>,
    journal: Journal,
    /// Where to send a session from inside `join`.
    bounce_to: Option<RoomRef>,
}

impl FakeRoom {
    pub(crate) fn journal() -> Journal {
        Journal::default()
    }

    pub(crate) fn open(id: &str) -> Arc<Self> {
        Self::build(id, true, Journal::default())
    }

    pub(crate) fn open_with_journal(id: &str, journal: &Journal) -> Arc<Self> {
        Self::build(id, true, journal.clone())
    }

    pub(crate) fn rejecting(id: &str) -> Arc<Self> {
        Self::build(id, false, Journal::default())
    }

    /// Accepts joins, and tries to move the joining session on to `target`
    /// from inside the join.
    pub(crate) fn bouncing(id: &str, target: &RoomRef, journal: &Journal) -> Arc<Self> {
        Arc::new(Self {
            bounce_to: Some(Arc::clone(target)),
            ..Self::fields(id, true, journal.clone())
        })
    }

    fn build(id: &str, accepts: bool, journal: Journal) -> Arc<Self> {
        Arc::new(Self::fields(id, accepts, journal))
    }

    fn fields(id: &str, accepts: bool, journal: Journal) -> Self {
        Self {
            id: RoomId::from(id),
            instance: NEXT_INSTANCE.fetch_add(1, Ordering::Relaxed),
            accepts,
            members: Mutex::new(HashSet::new()),
            journal,
            bounce_to: None,
        }
    }

    fn bounce(&self, session: &SessionHandle) {
        if let Some(target) = &self.bounce_to {
            let moved = session.move_to_room(target);
            self.journal
                .push(format!("bounce {} {} {moved}", self.id, session.id()));
        }
    }

    pub(crate) fn port(self: &Arc<Self>) -> RoomRef {
        Arc::clone(self) as RoomRef
    }

    pub(crate) fn has(&self, session: SessionId) -> bool {
        lock(&self.members).contains(&session)
    }
}

impl RoomPort for FakeRoom {
    fn id(&self) -> &RoomId {
        &self.id
    }

    fn instance(&self) -> u64 {
        self.instance
    }

    fn is_open(&self) -> bool {
        self.accepts
    }

    fn member_count(&self) -> usize {
        lock(&self.members).len()
    }

    fn join(&self, session: &SessionHandle) -> bool {
        if !self.accepts || !lock(&self.members).insert(session.id()) {
            return false;
        }
        self.journal.push(format!("join {} {}", self.id, session.id()));
        self.bounce(session);
        true
    }

    fn leave(&self, session: SessionId) {
        if lock(&self.members).remove(&session) {
            self.journal.push(format!("leave {} {}", self.id, session));
        }
    }

    fn dispatch(&self, session: SessionId, message: &Message) {
        if self.has(session) {
            self.journal
                .push(format!("dispatch {} {} {}", self.id, session, message.kind()));
        }
    }
}
