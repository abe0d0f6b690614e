//! The room registry: maps room ids to live rooms and owns the lobby.

use std::any::{Any, type_name};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use roomhub_protocol::RoomId;
use roomhub_session::{RoomPort, RoomRef};

use crate::{Room, RoomError, RoomInfo, RoomLogic, RoomState, lock};

/// Object-safe view of a `Room<L>` of any kind.
trait AnyRoom: RoomPort {
    fn into_port(self: Arc<Self>) -> RoomRef;
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
    fn info(&self) -> RoomInfo;
    fn state(&self) -> RoomState;
    fn shut_down(&self);
}

/// `true` once a room has started closing and may be replaced.
fn is_retired(state: RoomState) -> bool {
    matches!(state, RoomState::Closing | RoomState::Closed)
}

impl<L: RoomLogic> AnyRoom for Room<L> {
    fn into_port(self: Arc<Self>) -> RoomRef {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }

    fn info(&self) -> RoomInfo {
        Room::info(self)
    }

    fn state(&self) -> RoomState {
        Room::state(self)
    }

    fn shut_down(&self) {
        Room::shut_down(self);
    }
}

pub(crate) struct RegistryShared {
    lobby_id: RoomId,
    rooms: Mutex<HashMap<RoomId, Arc<dyn AnyRoom>>>,
}

impl RegistryShared {
    /// Drops the entry for `room_id` if it still belongs to `instance`.
    /// A newer room registered under the same id is left alone.
    pub(crate) fn remove_instance(&self, room_id: &RoomId, instance: u64) {
        let mut rooms = lock(&self.rooms);
        if rooms.get(room_id).is_some_and(|r| r.instance() == instance) {
            rooms.remove(room_id);
            tracing::debug!(%room_id, instance, "room unregistered");
        }
    }
}

/// Registry of every live room, keyed by [`RoomId`].
///
/// Cheap to clone; clones share the same rooms. The lobby is created
/// together with the registry, is pinned (never closes), and can never be
/// removed.
///
/// ```rust
/// use roomhub_room::{Lobby, RoomLogic, RoomRegistry};
///
/// #[derive(Default)]
/// struct Arena;
/// impl RoomLogic for Arena {
///     type UserState = ();
/// }
///
/// let registry = RoomRegistry::with_lobby("Lobby", Lobby::<Arena>::default());
/// let arena = registry.get_or_create::<Arena>("arena1").unwrap();
///
/// assert!(registry.contains("arena1"));
/// assert!(arena.is_open());
/// ```
#[derive(Clone)]
pub struct RoomRegistry {
    shared: Arc<RegistryShared>,
}

impl RoomRegistry {
    /// Creates a registry whose lobby is a room of kind `L` registered
    /// under `lobby_id`. The lobby's `on_create` runs before this returns.
    pub fn with_lobby<L: RoomLogic>(lobby_id: impl Into<RoomId>, logic: L) -> Self {
        let lobby_id = lobby_id.into();
        let shared = Arc::new(RegistryShared {
            lobby_id: lobby_id.clone(),
            rooms: Mutex::new(HashMap::new()),
        });
        let lobby = Arc::new(Room::new(lobby_id.clone(), logic, true, Arc::downgrade(&shared)));

        lock(&shared.rooms).insert(lobby_id, Arc::clone(&lobby) as Arc<dyn AnyRoom>);
        lobby.activate();

        Self { shared }
    }

    pub(crate) fn from_shared(shared: Arc<RegistryShared>) -> Self {
        Self { shared }
    }

    // -----------------------------------------------------------------------
    // Creation
    // -----------------------------------------------------------------------

    /// Returns the open room registered under `room_id`, creating a room
    /// of kind `L` with `L::default()` if there is none.
    ///
    /// # Errors
    /// [`RoomError::TypeMismatch`] if a room of another kind holds the id,
    /// [`RoomError::InvalidOperation`] if the id is the lobby's and the
    /// lobby is gone.
    pub fn get_or_create<L: RoomLogic + Default>(
        &self,
        room_id: impl Into<RoomId>,
    ) -> Result<Arc<Room<L>>, RoomError> {
        self.get_or_create_with(room_id, L::default)
    }

    /// Like [`get_or_create`](Self::get_or_create), building the logic
    /// with `make` only when a new room is needed.
    ///
    /// A registered room that is closing or closed is replaced by a fresh
    /// instance. A room another thread is still creating is waited for, so
    /// the caller always gets an open room (or, from inside that room's own
    /// `on_create`, the room itself).
    pub fn get_or_create_with<L: RoomLogic>(
        &self,
        room_id: impl Into<RoomId>,
        make: impl FnOnce() -> L,
    ) -> Result<Arc<Room<L>>, RoomError> {
        let room_id = room_id.into();
        let mut rooms = loop {
            let rooms = lock(&self.shared.rooms);
            let existing = rooms
                .get(&room_id)
                .filter(|r| !is_retired(r.state()))
                .cloned();
            let Some(existing) = existing else {
                break rooms;
            };
            drop(rooms);

            let room = downcast::<L>(&room_id, existing)?;
            room.await_activation();
            if !is_retired(room.state()) {
                return Ok(room);
            }
            // Closed while we waited; look again.
        };

        self.check_not_lobby(&room_id)?;
        let room = self.register_locked(&mut rooms, room_id, make());
        drop(rooms);
        room.activate();
        Ok(room)
    }

    /// Registers a new room of kind `L` under `room_id`.
    ///
    /// # Errors
    /// [`RoomError::AlreadyExists`] if a live room holds the id,
    /// [`RoomError::InvalidOperation`] for the lobby id.
    pub fn add<L: RoomLogic>(
        &self,
        room_id: impl Into<RoomId>,
        logic: L,
    ) -> Result<Arc<Room<L>>, RoomError> {
        let room_id = room_id.into();
        self.check_not_lobby(&room_id)?;
        let mut rooms = lock(&self.shared.rooms);
        if rooms.get(&room_id).is_some_and(|r| !is_retired(r.state())) {
            return Err(RoomError::AlreadyExists(room_id));
        }
        let room = self.register_locked(&mut rooms, room_id, logic);
        drop(rooms);
        room.activate();
        Ok(room)
    }

    fn check_not_lobby(&self, room_id: &RoomId) -> Result<(), RoomError> {
        if *room_id == self.shared.lobby_id {
            return Err(RoomError::InvalidOperation(format!(
                "room {room_id} is reserved for the lobby"
            )));
        }
        Ok(())
    }

    /// Builds a room in `Created` state and registers it. The caller runs
    /// `activate` after releasing the registry lock; until then sessions
    /// are denied and other creators wait.
    fn register_locked<L: RoomLogic>(
        &self,
        rooms: &mut HashMap<RoomId, Arc<dyn AnyRoom>>,
        room_id: RoomId,
        logic: L,
    ) -> Arc<Room<L>> {
        let room = Arc::new(Room::new(
            room_id.clone(),
            logic,
            false,
            Arc::downgrade(&self.shared),
        ));
        if let Some(stale) = rooms.insert(room_id, Arc::clone(&room) as Arc<dyn AnyRoom>) {
            tracing::debug!(room_id = %room.id(), stale = stale.instance(), "replacing closed room");
        }
        room
    }

    // -----------------------------------------------------------------------
    // Lookup
    // -----------------------------------------------------------------------

    /// The room of kind `L` registered under `room_id`.
    ///
    /// # Errors
    /// [`RoomError::NotFound`] if nothing is registered under the id,
    /// [`RoomError::TypeMismatch`] if the room is of another kind.
    pub fn get<L: RoomLogic>(&self, room_id: &str) -> Result<Arc<Room<L>>, RoomError> {
        let entry = lock(&self.shared.rooms).get(room_id).cloned();
        match entry {
            Some(room) => {
                let room_id = room.id().clone();
                downcast::<L>(&room_id, room)
            }
            None => Err(RoomError::NotFound(RoomId::from(room_id))),
        }
    }

    /// Like [`get`](Self::get), but `None` on a missing id or another kind.
    pub fn try_get<L: RoomLogic>(&self, room_id: &str) -> Option<Arc<Room<L>>> {
        self.get::<L>(room_id).ok()
    }

    /// The room registered under `room_id`, whatever its kind.
    pub fn get_ref(&self, room_id: &str) -> Option<RoomRef> {
        lock(&self.shared.rooms)
            .get(room_id)
            .cloned()
            .map(|room| room.into_port())
    }

    /// `true` if a room is registered under `room_id`.
    pub fn contains(&self, room_id: &str) -> bool {
        lock(&self.shared.rooms).contains_key(room_id)
    }

    /// Snapshot of the registered ids, sorted.
    pub fn room_ids(&self) -> Vec<RoomId> {
        let mut ids: Vec<RoomId> = lock(&self.shared.rooms).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Metadata for every registered room, sorted by id.
    pub fn list(&self) -> Vec<RoomInfo> {
        let rooms: Vec<_> = lock(&self.shared.rooms).values().cloned().collect();
        let mut infos: Vec<RoomInfo> = rooms.iter().map(|r| r.info()).collect();
        infos.sort_by(|a, b| a.room_id.cmp(&b.room_id));
        infos
    }

    /// Number of registered rooms, lobby included.
    pub fn len(&self) -> usize {
        lock(&self.shared.rooms).len()
    }

    /// `true` if not even the lobby is registered (only after
    /// [`shutdown`](Self::shutdown)).
    pub fn is_empty(&self) -> bool {
        lock(&self.shared.rooms).is_empty()
    }

    /// The lobby's id.
    pub fn lobby_id(&self) -> &RoomId {
        &self.shared.lobby_id
    }

    /// The lobby, or `None` after [`shutdown`](Self::shutdown).
    pub fn lobby(&self) -> Option<RoomRef> {
        self.get_ref(self.shared.lobby_id.as_str())
    }

    // -----------------------------------------------------------------------
    // Removal
    // -----------------------------------------------------------------------

    /// Unregisters the room under `room_id` without closing it.
    ///
    /// Sessions already inside keep using it; new lookups no longer find
    /// it.
    ///
    /// # Errors
    /// [`RoomError::InvalidOperation`] for the lobby id,
    /// [`RoomError::NotFound`] if nothing is registered under the id.
    pub fn remove(&self, room_id: &str) -> Result<RoomRef, RoomError> {
        if room_id == self.shared.lobby_id.as_str() {
            return Err(RoomError::InvalidOperation(format!(
                "the lobby room {room_id} may not be removed"
            )));
        }
        let removed = lock(&self.shared.rooms).remove(room_id);
        match removed {
            Some(room) => {
                tracing::info!(%room_id, "room removed from registry");
                Ok(room.into_port())
            }
            None => Err(RoomError::NotFound(RoomId::from(room_id))),
        }
    }

    /// Closes every room, the lobby included, and empties the registry.
    ///
    /// Members are evicted and each room's `on_destroy` runs. Intended for
    /// server teardown; afterwards [`lobby`](Self::lobby) is `None`.
    pub fn shutdown(&self) {
        let rooms: Vec<_> = lock(&self.shared.rooms).drain().map(|(_, r)| r).collect();
        tracing::info!(rooms = rooms.len(), "registry shutting down");
        for room in rooms {
            room.shut_down();
        }
    }
}

fn downcast<L: RoomLogic>(
    room_id: &RoomId,
    room: Arc<dyn AnyRoom>,
) -> Result<Arc<Room<L>>, RoomError> {
    room.into_any()
        .downcast::<Room<L>>()
        .map_err(|_| RoomError::TypeMismatch {
            room_id: room_id.clone(),
            expected: type_name::<L>(),
        })
}

impl std::fmt::Debug for RoomRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoomRegistry")
            .field("lobby_id", &self.shared.lobby_id)
            .field("rooms", &self.room_ids())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Plain;

    impl RoomLogic for Plain {
        type UserState = ();
    }

    #[derive(Default)]
    struct Other;

    impl RoomLogic for Other {
        type UserState = ();
    }

    fn registry() -> RoomRegistry {
        RoomRegistry::with_lobby("Lobby", Plain)
    }

    #[test]
    fn test_with_lobby_registers_open_pinned_lobby() {
        let reg = registry();

        let lobby = reg.get::<Plain>("Lobby").unwrap();
        assert!(lobby.is_open());
        assert!(lobby.is_pinned());
        assert_eq!(reg.room_ids(), vec![RoomId::from("Lobby")]);
    }

    #[test]
    fn test_get_or_create_returns_same_instance() {
        let reg = registry();

        let a = reg.get_or_create::<Plain>("arena").unwrap();
        let b = reg.get_or_create::<Plain>("arena").unwrap();

        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(reg.len(), 2);
    }

    #[test]
    fn test_get_or_create_other_kind_returns_type_mismatch() {
        let reg = registry();
        reg.get_or_create::<Plain>("arena").unwrap();

        let err = reg.get_or_create::<Other>("arena").unwrap_err();

        assert!(matches!(err, RoomError::TypeMismatch { .. }));
    }

    #[test]
    fn test_get_or_create_after_close_returns_new_instance() {
        let reg = registry();
        let first = reg.get_or_create::<Plain>("arena").unwrap();
        let stale_instance = first.instance();
        first.close().unwrap();
        assert!(!reg.contains("arena"));

        let second = reg.get_or_create::<Plain>("arena").unwrap();

        assert_ne!(second.instance(), stale_instance);
        assert!(second.is_open());
    }

    #[test]
    fn test_get_missing_returns_not_found() {
        let reg = registry();
        assert!(matches!(
            reg.get::<Plain>("nowhere"),
            Err(RoomError::NotFound(id)) if id.as_str() == "nowhere"
        ));
        assert!(reg.try_get::<Plain>("nowhere").is_none());
    }

    #[test]
    fn test_try_get_wrong_kind_returns_none() {
        let reg = registry();
        assert!(reg.try_get::<Other>("Lobby").is_none());
        assert!(reg.get_ref("Lobby").is_some());
    }

    #[test]
    fn test_add_existing_returns_already_exists() {
        let reg = registry();
        reg.add("arena", Plain).unwrap();

        assert!(matches!(
            reg.add("arena", Plain),
            Err(RoomError::AlreadyExists(_))
        ));
    }

    #[test]
    fn test_add_lobby_id_returns_invalid_operation() {
        let reg = registry();

        assert!(matches!(
            reg.add("Lobby", Other),
            Err(RoomError::InvalidOperation(_))
        ));
        assert!(reg.get::<Plain>("Lobby").unwrap().is_pinned());
    }

    #[test]
    fn test_lobby_id_after_shutdown_is_not_reusable() {
        let reg = registry();
        reg.shutdown();

        assert!(matches!(
            reg.add("Lobby", Plain),
            Err(RoomError::InvalidOperation(_))
        ));
        assert!(matches!(
            reg.get_or_create::<Plain>("Lobby"),
            Err(RoomError::InvalidOperation(_))
        ));
        assert!(reg.is_empty());
        assert!(reg.lobby().is_none());
    }

    /// Looks itself up and builds a companion room from `on_create`.
    #[derive(Default)]
    struct Founder {
        saw_itself: std::sync::atomic::AtomicBool,
    }

    impl RoomLogic for Founder {
        type UserState = ();

        fn on_create(&self, room: &Room<Self>) {
            let Some(registry) = room.registry() else {
                return;
            };
            let found = registry.contains(room.id().as_str())
                && registry.list().iter().any(|i| i.room_id == *room.id())
                && registry
                    .get_or_create::<Founder>(room.id().clone())
                    .is_ok_and(|same| same.instance() == room.instance());
            self.saw_itself
                .store(found, std::sync::atomic::Ordering::SeqCst);
            if room.id().as_str() == "arena" {
                let _ = registry.get_or_create::<Plain>("arena-annex");
            }
        }
    }

    #[test]
    fn test_on_create_may_call_back_into_registry() {
        let reg = registry();

        let arena = std::thread::scope(|s| {
            s.spawn(|| reg.get_or_create::<Founder>("arena"))
                .join()
                .unwrap()
        })
        .unwrap();

        assert!(arena.logic().saw_itself.load(std::sync::atomic::Ordering::SeqCst));
        assert!(arena.is_open());
        assert!(reg.get::<Plain>("arena-annex").unwrap().is_open());
    }

    #[test]
    fn test_get_or_create_during_on_create_waits_for_open_room() {
        use std::sync::mpsc;

        struct Slow {
            started: Mutex<Option<mpsc::Sender<()>>>,
        }

        impl RoomLogic for Slow {
            type UserState = ();

            fn on_create(&self, _room: &Room<Self>) {
                if let Some(tx) = lock(&self.started).take() {
                    let _ = tx.send(());
                }
                std::thread::sleep(std::time::Duration::from_millis(50));
            }
        }

        let reg = registry();
        let (tx, rx) = mpsc::channel();

        std::thread::scope(|s| {
            let creator = s.spawn(|| {
                reg.get_or_create_with("slow", || Slow {
                    started: Mutex::new(Some(tx)),
                })
                .unwrap()
            });
            rx.recv().unwrap();

            let late = reg
                .get_or_create_with("slow", || Slow {
                    started: Mutex::new(None),
                })
                .unwrap();

            assert!(late.is_open());
            assert!(Arc::ptr_eq(&late, &creator.join().unwrap()));
        });
    }

    #[test]
    fn test_remove_lobby_returns_invalid_operation() {
        let reg = registry();

        assert!(matches!(
            reg.remove("Lobby"),
            Err(RoomError::InvalidOperation(_))
        ));
        assert!(reg.contains("Lobby"));
    }

    #[test]
    fn test_remove_unregisters_without_closing() {
        let reg = registry();
        let arena = reg.add("arena", Plain).unwrap();

        let removed = reg.remove("arena").unwrap();

        assert!(!reg.contains("arena"));
        assert!(removed.is_open());
        assert!(arena.is_open());
        assert!(matches!(reg.remove("arena"), Err(RoomError::NotFound(_))));
    }

    #[test]
    fn test_remove_instance_ignores_newer_room() {
        let reg = registry();
        let first = reg.add("arena", Plain).unwrap();
        reg.remove("arena").unwrap();
        let second = reg.add("arena", Plain).unwrap();

        // Closing the unregistered instance must not drop its successor.
        first.close().unwrap();

        assert!(reg.contains("arena"));
        assert_eq!(
            reg.get::<Plain>("arena").unwrap().instance(),
            second.instance()
        );
    }

    #[test]
    fn test_list_reports_every_room() {
        let reg = registry();
        reg.add("b", Plain).unwrap();
        reg.add("a", Other).unwrap();

        let infos = reg.list();

        let ids: Vec<_> = infos.iter().map(|i| i.room_id.as_str()).collect();
        assert_eq!(ids, vec!["Lobby", "a", "b"]);
        assert!(infos[0].pinned);
        assert!(!infos[1].pinned);
    }

    #[test]
    fn test_shutdown_closes_everything_including_lobby() {
        let reg = registry();
        let lobby = reg.get::<Plain>("Lobby").unwrap();
        let arena = reg.add("arena", Plain).unwrap();

        reg.shutdown();

        assert!(reg.is_empty());
        assert!(reg.lobby().is_none());
        assert_eq!(lobby.state(), crate::RoomState::Closed);
        assert_eq!(arena.state(), crate::RoomState::Closed);
    }
}
