//! The default lobby: routes `join(room_id)` requests to rooms of one kind.

use std::fmt;
use std::marker::PhantomData;

use roomhub_protocol::{JOIN, Message};
use roomhub_session::RoomRef;

use crate::{Room, RoomLogic, User};

/// Lobby logic that sends sessions on to rooms of kind `K`.
///
/// A member sending `join("arena1")` is moved into the room `arena1`,
/// which is created with `K::default()` if it does not exist yet. A join
/// with a missing or non-string argument is ignored. If the move is
/// rejected the target room has already sent `joinDenied` and the member
/// stays in the lobby.
///
/// The lobby never closes when empty.
pub struct Lobby<K> {
    _kind: PhantomData<fn() -> K>,
}

impl<K> Default for Lobby<K> {
    fn default() -> Self {
        Self { _kind: PhantomData }
    }
}

impl<K> fmt::Debug for Lobby<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lobby")
            .field("kind", &std::any::type_name::<K>())
            .finish()
    }
}

impl<K: RoomLogic + Default> RoomLogic for Lobby<K> {
    type UserState = ();

    fn on_message(&self, room: &Room<Self>, user: &User<()>, message: &Message) {
        if !message.is(JOIN) {
            return;
        }
        let target = match message.get_string(0) {
            Ok(target) => target,
            Err(e) => {
                tracing::debug!(session_id = %user.id(), error = %e, "malformed join ignored");
                return;
            }
        };
        let Some(registry) = room.registry() else {
            return;
        };
        match registry.get_or_create::<K>(target) {
            Ok(target) => {
                let target: RoomRef = target;
                user.move_to_room(&target);
            }
            Err(e) => {
                tracing::debug!(session_id = %user.id(), room_id = target, error = %e, "join target unavailable");
            }
        }
    }

    fn should_close_when_empty(&self, _room: &Room<Self>) -> bool {
        false
    }
}
