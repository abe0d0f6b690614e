//! Rooms for Roomhub.
//!
//! A room groups sessions under a name and reacts to their joins,
//! messages, and leaves through the hooks of a [`RoomLogic`]
//! implementation. The [`RoomRegistry`] creates rooms on demand and owns
//! the lobby, the room every new session starts in.
//!
//! # Key types
//!
//! - [`RoomLogic`]: the trait application code implements per room kind
//! - [`Room`]: one live room, handed to every hook
//! - [`User`]: a member as room logic sees it, with per-room state
//! - [`RoomRegistry`]: id → room map, lazy creation, the lobby
//! - [`Lobby`]: default lobby that routes `join(room_id)` requests
//! - [`RoomState`]: lifecycle state machine

mod error;
mod lobby;
mod logic;
mod registry;
mod room;
mod state;
mod user;

pub use error::RoomError;
pub use lobby::Lobby;
pub use logic::RoomLogic;
pub use registry::RoomRegistry;
pub use room::Room;
pub use state::{RoomInfo, RoomState};
pub use user::User;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if a hook panicked while it was
/// held.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
