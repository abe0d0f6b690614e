//! Session routing for Roomhub.
//!
//! This crate binds one [`Connection`](roomhub_transport::Connection) to the
//! room that currently owns it:
//!
//! 1. **Identity**: [`SessionManager`] issues process-unique
//!    [`SessionId`](roomhub_protocol::SessionId)s and admits sessions into
//!    the lobby.
//! 2. **Move protocol**: [`SessionHandle::move_to_room`] relocates a
//!    session join-first, leave-second, so it is never roomless.
//! 3. **Event wiring**: [`SessionRouter`] forwards message and disconnect
//!    events to whichever room holds the session right now.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)  ← implements RoomPort; owns membership and hooks
//!     ↕
//! Session Layer (this crate)  ← current room per session, move protocol
//!     ↕
//! Transport (below)  ← Connection + ConnectionEvent stream
//! ```
//!
//! The session layer knows rooms only through the object-safe [`RoomPort`]
//! trait, so it does not depend on the room crate.

mod error;
mod handle;
mod manager;
mod port;
mod router;
#[cfg(test)]
mod testing;

pub use error::SessionError;
pub use handle::SessionHandle;
pub use manager::SessionManager;
pub use port::{RoomPort, RoomRef};
pub use router::SessionRouter;

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Locks a mutex, recovering the data if another thread panicked while
/// holding it. Every critical section in this crate leaves its data
/// consistent, so poisoning carries no information.
pub(crate) fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
