//! The `RoomLogic` trait, the extension point for room kinds.
//!
//! Application code implements this trait once per room kind. The room
//! calls the hooks at the right time; the implementation only decides what
//! happens in them.

use roomhub_protocol::Message;

use crate::{Room, User};

/// Behaviour of one room kind.
///
/// Every hook has a default, so a kind only overrides what it cares about.
/// Hooks are called with no room lock held: they may broadcast, inspect
/// members, move users to other rooms, or close the room.
///
/// The logic value itself is shared by all members of one room instance
/// (it is `&self` everywhere), so per-room mutable state belongs behind a
/// lock inside it. Per-member state lives in [`UserState`](Self::UserState).
pub trait RoomLogic: Sized + Send + Sync + 'static {
    /// Application state attached to each member, created fresh per join.
    type UserState: Default + Send + 'static;

    /// Called once, before any session can reach the room.
    ///
    /// The room is already registered but not yet open: sessions are
    /// denied and other threads asking the registry for it wait until this
    /// returns. The hook may use the registry freely, including creating
    /// other rooms. Two rooms whose `on_create` hooks each wait for the
    /// other will deadlock. Default: no-op.
    fn on_create(&self, _room: &Room<Self>) {}

    /// Decides whether a session may join. Default: allow everyone.
    fn allow_join(&self, _room: &Room<Self>, _user: &User<Self::UserState>) -> bool {
        true
    }

    /// Called after a user was admitted. Default: no-op.
    fn on_join(&self, _room: &Room<Self>, _user: &User<Self::UserState>) {}

    /// Called for each message a member sends. Default: ignore.
    fn on_message(&self, _room: &Room<Self>, _user: &User<Self::UserState>, _message: &Message) {}

    /// Called after a member was removed, with the removed user.
    /// Default: no-op.
    fn on_leave(&self, _room: &Room<Self>, _user: &User<Self::UserState>) {}

    /// Called once while the room closes, after members were evicted.
    /// Default: no-op.
    fn on_destroy(&self, _room: &Room<Self>) {}

    /// Asked when the last member leaves. Returning `true` closes the
    /// room. Ignored for the lobby. Default: `true`.
    fn should_close_when_empty(&self, _room: &Room<Self>) -> bool {
        true
    }
}
