//! Room lifecycle state machine and metadata snapshots.

use std::fmt;

use roomhub_protocol::RoomId;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// The lifecycle state of a room.
///
/// Transitions are strictly ordered, no skipping states:
///
/// ```text
/// Created → Open → Closing → Closed
/// ```
///
/// - **Created**: registered, `on_create` is running. Not reachable by
///   sessions yet.
/// - **Open**: admits joins and dispatches messages.
/// - **Closing**: members are being evicted and `on_destroy` runs.
///   Joins are denied, messages dropped.
/// - **Closed**: terminal. Holds no users and fires no more hooks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RoomState {
    Created,
    Open,
    Closing,
    Closed,
}

impl RoomState {
    /// Returns `true` if the room admits joins and messages.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Open)
    }

    /// The next state, or `None` from `Closed`.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Created => Some(Self::Open),
            Self::Open => Some(Self::Closing),
            Self::Closing => Some(Self::Closed),
            Self::Closed => None,
        }
    }

    /// Returns `true` if transitioning to `target` is valid.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Created => write!(f, "Created"),
            Self::Open => write!(f, "Open"),
            Self::Closing => write!(f, "Closing"),
            Self::Closed => write!(f, "Closed"),
        }
    }
}

// ---------------------------------------------------------------------------
// RoomInfo
// ---------------------------------------------------------------------------

/// A snapshot of room metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomInfo {
    /// The id the room is registered under.
    pub room_id: RoomId,
    /// Lifecycle state when the snapshot was taken.
    pub state: RoomState,
    /// Number of members when the snapshot was taken.
    pub members: usize,
    /// `true` for the registry's lobby.
    pub pinned: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_room_state_next_follows_strict_order() {
        assert_eq!(RoomState::Created.next(), Some(RoomState::Open));
        assert_eq!(RoomState::Open.next(), Some(RoomState::Closing));
        assert_eq!(RoomState::Closing.next(), Some(RoomState::Closed));
        assert_eq!(RoomState::Closed.next(), None);
    }

    #[test]
    fn test_room_state_can_transition_to() {
        assert!(RoomState::Created.can_transition_to(RoomState::Open));
        assert!(!RoomState::Created.can_transition_to(RoomState::Closing));
        assert!(!RoomState::Closed.can_transition_to(RoomState::Open));
    }

    #[test]
    fn test_room_state_is_joinable_only_when_open() {
        assert!(RoomState::Open.is_joinable());
        assert!(!RoomState::Created.is_joinable());
        assert!(!RoomState::Closing.is_joinable());
        assert!(!RoomState::Closed.is_joinable());
    }

    #[test]
    fn test_room_info_serializes_state_by_name() {
        let info = RoomInfo {
            room_id: RoomId::from("arena1"),
            state: RoomState::Open,
            members: 2,
            pinned: false,
        };
        let json = serde_json::to_value(&info).unwrap();
        assert_eq!(json["room_id"], "arena1");
        assert_eq!(json["state"], "Open");
        assert_eq!(json["members"], 2);
    }
}
