//! Hub configuration.

use roomhub_protocol::RoomId;
use serde::{Deserialize, Serialize};

/// Id the lobby is registered under unless configured otherwise.
pub const LOBBY_ROOM_ID: &str = "Lobby";

/// Configuration for a [`Hub`](crate::Hub).
///
/// Start from `HubConfig::default()` and override the fields you care
/// about. Missing fields fall back to their defaults when deserializing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Id of the lobby room every new session starts in.
    pub lobby_room_id: RoomId,

    /// `tracing` filter directive used by [`telemetry::init`](crate::telemetry::init)
    /// when `RUST_LOG` is not set.
    pub log_filter: String,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            lobby_room_id: RoomId::from(LOBBY_ROOM_ID),
            log_filter: "info".to_owned(),
        }
    }
}
