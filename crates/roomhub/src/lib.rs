//! # Roomhub
//!
//! Session multiplexing for real-time multiplayer services.
//!
//! Client connections are grouped into named rooms. Every session starts
//! in the lobby and moves between rooms with a join-first, leave-second
//! protocol, so it is never without a room. Application code implements
//! [`RoomLogic`](roomhub_room::RoomLogic) per room kind and reacts to
//! create, join, message, leave, and destroy events.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use roomhub::prelude::*;
//!
//! #[derive(Default)]
//! struct Arena;
//!
//! impl RoomLogic for Arena {
//!     type UserState = String;
//!
//!     fn on_join(&self, room: &Room<Self>, user: &User<String>) {
//!         let name = format!("Nub{}", user.id().0);
//!         *user.state() = name.clone();
//!         room.broadcast(&Message::new("join").with_arg(name));
//!     }
//! }
//!
//! # async fn run() -> Result<(), HubError> {
//! let config = HubConfig::default();
//! roomhub::telemetry::init(&config.log_filter);
//! let hub = Hub::with_lobby::<Arena>(config);
//!
//! // For every connection your transport accepts:
//! let (conn, events, _client) = ChannelConnection::pair("127.0.0.1:50000");
//! hub.accept(std::sync::Arc::new(conn), events)?;
//! # Ok(())
//! # }
//! ```

mod config;
mod error;
mod hub;
pub mod telemetry;

pub use config::{HubConfig, LOBBY_ROOM_ID};
pub use error::HubError;
pub use hub::Hub;

pub use roomhub_protocol as protocol;
pub use roomhub_room as room;
pub use roomhub_session as session;
pub use roomhub_transport as transport;

/// Everything needed to write room kinds and host them.
pub mod prelude {
    pub use crate::{Hub, HubConfig, HubError, LOBBY_ROOM_ID};
    pub use roomhub_protocol::{Arg, JOIN, JOIN_DENIED, Message, RoomId, SessionId};
    pub use roomhub_room::{Lobby, Room, RoomError, RoomLogic, RoomRegistry, RoomState, User};
    pub use roomhub_session::{RoomPort, RoomRef, SessionRouter};
    pub use roomhub_transport::{ChannelConnection, ClientEnd, Connection, ConnectionEvent};
}
