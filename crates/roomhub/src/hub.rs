//! The `Hub`: one registry, one session manager, one lobby.
//!
//! This is the entry point for embedding Roomhub. It ties the layers
//! together: transport → session → room.

use std::sync::Arc;

use roomhub_room::{Lobby, RoomError, RoomLogic, RoomRegistry};
use roomhub_session::{RoomRef, SessionManager, SessionRouter};
use roomhub_transport::{Connection, EventReceiver};
use tokio::task::JoinHandle;

use crate::{HubConfig, HubError};

/// A room server without a socket.
///
/// The embedding application owns the transport: for each accepted
/// connection it hands the hub the [`Connection`] and its event stream.
///
/// ```rust
/// use roomhub::prelude::*;
///
/// #[derive(Default)]
/// struct Arena;
/// impl RoomLogic for Arena {
///     type UserState = ();
/// }
///
/// let hub = Hub::with_lobby::<Arena>(HubConfig::default());
/// let (conn, _events, _client) = ChannelConnection::pair("demo");
/// let router = hub.register(std::sync::Arc::new(conn)).unwrap();
///
/// assert_eq!(router.current_room().unwrap().id().as_str(), "Lobby");
/// ```
pub struct Hub {
    config: HubConfig,
    registry: RoomRegistry,
    sessions: SessionManager,
}

impl Hub {
    /// Creates a hub whose lobby runs `lobby_logic`.
    ///
    /// The lobby is created (and its `on_create` run) before this returns.
    pub fn new<L: RoomLogic>(config: HubConfig, lobby_logic: L) -> Self {
        let registry = RoomRegistry::with_lobby(config.lobby_room_id.clone(), lobby_logic);
        tracing::info!(lobby = %config.lobby_room_id, "hub started");
        Self {
            config,
            registry,
            sessions: SessionManager::new(),
        }
    }

    /// Creates a hub with the default [`Lobby`], which sends `join(id)`
    /// requests on to rooms of kind `K`.
    pub fn with_lobby<K: RoomLogic + Default>(config: HubConfig) -> Self {
        Self::new(config, Lobby::<K>::default())
    }

    /// The configuration this hub was built with.
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// The room registry, for creating or looking up rooms directly.
    pub fn registry(&self) -> &RoomRegistry {
        &self.registry
    }

    /// The session manager that issues session ids.
    pub fn sessions(&self) -> &SessionManager {
        &self.sessions
    }

    /// The lobby, or `None` after [`shutdown`](Self::shutdown).
    pub fn lobby(&self) -> Option<RoomRef> {
        self.registry.lobby()
    }

    /// Admits a connection into the lobby.
    ///
    /// The caller must feed the connection's events to the returned router
    /// (see [`accept`](Self::accept) for the usual way).
    ///
    /// # Errors
    /// [`HubError::Session`] if the lobby refused the session,
    /// [`HubError::Room`] if the hub was shut down. In both cases the
    /// connection is disconnected.
    pub fn register(&self, connection: Arc<dyn Connection>) -> Result<SessionRouter, HubError> {
        let Some(lobby) = self.lobby() else {
            connection.disconnect();
            return Err(RoomError::NotFound(self.config.lobby_room_id.clone()).into());
        };
        match self.sessions.register(Arc::clone(&connection), &lobby) {
            Ok(router) => Ok(router),
            Err(e) => {
                connection.disconnect();
                Err(e.into())
            }
        }
    }

    /// Registers a connection and spawns the task that pumps its events.
    ///
    /// Must be called from within a tokio runtime. The returned handle
    /// completes once the session has disconnected and left its room.
    ///
    /// # Errors
    /// Same as [`register`](Self::register); no task is spawned then.
    pub fn accept(
        &self,
        connection: Arc<dyn Connection>,
        events: EventReceiver,
    ) -> Result<JoinHandle<()>, HubError> {
        let endpoint = connection.endpoint().to_owned();
        let router = self.register(connection)?;
        tracing::debug!(session_id = %router.id(), %endpoint, "connection accepted");
        Ok(router.spawn(events))
    }

    /// Closes every room, the lobby included. Members are disconnected and
    /// later registrations fail.
    pub fn shutdown(&self) {
        tracing::info!(sessions = self.sessions.issued(), "hub shutting down");
        self.registry.shutdown();
    }
}

impl std::fmt::Debug for Hub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Hub")
            .field("config", &self.config)
            .field("registry", &self.registry)
            .field("sessions", &self.sessions)
            .finish()
    }
}
