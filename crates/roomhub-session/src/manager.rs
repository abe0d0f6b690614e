//! The session manager: hands out identities and admits new connections.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use roomhub_protocol::SessionId;
use roomhub_transport::Connection;

use crate::{RoomRef, SessionError, SessionHandle, SessionRouter};

/// Issues session ids and builds a [`SessionRouter`] for every accepted
/// connection.
///
/// This is the single entry point through which a connection becomes
/// visible to the room system. Ids come from a per-manager counter that
/// starts at 0 and only goes up, so they are unique for the manager's
/// lifetime.
#[derive(Debug, Default)]
pub struct SessionManager {
    next_id: AtomicU64,
}

impl SessionManager {
    /// Creates a manager whose first session will be `S-0`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new connection and admits it into `lobby`.
    ///
    /// # Errors
    /// [`SessionError::OperationAborted`] if the lobby refuses the session.
    /// The id is still consumed.
    pub fn register(
        &self,
        connection: Arc<dyn Connection>,
        lobby: &RoomRef,
    ) -> Result<SessionRouter, SessionError> {
        let session_id = SessionId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let conn_id = connection.id();
        let handle = SessionHandle::new(session_id, connection);

        match SessionRouter::attach(handle, lobby) {
            Ok(router) => {
                tracing::info!(%session_id, %conn_id, room_id = %lobby.id(), "session registered");
                Ok(router)
            }
            Err(e) => {
                tracing::warn!(%session_id, %conn_id, error = %e, "session registration aborted");
                Err(e)
            }
        }
    }

    /// How many ids have been handed out so far.
    pub fn issued(&self) -> u64 {
        self.next_id.load(Ordering::Relaxed)
    }
}
