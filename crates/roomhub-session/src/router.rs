//! Event wiring between a connection and its current room.

use roomhub_protocol::SessionId;
use roomhub_transport::{ConnectionEvent, EventReceiver};
use tokio::task::JoinHandle;

use crate::{RoomRef, SessionError, SessionHandle};

/// Binds one connection's events to whichever room currently owns the
/// session.
///
/// Messages go to the current room's `dispatch`; the disconnected event
/// leaves the current room and turns the router inert. Events must be fed
/// in the order the transport delivered them, either one at a time through
/// [`handle_event`](Self::handle_event) or by handing the stream to
/// [`spawn`](Self::spawn).
#[derive(Debug)]
pub struct SessionRouter {
    handle: SessionHandle,
}

impl SessionRouter {
    /// Admits a fresh handle into `lobby`.
    ///
    /// # Errors
    /// [`SessionError::OperationAborted`] if the lobby refuses the join.
    /// The handle is dropped and nothing references the session afterwards.
    pub(crate) fn attach(handle: SessionHandle, lobby: &RoomRef) -> Result<Self, SessionError> {
        if !handle.move_to_room(lobby) {
            return Err(SessionError::OperationAborted {
                session: handle.id(),
                room: lobby.id().clone(),
            });
        }
        Ok(Self { handle })
    }

    /// The session this router serves.
    pub fn id(&self) -> SessionId {
        self.handle.id()
    }

    /// The shared session handle (the same one room users hold).
    pub fn handle(&self) -> &SessionHandle {
        &self.handle
    }

    /// The room that currently owns the session, `None` after disconnect.
    pub fn current_room(&self) -> Option<RoomRef> {
        self.handle.current_room()
    }

    /// Processes one transport event.
    ///
    /// Returns `false` once the session is disconnected; every later event
    /// is ignored.
    pub fn handle_event(&self, event: ConnectionEvent) -> bool {
        match event {
            ConnectionEvent::Message(message) => {
                self.handle.on_message(&message);
                !self.handle.is_disconnected()
            }
            ConnectionEvent::Disconnected => {
                self.handle.on_disconnected();
                false
            }
        }
    }

    /// Drains `events` on a tokio task until the session disconnects.
    ///
    /// One task per session keeps that session's events strictly ordered
    /// while different sessions run in parallel. A stream that ends without
    /// a disconnected event is treated as a disconnect.
    pub fn spawn(self, mut events: EventReceiver) -> JoinHandle<()> {
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                if !self.handle_event(event) {
                    break;
                }
            }
            if self.handle.on_disconnected() {
                tracing::debug!(session_id = %self.id(), "event stream ended without disconnect");
            }
            tracing::trace!(session_id = %self.id(), "router stopped");
        })
    }
}

#[cfg(test)]
mod tests {
    use roomhub_protocol::Message;

    use super::*;
    use crate::testing::{FakeRoom, handle};

    #[test]
    fn test_attach_rejected_lobby_returns_operation_aborted() {
        let (session, _client) = handle(3);
        let lobby = FakeRoom::rejecting("Lobby");

        let result = SessionRouter::attach(session, &lobby.port());

        assert!(matches!(
            result,
            Err(SessionError::OperationAborted { session, .. }) if session == SessionId(3)
        ));
    }

    #[test]
    fn test_handle_event_message_then_disconnect() {
        let (session, _client) = handle(1);
        let journal = FakeRoom::journal();
        let lobby = FakeRoom::open_with_journal("Lobby", &journal);
        let router = SessionRouter::attach(session, &lobby.port()).unwrap();

        assert!(router.handle_event(ConnectionEvent::Message(Message::new("ping"))));
        assert!(!router.handle_event(ConnectionEvent::Disconnected));
        assert!(!router.handle_event(ConnectionEvent::Message(Message::new("late"))));

        assert_eq!(
            journal.entries(),
            vec!["join Lobby S-1", "dispatch Lobby S-1 ping", "leave Lobby S-1"]
        );
        assert!(router.current_room().is_none());
    }

    #[tokio::test]
    async fn test_spawn_drains_events_in_order() {
        let (conn, events, client) = roomhub_transport::ChannelConnection::pair("pump");
        let session = SessionHandle::new(SessionId(9), std::sync::Arc::new(conn));
        let journal = FakeRoom::journal();
        let lobby = FakeRoom::open_with_journal("Lobby", &journal);
        let router = SessionRouter::attach(session, &lobby.port()).unwrap();

        client.send(Message::new("a")).unwrap();
        client.send(Message::new("b")).unwrap();
        client.disconnect();

        router.spawn(events).await.unwrap();

        assert_eq!(
            journal.entries(),
            vec![
                "join Lobby S-9",
                "dispatch Lobby S-9 a",
                "dispatch Lobby S-9 b",
                "leave Lobby S-9"
            ]
        );
    }
}
