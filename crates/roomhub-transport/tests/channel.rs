//! Integration tests for the in-memory channel transport.

use roomhub_protocol::Message;
use roomhub_transport::{ChannelConnection, Connection, ConnectionEvent, TransportError};

#[test]
fn test_pair_assigns_unique_ids() {
    let (a, _ea, _ca) = ChannelConnection::pair("a");
    let (b, _eb, _cb) = ChannelConnection::pair("b");
    assert_ne!(a.id(), b.id());
    assert_eq!(a.endpoint(), "a");
}

#[test]
fn test_server_send_reaches_client() {
    let (conn, _events, mut client) = ChannelConnection::pair("peer");

    conn.send(&Message::new("ping")).unwrap();
    conn.send(&Message::new("pong")).unwrap();

    let kinds: Vec<String> = client.drain().iter().map(|m| m.kind().to_owned()).collect();
    assert_eq!(kinds, vec!["ping", "pong"]);
}

#[test]
fn test_client_send_arrives_as_message_event() {
    let (_conn, mut events, client) = ChannelConnection::pair("peer");

    client.send(Message::new("join").with_arg("arena1")).unwrap();

    assert_eq!(
        events.try_recv().unwrap(),
        ConnectionEvent::Message(Message::new("join").with_arg("arena1"))
    );
}

#[test]
fn test_disconnect_emits_exactly_one_event() {
    let (conn, mut events, client) = ChannelConnection::pair("peer");

    conn.disconnect();
    conn.disconnect();
    client.disconnect();

    assert_eq!(events.try_recv().unwrap(), ConnectionEvent::Disconnected);
    assert!(events.try_recv().is_err(), "only one Disconnected expected");
    assert!(conn.is_closed());
}

#[test]
fn test_send_after_disconnect_returns_closed() {
    let (conn, _events, _client) = ChannelConnection::pair("peer");
    conn.disconnect();

    let result = conn.send(&Message::new("late"));
    assert_eq!(result, Err(TransportError::ConnectionClosed(conn.id())));
}

#[test]
fn test_dropping_client_end_disconnects() {
    let (conn, mut events, client) = ChannelConnection::pair("peer");
    drop(client);

    assert_eq!(events.try_recv().unwrap(), ConnectionEvent::Disconnected);
    assert!(conn.send(&Message::new("late")).is_err());
}

#[test]
fn test_events_keep_transport_order() {
    let (_conn, mut events, client) = ChannelConnection::pair("peer");
    client.send(Message::new("a")).unwrap();
    client.send(Message::new("b")).unwrap();
    client.disconnect();

    assert_eq!(events.try_recv().unwrap(), ConnectionEvent::Message(Message::new("a")));
    assert_eq!(events.try_recv().unwrap(), ConnectionEvent::Message(Message::new("b")));
    assert_eq!(events.try_recv().unwrap(), ConnectionEvent::Disconnected);
}

#[tokio::test]
async fn test_client_recv_waits_for_message() {
    let (conn, _events, mut client) = ChannelConnection::pair("peer");
    tokio::spawn(async move {
        conn.send(&Message::new("hello")).unwrap();
    });
    let msg = client.recv().await.expect("message");
    assert_eq!(msg.kind(), "hello");
}
