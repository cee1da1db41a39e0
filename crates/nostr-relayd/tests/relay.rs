// Copyright (c) 2023-2025 Rust Nostr Developers
// Distributed under the MIT software license

//! End-to-end relay tests over real WebSocket connections

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use nostr_relayd::prelude::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};

type WsClient = WebSocketStream<MaybeTlsStream<TcpStream>>;

async fn run_relay() -> Relay {
    Relay::run(RelayBuilder::default()).await.unwrap()
}

async fn connect(relay: &Relay) -> WsClient {
    let (ws, _) = connect_async(relay.url()).await.unwrap();
    ws
}

async fn send(ws: &mut WsClient, msg: ClientMessage) {
    ws.send(Message::Text(msg.as_json())).await.unwrap();
}

async fn recv(ws: &mut WsClient) -> RelayMessage {
    loop {
        let msg = timeout(Duration::from_secs(5), ws.next())
            .await
            .expect("timed out waiting for relay message")
            .expect("connection closed")
            .unwrap();
        if let Message::Text(json) = msg {
            return RelayMessage::from_json(json).unwrap();
        }
    }
}

/// Assert that nothing arrives within a grace period
async fn assert_silent(ws: &mut WsClient) {
    let res = timeout(Duration::from_millis(500), ws.next()).await;
    assert!(res.is_err(), "expected silence, got {res:?}");
}

async fn publish(ws: &mut WsClient, event: &Event) -> (bool, String) {
    send(ws, ClientMessage::event(event.clone())).await;
    match recv(ws).await {
        RelayMessage::Ok {
            event_id,
            status,
            message,
        } => {
            assert_eq!(event_id, event.id);
            (status, message)
        }
        other => panic!("expected OK, got {other:?}"),
    }
}

fn expect_event(msg: RelayMessage, sub: &SubscriptionId) -> Event {
    match msg {
        RelayMessage::Event {
            subscription_id,
            event,
        } => {
            assert_eq!(&subscription_id, sub);
            *event
        }
        other => panic!("expected EVENT, got {other:?}"),
    }
}

fn expect_eose(msg: RelayMessage, sub: &SubscriptionId) {
    match msg {
        RelayMessage::EndOfStoredEvents(subscription_id) => assert_eq!(&subscription_id, sub),
        other => panic!("expected EOSE, got {other:?}"),
    }
}

#[tokio::test]
async fn test_publish_replace_and_query() {
    let relay = run_relay().await;
    let mut ws = connect(&relay).await;
    let keys = Keys::generate();

    let old = EventBuilder::new(Kind::METADATA, r#"{"name":"old"}"#)
        .custom_created_at(Timestamp::from(100i64))
        .to_event(&keys);
    let new = EventBuilder::new(Kind::METADATA, r#"{"name":"new"}"#)
        .custom_created_at(Timestamp::from(200i64))
        .to_event(&keys);

    assert_eq!(publish(&mut ws, &old).await, (true, String::new()));
    assert_eq!(publish(&mut ws, &new).await, (true, String::new()));

    let sub = SubscriptionId::new("meta");
    send(
        &mut ws,
        ClientMessage::req(
            sub.clone(),
            vec![Filter::new().author(keys.public_key()).kind(Kind::METADATA)],
        ),
    )
    .await;

    let event = expect_event(recv(&mut ws).await, &sub);
    assert_eq!(event, new);
    expect_eose(recv(&mut ws).await, &sub);
}

#[tokio::test]
async fn test_invalid_signature_rejected() {
    let relay = run_relay().await;
    let mut ws = connect(&relay).await;
    let keys = Keys::generate();

    let mut event = EventBuilder::new(Kind::TEXT_NOTE, "genuine").to_event(&keys);
    event.content = String::from("forged");

    let (status, message) = publish(&mut ws, &event).await;
    assert!(!status);
    assert_eq!(message, "invalid: signature");
}

#[tokio::test]
async fn test_deletion_authorization() {
    let relay = run_relay().await;
    let mut ws = connect(&relay).await;
    let keys_a = Keys::generate();
    let keys_b = Keys::generate();

    let target = EventBuilder::new(Kind::TEXT_NOTE, "delete me").to_event(&keys_a);
    assert!(publish(&mut ws, &target).await.0);

    let sub = SubscriptionId::new("check");
    let filter = Filter::new().id(target.id);

    // A deletion request from a different pubkey is acknowledged but ignored
    let foreign = EventBuilder::new(Kind::EVENT_DELETION, "")
        .tag(Tag::event(target.id))
        .to_event(&keys_b);
    assert_eq!(publish(&mut ws, &foreign).await, (true, String::new()));

    send(&mut ws, ClientMessage::req(sub.clone(), vec![filter.clone()])).await;
    assert_eq!(expect_event(recv(&mut ws).await, &sub), target);
    expect_eose(recv(&mut ws).await, &sub);

    // The author's deletion request removes the event
    let own = EventBuilder::new(Kind::EVENT_DELETION, "")
        .tag(Tag::event(target.id))
        .to_event(&keys_a);
    assert_eq!(publish(&mut ws, &own).await, (true, String::new()));

    send(&mut ws, ClientMessage::req(sub.clone(), vec![filter])).await;
    expect_eose(recv(&mut ws).await, &sub);
}

#[tokio::test]
async fn test_live_dispatch() {
    let relay = run_relay().await;
    let mut subscriber = connect(&relay).await;
    let mut publisher = connect(&relay).await;

    let sub = SubscriptionId::new("live");
    send(
        &mut subscriber,
        ClientMessage::req(sub.clone(), vec![Filter::new().kind(Kind::TEXT_NOTE)]),
    )
    .await;
    expect_eose(recv(&mut subscriber).await, &sub);

    let keys = Keys::generate();
    let event = EventBuilder::new(Kind::TEXT_NOTE, "breaking news").to_event(&keys);
    assert!(publish(&mut publisher, &event).await.0);

    let delivered = expect_event(recv(&mut subscriber).await, &sub);
    assert_eq!(delivered, event);
}

#[tokio::test]
async fn test_eose_after_limited_backfill() {
    let relay = run_relay().await;
    let mut ws = connect(&relay).await;
    let keys = Keys::generate();

    for i in 0..10i64 {
        let event = EventBuilder::new(Kind::TEXT_NOTE, format!("note {i}"))
            .custom_created_at(Timestamp::from(1_000 + i))
            .to_event(&keys);
        assert!(publish(&mut ws, &event).await.0);
    }

    let sub = SubscriptionId::new("backlog");
    send(
        &mut ws,
        ClientMessage::req(
            sub.clone(),
            vec![Filter::new().kind(Kind::TEXT_NOTE).limit(3)],
        ),
    )
    .await;

    // Three newest events, newest first, then exactly one EOSE
    let mut created_at: Vec<i64> = Vec::new();
    for _ in 0..3 {
        created_at.push(expect_event(recv(&mut ws).await, &sub).created_at.as_i64());
    }
    assert_eq!(created_at, vec![1_009, 1_008, 1_007]);
    expect_eose(recv(&mut ws).await, &sub);
    assert_silent(&mut ws).await;
}

#[tokio::test]
async fn test_ephemeral_broadcast_not_stored() {
    let relay = run_relay().await;
    let mut subscriber = connect(&relay).await;
    let mut publisher = connect(&relay).await;
    let kind = Kind::new(25_000);

    let sub = SubscriptionId::new("ephemeral");
    send(
        &mut subscriber,
        ClientMessage::req(sub.clone(), vec![Filter::new().kind(kind)]),
    )
    .await;
    expect_eose(recv(&mut subscriber).await, &sub);

    let keys = Keys::generate();
    let event = EventBuilder::new(kind, "now you see me").to_event(&keys);
    assert_eq!(publish(&mut publisher, &event).await, (true, String::new()));

    // Delivered live
    assert_eq!(expect_event(recv(&mut subscriber).await, &sub), event);

    // Absent from any later query
    let replay = SubscriptionId::new("replay");
    send(
        &mut publisher,
        ClientMessage::req(replay.clone(), vec![Filter::new().kind(kind)]),
    )
    .await;
    expect_eose(recv(&mut publisher).await, &replay);
}

#[tokio::test]
async fn test_notice_on_malformed_then_session_continues() {
    let relay = run_relay().await;
    let mut ws = connect(&relay).await;

    ws.send(Message::Text(String::from("not json"))).await.unwrap();
    assert!(matches!(recv(&mut ws).await, RelayMessage::Notice(..)));

    // Unknown message tags are errors too
    ws.send(Message::Text(String::from(r#"["AUTH","challenge"]"#)))
        .await
        .unwrap();
    assert!(matches!(recv(&mut ws).await, RelayMessage::Notice(..)));

    // The session survives
    let keys = Keys::generate();
    let event = EventBuilder::new(Kind::TEXT_NOTE, "still here").to_event(&keys);
    assert_eq!(publish(&mut ws, &event).await, (true, String::new()));
}

#[tokio::test]
async fn test_protected_event_refused() {
    let relay = run_relay().await;
    let mut ws = connect(&relay).await;
    let keys = Keys::generate();

    let event = EventBuilder::new(Kind::TEXT_NOTE, "for my relay only")
        .tag(Tag::parse(["-"]).unwrap())
        .to_event(&keys);

    let (status, message) = publish(&mut ws, &event).await;
    assert!(!status);
    assert_eq!(
        message,
        "auth-required: this event may only be published by its author"
    );
}

#[tokio::test]
async fn test_count() {
    let relay = run_relay().await;
    let mut ws = connect(&relay).await;
    let keys = Keys::generate();

    for i in 0..3 {
        let event = EventBuilder::new(Kind::TEXT_NOTE, format!("note {i}")).to_event(&keys);
        assert!(publish(&mut ws, &event).await.0);
    }
    let metadata = EventBuilder::new(Kind::METADATA, "{}").to_event(&keys);
    assert!(publish(&mut ws, &metadata).await.0);

    let sub = SubscriptionId::new("stats");
    send(
        &mut ws,
        ClientMessage::count(sub.clone(), vec![Filter::new().kind(Kind::TEXT_NOTE)]),
    )
    .await;

    match recv(&mut ws).await {
        RelayMessage::Count {
            subscription_id,
            count,
        } => {
            assert_eq!(subscription_id, sub);
            assert_eq!(count, 3);
        }
        other => panic!("expected COUNT, got {other:?}"),
    }
}

#[tokio::test]
async fn test_resubscribe_replaces_previous() {
    let relay = run_relay().await;
    let mut subscriber = connect(&relay).await;
    let mut publisher = connect(&relay).await;

    let sub = SubscriptionId::new("mine");
    send(
        &mut subscriber,
        ClientMessage::req(sub.clone(), vec![Filter::new().kind(Kind::TEXT_NOTE)]),
    )
    .await;
    expect_eose(recv(&mut subscriber).await, &sub);

    // Same id, different filters: replaces the previous subscription
    send(
        &mut subscriber,
        ClientMessage::req(sub.clone(), vec![Filter::new().kind(Kind::METADATA)]),
    )
    .await;
    expect_eose(recv(&mut subscriber).await, &sub);

    let keys = Keys::generate();

    // Matches only the replaced subscription: nothing is delivered
    let note = EventBuilder::new(Kind::TEXT_NOTE, "stale interest").to_event(&keys);
    assert!(publish(&mut publisher, &note).await.0);
    assert_silent(&mut subscriber).await;

    // Matches the live subscription
    let metadata = EventBuilder::new(Kind::METADATA, "{}").to_event(&keys);
    assert!(publish(&mut publisher, &metadata).await.0);
    assert_eq!(expect_event(recv(&mut subscriber).await, &sub), metadata);
}

#[tokio::test]
async fn test_unsubscribe_stops_delivery() {
    let relay = run_relay().await;
    let mut subscriber = connect(&relay).await;
    let mut publisher = connect(&relay).await;

    let sub = SubscriptionId::new("short-lived");
    send(
        &mut subscriber,
        ClientMessage::req(sub.clone(), vec![Filter::new().kind(Kind::TEXT_NOTE)]),
    )
    .await;
    expect_eose(recv(&mut subscriber).await, &sub);

    send(&mut subscriber, ClientMessage::close(sub)).await;
    // CLOSE has no acknowledgement; give the relay a moment to apply it
    tokio::time::sleep(Duration::from_millis(100)).await;

    let keys = Keys::generate();
    let event = EventBuilder::new(Kind::TEXT_NOTE, "into the void").to_event(&keys);
    assert!(publish(&mut publisher, &event).await.0);

    assert_silent(&mut subscriber).await;
}

#[tokio::test]
async fn test_relay_information_document() {
    let relay = run_relay().await;
    let addr = relay.local_addr();

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "GET / HTTP/1.1\r\nHost: {addr}\r\nAccept: application/nostr+json\r\nConnection: close\r\n\r\n"
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut response = String::new();
    stream.read_to_string(&mut response).await.unwrap();

    assert!(response.starts_with("HTTP/1.1 200"));
    assert!(response.contains("application/nostr+json"));
    assert!(response.contains("access-control-allow-origin: *"));
    assert!(response.contains("\"supported_nips\""));
    assert!(response.contains("\"software\""));
}
