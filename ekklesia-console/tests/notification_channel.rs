mod common;

use common::{Script, WsServer};
use ekklesia_console::models::TokenPair;
use ekklesia_console::notices::Notices;
use ekklesia_console::notifications::{ChannelState, Dispatcher, NotificationChannel, Section};
use ekklesia_console::session::{MemorySessionStore, Session, SessionEnd};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;

const DONATION: &str = r#"{"type":"donation.created","amount":50000,"donation_type":"tithe"}"#;
const EVENT: &str = r#"{"type":"event.created","name":"Culto de jóvenes","event_id":12}"#;

async fn session_with_token(token: &str) -> Arc<Session> {
    let session = Arc::new(Session::new(
        Arc::new(MemorySessionStore::new()),
        Notices::new(),
    ));
    session
        .begin(TokenPair::new(token, "R1"))
        .await
        .expect("Failed to start session");
    session
}

fn channel(
    server: &WsServer,
    session: Arc<Session>,
    dispatcher: Arc<Dispatcher>,
    delay: Duration,
) -> NotificationChannel {
    NotificationChannel::new(&server.base, delay, session, dispatcher)
}

fn counter(dispatcher: &Dispatcher, section: Section) -> Arc<AtomicUsize> {
    let count = Arc::new(AtomicUsize::new(0));
    let c = count.clone();
    dispatcher.on_refresh(section, move || {
        c.fetch_add(1, Ordering::SeqCst);
    });
    count
}

async fn wait_for_state(rx: &mut watch::Receiver<ChannelState>, state: ChannelState) -> bool {
    tokio::time::timeout(Duration::from_secs(3), rx.wait_for(|s| *s == state))
        .await
        .map(|result| result.is_ok())
        .unwrap_or(false)
}

async fn wait_for_count(count: &AtomicUsize, expected: usize) -> bool {
    for _ in 0..300 {
        if count.load(Ordering::SeqCst) >= expected {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

#[tokio::test]
async fn connection_request_embeds_the_access_token() {
    let server = WsServer::start(Script::SendThenHold(vec![])).await;
    let session = session_with_token("T").await;
    let dispatcher = Arc::new(Dispatcher::new(Notices::new(), []));
    let channel = channel(&server, session, dispatcher, Duration::from_secs(5));
    let mut state = channel.subscribe();

    assert!(channel.open());

    assert!(wait_for_state(&mut state, ChannelState::Open).await);
    assert_eq!(server.uris(), vec!["/api/ws/notifications?token=T".to_string()]);

    channel.close();
    assert_eq!(channel.state(), ChannelState::Closed);
}

#[tokio::test]
async fn dropped_connection_is_retried_after_the_delay() {
    let server = WsServer::start(Script::SendThenClose(vec![])).await;
    let session = session_with_token("T").await;
    let dispatcher = Arc::new(Dispatcher::new(Notices::new(), []));
    let channel = channel(&server, session, dispatcher, Duration::from_millis(400));

    channel.open();
    assert!(server.wait_for_connections(1, Duration::from_secs(3)).await);
    let first = Instant::now();

    assert!(server.wait_for_connections(2, Duration::from_secs(3)).await);
    assert!(first.elapsed() >= Duration::from_millis(300));

    channel.close();
}

#[tokio::test]
async fn logout_during_reconnect_delay_prevents_reconnect() {
    let server = WsServer::start(Script::SendThenClose(vec![])).await;
    let session = session_with_token("T").await;
    let dispatcher = Arc::new(Dispatcher::new(Notices::new(), []));
    let channel = channel(&server, session.clone(), dispatcher, Duration::from_millis(500));
    let mut state = channel.subscribe();

    channel.open();
    assert!(wait_for_state(&mut state, ChannelState::ReconnectScheduled).await);

    tokio::time::sleep(Duration::from_millis(100)).await;
    session.end(SessionEnd::Logout).await.unwrap();

    tokio::time::sleep(Duration::from_millis(800)).await;
    assert_eq!(server.connections(), 1);
    assert_eq!(channel.state(), ChannelState::Closed);
    assert!(!channel.is_running());
}

#[tokio::test]
async fn close_during_reconnect_delay_prevents_reconnect() {
    let server = WsServer::start(Script::SendThenClose(vec![])).await;
    let session = session_with_token("T").await;
    let dispatcher = Arc::new(Dispatcher::new(Notices::new(), []));
    let channel = channel(&server, session.clone(), dispatcher, Duration::from_millis(300));
    let mut state = channel.subscribe();

    channel.open();
    assert!(wait_for_state(&mut state, ChannelState::ReconnectScheduled).await);
    channel.close();

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert_eq!(server.connections(), 1);
    assert!(session.is_authenticated());
}

#[tokio::test]
async fn reopening_replaces_the_previous_channel() {
    let server = WsServer::start(Script::SendThenHold(vec![])).await;
    let session = session_with_token("T").await;
    let dispatcher = Arc::new(Dispatcher::new(Notices::new(), []));
    let channel = channel(&server, session, dispatcher, Duration::from_millis(200));

    channel.open();
    assert!(server.wait_for_connections(1, Duration::from_secs(3)).await);
    channel.open();
    assert!(server.wait_for_connections(2, Duration::from_secs(3)).await);

    // The first socket was closed by the client, so nothing reconnects it.
    tokio::time::sleep(Duration::from_millis(500)).await;
    assert_eq!(server.connections(), 2);

    channel.close();
}

#[tokio::test]
async fn donation_refreshes_visible_dashboard_exactly_once() {
    let server = WsServer::start(Script::SendThenHold(vec![DONATION.to_string()])).await;
    let session = session_with_token("T").await;
    let dispatcher = Arc::new(Dispatcher::new(Notices::new(), [Section::Dashboard]));
    let dashboard = counter(&dispatcher, Section::Dashboard);
    let channel = channel(&server, session, dispatcher, Duration::from_secs(5));

    channel.open();

    assert!(wait_for_count(&dashboard, 1).await);
    tokio::time::sleep(Duration::from_millis(100)).await;
    assert_eq!(dashboard.load(Ordering::SeqCst), 1);

    channel.close();
}

#[tokio::test]
async fn hidden_dashboard_and_malformed_frames_are_ignored() {
    let frames = vec![
        "{not json".to_string(),
        DONATION.to_string(),
        EVENT.to_string(),
    ];
    let server = WsServer::start(Script::SendThenHold(frames)).await;
    let session = session_with_token("T").await;
    let dispatcher = Arc::new(Dispatcher::new(Notices::new(), [Section::Events]));
    let dashboard = counter(&dispatcher, Section::Dashboard);
    let events = counter(&dispatcher, Section::Events);
    let channel = channel(&server, session, dispatcher, Duration::from_secs(5));

    channel.open();

    // The event frame arrives last, so the earlier ones were already handled.
    assert!(wait_for_count(&events, 1).await);
    assert_eq!(dashboard.load(Ordering::SeqCst), 0);
    assert_eq!(channel.state(), ChannelState::Open);
    assert_eq!(server.connections(), 1);

    channel.close();
}

#[tokio::test]
async fn stalled_handshake_is_retried_after_the_delay() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    let accepts = Arc::new(AtomicUsize::new(0));
    let counter = accepts.clone();
    tokio::spawn(async move {
        // Accept TCP but never answer the WebSocket handshake.
        let mut held = Vec::new();
        while let Ok((socket, _)) = listener.accept().await {
            counter.fetch_add(1, Ordering::SeqCst);
            held.push(socket);
        }
    });

    let session = session_with_token("T").await;
    let dispatcher = Arc::new(Dispatcher::new(Notices::new(), []));
    let channel = NotificationChannel::new(
        &format!("ws://{}", address),
        Duration::from_millis(100),
        session,
        dispatcher,
    )
    .with_connect_timeout(Duration::from_millis(200));
    let mut state = channel.subscribe();

    channel.open();

    assert!(wait_for_state(&mut state, ChannelState::ReconnectScheduled).await);
    assert!(wait_for_count(&accepts, 2).await);

    channel.close();
}
