mod common;

use common::{Script, WsServer};
use ekklesia_console::config::{
    ApiSettings, NotificationSettings, SessionSettings, Settings, TelemetrySettings,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use ekklesia_console::models::Role;
use ekklesia_console::notices::NoticeLevel;
use ekklesia_console::notifications::{ChannelState, Section};
use ekklesia_console::session::{MemorySessionStore, SessionState, StoredSession};
use ekklesia_console::Console;
use secrecy::Secret;
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn settings(server: &MockServer, ws: &WsServer) -> Settings {
    let mut api = ApiSettings::new(format!("{}/api", server.uri()));
    api.ws_base_url = Some(ws.base.clone());

    Settings {
        api,
        notifications: NotificationSettings {
            reconnect_delay_ms: 200,
            visible_sections: vec![Section::Dashboard],
        },
        session: SessionSettings::default(),
        telemetry: TelemetrySettings::default(),
        credentials: None,
    }
}

async fn mount_login(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .and(body_json(json!({ "email": "admin@iglesia.org", "password": "secreto" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A1",
            "refresh_token": "R1",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(server)
        .await;
}

async fn mount_me(server: &MockServer, token: &str) {
    Mock::given(method("GET"))
        .and(path("/api/users/me"))
        .and(header("authorization", format!("Bearer {}", token).as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "id": 1,
            "full_name": "Pastor Admin",
            "email": "admin@iglesia.org",
            "role": "admin",
            "is_active": true
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn login_loads_profile_and_opens_channel() {
    let server = MockServer::start().await;
    let ws = WsServer::start(Script::SendThenHold(vec![])).await;
    mount_login(&server).await;
    mount_me(&server, "A1").await;

    let store = Arc::new(MemorySessionStore::new());
    let console = Console::build(&settings(&server, &ws), store.clone())
        .await
        .unwrap();
    let mut notices = console.notices().subscribe();

    let user = console
        .login("admin@iglesia.org", &Secret::new("secreto".to_string()))
        .await
        .unwrap();

    assert_eq!(user.role, Role::Admin);
    assert_eq!(console.session().current_user(), Some(user.clone()));
    assert_eq!(store.snapshot().user, Some(user));
    assert!(ws.wait_for_connections(1, Duration::from_secs(3)).await);
    assert_eq!(ws.uris(), vec!["/api/ws/notifications?token=A1".to_string()]);
    assert_eq!(notices.recv().await.unwrap().message, "Welcome, Pastor Admin");

    console.logout().await.unwrap();

    assert_eq!(console.session().state(), SessionState::Anonymous);
    assert_eq!(console.channel().state(), ChannelState::Closed);
    assert!(store.snapshot().is_empty());
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(ws.connections(), 1);
}

#[tokio::test]
async fn failed_refresh_shuts_the_channel_down() {
    let server = MockServer::start().await;
    let ws = WsServer::start(Script::SendThenHold(vec![])).await;
    mount_login(&server).await;
    mount_me(&server, "A1").await;
    Mock::given(method("GET"))
        .and(path("/api/donations"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({ "detail": "expired" })))
        .expect(1)
        .mount(&server)
        .await;

    let console = Console::build(&settings(&server, &ws), Arc::new(MemorySessionStore::new()))
        .await
        .unwrap();
    console
        .login("admin@iglesia.org", &Secret::new("secreto".to_string()))
        .await
        .unwrap();
    let mut channel_state = console.channel().subscribe();
    assert!(ws.wait_for_connections(1, Duration::from_secs(3)).await);

    let result = console.donations().list().await;

    assert!(result.unwrap_err().is_session_expired());
    let closed = tokio::time::timeout(
        Duration::from_secs(3),
        channel_state.wait_for(|s| *s == ChannelState::Closed),
    )
    .await;
    assert!(matches!(closed, Ok(Ok(_))));
    tokio::time::sleep(Duration::from_millis(400)).await;
    assert_eq!(ws.connections(), 1);
}

#[tokio::test]
async fn restored_session_resumes_without_login() {
    let server = MockServer::start().await;
    let ws = WsServer::start(Script::SendThenHold(vec![])).await;
    mount_me(&server, "A9").await;

    let store = Arc::new(MemorySessionStore::with_record(StoredSession {
        access_token: Some("A9".to_string()),
        refresh_token: Some("R9".to_string()),
        user: None,
    }));
    let console = Console::build(&settings(&server, &ws), store).await.unwrap();

    let user = console.resume().await.unwrap().expect("session should resume");

    assert_eq!(user.email, "admin@iglesia.org");
    assert!(ws.wait_for_connections(1, Duration::from_secs(3)).await);
    assert_eq!(ws.uris(), vec!["/api/ws/notifications?token=A9".to_string()]);

    console.logout().await.unwrap();
}

#[tokio::test]
async fn nothing_to_resume_without_stored_session() {
    let server = MockServer::start().await;
    let ws = WsServer::start(Script::SendThenHold(vec![])).await;

    let console = Console::build(&settings(&server, &ws), Arc::new(MemorySessionStore::new()))
        .await
        .unwrap();

    assert!(console.resume().await.unwrap().is_none());
    assert!(!console.channel().open());
    assert_eq!(ws.connections(), 0);
}

#[tokio::test]
async fn own_donations_survive_access_token_expiry() {
    let server = MockServer::start().await;
    let ws = WsServer::start(Script::SendThenHold(vec![])).await;
    mount_login(&server).await;
    mount_me(&server, "A1").await;
    Mock::given(method("GET"))
        .and(path("/api/donations/me"))
        .and(header("authorization", "Bearer A1"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "R1" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A2",
            "refresh_token": "R2",
            "token_type": "bearer"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/donations/me"))
        .and(header("authorization", "Bearer A2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemorySessionStore::new());
    let console = Console::build(&settings(&server, &ws), store.clone())
        .await
        .unwrap();
    console
        .login("admin@iglesia.org", &Secret::new("secreto".to_string()))
        .await
        .unwrap();

    let donations = console.donations().list_mine().await.unwrap();

    assert!(donations.is_empty());
    assert_eq!(console.session().state(), SessionState::Authenticated);
    let stored = store.snapshot();
    assert_eq!(stored.access_token.as_deref(), Some("A2"));
    assert_eq!(stored.refresh_token.as_deref(), Some("R2"));
    assert_eq!(stored.user.map(|u| u.id), Some(1));

    console.logout().await.unwrap();
}

#[tokio::test]
async fn rejected_login_publishes_error_notice() {
    let server = MockServer::start().await;
    let ws = WsServer::start(Script::SendThenHold(vec![])).await;
    Mock::given(method("POST"))
        .and(path("/api/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({ "detail": "Incorrect email or password" })),
        )
        .mount(&server)
        .await;

    let console = Console::build(&settings(&server, &ws), Arc::new(MemorySessionStore::new()))
        .await
        .unwrap();
    let mut notices = console.notices().subscribe();

    let result = console
        .login("admin@iglesia.org", &Secret::new("nope".to_string()))
        .await;

    assert!(result.is_err());
    let notice = notices.recv().await.unwrap();
    assert_eq!(notice.level, NoticeLevel::Error);
    assert_eq!(notice.message, "Invalid email or password");
    assert!(!console.session().is_authenticated());
    assert_eq!(ws.connections(), 0);
}

#[tokio::test]
async fn expired_stored_token_is_refreshed_before_resuming() {
    let server = MockServer::start().await;
    let ws = WsServer::start(Script::SendThenHold(vec![])).await;
    let claims = URL_SAFE_NO_PAD.encode(br#"{"sub":"1","exp":1000}"#);
    let expired = format!("eyJhbGciOiJIUzI1NiJ9.{}.c2ln", claims);

    Mock::given(method("POST"))
        .and(path("/api/auth/refresh"))
        .and(body_json(json!({ "refresh_token": "R9" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "A10",
            "refresh_token": "R10"
        })))
        .expect(1)
        .mount(&server)
        .await;
    mount_me(&server, "A10").await;

    let store = Arc::new(MemorySessionStore::with_record(StoredSession {
        access_token: Some(expired),
        refresh_token: Some("R9".to_string()),
        user: None,
    }));
    let console = Console::build(&settings(&server, &ws), store.clone())
        .await
        .unwrap();

    let user = console.resume().await.unwrap();

    assert!(user.is_some());
    assert_eq!(store.snapshot().access_token.as_deref(), Some("A10"));
    assert!(ws.wait_for_connections(1, Duration::from_secs(3)).await);
    assert_eq!(ws.uris(), vec!["/api/ws/notifications?token=A10".to_string()]);

    console.logout().await.unwrap();
}
