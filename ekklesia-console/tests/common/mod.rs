#![allow(dead_code)]

use ekklesia_console::models::TokenPair;
use ekklesia_console::notices::Notices;
use ekklesia_console::services::ApiClient;
use ekklesia_console::session::{MemorySessionStore, Session};
use futures::{SinkExt, StreamExt};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};
use tokio_tungstenite::tungstenite::protocol::Message;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub struct TestApp {
    pub server: MockServer,
    pub store: Arc<MemorySessionStore>,
    pub session: Arc<Session>,
    pub notices: Notices,
    pub api: Arc<ApiClient>,
}

impl TestApp {
    pub async fn spawn() -> Self {
        let server = MockServer::start().await;
        let store = Arc::new(MemorySessionStore::new());
        let notices = Notices::new();
        let session = Arc::new(Session::new(store.clone(), notices.clone()));
        let api = Arc::new(ApiClient::with_http_client(
            reqwest::Client::new(),
            &format!("{}/api", server.uri()),
            session.clone(),
        ));

        Self {
            server,
            store,
            session,
            notices,
            api,
        }
    }

    pub async fn logged_in(access_token: &str, refresh_token: &str) -> Self {
        let app = Self::spawn().await;
        app.session
            .begin(TokenPair::new(access_token, refresh_token))
            .await
            .expect("Failed to start session");
        app
    }

    /// Mount a refresh endpoint that trades `refresh_token` for a new pair.
    pub async fn mount_refresh(&self, refresh_token: &str, access: &str, refresh: &str) {
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .and(body_json(json!({ "refresh_token": refresh_token })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": access,
                "refresh_token": refresh,
                "token_type": "bearer"
            })))
            .expect(1)
            .mount(&self.server)
            .await;
    }

    pub async fn mount_refresh_failure(&self, status: u16) {
        Mock::given(method("POST"))
            .and(path("/api/auth/refresh"))
            .respond_with(
                ResponseTemplate::new(status)
                    .set_body_json(json!({ "detail": "Invalid refresh token" })),
            )
            .expect(1)
            .mount(&self.server)
            .await;
    }
}

/// What a test WebSocket server does with each accepted connection.
#[derive(Clone)]
pub enum Script {
    /// Send the frames, then close.
    SendThenClose(Vec<String>),
    /// Send the frames, then keep the socket open until the client leaves.
    SendThenHold(Vec<String>),
}

/// Minimal notification backend: records each handshake URI and plays a
/// script on every connection.
pub struct WsServer {
    pub base: String,
    connections: Arc<AtomicUsize>,
    uris: Arc<Mutex<Vec<String>>>,
}

impl WsServer {
    pub async fn start(script: Script) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind WebSocket listener");
        let address = listener.local_addr().expect("No local address");

        let connections = Arc::new(AtomicUsize::new(0));
        let uris = Arc::new(Mutex::new(Vec::new()));

        let counter = connections.clone();
        let seen = uris.clone();
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let script = script.clone();
                let counter = counter.clone();
                let seen = seen.clone();

                tokio::spawn(async move {
                    let callback = |request: &Request, response: Response| {
                        seen.lock().unwrap().push(request.uri().to_string());
                        Ok::<Response, ErrorResponse>(response)
                    };
                    let Ok(mut socket) =
                        tokio_tungstenite::accept_hdr_async(stream, callback).await
                    else {
                        return;
                    };
                    counter.fetch_add(1, Ordering::SeqCst);

                    let (frames, hold) = match script {
                        Script::SendThenClose(frames) => (frames, false),
                        Script::SendThenHold(frames) => (frames, true),
                    };
                    for frame in frames {
                        if socket.send(Message::Text(frame.into())).await.is_err() {
                            return;
                        }
                    }

                    if hold {
                        while let Some(Ok(message)) = socket.next().await {
                            if matches!(message, Message::Close(_)) {
                                break;
                            }
                        }
                    } else {
                        let _ = socket.close(None).await;
                    }
                });
            }
        });

        Self {
            base: format!("ws://{}", address),
            connections,
            uris,
        }
    }

    pub fn connections(&self) -> usize {
        self.connections.load(Ordering::SeqCst)
    }

    pub fn uris(&self) -> Vec<String> {
        self.uris.lock().unwrap().clone()
    }

    /// Poll until at least `count` connections were accepted.
    pub async fn wait_for_connections(&self, count: usize, within: Duration) -> bool {
        let deadline = tokio::time::Instant::now() + within;
        while tokio::time::Instant::now() < deadline {
            if self.connections() >= count {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        self.connections() >= count
    }
}
