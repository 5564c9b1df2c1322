//! Live notification channel.
//!
//! One WebSocket per session, modeled as a small state machine:
//!
//! ```text
//! Closed -> Connecting -> Open -> ReconnectScheduled -> Connecting -> ...
//! ```
//!
//! Leaving `ReconnectScheduled` is guarded: the session must still hold an
//! access token when the delay elapses, otherwise the channel goes `Closed`.

use crate::notifications::dispatcher::Dispatcher;
use crate::session::{Session, SessionState};
use console_core::ConsoleError;
use futures::{SinkExt, StreamExt};
use reqwest::Url;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::tungstenite::protocol::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;

pub const NOTIFICATIONS_PATH: &str = "/api/ws/notifications";
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Closed,
    Connecting,
    Open,
    ReconnectScheduled,
}

/// Why a connected socket stopped pumping.
enum Disconnect {
    Cancelled,
    SessionEnded,
    Dropped,
}

struct ChannelTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

#[derive(Clone)]
struct ChannelContext {
    endpoint: String,
    reconnect_delay: Duration,
    connect_timeout: Duration,
    session: Arc<Session>,
    dispatcher: Arc<Dispatcher>,
    state_tx: Arc<watch::Sender<ChannelState>>,
}

pub struct NotificationChannel {
    context: ChannelContext,
    task: Mutex<Option<ChannelTask>>,
}

impl NotificationChannel {
    pub fn new(
        ws_base: &str,
        reconnect_delay: Duration,
        session: Arc<Session>,
        dispatcher: Arc<Dispatcher>,
    ) -> Self {
        let (state_tx, _) = watch::channel(ChannelState::Closed);
        Self {
            context: ChannelContext {
                endpoint: format!("{}{}", ws_base.trim_end_matches('/'), NOTIFICATIONS_PATH),
                reconnect_delay,
                connect_timeout: DEFAULT_CONNECT_TIMEOUT,
                session,
                dispatcher,
                state_tx: Arc::new(state_tx),
            },
            task: Mutex::new(None),
        }
    }

    /// Bound on TCP connect plus WebSocket handshake. A handshake that
    /// does not finish in time counts as a dropped connection.
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.context.connect_timeout = timeout;
        self
    }

    pub fn state(&self) -> ChannelState {
        *self.context.state_tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<ChannelState> {
        self.context.state_tx.subscribe()
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        &self.context.dispatcher
    }

    /// Whether a channel task is alive (connected or waiting to reconnect).
    pub fn is_running(&self) -> bool {
        self.task
            .lock()
            .map(|task| task.as_ref().is_some_and(|t| !t.handle.is_finished()))
            .unwrap_or(false)
    }

    /// Start the channel for the current session.
    ///
    /// Returns `false` without doing anything when no access token is held.
    /// A channel that is already running is closed first.
    pub fn open(&self) -> bool {
        if self.context.session.bearer_token().is_none() {
            tracing::debug!("Not opening notification channel without a session");
            return false;
        }

        self.close();

        let cancel = CancellationToken::new();
        let context = self.context.clone();
        let task_cancel = cancel.clone();
        let handle = tokio::spawn(async move { context.run(task_cancel).await });

        if let Ok(mut task) = self.task.lock() {
            *task = Some(ChannelTask { cancel, handle });
        }
        true
    }

    /// Stop the channel. No reconnect fires afterwards.
    pub fn close(&self) {
        let task = self.task.lock().ok().and_then(|mut task| task.take());
        if let Some(task) = task {
            task.cancel.cancel();
            self.context.state_tx.send_replace(ChannelState::Closed);
            tracing::info!("Notification channel closed");
        }
    }
}

impl Drop for NotificationChannel {
    fn drop(&mut self) {
        if let Ok(mut task) = self.task.lock() {
            if let Some(task) = task.take() {
                task.cancel.cancel();
            }
        }
    }
}

impl ChannelContext {
    fn set_state(&self, cancel: &CancellationToken, state: ChannelState) {
        // Checked under the channel lock so a cancelled task can never
        // overwrite the `Closed` written by `close()`.
        self.state_tx.send_if_modified(|current| {
            if cancel.is_cancelled() || *current == state {
                return false;
            }
            *current = state;
            true
        });
    }

    fn url_for(&self, token: &str) -> Result<Url, ConsoleError> {
        Url::parse_with_params(&self.endpoint, &[("token", token)])
            .map_err(|e| ConsoleError::InvalidUrl(format!("{}: {}", self.endpoint, e)))
    }

    async fn connect(&self, url: &Url) -> Result<Socket, ConsoleError> {
        let handshake = tokio::time::timeout(self.connect_timeout, connect_async(url.as_str()))
            .await
            .map_err(|_| {
                ConsoleError::WebSocket(format!(
                    "handshake not completed within {}ms",
                    self.connect_timeout.as_millis()
                ))
            })?;
        let (socket, _) = handshake.map_err(|e| ConsoleError::WebSocket(e.to_string()))?;
        Ok(socket)
    }

    async fn run(self, cancel: CancellationToken) {
        let mut session_rx = self.session.subscribe();

        loop {
            // Checked when the reconnect delay fires, not when it was scheduled.
            let Some(token) = self.session.bearer_token() else {
                tracing::info!("Session gone, not reconnecting notification channel");
                break;
            };

            let url = match self.url_for(&token) {
                Ok(url) => url,
                Err(e) => {
                    tracing::error!(error = %e, "Cannot build notification channel URL");
                    break;
                }
            };

            self.set_state(&cancel, ChannelState::Connecting);
            tracing::debug!(endpoint = %self.endpoint, "Connecting notification channel");

            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = session_ended(&mut session_rx) => break,
                result = self.connect(&url) => result,
            };

            match connected {
                Ok(socket) => {
                    self.set_state(&cancel, ChannelState::Open);
                    tracing::info!(endpoint = %self.endpoint, "Notification channel open");

                    match self.pump(socket, &cancel, &mut session_rx).await {
                        Disconnect::Cancelled => return,
                        Disconnect::SessionEnded => break,
                        Disconnect::Dropped => {}
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Notification channel connection failed");
                }
            }

            self.set_state(&cancel, ChannelState::ReconnectScheduled);
            tracing::info!(
                delay_ms = self.reconnect_delay.as_millis() as u64,
                "Notification channel reconnect scheduled"
            );

            tokio::select! {
                biased;
                _ = cancel.cancelled() => return,
                _ = session_ended(&mut session_rx) => break,
                _ = tokio::time::sleep(self.reconnect_delay) => {}
            }
        }

        self.set_state(&cancel, ChannelState::Closed);
    }

    async fn pump(
        &self,
        mut socket: Socket,
        cancel: &CancellationToken,
        session_rx: &mut watch::Receiver<SessionState>,
    ) -> Disconnect {
        loop {
            let frame = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    let _ = socket.close(None).await;
                    return Disconnect::Cancelled;
                }
                _ = session_ended(session_rx) => {
                    let _ = socket.close(None).await;
                    return Disconnect::SessionEnded;
                }
                frame = socket.next() => frame,
            };

            match frame {
                Some(Ok(Message::Text(text))) => {
                    self.dispatcher.handle_text(&text);
                }
                Some(Ok(Message::Ping(payload))) => {
                    let _ = socket.send(Message::Pong(payload)).await;
                }
                Some(Ok(Message::Close(frame))) => {
                    tracing::info!(frame = ?frame, "Notification channel closed by server");
                    return Disconnect::Dropped;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(error = %e, "Notification channel error");
                    return Disconnect::Dropped;
                }
                None => return Disconnect::Dropped,
            }
        }
    }
}

/// Resolves once the session is anonymous (or its owner is gone).
async fn session_ended(session_rx: &mut watch::Receiver<SessionState>) {
    let _ = session_rx
        .wait_for(|state| *state == SessionState::Anonymous)
        .await;
}
