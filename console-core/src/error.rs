use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

pub type Result<T, E = ConsoleError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    /// No response was obtained (DNS, connect, TLS, timeout).
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The session was terminated while serving this call.
    #[error("Session ended: {0}")]
    SessionExpired(String),

    #[error("Not authenticated")]
    NotAuthenticated,

    /// Application-level failure returned by the backend.
    #[error("API error ({status}): {detail}")]
    Api { status: StatusCode, detail: String },

    #[error("Decode error: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] std::io::Error),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Invalid URL: {0}")]
    InvalidUrl(String),

    /// The request could not be assembled; nothing was sent.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("WebSocket error: {0}")]
    WebSocket(String),

    #[error("Configuration error: {0}")]
    Config(anyhow::Error),
}

impl From<config::ConfigError> for ConsoleError {
    fn from(err: config::ConfigError) -> Self {
        ConsoleError::Config(anyhow::Error::new(err))
    }
}

impl ConsoleError {
    /// Build an `Api` error from a non-success response, pulling the backend's
    /// `detail` field when the body is JSON.
    pub async fn from_response(response: reqwest::Response) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            detail: serde_json::Value,
        }

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        let detail = match serde_json::from_str::<ErrorBody>(&body) {
            Ok(ErrorBody {
                detail: serde_json::Value::String(message),
            }) => message,
            Ok(ErrorBody { detail }) => detail.to_string(),
            Err(_) if body.is_empty() => status
                .canonical_reason()
                .unwrap_or("Unknown error")
                .to_string(),
            Err(_) => body,
        };

        ConsoleError::Api { status, detail }
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ConsoleError::Api { status, .. } => Some(*status),
            ConsoleError::Transport(err) => err.status(),
            _ => None,
        }
    }

    pub fn is_session_expired(&self) -> bool {
        matches!(self, ConsoleError::SessionExpired(_))
    }
}
