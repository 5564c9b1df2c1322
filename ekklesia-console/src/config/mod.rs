use crate::notifications::Section;
use console_core::ConsoleError;
use secrecy::Secret;
use serde::Deserialize;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Deserialize, Clone)]
pub struct Settings {
    pub api: ApiSettings,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default)]
    pub session: SessionSettings,
    #[serde(default)]
    pub telemetry: TelemetrySettings,
    #[serde(default)]
    pub credentials: Option<CredentialSettings>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ApiSettings {
    /// REST base URL including the `/api` prefix (e.g. http://localhost:6076/api).
    pub base_url: String,
    /// WebSocket origin. Derived from `base_url` when absent.
    #[serde(default)]
    pub ws_base_url: Option<String>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    30
}

impl ApiSettings {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ws_base_url: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// WebSocket origin for the push channel: `http(s)` becomes `ws(s)` and the
    /// trailing `/api` segment is dropped.
    pub fn ws_base(&self) -> String {
        if let Some(ws) = &self.ws_base_url {
            return ws.trim_end_matches('/').to_string();
        }

        let base = self.base_url.trim_end_matches('/');
        let base = base.strip_suffix("/api").unwrap_or(base);

        if let Some(rest) = base.strip_prefix("https://") {
            format!("wss://{}", rest)
        } else if let Some(rest) = base.strip_prefix("http://") {
            format!("ws://{}", rest)
        } else {
            base.to_string()
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct NotificationSettings {
    /// Fixed delay before reopening a closed channel.
    #[serde(default = "default_reconnect_delay_ms")]
    pub reconnect_delay_ms: u64,
    /// Sections considered visible at startup.
    #[serde(default = "default_visible_sections")]
    pub visible_sections: Vec<Section>,
}

fn default_reconnect_delay_ms() -> u64 {
    5000
}

fn default_visible_sections() -> Vec<Section> {
    vec![Section::Dashboard]
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_ms: default_reconnect_delay_ms(),
            visible_sections: default_visible_sections(),
        }
    }
}

impl NotificationSettings {
    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct SessionSettings {
    /// File holding the persisted token pair and profile.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from(".ekklesia/session.json")
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
        }
    }
}

#[derive(Deserialize, Clone, Debug)]
pub struct TelemetrySettings {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// OTLP gRPC endpoint; spans are only exported when set.
    #[serde(default)]
    pub otlp_endpoint: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            otlp_endpoint: None,
        }
    }
}

/// Optional credentials used by the console binary when no session is stored.
#[derive(Deserialize, Clone)]
pub struct CredentialSettings {
    pub email: String,
    pub password: Secret<String>,
}

pub fn get_configuration() -> Result<Settings, ConsoleError> {
    let configuration_directory =
        console_core::config::configuration_directory("ekklesia-console")?;

    console_core::config::load_settings(&configuration_directory)
}
