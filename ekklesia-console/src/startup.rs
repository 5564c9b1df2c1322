//! Console assembly and lifecycle.
//!
//! `Console` owns the single `Session` and hands it by `Arc` to the request
//! client and the notification channel.

use crate::config::Settings;
use crate::models::UserSummary;
use crate::notices::Notices;
use crate::notifications::{Dispatcher, NotificationChannel};
use crate::services::{
    ApiClient, AuthClient, DocumentClient, DonationClient, EventClient, ExpenseClient,
    PublicClient, ReportClient, UserClient,
};
use crate::session::{Session, SessionStore};
use crate::utils::jwt::decode_jwt_claims;
use chrono::Utc;
use console_core::ConsoleError;
use reqwest::StatusCode;
use secrecy::Secret;
use std::sync::Arc;

pub struct Console {
    notices: Notices,
    session: Arc<Session>,
    api: Arc<ApiClient>,
    auth: AuthClient,
    channel: NotificationChannel,
}

impl Console {
    /// Build the console, restoring any session persisted in `store`.
    pub async fn build(
        settings: &Settings,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self, ConsoleError> {
        let notices = Notices::new();
        let session = Arc::new(Session::restore(store, notices.clone()).await?);
        let api = Arc::new(ApiClient::new(&settings.api, session.clone())?);

        let dispatcher = Arc::new(Dispatcher::new(
            notices.clone(),
            settings.notifications.visible_sections.iter().copied(),
        ));
        let channel = NotificationChannel::new(
            &settings.api.ws_base(),
            settings.notifications.reconnect_delay(),
            session.clone(),
            dispatcher,
        )
        .with_connect_timeout(settings.api.request_timeout());

        tracing::info!(
            base_url = %api.base_url(),
            authenticated = session.is_authenticated(),
            "Console initialized"
        );

        Ok(Self {
            notices,
            session,
            auth: AuthClient::new(api.clone()),
            api,
            channel,
        })
    }

    /// Sign in, load the profile and start live notifications.
    pub async fn login(
        &self,
        email: &str,
        password: &Secret<String>,
    ) -> Result<UserSummary, ConsoleError> {
        if let Err(e) = self.auth.login(email, password).await {
            let message = if e.status() == Some(StatusCode::UNAUTHORIZED) {
                "Invalid email or password".to_string()
            } else {
                format!("Login failed: {}", e)
            };
            self.notices.error(message);
            return Err(e);
        }
        let user = self.auth.fetch_current_user().await?;

        self.channel.open();
        self.notices
            .success(format!("Welcome, {}", user.display_name()));

        Ok(user)
    }

    /// Continue a restored session. Returns `None` when there is nothing to
    /// resume or the stored credentials turned out to be unusable.
    pub async fn resume(&self) -> Result<Option<UserSummary>, ConsoleError> {
        if !self.session.is_authenticated() {
            return Ok(None);
        }

        if self.stored_token_expired() {
            tracing::info!("Stored access token has expired, refreshing before use");
            match self.auth.refresh().await {
                Ok(()) | Err(ConsoleError::NotAuthenticated) => {}
                Err(e) if e.is_session_expired() => return Ok(None),
                Err(e) => return Err(e),
            }
        }

        match self.auth.fetch_current_user().await {
            Ok(user) => {
                self.channel.open();
                Ok(Some(user))
            }
            Err(e) if e.is_session_expired() => {
                tracing::info!("Stored session is no longer valid");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Tokens that are not JWTs are never considered expired here; the
    /// backend's 401 settles those.
    fn stored_token_expired(&self) -> bool {
        self.session
            .bearer_token()
            .and_then(|token| decode_jwt_claims(&token).ok())
            .is_some_and(|claims| claims.is_expired_at(Utc::now()))
    }

    pub async fn logout(&self) -> Result<(), ConsoleError> {
        self.channel.close();
        self.auth.logout().await
    }

    pub fn notices(&self) -> &Notices {
        &self.notices
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn api(&self) -> &Arc<ApiClient> {
        &self.api
    }

    pub fn channel(&self) -> &NotificationChannel {
        &self.channel
    }

    pub fn dispatcher(&self) -> &Arc<Dispatcher> {
        self.channel.dispatcher()
    }

    pub fn auth(&self) -> &AuthClient {
        &self.auth
    }

    pub fn donations(&self) -> DonationClient {
        DonationClient::new(self.api.clone())
    }

    pub fn events(&self) -> EventClient {
        EventClient::new(self.api.clone())
    }

    pub fn documents(&self) -> DocumentClient {
        DocumentClient::new(self.api.clone())
    }

    pub fn expenses(&self) -> ExpenseClient {
        ExpenseClient::new(self.api.clone())
    }

    pub fn reports(&self) -> ReportClient {
        ReportClient::new(self.api.clone())
    }

    pub fn users(&self) -> UserClient {
        UserClient::new(self.api.clone())
    }

    pub fn public(&self) -> PublicClient {
        PublicClient::new(self.api.clone())
    }
}
