//! Session-aware request pipeline.
//!
//! Every backend call goes through [`ApiClient::send`]:
//!
//! 1. attempt with the current access token;
//! 2. on 401, refresh the token pair once (or end the session);
//! 3. attempt again with the new token and return whatever comes back.
//!
//! A single call never triggers more than one refresh nor more than one retry.

use crate::config::ApiSettings;
use crate::models::{RefreshRequest, TokenPair};
use crate::session::{Session, SessionEnd};
use console_core::observability::TracedClientExt;
use console_core::ConsoleError;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{multipart, Client, Method, Response, StatusCode};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const REFRESH_PATH: &str = "/auth/refresh";

/// One file inside a multipart upload.
#[derive(Debug, Clone)]
pub struct FilePart {
    pub field: String,
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
}

/// Description of a `multipart/form-data` body. Kept as plain data so the form
/// can be rebuilt when the request is retried.
#[derive(Debug, Clone, Default)]
pub struct MultipartPayload {
    fields: Vec<(String, String)>,
    files: Vec<FilePart>,
}

impl MultipartPayload {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn file(
        mut self,
        field: impl Into<String>,
        file_name: impl Into<String>,
        mime_type: impl Into<String>,
        content: Vec<u8>,
    ) -> Self {
        self.files.push(FilePart {
            field: field.into(),
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            content,
        });
        self
    }

    fn to_form(&self) -> Result<multipart::Form, ConsoleError> {
        let mut form = multipart::Form::new();

        for (name, value) in &self.fields {
            form = form.text(name.clone(), value.clone());
        }

        for file in &self.files {
            let part = multipart::Part::bytes(file.content.clone())
                .file_name(file.file_name.clone())
                .mime_str(&file.mime_type)
                .map_err(|e| {
                    ConsoleError::InvalidRequest(format!(
                        "bad content type '{}' for {}: {}",
                        file.mime_type, file.file_name, e
                    ))
                })?;
            form = form.part(file.field.clone(), part);
        }

        Ok(form)
    }
}

#[derive(Debug, Clone)]
pub enum RequestBody {
    Json(serde_json::Value),
    Multipart(MultipartPayload),
}

/// An outgoing call, retained until it either completes or has been retried
/// once after a token refresh.
#[derive(Debug, Clone)]
pub struct PendingRequest {
    pub method: Method,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: HeaderMap,
    pub body: Option<RequestBody>,
    /// Public endpoints: never attach credentials, never refresh.
    pub skip_auth: bool,
}

impl PendingRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
            skip_auth: false,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn patch(path: impl Into<String>) -> Self {
        Self::new(Method::PATCH, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ConsoleError> {
        self.body = Some(RequestBody::Json(serde_json::to_value(body)?));
        Ok(self)
    }

    pub fn multipart(mut self, payload: MultipartPayload) -> Self {
        self.body = Some(RequestBody::Multipart(payload));
        self
    }

    /// Append query parameters from a flat serializable struct; `None` fields
    /// are skipped.
    pub fn query<T: Serialize + ?Sized>(mut self, params: &T) -> Result<Self, ConsoleError> {
        if let serde_json::Value::Object(map) = serde_json::to_value(params)? {
            for (key, value) in map {
                let value = match value {
                    serde_json::Value::Null => continue,
                    serde_json::Value::String(s) => s,
                    other => other.to_string(),
                };
                self.query.push((key, value));
            }
        }
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn skip_auth(mut self) -> Self {
        self.skip_auth = true;
        self
    }
}

enum Recovery {
    /// Retry with this access token.
    Retry(String),
    /// The session was ended; hand the 401 back.
    Terminated,
}

pub struct ApiClient {
    http: Client,
    base_url: String,
    session: Arc<Session>,
    // At most one refresh in flight; late arrivals reuse its result.
    refresh_gate: Mutex<()>,
}

impl ApiClient {
    pub fn new(settings: &ApiSettings, session: Arc<Session>) -> Result<Self, ConsoleError> {
        let http = Client::builder()
            .timeout(settings.request_timeout())
            .build()?;

        Ok(Self::with_http_client(http, &settings.base_url, session))
    }

    pub fn with_http_client(http: Client, base_url: &str, session: Arc<Session>) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            refresh_gate: Mutex::new(()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session(&self) -> &Arc<Session> {
        &self.session
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Run the request through the attempt -> refresh -> attempt pipeline.
    ///
    /// Any status other than 401 is returned untouched. Only transport
    /// failures surface as errors.
    pub async fn send(&self, request: PendingRequest) -> Result<Response, ConsoleError> {
        let sent_token = if request.skip_auth {
            None
        } else {
            self.session.bearer_token()
        };

        let response = self.attempt(&request, sent_token.as_deref()).await?;

        if response.status() != StatusCode::UNAUTHORIZED || request.skip_auth {
            return Ok(response);
        }

        tracing::info!(
            method = %request.method,
            path = %request.path,
            "Request unauthorized, attempting token refresh"
        );

        match self.recover(sent_token.as_deref()).await {
            Recovery::Retry(token) => self.attempt(&request, Some(&token)).await,
            Recovery::Terminated => Ok(response),
        }
    }

    /// Explicitly refresh the token pair (outside of a 401).
    pub async fn refresh_session(&self) -> Result<(), ConsoleError> {
        let _gate = self.refresh_gate.lock().await;

        let refresh_token = self
            .session
            .refresh_token()
            .ok_or(ConsoleError::NotAuthenticated)?;

        match self.refresh(refresh_token.expose_secret()).await {
            Ok(tokens) => {
                if self
                    .session
                    .rotate(refresh_token.expose_secret(), tokens)
                    .await?
                {
                    Ok(())
                } else {
                    Err(ConsoleError::NotAuthenticated)
                }
            }
            Err(e) => {
                self.end_session().await;
                Err(ConsoleError::SessionExpired(e.to_string()))
            }
        }
    }

    async fn recover(&self, sent_token: Option<&str>) -> Recovery {
        let _gate = self.refresh_gate.lock().await;

        // Another request rotated the pair while this one was in flight.
        if let (Some(sent), Some(current)) = (sent_token, self.session.bearer_token()) {
            if sent != current {
                tracing::debug!("Token already refreshed by a concurrent request");
                return Recovery::Retry(current);
            }
        }

        let Some(refresh_token) = self.session.refresh_token() else {
            tracing::warn!("No refresh token held, ending session");
            self.end_session().await;
            return Recovery::Terminated;
        };

        match self.refresh(refresh_token.expose_secret()).await {
            Ok(tokens) => {
                let access_token = tokens.access_token.expose_secret().clone();
                match self
                    .session
                    .rotate(refresh_token.expose_secret(), tokens)
                    .await
                {
                    Ok(true) => Recovery::Retry(access_token),
                    Ok(false) => Recovery::Terminated,
                    Err(e) => {
                        tracing::warn!(error = %e, "Refreshed tokens could not be persisted");
                        Recovery::Retry(access_token)
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Token refresh failed, ending session");
                self.end_session().await;
                Recovery::Terminated
            }
        }
    }

    /// `POST /auth/refresh`. Any non-success status or transport error is a
    /// failed refresh.
    async fn refresh(&self, refresh_token: &str) -> Result<TokenPair, ConsoleError> {
        let url = self.url(REFRESH_PATH);

        let response = self
            .http
            .traced_post(&url)
            .json(&RefreshRequest { refresh_token })
            .send_with_request_id(&uuid::Uuid::new_v4().to_string())
            .await
            .map_err(|e| {
                tracing::error!("Failed to send POST request to {}: {}", url, e);
                ConsoleError::Transport(e)
            })?;

        if !response.status().is_success() {
            return Err(ConsoleError::from_response(response).await);
        }

        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn end_session(&self) {
        if let Err(e) = self.session.end(SessionEnd::Expired).await {
            tracing::error!(error = %e, "Failed to clear persisted session");
        }
    }

    async fn attempt(
        &self,
        request: &PendingRequest,
        access_token: Option<&str>,
    ) -> Result<Response, ConsoleError> {
        let mut url = self.url(&request.path);
        if !request.query.is_empty() {
            url = reqwest::Url::parse_with_params(&url, &request.query)
                .map_err(|e| ConsoleError::InvalidUrl(format!("{}: {}", url, e)))?
                .to_string();
        }

        let mut builder = self
            .http
            .traced(request.method.clone(), &url)
            .headers(request.headers.clone());

        if let Some(token) = access_token {
            builder = builder.bearer_auth(token);
        }

        match &request.body {
            Some(RequestBody::Json(value)) => builder = builder.json(value),
            Some(RequestBody::Multipart(payload)) => builder = builder.multipart(payload.to_form()?),
            None => {}
        }

        let response = builder
            .send_with_request_id(&uuid::Uuid::new_v4().to_string())
            .await
            .map_err(|e| {
                tracing::error!("Failed to send {} request to {}: {}", request.method, url, e);
                ConsoleError::Transport(e)
            })?;

        tracing::debug!(
            method = %request.method,
            path = %request.path,
            status = response.status().as_u16(),
            "Backend responded"
        );

        Ok(response)
    }

    /// Send and decode a JSON body from a success response.
    pub async fn send_json<T: DeserializeOwned>(
        &self,
        request: PendingRequest,
    ) -> Result<T, ConsoleError> {
        let response = self.checked(request).await?;
        let bytes = response.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    /// Send and discard the body of a success response.
    pub async fn send_empty(&self, request: PendingRequest) -> Result<(), ConsoleError> {
        self.checked(request).await?;
        Ok(())
    }

    /// Send and map non-success statuses to errors. A 401 that ended the
    /// session becomes `SessionExpired`.
    pub async fn checked(&self, request: PendingRequest) -> Result<Response, ConsoleError> {
        let skip_auth = request.skip_auth;
        let response = self.send(request).await?;

        if response.status().is_success() {
            return Ok(response);
        }

        if response.status() == StatusCode::UNAUTHORIZED
            && !skip_auth
            && !self.session.is_authenticated()
        {
            return Err(ConsoleError::SessionExpired(
                "credentials were rejected".to_string(),
            ));
        }

        Err(ConsoleError::from_response(response).await)
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        self.send_json(PendingRequest::get(path)).await
    }

    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ConsoleError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.send_json(PendingRequest::post(path).json(body)?).await
    }
}
