use crate::models::{UserSummary, UserUpdate};
use crate::services::request_client::{ApiClient, PendingRequest};
use console_core::ConsoleError;
use std::sync::Arc;

/// User administration (admin only).
pub struct UserClient {
    api: Arc<ApiClient>,
}

impl UserClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self) -> Result<Vec<UserSummary>, ConsoleError> {
        self.api.get_json("/users").await
    }

    pub async fn get(&self, user_id: i64) -> Result<UserSummary, ConsoleError> {
        self.api.get_json(&format!("/users/{}", user_id)).await
    }

    pub async fn update(&self, user_id: i64, update: &UserUpdate) -> Result<UserSummary, ConsoleError> {
        self.api
            .send_json(PendingRequest::patch(format!("/users/{}", user_id)).json(update)?)
            .await
    }

    pub async fn delete(&self, user_id: i64) -> Result<(), ConsoleError> {
        self.api
            .send_empty(PendingRequest::delete(format!("/users/{}", user_id)))
            .await
    }
}
