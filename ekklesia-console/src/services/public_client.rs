//! Public site endpoints and the admin side of its content.

use crate::models::{Announcement, AnnouncementCreate, ChurchPublicInfo, EventRead, LiveStream};
use crate::services::request_client::{ApiClient, PendingRequest};
use console_core::ConsoleError;
use serde::de::DeserializeOwned;
use std::sync::Arc;

pub struct PublicClient {
    api: Arc<ApiClient>,
}

impl PublicClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    async fn public<T: DeserializeOwned>(&self, path: &str) -> Result<T, ConsoleError> {
        self.api
            .send_json(PendingRequest::get(path).skip_auth())
            .await
    }

    pub async fn church(&self) -> Result<ChurchPublicInfo, ConsoleError> {
        self.public("/public/config").await
    }

    pub async fn events(&self) -> Result<Vec<EventRead>, ConsoleError> {
        self.public("/public/events").await
    }

    pub async fn event(&self, event_id: i64) -> Result<EventRead, ConsoleError> {
        self.public(&format!("/public/events/{}", event_id)).await
    }

    pub async fn announcements(&self) -> Result<Vec<Announcement>, ConsoleError> {
        self.public("/public/announcements").await
    }

    pub async fn streams(&self) -> Result<Vec<LiveStream>, ConsoleError> {
        self.public("/public/streams").await
    }

    /// The stream currently on air, if any.
    pub async fn live_stream(&self) -> Result<Option<LiveStream>, ConsoleError> {
        self.public("/public/streams/live").await
    }

    pub async fn donation_info(&self) -> Result<serde_json::Value, ConsoleError> {
        self.public("/public/donation-info").await
    }

    pub async fn admin_announcements(&self) -> Result<Vec<Announcement>, ConsoleError> {
        self.api.get_json("/admin/announcements").await
    }

    pub async fn publish_announcement(
        &self,
        announcement: &AnnouncementCreate,
    ) -> Result<Announcement, ConsoleError> {
        self.api.post_json("/admin/announcements", announcement).await
    }

    pub async fn delete_announcement(&self, announcement_id: i64) -> Result<(), ConsoleError> {
        self.api
            .send_empty(PendingRequest::delete(format!(
                "/admin/announcements/{}",
                announcement_id
            )))
            .await
    }
}
