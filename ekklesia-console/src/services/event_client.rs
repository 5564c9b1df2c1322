use crate::models::{EventCreate, EventRead, RegistrationCreate, RegistrationRead};
use crate::services::request_client::{ApiClient, PendingRequest};
use console_core::ConsoleError;
use std::sync::Arc;

pub struct EventClient {
    api: Arc<ApiClient>,
}

impl EventClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Upcoming events; readable without signing in.
    pub async fn list(&self) -> Result<Vec<EventRead>, ConsoleError> {
        self.api
            .send_json(PendingRequest::get("/events").skip_auth())
            .await
    }

    pub async fn create(&self, event: &EventCreate) -> Result<EventRead, ConsoleError> {
        let created: EventRead = self.api.post_json("/events", event).await?;
        tracing::info!(event_id = created.id, name = %created.name, "Event created");
        Ok(created)
    }

    pub async fn register_attendee(
        &self,
        event_id: i64,
        registration: &RegistrationCreate,
    ) -> Result<RegistrationRead, ConsoleError> {
        self.api
            .post_json(&format!("/events/{}/registrations", event_id), registration)
            .await
    }

    pub async fn registrations(&self, event_id: i64) -> Result<Vec<RegistrationRead>, ConsoleError> {
        self.api
            .get_json(&format!("/events/{}/registrations", event_id))
            .await
    }

    pub async fn cancel_registration(
        &self,
        event_id: i64,
        registration_id: i64,
    ) -> Result<(), ConsoleError> {
        self.api
            .send_empty(PendingRequest::delete(format!(
                "/events/{}/registrations/{}",
                event_id, registration_id
            )))
            .await
    }
}
