use crate::models::{DonationCreate, DonationRead};
use crate::services::request_client::ApiClient;
use console_core::ConsoleError;
use std::sync::Arc;

pub struct DonationClient {
    api: Arc<ApiClient>,
}

impl DonationClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// All donations (admin only).
    pub async fn list(&self) -> Result<Vec<DonationRead>, ConsoleError> {
        self.api.get_json("/donations").await
    }

    /// Donations registered by the signed-in user.
    pub async fn list_mine(&self) -> Result<Vec<DonationRead>, ConsoleError> {
        self.api.get_json("/donations/me").await
    }

    pub async fn create(&self, donation: &DonationCreate) -> Result<DonationRead, ConsoleError> {
        let created: DonationRead = self.api.post_json("/donations", donation).await?;
        tracing::info!(
            donation_id = created.id,
            amount_total = created.amount_total,
            "Donation registered"
        );
        Ok(created)
    }
}
