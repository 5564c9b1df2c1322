use crate::models::{
    AccountantReport, DashboardReport, DonationMonthlyReport, ReportFilter, ReportSummary,
};
use crate::services::request_client::{ApiClient, PendingRequest};
use console_core::ConsoleError;
use serde::Serialize;
use std::sync::Arc;

#[derive(Serialize)]
struct MonthQuery {
    month: u32,
    year: i32,
}

#[derive(Serialize)]
struct YearQuery {
    year: i32,
}

/// Donation reports (admin only).
pub struct ReportClient {
    api: Arc<ApiClient>,
}

impl ReportClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn summary(&self, filter: &ReportFilter) -> Result<ReportSummary, ConsoleError> {
        self.api
            .send_json(PendingRequest::get("/reports/summary").query(filter)?)
            .await
    }

    pub async fn dashboard(&self, filter: &ReportFilter) -> Result<DashboardReport, ConsoleError> {
        self.api
            .send_json(PendingRequest::get("/reports/dashboard").query(filter)?)
            .await
    }

    /// Raw CSV export; the bytes are handed over as produced by the backend.
    pub async fn export_csv(&self, filter: &ReportFilter) -> Result<Vec<u8>, ConsoleError> {
        let response = self
            .api
            .checked(PendingRequest::get("/reports/export").query(filter)?)
            .await?;
        Ok(response.bytes().await?.to_vec())
    }

    pub async fn monthly_donations(
        &self,
        month: u32,
        year: i32,
    ) -> Result<DonationMonthlyReport, ConsoleError> {
        self.api
            .send_json(
                PendingRequest::get("/reports/donations/monthly")
                    .query(&MonthQuery { month, year })?,
            )
            .await
    }

    pub async fn weekly_accountant(
        &self,
        week_number: u32,
        year: i32,
    ) -> Result<AccountantReport, ConsoleError> {
        self.api
            .send_json(
                PendingRequest::get(format!("/reports/donations/weekly/{}", week_number))
                    .query(&YearQuery { year })?,
            )
            .await
    }
}
