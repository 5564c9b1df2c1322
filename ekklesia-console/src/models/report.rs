use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Optional date range applied to report endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct ReportFilter {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportSummary {
    pub total_donations: u64,
    #[serde(with = "crate::models::amount")]
    pub total_amount: f64,
    #[serde(default)]
    pub by_type: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MonthBucket {
    pub count: u64,
    pub amount: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DashboardReport {
    #[serde(default)]
    pub by_month: BTreeMap<String, MonthBucket>,
    #[serde(default)]
    pub by_payment_method: BTreeMap<String, f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationReportRow {
    pub fecha: String,
    pub nombre: String,
    #[serde(with = "crate::models::amount")]
    pub efectivo: f64,
    #[serde(with = "crate::models::amount")]
    pub transferencia: f64,
    pub documento: String,
    #[serde(with = "crate::models::amount")]
    pub diezmo: f64,
    #[serde(with = "crate::models::amount")]
    pub ofrenda: f64,
    #[serde(with = "crate::models::amount")]
    pub misiones: f64,
    #[serde(with = "crate::models::amount")]
    pub total: f64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationReportSummary {
    #[serde(with = "crate::models::amount")]
    pub total_efectivo: f64,
    #[serde(with = "crate::models::amount")]
    pub total_transferencia: f64,
    #[serde(with = "crate::models::amount")]
    pub gran_total: f64,
    pub cantidad_donaciones: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationMonthlyReport {
    pub church_name: String,
    pub month: u32,
    pub year: i32,
    pub period_label: String,
    pub donations: Vec<DonationReportRow>,
    pub summary: DonationReportSummary,
}

/// Weekly counting sheet handed to the accountant.
#[derive(Debug, Clone, Deserialize)]
pub struct AccountantReport {
    pub church_name: String,
    pub fecha: String,
    pub semana: u32,
    pub numero_sobres: u32,
    #[serde(with = "crate::models::amount")]
    pub total_efectivo: f64,
    #[serde(with = "crate::models::amount")]
    pub total_transferencia: f64,
    #[serde(with = "crate::models::amount")]
    pub valor_total: f64,
    #[serde(with = "crate::models::amount")]
    pub diezmo_de_diezmos: f64,
    #[serde(default)]
    pub testigo_1: Option<String>,
    #[serde(default)]
    pub testigo_2: Option<String>,
}
