use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Donation as captured at the counting table: amounts split by concept and
/// by payment method (cash and transfer may both be used).
#[derive(Debug, Clone, Default, Serialize)]
pub struct DonationCreate {
    pub donor_name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_document: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor_phone: Option<String>,
    pub amount_tithe: f64,
    pub amount_offering: f64,
    pub amount_missions: f64,
    pub amount_special: f64,
    pub cash_amount: f64,
    pub transfer_amount: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    pub donation_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub envelope_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    pub is_anonymous: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub event_id: Option<i64>,
}

impl DonationCreate {
    pub fn total(&self) -> f64 {
        self.amount_tithe + self.amount_offering + self.amount_missions + self.amount_special
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DonationRead {
    pub id: i64,
    pub donor_name: String,
    #[serde(default)]
    pub donor_document: Option<String>,
    #[serde(with = "crate::models::amount")]
    pub amount_tithe: f64,
    #[serde(with = "crate::models::amount")]
    pub amount_offering: f64,
    #[serde(with = "crate::models::amount")]
    pub amount_missions: f64,
    #[serde(with = "crate::models::amount")]
    pub amount_special: f64,
    #[serde(with = "crate::models::amount")]
    pub amount_total: f64,
    pub is_cash: bool,
    pub is_transfer: bool,
    #[serde(default)]
    pub payment_reference: Option<String>,
    pub donation_date: NaiveDate,
    #[serde(default)]
    pub week_number: Option<i32>,
    #[serde(default)]
    pub envelope_number: Option<String>,
    #[serde(default)]
    pub receipt_number: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    pub is_anonymous: bool,
    pub created_at: String,
}
