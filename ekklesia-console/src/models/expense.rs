use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMethod {
    Efectivo,
    Transferencia,
    Cheque,
    Tarjeta,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExpenseStatus {
    Pending,
    Approved,
    Paid,
    Cancelled,
    Rejected,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseCategoryCreate {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub color: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub monthly_budget: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseCategoryRead {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub color: String,
    #[serde(default)]
    pub icon: Option<String>,
    pub is_active: bool,
    #[serde(default)]
    pub sort_order: i32,
    #[serde(default, deserialize_with = "crate::models::amount::deserialize_option")]
    pub monthly_budget: Option<f64>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ExpenseCreate {
    pub category_id: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subcategory_id: Option<i64>,
    pub description: String,
    pub amount: f64,
    pub expense_date: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vendor_name: Option<String>,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_reference: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_number: Option<String>,
    pub is_recurring: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<i64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExpenseRead {
    pub id: i64,
    pub category_id: i64,
    #[serde(default)]
    pub subcategory_id: Option<i64>,
    pub description: String,
    #[serde(with = "crate::models::amount")]
    pub amount: f64,
    pub expense_date: NaiveDate,
    #[serde(default)]
    pub vendor_name: Option<String>,
    #[serde(default)]
    pub payment_method: Option<String>,
    pub status: ExpenseStatus,
    #[serde(default)]
    pub is_recurring: bool,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_by_id: i64,
    #[serde(default)]
    pub approved_by_id: Option<i64>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub category: Option<ExpenseCategoryRead>,
}

/// Query filters for `GET /expenses`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpenseFilter {
    #[serde(rename = "status_filter", skip_serializing_if = "Option::is_none")]
    pub status: Option<ExpenseStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_id: Option<i64>,
}
