use crate::models::{
    ExpenseCategoryCreate, ExpenseCategoryRead, ExpenseCreate, ExpenseFilter, ExpenseRead,
};
use crate::services::request_client::{ApiClient, PendingRequest};
use console_core::ConsoleError;
use std::sync::Arc;

/// Expense bookkeeping (admin only).
pub struct ExpenseClient {
    api: Arc<ApiClient>,
}

impl ExpenseClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    pub async fn list(&self, filter: &ExpenseFilter) -> Result<Vec<ExpenseRead>, ConsoleError> {
        self.api
            .send_json(PendingRequest::get("/expenses").query(filter)?)
            .await
    }

    pub async fn get(&self, expense_id: i64) -> Result<ExpenseRead, ConsoleError> {
        self.api.get_json(&format!("/expenses/{}", expense_id)).await
    }

    pub async fn create(&self, expense: &ExpenseCreate) -> Result<ExpenseRead, ConsoleError> {
        self.api.post_json("/expenses", expense).await
    }

    pub async fn approve(&self, expense_id: i64) -> Result<(), ConsoleError> {
        self.transition(expense_id, "approve").await
    }

    pub async fn reject(&self, expense_id: i64) -> Result<(), ConsoleError> {
        self.transition(expense_id, "reject").await
    }

    pub async fn mark_paid(&self, expense_id: i64) -> Result<(), ConsoleError> {
        self.transition(expense_id, "pay").await
    }

    pub async fn delete(&self, expense_id: i64) -> Result<(), ConsoleError> {
        self.api
            .send_empty(PendingRequest::delete(format!("/expenses/{}", expense_id)))
            .await
    }

    pub async fn categories(&self) -> Result<Vec<ExpenseCategoryRead>, ConsoleError> {
        self.api.get_json("/expenses/categories").await
    }

    pub async fn create_category(
        &self,
        category: &ExpenseCategoryCreate,
    ) -> Result<ExpenseCategoryRead, ConsoleError> {
        self.api.post_json("/expenses/categories", category).await
    }

    pub async fn delete_category(&self, category_id: i64) -> Result<(), ConsoleError> {
        self.api
            .send_empty(PendingRequest::delete(format!(
                "/expenses/categories/{}",
                category_id
            )))
            .await
    }

    async fn transition(&self, expense_id: i64, action: &str) -> Result<(), ConsoleError> {
        self.api
            .send_empty(PendingRequest::patch(format!(
                "/expenses/{}/{}",
                expense_id, action
            )))
            .await?;
        tracing::info!(expense_id, action, "Expense status changed");
        Ok(())
    }
}
