pub mod auth_client;
pub mod document_client;
pub mod donation_client;
pub mod event_client;
pub mod expense_client;
pub mod public_client;
pub mod report_client;
pub mod request_client;
pub mod user_client;

pub use auth_client::AuthClient;
pub use document_client::DocumentClient;
pub use donation_client::DonationClient;
pub use event_client::EventClient;
pub use expense_client::ExpenseClient;
pub use public_client::PublicClient;
pub use report_client::ReportClient;
pub use request_client::{ApiClient, MultipartPayload, PendingRequest, RequestBody};
pub use user_client::UserClient;
