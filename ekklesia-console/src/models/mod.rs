pub mod amount;
pub mod document;
pub mod donation;
pub mod event;
pub mod expense;
pub mod notification;
pub mod public;
pub mod report;
pub mod token;
pub mod user;

pub use document::{DocumentLink, DocumentRead, DocumentUpload, DownloadedFile};
pub use donation::{DonationCreate, DonationRead};
pub use event::{EventCreate, EventRead, RegistrationCreate, RegistrationRead};
pub use expense::{
    ExpenseCategoryCreate, ExpenseCategoryRead, ExpenseCreate, ExpenseFilter, ExpenseRead,
    ExpenseStatus, PaymentMethod,
};
pub use notification::NotificationEvent;
pub use public::{Announcement, AnnouncementCreate, ChurchPublicInfo, LiveStream};
pub use report::{
    AccountantReport, DashboardReport, DonationMonthlyReport, ReportFilter, ReportSummary,
};
pub use token::{LoginRequest, RefreshRequest, TokenPair};
pub use user::{RegisterRequest, Role, UserSummary, UserUpdate};
