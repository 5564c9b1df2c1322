use serde::Deserialize;

/// What an uploaded document is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentLink {
    Donation(i64),
    User(i64),
    Event(i64),
}

impl DocumentLink {
    pub fn link_type(&self) -> &'static str {
        match self {
            DocumentLink::Donation(_) => "donation",
            DocumentLink::User(_) => "user",
            DocumentLink::Event(_) => "event",
        }
    }

    pub fn ref_id(&self) -> i64 {
        match self {
            DocumentLink::Donation(id) | DocumentLink::User(id) | DocumentLink::Event(id) => *id,
        }
    }
}

/// A file to upload through `POST /documents`.
#[derive(Debug, Clone)]
pub struct DocumentUpload {
    pub file_name: String,
    pub mime_type: String,
    pub content: Vec<u8>,
    pub link: Option<DocumentLink>,
    pub description: Option<String>,
    pub is_public: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DocumentRead {
    pub id: i64,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    #[serde(default)]
    pub checksum: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub is_public: bool,
    pub uploaded_at: String,
    #[serde(default)]
    pub donation_id: Option<i64>,
    #[serde(default)]
    pub user_id: Option<i64>,
    #[serde(default)]
    pub event_id: Option<i64>,
}

/// Downloaded file body with the metadata the backend sent along.
#[derive(Debug, Clone)]
pub struct DownloadedFile {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content: Vec<u8>,
}
