use serde::{Deserialize, Serialize};

/// Church profile exposed on the public site (`GET /public/config`).
#[derive(Debug, Clone, Deserialize)]
pub struct ChurchPublicInfo {
    pub church_name: String,
    #[serde(default)]
    pub slogan: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Announcement {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub content: Option<String>,
    pub announcement_type: String,
    pub priority: i32,
    pub is_public: bool,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnnouncementCreate {
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    pub announcement_type: String,
    pub priority: i32,
    pub is_public: bool,
}

impl AnnouncementCreate {
    pub fn general(title: impl Into<String>, content: Option<String>) -> Self {
        Self {
            title: title.into(),
            content,
            announcement_type: "general".to_string(),
            priority: 0,
            is_public: true,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LiveStream {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub stream_url: Option<String>,
    pub platform: String,
    pub is_live: bool,
    pub is_featured: bool,
    #[serde(default)]
    pub view_count: u64,
}
