//! Document uploads and downloads.

use crate::models::{DocumentRead, DocumentUpload, DownloadedFile};
use crate::services::request_client::{ApiClient, MultipartPayload, PendingRequest};
use crate::utils::format::format_file_size;
use console_core::ConsoleError;
use reqwest::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use std::sync::Arc;

pub struct DocumentClient {
    api: Arc<ApiClient>,
}

impl DocumentClient {
    pub fn new(api: Arc<ApiClient>) -> Self {
        Self { api }
    }

    /// Upload a file as `multipart/form-data`.
    pub async fn upload(&self, upload: DocumentUpload) -> Result<DocumentRead, ConsoleError> {
        let mut payload = MultipartPayload::new()
            .file("file", upload.file_name, upload.mime_type, upload.content)
            .text("is_public", upload.is_public.to_string());

        if let Some(link) = upload.link {
            payload = payload
                .text("link_type", link.link_type())
                .text("ref_id", link.ref_id().to_string());
        }
        if let Some(description) = upload.description {
            payload = payload.text("description", description);
        }

        let document: DocumentRead = self
            .api
            .send_json(PendingRequest::post("/documents").multipart(payload))
            .await?;

        tracing::info!(
            document_id = document.id,
            size_bytes = document.size_bytes,
            "Document uploaded"
        );
        self.api.session().notices().success(format!(
            "Uploaded {} ({})",
            document.file_name,
            format_file_size(document.size_bytes)
        ));
        Ok(document)
    }

    /// All documents (admin only).
    pub async fn list(&self) -> Result<Vec<DocumentRead>, ConsoleError> {
        self.api.get_json("/documents").await
    }

    pub async fn download(&self, document_id: i64) -> Result<DownloadedFile, ConsoleError> {
        let response = self
            .api
            .checked(PendingRequest::get(format!("/documents/{}", document_id)))
            .await?;

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());
        let file_name = response
            .headers()
            .get(CONTENT_DISPOSITION)
            .and_then(|v| v.to_str().ok())
            .and_then(file_name_from_disposition);

        let content = response.bytes().await?.to_vec();

        Ok(DownloadedFile {
            file_name,
            content_type,
            content,
        })
    }
}

/// Pull `filename` out of a `Content-Disposition` header value.
fn file_name_from_disposition(value: &str) -> Option<String> {
    value.split(';').map(str::trim).find_map(|part| {
        part.strip_prefix("filename=")
            .map(|name| name.trim_matches('"').to_string())
    })
}
