use serde::{Deserialize, Serialize};

use crate::metadata::UploadRecord;

#[derive(Debug, Serialize)]
pub struct FileListResponse {
    pub files: Vec<UploadRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub message: String,
    pub filename: String,
    pub saved_at: String,
}

#[derive(Debug, Deserialize)]
pub struct ListQueryParams {
    /// Kept as text so a junk value falls back to the default cap.
    pub limit: Option<String>,
}

impl ListQueryParams {
    pub fn limit_or(&self, cap: usize) -> usize {
        self.limit
            .as_deref()
            .and_then(|l| l.trim().parse::<usize>().ok())
            .filter(|l| *l > 0)
            .map(|l| l.min(cap))
            .unwrap_or(cap)
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}
