use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Download failed: {0}")]
    Download(String),

    #[error("{0}")]
    Decode(#[from] base64::DecodeError),

    #[error("{0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn incomplete_data() -> Self {
        ApiError::Validation("incomplete data".to_string())
    }

    pub fn invalid_type() -> Self {
        ApiError::Validation("invalid type".to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        // Download failures answer in plain text, everything else in JSON.
        let status = match self {
            ApiError::FileNotFound(_) => {
                return (StatusCode::NOT_FOUND, "file not found").into_response();
            }
            ApiError::Download(ref message) => {
                tracing::error!("Download error: {}", message);
                return (StatusCode::INTERNAL_SERVER_ERROR, "download error").into_response();
            }
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Decode(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

pub type Result<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn test_validation_is_json_400() {
        let response = ApiError::incomplete_data().into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body: serde_json::Value = serde_json::from_str(&body_of(response).await).unwrap();
        assert_eq!(body, json!({"error": "incomplete data"}));
    }

    #[tokio::test]
    async fn test_not_found_is_plain_text() {
        let response = ApiError::FileNotFound("x.jpg".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_of(response).await, "file not found");
    }

    #[tokio::test]
    async fn test_download_error_hides_cause() {
        let response = ApiError::Download("permission denied".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body_of(response).await, "download error");
    }

    #[tokio::test]
    async fn test_internal_error_carries_raw_message() {
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        let response = ApiError::from(io).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: serde_json::Value = serde_json::from_str(&body_of(response).await).unwrap();
        assert_eq!(body["error"], "disk full");
    }
}
