use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{Html, Response},
    Json,
};
use chrono::Utc;
use std::sync::Arc;
use tokio_util::io::ReaderStream;

use crate::api::body::UploadBody;
use crate::api::models::{FileListResponse, HealthResponse, ListQueryParams, UploadResponse};
use crate::error::{ApiError, Result};
use crate::metadata::{iso_millis, newest_first};
use crate::payload::{classify, device_label};
use crate::stats::StatsReport;
use crate::storage::local::LocalStorage;
use crate::AppState;

/// Most entries any listing returns.
pub const MAX_LISTED: usize = 50;

const LANDING_PAGE: &str = include_str!("landing.html");

pub async fn landing() -> Html<&'static str> {
    Html(LANDING_PAGE)
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

pub async fn upload(
    State(state): State<Arc<AppState>>,
    UploadBody(body): UploadBody,
) -> Result<Json<UploadResponse>> {
    let now = Utc::now();
    let device = body.get("device_id").map(|d| device_label(Some(d)));

    state.metrics.upload_requests.inc();
    state.devices.touch(now).await;

    tracing::info!(
        kind = %body.get("type").map(|t| t.to_string()).unwrap_or_default(),
        device = %device.as_deref().unwrap_or("undefined"),
        "Upload received"
    );

    let upload = classify(&body, now).map_err(|e| {
        state
            .metrics
            .uploads_rejected
            .with_label_values(&[rejection_reason(&e)])
            .inc();
        tracing::warn!("Upload rejected: {}", e);
        e
    })?;

    state
        .storage
        .put(&upload.filename, &upload.content)
        .await
        .map_err(|e| {
            state
                .metrics
                .uploads_rejected
                .with_label_values(&["write"])
                .inc();
            tracing::error!("Failed to write {}: {}", upload.filename, e);
            e
        })?;

    state.metrics.record_stored(upload.kind, upload.content.len());
    if device.is_some() {
        state.devices.record_device(&upload.device).await;
    }
    tracing::info!(
        device = %upload.device,
        "Saved {} ({} bytes)",
        upload.filename,
        upload.content.len()
    );

    Ok(Json(UploadResponse {
        success: true,
        message: "received successfully".to_string(),
        filename: upload.filename,
        saved_at: iso_millis(&Utc::now()),
    }))
}

fn rejection_reason(error: &ApiError) -> &'static str {
    match error {
        ApiError::Validation(_) => "validation",
        ApiError::Decode(_) => "decode",
        _ => "internal",
    }
}

pub async fn list_files(State(state): State<Arc<AppState>>) -> Json<FileListResponse> {
    state.metrics.files_listed.inc();
    Json(recent_files(&state.storage, None, MAX_LISTED).await)
}

pub async fn list_photos(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQueryParams>,
) -> Json<FileListResponse> {
    state.metrics.files_listed.inc();
    Json(recent_files(&state.storage, Some("jpg"), params.limit_or(MAX_LISTED)).await)
}

pub async fn list_audios(
    State(state): State<Arc<AppState>>,
    Query(params): Query<ListQueryParams>,
) -> Json<FileListResponse> {
    state.metrics.files_listed.inc();
    Json(recent_files(&state.storage, Some("m4a"), params.limit_or(MAX_LISTED)).await)
}

/// Listing failures degrade to an empty list carrying the error text.
async fn recent_files(
    storage: &LocalStorage,
    extension: Option<&str>,
    limit: usize,
) -> FileListResponse {
    match storage.list().await {
        Ok(records) => {
            let records: Vec<_> = records
                .into_iter()
                .filter(|r| extension.map_or(true, |ext| r.has_extension(ext)))
                .collect();

            FileListResponse {
                files: newest_first(records, limit),
                error: None,
            }
        }
        Err(e) => {
            tracing::warn!(
                "Failed to list {}: {}",
                storage.base_path().display(),
                e
            );
            FileListResponse {
                files: Vec::new(),
                error: Some(e.to_string()),
            }
        }
    }
}

pub async fn download(
    State(state): State<Arc<AppState>>,
    Path(filename): Path<String>,
) -> Result<Response> {
    let stored = state.storage.open(&filename).await?;
    let content_type = mime_guess::from_path(&stored.name).first_or_octet_stream();

    state.metrics.files_downloaded.inc();
    state.metrics.download_bytes.inc_by(stored.size);

    let body = Body::from_stream(ReaderStream::new(stored.file));

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type.as_ref())
        .header(header::CONTENT_LENGTH, stored.size)
        .header(header::CONTENT_DISPOSITION, content_disposition(&stored.name))
        .body(body)
        .map_err(|e| ApiError::Download(e.to_string()))
}

/// `attachment` disposition with an RFC 5987 `filename*` when the name is not plain ASCII.
fn content_disposition(name: &str) -> String {
    let plain = name
        .chars()
        .all(|c| (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ');
    if plain {
        return format!("attachment; filename=\"{}\"", name);
    }

    let fallback: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_graphic() && c != '"' && c != '\\' {
                c
            } else {
                '?'
            }
        })
        .collect();

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(name)
    )
}

pub async fn stats(State(state): State<Arc<AppState>>) -> Json<StatsReport> {
    let folder_size = state.storage.folder_size().await.unwrap_or_else(|e| {
        tracing::warn!("Failed to size upload folder: {}", e);
        0
    });

    Json(state.devices.report(&state.metrics, folder_size).await)
}

pub async fn metrics(State(state): State<Arc<AppState>>) -> Result<String> {
    state
        .metrics
        .encode()
        .map_err(|e| ApiError::Internal(format!("Failed to encode metrics: {}", e)))
}
