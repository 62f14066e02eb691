pub mod body;
pub mod handlers;
pub mod models;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::CorsLayer;

use crate::AppState;

pub fn create_router(state: Arc<AppState>, body_limit_bytes: usize) -> Router {
    Router::new()
        .route("/", get(handlers::landing))
        .route("/health", get(handlers::health))
        .route("/upload", post(handlers::upload))
        .route("/files", get(handlers::list_files))
        .route("/photos", get(handlers::list_photos))
        .route("/audios", get(handlers::list_audios))
        .route("/download/:filename", get(handlers::download))
        .route("/stats", get(handlers::stats))
        .route("/metrics", get(handlers::metrics))
        .layer(DefaultBodyLimit::max(body_limit_bytes))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
