mod api;
mod config;
mod error;
mod metadata;
mod metrics;
mod payload;
mod stats;
mod storage;

use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::metrics::SharedMetrics;
use crate::stats::DeviceTracker;
use crate::storage::local::LocalStorage;

pub struct AppState {
    pub storage: LocalStorage,
    pub metrics: SharedMetrics,
    pub devices: DeviceTracker,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "device_ingest=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path = std::env::var("CONFIG_PATH").unwrap_or_else(|_| "config.yaml".to_string());
    tracing::info!("Loading configuration from: {}", config_path);

    let config = Config::load(&config_path)?;

    let storage = LocalStorage::new(&config.storage.path).await?;
    tracing::info!("Uploads stored in: {}", storage.base_path().display());

    let metrics = Arc::new(metrics::Metrics::new()?);

    let state = Arc::new(AppState {
        storage,
        metrics,
        devices: DeviceTracker::new(),
    });

    let app = api::create_router(state, config.server.body_limit_bytes)
        .layer(TraceLayer::new_for_http());

    let addr = format!("{}:{}", config.server.host, config.server.port);
    tracing::info!("Starting server on {}", addr);

    let listener = TcpListener::bind(&addr).await?;

    axum::serve(listener, app).await?;

    Ok(())
}
