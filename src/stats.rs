// Connection statistics reported by /stats
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::BTreeSet;
use tokio::sync::RwLock;

use crate::metadata::iso_millis;
use crate::metrics::Metrics;
use crate::payload::UploadKind;

#[derive(Debug, Clone, Serialize)]
pub struct StatsReport {
    pub total_requests: u64,
    pub photos_received: u64,
    pub audios_received: u64,
    pub data_received: u64,
    pub devices: Vec<String>,
    pub last_connection: Option<String>,
    pub upload_folder_size: u64,
}

/// Most distinct devices remembered; later ones are not tracked.
pub const MAX_TRACKED_DEVICES: usize = 1024;

/// Longest device label kept, in characters.
pub const MAX_DEVICE_LABEL: usize = 128;

/// Devices with a stored upload since startup.
#[derive(Default)]
pub struct DeviceTracker {
    inner: RwLock<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    devices: BTreeSet<String>,
    last_connection: Option<DateTime<Utc>>,
}

impl DeviceTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Marks an upload request, stored or not.
    pub async fn touch(&self, at: DateTime<Utc>) {
        self.inner.write().await.last_connection = Some(at);
    }

    /// Remembers the device behind a stored upload.
    pub async fn record_device(&self, device: &str) {
        let label: String = device.chars().take(MAX_DEVICE_LABEL).collect();
        let mut state = self.inner.write().await;
        if state.devices.len() < MAX_TRACKED_DEVICES || state.devices.contains(&label) {
            state.devices.insert(label);
        }
    }

    pub async fn report(&self, metrics: &Metrics, upload_folder_size: u64) -> StatsReport {
        let state = self.inner.read().await;

        StatsReport {
            total_requests: metrics.upload_requests.get(),
            photos_received: metrics.stored_count(UploadKind::Photo)
                + metrics.stored_count(UploadKind::Screenshot),
            audios_received: metrics.stored_count(UploadKind::Audio),
            data_received: metrics.stored_count(UploadKind::Data),
            devices: state.devices.iter().cloned().collect(),
            last_connection: state.last_connection.as_ref().map(iso_millis),
            upload_folder_size,
        }
    }
}
