// Prometheus metrics
use prometheus::{CounterVec, IntCounter, IntCounterVec, Opts, Registry};
use std::sync::Arc;

use crate::payload::UploadKind;

pub struct Metrics {
    pub registry: Registry,

    // Upload counters
    pub upload_requests: IntCounter,
    pub files_stored: IntCounterVec,
    pub stored_bytes: CounterVec,
    pub uploads_rejected: IntCounterVec,

    // Download counters
    pub files_downloaded: IntCounter,
    pub download_bytes: IntCounter,

    pub files_listed: IntCounter,
}

impl Metrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let upload_requests = IntCounter::new(
            "upload_requests_total",
            "Total number of upload requests received",
        )?;
        registry.register(Box::new(upload_requests.clone()))?;

        let files_stored = IntCounterVec::new(
            Opts::new("files_stored_total", "Total number of uploads written to disk"),
            &["kind"],
        )?;
        registry.register(Box::new(files_stored.clone()))?;

        let stored_bytes = CounterVec::new(
            Opts::new("stored_bytes_total", "Total bytes written to disk"),
            &["kind"],
        )?;
        registry.register(Box::new(stored_bytes.clone()))?;

        let uploads_rejected = IntCounterVec::new(
            Opts::new("uploads_rejected_total", "Total uploads that were not stored"),
            &["reason"],
        )?;
        registry.register(Box::new(uploads_rejected.clone()))?;

        let files_downloaded =
            IntCounter::new("files_downloaded_total", "Total number of files downloaded")?;
        registry.register(Box::new(files_downloaded.clone()))?;

        let download_bytes = IntCounter::new("download_bytes_total", "Total bytes downloaded")?;
        registry.register(Box::new(download_bytes.clone()))?;

        let files_listed =
            IntCounter::new("files_listed_total", "Total number of file list operations")?;
        registry.register(Box::new(files_listed.clone()))?;

        Ok(Self {
            registry,
            upload_requests,
            files_stored,
            stored_bytes,
            uploads_rejected,
            files_downloaded,
            download_bytes,
            files_listed,
        })
    }

    pub fn record_stored(&self, kind: UploadKind, bytes: usize) {
        self.files_stored.with_label_values(&[kind.as_str()]).inc();
        self.stored_bytes
            .with_label_values(&[kind.as_str()])
            .inc_by(bytes as f64);
    }

    pub fn stored_count(&self, kind: UploadKind) -> u64 {
        self.files_stored.with_label_values(&[kind.as_str()]).get()
    }

    pub fn gather(&self) -> Vec<prometheus::proto::MetricFamily> {
        self.registry.gather()
    }

    /// Text exposition of every registered metric.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        use prometheus::Encoder;

        let encoder = prometheus::TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

/// Shared metrics instance
pub type SharedMetrics = Arc<Metrics>;
