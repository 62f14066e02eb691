use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Serialize, Serializer};

/// Listing entry for one file in the storage directory.
#[derive(Debug, Clone, Serialize)]
pub struct UploadRecord {
    pub name: String,
    pub size: u64,
    #[serde(rename = "time", serialize_with = "serialize_iso")]
    pub modified: DateTime<Utc>,
    pub url: String,
}

impl UploadRecord {
    pub fn new(name: String, size: u64, modified: DateTime<Utc>) -> Self {
        let url = format!("/download/{}", name);
        Self {
            name,
            size,
            modified,
            url,
        }
    }

    pub fn has_extension(&self, extension: &str) -> bool {
        self.name
            .rsplit_once('.')
            .map(|(_, ext)| ext.eq_ignore_ascii_case(extension))
            .unwrap_or(false)
    }
}

/// ISO-8601 with millisecond precision and a `Z` suffix.
pub fn iso_millis(time: &DateTime<Utc>) -> String {
    time.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn serialize_iso<S: Serializer>(time: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&iso_millis(time))
}

/// Newest first, truncated to `limit`.
pub fn newest_first(mut records: Vec<UploadRecord>, limit: usize) -> Vec<UploadRecord> {
    records.sort_by(|a, b| b.modified.cmp(&a.modified));
    records.truncate(limit);
    records
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_record_serialization() {
        let modified = Utc.with_ymd_and_hms(2024, 5, 1, 12, 30, 0).unwrap();
        let record = UploadRecord::new("IMG_dev1_x.jpg".to_string(), 42, modified);

        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(
            value,
            json!({
                "name": "IMG_dev1_x.jpg",
                "size": 42,
                "time": "2024-05-01T12:30:00.000Z",
                "url": "/download/IMG_dev1_x.jpg",
            })
        );
    }

    #[test]
    fn test_newest_first_sorts_and_caps() {
        let records: Vec<UploadRecord> = (0..60)
            .map(|i| {
                let time = Utc.timestamp_opt(1_700_000_000 + i, 0).unwrap();
                UploadRecord::new(format!("f{}", i), 1, time)
            })
            .collect();

        let sorted = newest_first(records, 50);
        assert_eq!(sorted.len(), 50);
        assert_eq!(sorted[0].name, "f59");
        assert!(sorted.windows(2).all(|w| w[0].modified > w[1].modified));
    }

    #[test]
    fn test_extension_match() {
        let record = UploadRecord::new("AUDIO_a_b.m4a".to_string(), 0, Utc::now());
        assert!(record.has_extension("m4a"));
        assert!(!record.has_extension("jpg"));
        assert!(!UploadRecord::new("noext".to_string(), 0, Utc::now()).has_extension("jpg"));
    }
}
