// Classification of incoming device payloads into stored files
use base64::{
    alphabet,
    engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig},
    Engine as _,
};
use bytes::Bytes;
use chrono::{DateTime, SecondsFormat, Utc};
use serde_json::Value as JsonValue;

use crate::error::{ApiError, Result};

/// Standard alphabet, padding optional, non-zero trailing bits tolerated.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadKind {
    Photo,
    Screenshot,
    Audio,
    Data,
}

impl UploadKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "photo" => Some(UploadKind::Photo),
            "screenshot" => Some(UploadKind::Screenshot),
            "audio" => Some(UploadKind::Audio),
            "data" => Some(UploadKind::Data),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            UploadKind::Photo => "photo",
            UploadKind::Screenshot => "screenshot",
            UploadKind::Audio => "audio",
            UploadKind::Data => "data",
        }
    }

    fn prefix(&self) -> &'static str {
        match self {
            UploadKind::Photo | UploadKind::Screenshot => "IMG",
            UploadKind::Audio => "AUDIO",
            UploadKind::Data => "DATA",
        }
    }

    fn extension(&self) -> &'static str {
        match self {
            UploadKind::Photo | UploadKind::Screenshot => "jpg",
            UploadKind::Audio => "m4a",
            UploadKind::Data => "json",
        }
    }
}

/// A payload that passed validation and is ready to be written.
#[derive(Debug, Clone)]
pub struct ClassifiedUpload {
    pub kind: UploadKind,
    pub device: String,
    pub filename: String,
    pub content: Bytes,
}

/// Validates the body, derives the filename and produces the bytes to store.
///
/// `type` and `data` must both be truthy, whatever the kind. For `data`
/// uploads the whole body is stored, not the `data` field.
pub fn classify(body: &JsonValue, now: DateTime<Utc>) -> Result<ClassifiedUpload> {
    let kind_value = body.get("type");
    let data_value = body.get("data");

    if !is_truthy(kind_value) || !is_truthy(data_value) {
        return Err(ApiError::incomplete_data());
    }

    let kind = kind_value
        .and_then(JsonValue::as_str)
        .and_then(UploadKind::parse)
        .ok_or_else(ApiError::invalid_type)?;

    let device = device_label(body.get("device_id"));
    let filename = format!(
        "{}_{}_{}.{}",
        kind.prefix(),
        device,
        file_timestamp(now),
        kind.extension()
    );

    let content = match kind {
        UploadKind::Photo | UploadKind::Screenshot | UploadKind::Audio => {
            let encoded = data_value
                .and_then(JsonValue::as_str)
                .ok_or_else(|| ApiError::Internal("data must be a base64 string".to_string()))?;
            Bytes::from(decode_base64(encoded)?)
        }
        UploadKind::Data => Bytes::from(serde_json::to_vec_pretty(body)?),
    };

    Ok(ClassifiedUpload {
        kind,
        device,
        filename,
        content,
    })
}

/// ISO-8601 time with `:` and `.` swapped for `-`.
pub fn file_timestamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace(&[':', '.'][..], "-")
}

/// Text form of `device_id` as it appears in filenames.
pub fn device_label(value: Option<&JsonValue>) -> String {
    let label = match value {
        None => "undefined".to_string(),
        Some(JsonValue::Null) => "null".to_string(),
        Some(other) => script_text(other),
    };

    label.replace(&['/', '\\'][..], "_")
}

/// String conversion as a script template would do it: arrays join with `,`
/// and lose their null entries, whole floats drop the fraction.
fn script_text(value: &JsonValue) -> String {
    match value {
        JsonValue::Null => String::new(),
        JsonValue::Bool(b) => b.to_string(),
        JsonValue::Number(n) => match n.as_f64() {
            Some(f) if n.is_f64() && f == 0.0 => "0".to_string(),
            Some(f) if n.is_f64() && f.fract() == 0.0 && f.abs() < 1e21 => format!("{:.0}", f),
            _ => n.to_string(),
        },
        JsonValue::String(s) => s.clone(),
        JsonValue::Array(items) => items.iter().map(script_text).collect::<Vec<_>>().join(","),
        JsonValue::Object(_) => "[object Object]".to_string(),
    }
}

/// Accepts the URL-safe `-` and `_` alongside the standard alphabet.
pub fn decode_base64(encoded: &str) -> Result<Vec<u8>> {
    let compact: String = encoded
        .chars()
        .filter(|c| !c.is_ascii_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    Ok(LENIENT.decode(compact)?)
}

fn is_truthy(value: Option<&JsonValue>) -> bool {
    match value {
        None | Some(JsonValue::Null) => false,
        Some(JsonValue::Bool(b)) => *b,
        Some(JsonValue::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(true),
        Some(JsonValue::String(s)) => !s.is_empty(),
        Some(JsonValue::Array(_)) | Some(JsonValue::Object(_)) => true,
    }
}
