use axum::{
    async_trait,
    extract::{FromRequest, Request},
    http::header,
    response::{IntoResponse, Response},
    Form, Json,
};
use serde_json::{json, Map, Value as JsonValue};

/// Upload body as loose JSON, whether it arrived as JSON or as a form.
///
/// Other content types produce an empty object so validation reports the
/// missing fields.
#[derive(Debug)]
pub struct UploadBody(pub JsonValue);

#[async_trait]
impl<S> FromRequest<S> for UploadBody
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let content_type = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.to_ascii_lowercase())
            .unwrap_or_default();
        let essence = content_type.split(';').next().unwrap_or("").trim();

        if essence == "application/x-www-form-urlencoded" {
            let Form(fields) = Form::<Vec<(String, String)>>::from_request(req, state)
                .await
                .map_err(|rejection| reject(rejection.status(), rejection.body_text()))?;

            let object: Map<String, JsonValue> = fields
                .into_iter()
                .map(|(key, value)| (key, JsonValue::String(value)))
                .collect();
            return Ok(UploadBody(JsonValue::Object(object)));
        }

        if essence == "application/json" || essence.ends_with("+json") {
            let Json(value) = Json::<JsonValue>::from_request(req, state)
                .await
                .map_err(|rejection| reject(rejection.status(), rejection.body_text()))?;
            return Ok(UploadBody(value));
        }

        Ok(UploadBody(JsonValue::Object(Map::new())))
    }
}

fn reject(status: axum::http::StatusCode, message: String) -> Response {
    tracing::warn!("Rejected upload body: {}", message);
    (status, Json(json!({ "error": message }))).into_response()
}
