//! Server-side proxy to the Gemini API so the key never reaches the browser.

use crate::services::metrics::record_proxy_outcome;
use crate::services::GenerationError;
use crate::startup::AppState;
use axum::{
    body::Bytes,
    extract::{rejection::BytesRejection, State},
    http::Method,
    Json,
};
use serde::Serialize;
use serde_json::Value;
use service_core::error::AppError;

#[derive(Debug, Serialize)]
pub struct ProxyResponse {
    pub text: String,
}

/// Pull a required, non-empty string field out of the request JSON.
fn required_str<'a>(body: &'a Value, field: &str) -> Option<&'a str> {
    body.get(field)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
}

/// Checks run in order: credential, method, body, JSON, fields. Then forward
/// and relay the first text part.
pub async fn gemini_proxy(
    State(state): State<AppState>,
    method: Method,
    body: Result<Bytes, BytesRejection>,
) -> Result<Json<ProxyResponse>, AppError> {
    if !state.generator.is_configured() {
        tracing::error!("Gemini proxy called but no usable API key is configured");
        record_proxy_outcome("unconfigured");
        return Err(GenerationError::NotConfigured.into());
    }

    if method != Method::POST {
        record_proxy_outcome("method_not_allowed");
        return Err(AppError::MethodNotAllowed("POST"));
    }

    let body = body.map_err(|rejection| {
        tracing::debug!(error = %rejection, "Rejected unreadable proxy request body");
        record_proxy_outcome("bad_request");
        AppError::from(rejection)
    })?;

    let payload: Value = serde_json::from_slice(&body).map_err(|e| {
        tracing::debug!(error = %e, "Rejected proxy request with invalid JSON");
        record_proxy_outcome("bad_request");
        AppError::BadRequest(anyhow::anyhow!("Invalid JSON in request body"))
    })?;

    let (Some(prompt), Some(system_instruction)) = (
        required_str(&payload, "prompt"),
        required_str(&payload, "systemInstruction"),
    ) else {
        record_proxy_outcome("bad_request");
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "Missing prompt or system instruction"
        )));
    };

    match state.generator.generate(prompt, system_instruction).await {
        Ok(text) => {
            record_proxy_outcome("ok");
            Ok(Json(ProxyResponse { text }))
        }
        Err(e) => {
            record_proxy_outcome(match e {
                GenerationError::NotConfigured => "unconfigured",
                GenerationError::EmptyContent => "empty_content",
                GenerationError::Request(_) | GenerationError::Status { .. } => "upstream_error",
            });
            Err(e.into())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn required_str_rejects_missing_empty_and_non_string() {
        let body = json!({"prompt": "hi", "empty": "", "number": 3});
        assert_eq!(required_str(&body, "prompt"), Some("hi"));
        assert_eq!(required_str(&body, "empty"), None);
        assert_eq!(required_str(&body, "number"), None);
        assert_eq!(required_str(&body, "absent"), None);
        assert_eq!(required_str(&json!(["prompt"]), "prompt"), None);
    }
}
