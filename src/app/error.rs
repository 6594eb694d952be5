use reqwest::StatusCode;
use serde_json::Value as JsonValue;
use thiserror::Error;

/// Errors produced by the service layer. The HTTP mapping lives in `transport::http::types`.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    /// The payment provider rejected the client-credentials exchange.
    #[error("Failed to obtain M-PESA access token (status {status})")]
    UpstreamAuth { status: StatusCode, body: JsonValue },

    /// The payment provider rejected the STK push request.
    #[error("M-PESA STK push request failed (status {status})")]
    UpstreamRequest { status: StatusCode, body: JsonValue },

    #[error("{0}")]
    Storage(String),

    #[error("Platform request failed (status {status}): {message}")]
    Platform { status: StatusCode, message: String },

    #[error("Upstream call failed: {0}")]
    Http(#[from] reqwest::Error),
}

impl ServiceError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ServiceError::Validation(msg.into())
    }
}

/// Reads a non-success upstream body, keeping it as JSON when it parses and as a string
/// otherwise.
pub async fn upstream_body(response: reqwest::Response) -> JsonValue {
    match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or(JsonValue::String(text)),
        Err(e) => JsonValue::String(format!("<unreadable body: {}>", e)),
    }
}

/// Best-effort human message out of an upstream error body (`message`, `error`,
/// `errorMessage`, `msg`, `error_description`), falling back to the raw body.
pub fn upstream_message(body: &JsonValue) -> String {
    if let JsonValue::Object(map) = body {
        for key in ["message", "errorMessage", "error_description", "msg", "error"] {
            if let Some(JsonValue::String(s)) = map.get(key) {
                return s.clone();
            }
        }
    }
    match body {
        JsonValue::String(s) => s.clone(),
        other => other.to_string(),
    }
}
