//! Error responses for the HTTP API.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Map, Value};
use tx_core::TxError;
use tx_llm::LlmError;
use tx_parser::ParseError;

/// API error with status code, headline and optional detail.
///
/// Renders as `{"error": <headline>, "message"?: <detail>, "code": <code>}`,
/// or as the bare headline for plain-text errors.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub message: Option<String>,
    pub plain: bool,
}

impl ApiError {
    fn new(status: StatusCode, code: &'static str, error: impl Into<String>) -> Self {
        Self { status, code, error: error.into(), message: None, plain: false }
    }

    pub fn bad_request(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", error)
    }
    pub fn conflict(error: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", error)
    }
    pub fn payload_too_large(error: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, "payload_too_large", error)
    }
    pub fn bad_gateway(error: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, "upstream_error", error)
    }
    pub fn internal(error: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", error)
    }

    /// Respond with `text/plain` instead of JSON.
    pub fn plain_text(status: StatusCode, error: impl Into<String>) -> Self {
        Self { plain: true, ..Self::new(status, "bad_request", error) }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.plain {
            return (self.status, self.error).into_response();
        }
        let mut body = Map::new();
        body.insert("error".into(), Value::String(self.error));
        if let Some(message) = self.message {
            body.insert("message".into(), Value::String(message));
        }
        body.insert("code".into(), json!(self.code));
        (self.status, Json(Value::Object(body))).into_response()
    }
}

impl From<ParseError> for ApiError {
    fn from(err: ParseError) -> Self {
        match &err {
            ParseError::Io(e) => ApiError::internal("Error processing file").with_message(e.to_string()),
            _ => {
                let detail = err.detail().map(str::to_string);
                let api = ApiError::bad_request(err.to_string());
                match detail {
                    Some(d) => api.with_message(d),
                    None => api,
                }
            }
        }
    }
}

impl From<LlmError> for ApiError {
    fn from(err: LlmError) -> Self {
        match &err {
            LlmError::InvalidModel(value) => ApiError::bad_request("Invalid model").with_message(value.clone()),
            LlmError::MissingApiKey { .. } => {
                ApiError::internal("Model provider is not configured").with_message(err.to_string())
            }
            LlmError::Request { .. }
            | LlmError::Status { .. }
            | LlmError::Upstream { .. }
            | LlmError::Parse { .. } => {
                ApiError::bad_gateway("Upstream model request failed").with_message(err.to_string())
            }
            LlmError::Protocol(_) => ApiError::internal(err.to_string()),
        }
    }
}

impl From<TxError> for ApiError {
    fn from(err: TxError) -> Self {
        match &err {
            TxError::EmptyPrompt => ApiError::bad_request("No prompt provided"),
            TxError::MissingTractatus => ApiError::plain_text(StatusCode::BAD_REQUEST, err.to_string()),
            TxError::Busy => ApiError::conflict(err.to_string()),
            _ => ApiError::internal(err.to_string()),
        }
    }
}
