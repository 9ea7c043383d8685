use std::convert::Infallible;

use axum::{
    body::Body,
    extract::{
        multipart::MultipartRejection,
        rejection::JsonRejection,
        DefaultBodyLimit, Multipart, State,
    },
    http::{header, HeaderName, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use futures_util::StreamExt;
use serde_json::{json, Value};
use tx_core::prompts::{chat_system_prompt, tractatus_system_prompt};
use tx_core::{ChatRequestBody, TractatusRequest, TxError};
use tx_llm::protocol::{DATA_STREAM_HEADER, DATA_STREAM_VERSION};
use tx_llm::{registry, resolve_model, stream_generation, ChatMessage, ChatRequest, PartStream};

use crate::error::ApiError;
use crate::state::AppState;

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(health))
}

/// Upload extraction, with the request body capped at `max_bytes`.
pub fn upload_routes(max_bytes: usize) -> Router<AppState> {
    Router::new().route(
        "/api/upload",
        post(upload).layer(DefaultBodyLimit::max(max_bytes)),
    )
}

/// Generation and chat relays, with JSON bodies capped at `max_bytes`.
pub fn generation_routes(max_bytes: usize) -> Router<AppState> {
    Router::new()
        .route("/api/tractatus", post(tractatus))
        .route("/api/chat", post(chat))
        .layer(DefaultBodyLimit::max(max_bytes))
}

async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "uptime_secs": state.start_time.elapsed().as_secs(),
        "models": registry::model_values().collect::<Vec<_>>(),
    }))
}

// ========== Upload ==========

fn processing_error(detail: impl ToString) -> ApiError {
    ApiError::internal("Error processing file").with_message(detail.to_string())
}

async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let mut multipart = multipart.map_err(|e| processing_error(e.body_text()))?;

    let mut file = None;
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiError::payload_too_large("File is too large").with_message(e.body_text()));
            }
            Err(e) => return Err(processing_error(e.body_text())),
        };
        if field.name() != Some("file") {
            continue;
        }
        let name = field.file_name().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(b) => b,
            Err(e) if e.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                return Err(ApiError::payload_too_large("File is too large").with_message(e.body_text()));
            }
            Err(e) => return Err(processing_error(e.body_text())),
        };
        file = Some((name, bytes));
        break;
    }

    let Some((name, bytes)) = file else {
        return Err(ApiError::bad_request("No file provided"));
    };

    let extractor = state.extractor.clone();
    let file_name = name.clone();
    let result = tokio::task::spawn_blocking(move || extractor.extract_upload(&file_name, &bytes))
        .await
        .map_err(processing_error)?;

    match result {
        Ok(extraction) => {
            tracing::info!(
                file_name = %name,
                kind = extraction.kind.label(),
                chars = extraction.text.chars().count(),
                "upload extracted"
            );
            Ok(Json(json!({ "text": extraction.text })))
        }
        Err(e) => {
            tracing::warn!(file_name = %name, error = %e, detail = ?e.detail(), "upload rejected");
            Err(e.into())
        }
    }
}

// ========== Generation ==========

/// Wrap protocol parts in a streaming `text/plain` response.
pub fn data_stream_response(parts: PartStream) -> Response {
    let body = Body::from_stream(parts.map(|part| Ok::<_, Infallible>(part.encode())));
    (
        [
            (header::CONTENT_TYPE, "text/plain; charset=utf-8"),
            (HeaderName::from_static(DATA_STREAM_HEADER), DATA_STREAM_VERSION),
        ],
        body,
    )
        .into_response()
}

fn json_error(rejection: JsonRejection) -> ApiError {
    let api = if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        ApiError::payload_too_large("Request body is too large")
    } else {
        ApiError::bad_request("Invalid request body")
    };
    api.with_message(rejection.body_text())
}

async fn tractatus(
    State(state): State<AppState>,
    body: Result<Json<TractatusRequest>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body.map_err(json_error)?;
    let spec = resolve_model(&req.model_value)?;
    if req.prompt.trim().is_empty() {
        return Err(TxError::EmptyPrompt.into());
    }

    tracing::info!(
        model = %req.model_value,
        return_type = req.return_type.as_str(),
        language = req.language.code(),
        prompt_chars = req.prompt.chars().count(),
        "tractatus requested"
    );

    let model = state.models.language_model(&spec)?;
    let system = tractatus_system_prompt(req.return_type, req.language);
    let request = ChatRequest::new(system).with_message(ChatMessage::user(req.prompt));

    let parts = stream_generation(model, request, state.generation_options())
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "failed to open generation stream"))?;
    Ok(data_stream_response(parts))
}

async fn chat(
    State(state): State<AppState>,
    body: Result<Json<ChatRequestBody>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(body) = body.map_err(json_error)?;
    let tractatus = body
        .tractatus
        .filter(|t| !t.trim().is_empty())
        .ok_or(TxError::MissingTractatus)?;

    let messages = ChatMessage::from_wire(&body.messages);
    tracing::info!(messages = messages.len(), tractatus_chars = tractatus.chars().count(), "chat requested");

    let spec = resolve_model(&state.config.chat.model)?;
    let model = state.models.language_model(&spec)?;
    let request = ChatRequest::new(chat_system_prompt(&tractatus)).with_messages(messages);

    let parts = stream_generation(model, request, state.chat_options())
        .await
        .inspect_err(|e| tracing::warn!(error = %e, "failed to open chat stream"))?;
    Ok(data_stream_response(parts))
}
