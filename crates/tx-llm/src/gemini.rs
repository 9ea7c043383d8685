//! Google Gemini `streamGenerateContent` client.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tx_core::types::Role;

use crate::error::{LlmError, Result};
use crate::provider::ChatModel;
use crate::registry::Provider;
use crate::sse::{delta_stream, EventParser};
use crate::types::{ChatRequest, FinishReason, StreamDelta, Usage};
use crate::DeltaStream;

pub struct GeminiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl GeminiChat {
    pub fn new(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        model_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into(),
            api_key: api_key.into(),
            model_id: model_id.into(),
        }
    }

    /// JSON body. System turns are folded into `systemInstruction`; assistant
    /// turns use the `model` role.
    pub fn request_body(&self, request: &ChatRequest) -> Value {
        let mut system_parts: Vec<Value> = request
            .system
            .iter()
            .map(|s| json!({ "text": s }))
            .collect();
        let mut contents = Vec::new();

        for m in &request.messages {
            match m.role {
                Role::System => system_parts.push(json!({ "text": m.content })),
                Role::User => contents.push(json!({ "role": "user", "parts": [{ "text": m.content }] })),
                Role::Assistant => {
                    contents.push(json!({ "role": "model", "parts": [{ "text": m.content }] }))
                }
            }
        }

        let mut body = json!({ "contents": contents });
        if !system_parts.is_empty() {
            body["systemInstruction"] = json!({ "parts": system_parts });
        }
        body
    }
}

#[async_trait]
impl ChatModel for GeminiChat {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn stream(&self, request: ChatRequest) -> Result<DeltaStream> {
        let url = format!(
            "{}/models/{}:streamGenerateContent",
            self.base_url.trim_end_matches('/'),
            self.model_id
        );
        tracing::debug!(model = %self.model_id, %url, "opening gemini stream");

        let resp = self
            .client
            .post(&url)
            .query(&[("alt", "sse")])
            .header("x-goog-api-key", &self.api_key)
            .json(&self.request_body(&request))
            .send()
            .await
            .map_err(|e| LlmError::request(Provider::Google, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: Provider::Google,
                status: status.as_u16(),
                body,
            });
        }

        Ok(delta_stream(
            Box::pin(resp.bytes_stream()),
            Provider::Google,
            GeminiEventParser::default(),
        ))
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    usage_metadata: Option<UsageMetadata>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u64,
    #[serde(default)]
    candidates_token_count: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "STOP" => FinishReason::Stop,
        "MAX_TOKENS" => FinishReason::Length,
        "SAFETY" | "RECITATION" | "BLOCKLIST" | "PROHIBITED_CONTENT" | "SPII" => {
            FinishReason::ContentFilter
        }
        "OTHER" | "LANGUAGE" | "MALFORMED_FUNCTION_CALL" => FinishReason::Other,
        _ => FinishReason::Unknown,
    }
}

/// Interprets `GenerateContentResponse` events. Usage metadata is cumulative,
/// so the last value seen wins.
#[derive(Debug, Default)]
pub struct GeminiEventParser {
    finish_reason: Option<FinishReason>,
    usage: Usage,
    finished: bool,
}

impl EventParser for GeminiEventParser {
    fn on_event(&mut self, data: &str) -> Result<Vec<StreamDelta>> {
        let resp: GenerateResponse =
            serde_json::from_str(data).map_err(|e| LlmError::parse(Provider::Google, e))?;

        if let Some(err) = resp.error {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(LlmError::Upstream { provider: Provider::Google, message });
        }

        if let Some(usage) = resp.usage_metadata {
            self.usage = Usage {
                prompt_tokens: usage.prompt_token_count,
                completion_tokens: usage.candidates_token_count,
            };
        }

        if resp
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .is_some()
        {
            self.finish_reason = Some(FinishReason::ContentFilter);
        }

        let mut deltas = Vec::new();
        if let Some(candidate) = resp.candidates.into_iter().next() {
            let text: String = candidate
                .content
                .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
                .unwrap_or_default();
            if !text.is_empty() {
                deltas.push(StreamDelta::Text(text));
            }
            if let Some(reason) = candidate.finish_reason.as_deref() {
                self.finish_reason = Some(map_finish_reason(reason));
            }
        }
        Ok(deltas)
    }

    fn on_end(&mut self) -> Vec<StreamDelta> {
        if self.finished {
            return Vec::new();
        }
        self.finished = true;
        vec![StreamDelta::Finish {
            reason: self.finish_reason.unwrap_or_default(),
            usage: self.usage,
        }]
    }
}
