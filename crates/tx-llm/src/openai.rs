//! OpenAI chat completions client (streaming).

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::{LlmError, Result};
use crate::provider::ChatModel;
use crate::registry::Provider;
use crate::sse::{delta_stream, EventParser};
use crate::types::{ChatRequest, FinishReason, StreamDelta, Usage};
use crate::DeltaStream;

pub struct OpenAiChat {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    model_id: String,
}

impl OpenAiChat {
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

    /// JSON body for `/chat/completions`.
    pub fn request_body(&self, request: &ChatRequest) -> Value {
        let mut messages = Vec::with_capacity(request.messages.len() + 1);
        if let Some(system) = &request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }
        for m in &request.messages {
            messages.push(json!({ "role": m.role.to_string(), "content": m.content }));
        }
        json!({
            "model": self.model_id,
            "messages": messages,
            "stream": true,
            "stream_options": { "include_usage": true },
        })
    }
}

#[async_trait]
impl ChatModel for OpenAiChat {
    fn provider(&self) -> Provider {
        Provider::OpenAi
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }

    async fn stream(&self, request: ChatRequest) -> Result<DeltaStream> {
        let url = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        tracing::debug!(model = %self.model_id, %url, "opening openai stream");

        let resp = self
            .client
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&self.request_body(&request))
            .send()
            .await
            .map_err(|e| LlmError::request(Provider::OpenAi, e))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(LlmError::Status {
                provider: Provider::OpenAi,
                status: status.as_u16(),
                body,
            });
        }

        Ok(delta_stream(
            Box::pin(resp.bytes_stream()),
            Provider::OpenAi,
            OpenAiEventParser::default(),
        ))
    }
}

#[derive(Debug, Deserialize)]
struct Chunk {
    #[serde(default)]
    choices: Vec<Choice>,
    usage: Option<ChunkUsage>,
    error: Option<Value>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    #[serde(default)]
    delta: Option<Delta>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Delta {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChunkUsage {
    #[serde(default)]
    prompt_tokens: u64,
    #[serde(default)]
    completion_tokens: u64,
}

fn map_finish_reason(reason: &str) -> FinishReason {
    match reason {
        "stop" => FinishReason::Stop,
        "length" => FinishReason::Length,
        "content_filter" => FinishReason::ContentFilter,
        "tool_calls" | "function_call" => FinishReason::Other,
        _ => FinishReason::Unknown,
    }
}

/// Interprets `chat.completion.chunk` events. The finish reason arrives before
/// the usage chunk, so the finish delta is held until `[DONE]` or end of stream.
#[derive(Debug, Default)]
pub struct OpenAiEventParser {
    finish_reason: Option<FinishReason>,
    usage: Usage,
    finished: bool,
}

impl OpenAiEventParser {
    fn finish(&mut self) -> Vec<StreamDelta> {
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

impl EventParser for OpenAiEventParser {
    fn on_event(&mut self, data: &str) -> Result<Vec<StreamDelta>> {
        if data.trim() == "[DONE]" {
            return Ok(self.finish());
        }

        let chunk: Chunk =
            serde_json::from_str(data).map_err(|e| LlmError::parse(Provider::OpenAi, e))?;

        if let Some(err) = chunk.error {
            let message = err
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| err.to_string());
            return Err(LlmError::Upstream { provider: Provider::OpenAi, message });
        }

        if let Some(usage) = chunk.usage {
            self.usage = Usage {
                prompt_tokens: usage.prompt_tokens,
                completion_tokens: usage.completion_tokens,
            };
        }

        let mut deltas = Vec::new();
        for choice in chunk.choices {
            if let Some(text) = choice.delta.and_then(|d| d.content) {
                if !text.is_empty() {
                    deltas.push(StreamDelta::Text(text));
                }
            }
            if let Some(reason) = choice.finish_reason.as_deref() {
                self.finish_reason = Some(map_finish_reason(reason));
            }
        }
        Ok(deltas)
    }

    fn on_end(&mut self) -> Vec<StreamDelta> {
        self.finish()
    }
}
