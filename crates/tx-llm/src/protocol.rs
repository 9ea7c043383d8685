//! Line-oriented data stream protocol spoken to the browser.
//!
//! Every part is one line, `<code>:<json>\n`:
//!
//! | code | part |
//! |------|------|
//! | `0`  | text delta |
//! | `3`  | error message |
//! | `f`  | start of a step |
//! | `e`  | end of a step |
//! | `d`  | end of the message |

use serde::{Deserialize, Serialize};

use crate::error::{LlmError, Result};
use crate::types::{FinishReason, Usage};

/// Header announcing the protocol version on responses.
pub const DATA_STREAM_HEADER: &str = "x-vercel-ai-data-stream";
pub const DATA_STREAM_VERSION: &str = "v1";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamPart {
    Text(String),
    Error(String),
    StartStep { message_id: String },
    FinishStep { finish_reason: FinishReason, usage: Usage, is_continued: bool },
    FinishMessage { finish_reason: FinishReason, usage: Usage },
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StartStepPayload {
    message_id: String,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinishStepPayload {
    finish_reason: FinishReason,
    #[serde(default)]
    usage: Usage,
    #[serde(default)]
    is_continued: bool,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FinishMessagePayload {
    finish_reason: FinishReason,
    #[serde(default)]
    usage: Usage,
}

impl StreamPart {
    pub fn code(&self) -> char {
        match self {
            StreamPart::Text(_) => '0',
            StreamPart::Error(_) => '3',
            StreamPart::StartStep { .. } => 'f',
            StreamPart::FinishStep { .. } => 'e',
            StreamPart::FinishMessage { .. } => 'd',
        }
    }

    /// Encode as a newline-terminated line.
    pub fn encode(&self) -> String {
        let payload = match self {
            StreamPart::Text(text) | StreamPart::Error(text) => serde_json::to_string(text),
            StreamPart::StartStep { message_id } => serde_json::to_string(&StartStepPayload {
                message_id: message_id.clone(),
            }),
            StreamPart::FinishStep { finish_reason, usage, is_continued } => {
                serde_json::to_string(&FinishStepPayload {
                    finish_reason: *finish_reason,
                    usage: *usage,
                    is_continued: *is_continued,
                })
            }
            StreamPart::FinishMessage { finish_reason, usage } => {
                serde_json::to_string(&FinishMessagePayload {
                    finish_reason: *finish_reason,
                    usage: *usage,
                })
            }
        };
        format!("{}:{}\n", self.code(), payload.unwrap_or_default())
    }

    /// Parse one line (with or without its trailing newline).
    pub fn decode(line: &str) -> Result<Self> {
        let line = line.trim_end_matches(&['\r', '\n'][..]);
        let (code, json) = line
            .split_once(':')
            .ok_or_else(|| LlmError::Protocol(line.to_string()))?;
        let bad = |e: serde_json::Error| LlmError::Protocol(format!("{line}: {e}"));

        match code {
            "0" => Ok(StreamPart::Text(serde_json::from_str(json).map_err(bad)?)),
            "3" => Ok(StreamPart::Error(serde_json::from_str(json).map_err(bad)?)),
            "f" => {
                let p: StartStepPayload = serde_json::from_str(json).map_err(bad)?;
                Ok(StreamPart::StartStep { message_id: p.message_id })
            }
            "e" => {
                let p: FinishStepPayload = serde_json::from_str(json).map_err(bad)?;
                Ok(StreamPart::FinishStep {
                    finish_reason: p.finish_reason,
                    usage: p.usage,
                    is_continued: p.is_continued,
                })
            }
            "d" => {
                let p: FinishMessagePayload = serde_json::from_str(json).map_err(bad)?;
                Ok(StreamPart::FinishMessage { finish_reason: p.finish_reason, usage: p.usage })
            }
            other => Err(LlmError::Protocol(format!("unknown part code {other:?}"))),
        }
    }
}

/// Incremental decoder for a data stream response body.
#[derive(Debug, Default)]
pub struct PartDecoder {
    buf: Vec<u8>,
}

impl PartDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes; returns one result per completed line.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Result<StreamPart>> {
        self.buf.extend_from_slice(chunk);
        let mut parts = Vec::new();
        while let Some(pos) = self.buf.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buf.drain(..=pos).collect();
            let line = String::from_utf8_lossy(&raw);
            if line.trim().is_empty() {
                continue;
            }
            parts.push(StreamPart::decode(&line));
        }
        parts
    }

    /// Decode an unterminated final line, if any.
    pub fn finish(&mut self) -> Option<Result<StreamPart>> {
        let raw = std::mem::take(&mut self.buf);
        let line = String::from_utf8_lossy(&raw);
        (!line.trim().is_empty()).then(|| StreamPart::decode(&line))
    }
}
