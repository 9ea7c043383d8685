//! Hosted LLM access for the Tractatus generator.
//!
//! Resolves form model values to providers, streams completions from OpenAI
//! and Gemini, and turns them into the line protocol relayed to the browser.

pub mod error;
pub mod gemini;
pub mod openai;
pub mod protocol;
pub mod provider;
pub mod registry;
pub mod smooth;
pub mod sse;
pub mod steps;
pub mod types;

use futures_util::stream::BoxStream;

pub use error::{LlmError, Result};
pub use protocol::{PartDecoder, StreamPart};
pub use provider::{ChatModel, HttpModelProvider, ModelProvider};
pub use registry::{resolve_model, ModelSpec, Provider};
pub use steps::{stream_generation, StepOptions};
pub use types::{ChatMessage, ChatRequest, FinishReason, StreamDelta, Usage};

/// Deltas from a single provider call.
pub type DeltaStream = BoxStream<'static, Result<StreamDelta>>;

/// Protocol parts for a whole generation.
pub type PartStream = BoxStream<'static, StreamPart>;

#[cfg(test)]
mod tests;
