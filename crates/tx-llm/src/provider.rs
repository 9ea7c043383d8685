//! Model traits and the HTTP-backed provider.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tx_core::config::{ProvidersConfig, GOOGLE_API_KEY_ENV, OPENAI_API_KEY_ENV};

use crate::error::{LlmError, Result};
use crate::gemini::GeminiChat;
use crate::openai::OpenAiChat;
use crate::registry::{ModelSpec, Provider};
use crate::types::ChatRequest;
use crate::DeltaStream;

/// A hosted chat model that streams its answer.
#[async_trait]
pub trait ChatModel: Send + Sync {
    fn provider(&self) -> Provider;

    fn model_id(&self) -> &str;

    /// Open a stream. Errors here mean nothing was generated.
    async fn stream(&self, request: ChatRequest) -> Result<DeltaStream>;
}

/// Builds chat models for resolved specs.
pub trait ModelProvider: Send + Sync {
    fn language_model(&self, spec: &ModelSpec) -> Result<Arc<dyn ChatModel>>;
}

/// Provider talking to the real OpenAI and Google endpoints.
pub struct HttpModelProvider {
    openai_client: reqwest::Client,
    google_client: reqwest::Client,
    config: ProvidersConfig,
}

impl HttpModelProvider {
    pub fn new(config: ProvidersConfig) -> Result<Self> {
        let build = |provider: Provider, secs: u64| {
            reqwest::Client::builder()
                .connect_timeout(Duration::from_secs(secs))
                .build()
                .map_err(|e| LlmError::request(provider, e))
        };
        Ok(Self {
            openai_client: build(Provider::OpenAi, config.openai.connect_timeout_secs)?,
            google_client: build(Provider::Google, config.google.connect_timeout_secs)?,
            config,
        })
    }
}

impl ModelProvider for HttpModelProvider {
    fn language_model(&self, spec: &ModelSpec) -> Result<Arc<dyn ChatModel>> {
        match spec.provider {
            Provider::OpenAi => {
                let key = self.config.openai.api_key.clone().ok_or(LlmError::MissingApiKey {
                    provider: Provider::OpenAi,
                    env_var: OPENAI_API_KEY_ENV,
                })?;
                Ok(Arc::new(OpenAiChat::new(
                    self.openai_client.clone(),
                    &self.config.openai.base_url,
                    key,
                    &spec.model_id,
                )))
            }
            Provider::Google => {
                let key = self.config.google.api_key.clone().ok_or(LlmError::MissingApiKey {
                    provider: Provider::Google,
                    env_var: GOOGLE_API_KEY_ENV,
                })?;
                Ok(Arc::new(GeminiChat::new(
                    self.google_client.clone(),
                    &self.config.google.base_url,
                    key,
                    &spec.model_id,
                )))
            }
        }
    }
}
