//! Application state shared across all handlers.

use std::sync::Arc;
use std::time::{Duration, Instant};
use tx_core::TractatusConfig;
use tx_llm::{HttpModelProvider, ModelProvider, StepOptions};
use tx_parser::Extractor;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<TractatusConfig>,
    pub models: Arc<dyn ModelProvider>,
    pub extractor: Arc<Extractor>,
    pub start_time: Instant,
}

impl AppState {
    /// State backed by the real provider endpoints from `config`.
    pub fn new(config: TractatusConfig) -> tx_llm::Result<Self> {
        let models = HttpModelProvider::new(config.providers.clone())?;
        Ok(Self::with_models(config, Arc::new(models)))
    }

    pub fn with_models(config: TractatusConfig, models: Arc<dyn ModelProvider>) -> Self {
        Self {
            config: Arc::new(config),
            models,
            extractor: Arc::new(Extractor::new()),
            start_time: Instant::now(),
        }
    }

    /// Step options for `/api/tractatus`: smoothing and continuation on.
    pub fn generation_options(&self) -> StepOptions {
        let generation = &self.config.generation;
        StepOptions {
            max_steps: generation.max_steps,
            smooth_delay: Some(Duration::from_millis(generation.smooth_delay_ms)),
        }
    }

    /// Step options for `/api/chat`: a single unsmoothed step.
    pub fn chat_options(&self) -> StepOptions {
        StepOptions::default()
    }
}
