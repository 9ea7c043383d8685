//! Generator form state: inputs, upload, loading flags and the streamed
//! completion.

use std::time::Duration;

use crate::error::{Result, TxError};
use crate::types::{Language, ReturnType, TractatusRequest, DEFAULT_MODEL_VALUE};

/// Messages rotated while a generation is in flight.
pub const LOADING_MESSAGES: [&str; 8] = [
    "☕ Grab a cup of coffee while I think...",
    "🤔 Processing your brilliant ideas...",
    "🧩 Organizing your thoughts Wittgenstein-style...",
    "🎯 Making your text more philosophical...",
    "🔄 Transforming chaos into order...",
    "🎨 Crafting your intellectual masterpiece...",
    "🌟 Almost there, just adding some sparkle...",
    "📚 Consulting the great philosophers...",
];

/// Rotates through [`LOADING_MESSAGES`].
#[derive(Debug, Clone)]
pub struct LoadingTicker {
    index: usize,
    pub interval: Duration,
}

impl LoadingTicker {
    pub fn new() -> Self {
        Self {
            index: 0,
            interval: Duration::from_secs(3),
        }
    }

    pub fn current(&self) -> &'static str {
        LOADING_MESSAGES[self.index]
    }

    /// Advance one message, wrapping at the end.
    pub fn tick(&mut self) -> &'static str {
        self.index = (self.index + 1) % LOADING_MESSAGES.len();
        self.current()
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

impl Default for LoadingTicker {
    fn default() -> Self {
        Self::new()
    }
}

/// An extracted upload attached to the form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub name: String,
    pub text: String,
}

/// State of the generator form.
#[derive(Debug, Clone)]
pub struct GeneratorForm {
    pub return_type: ReturnType,
    pub language: Language,
    pub input: String,
    model: String,
    upload: Option<UploadedFile>,
    loading: bool,
    uploading: bool,
    completion: String,
    ticker: LoadingTicker,
}

impl GeneratorForm {
    pub fn new() -> Self {
        Self {
            return_type: ReturnType::Text,
            language: Language::Same,
            input: String::new(),
            model: DEFAULT_MODEL_VALUE.into(),
            upload: None,
            loading: false,
            uploading: false,
            completion: String::new(),
            ticker: LoadingTicker::new(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Change the model. Ignored while a generation is running.
    pub fn set_model(&mut self, value: impl Into<String>) -> bool {
        if self.loading {
            return false;
        }
        self.model = value.into();
        true
    }

    pub fn upload(&self) -> Option<&UploadedFile> {
        self.upload.as_ref()
    }

    pub fn set_uploading(&mut self, uploading: bool) {
        self.uploading = uploading;
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Attach extracted text. Also ends the uploading phase.
    pub fn attach_upload(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.upload = Some(UploadedFile {
            name: name.into(),
            text: text.into(),
        });
        self.uploading = false;
    }

    pub fn clear_upload(&mut self) {
        self.upload = None;
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Uploaded text and manual input, blank parts skipped, separated by a
    /// blank line.
    pub fn combined_prompt(&self) -> String {
        let uploaded = self.upload.as_ref().map(|u| u.text.as_str()).unwrap_or("");
        [uploaded, self.input.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    pub fn can_submit(&self) -> bool {
        let has_upload = self.upload.as_ref().is_some_and(|u| !u.text.is_empty());
        !self.loading && !self.uploading && (has_upload || !self.input.is_empty())
    }

    /// Start a generation: clears the previous completion and returns the
    /// request body for `/api/tractatus`.
    pub fn begin_submit(&mut self) -> Result<TractatusRequest> {
        if self.loading || self.uploading {
            return Err(TxError::Busy);
        }
        if !self.can_submit() {
            return Err(TxError::EmptyPrompt);
        }
        self.completion.clear();
        self.loading = true;
        self.ticker.reset();
        Ok(TractatusRequest {
            prompt: self.combined_prompt(),
            return_type: self.return_type,
            model_value: self.model.clone(),
            language: self.language,
        })
    }

    pub fn push_delta(&mut self, delta: &str) {
        self.completion.push_str(delta);
    }

    /// Generation ended, normally or by stop.
    pub fn finish(&mut self) {
        self.loading = false;
        self.ticker.reset();
    }

    pub fn completion(&self) -> &str {
        &self.completion
    }

    pub fn ticker(&self) -> &LoadingTicker {
        &self.ticker
    }

    pub fn ticker_mut(&mut self) -> &mut LoadingTicker {
        &mut self.ticker
    }

    /// Copy and chat actions need a finished, non-empty completion.
    pub fn can_use_completion(&self) -> bool {
        !self.loading && !self.completion.is_empty()
    }

    /// Completion handed to the chat view.
    pub fn chat_handoff(&self) -> Option<String> {
        self.can_use_completion().then(|| self.completion.clone())
    }
}

impl Default for GeneratorForm {
    fn default() -> Self {
        Self::new()
    }
}
