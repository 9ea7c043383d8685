//! Model value to provider/model-id resolution.

use std::fmt;

use crate::error::{LlmError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provider {
    OpenAi,
    Google,
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::OpenAi => write!(f, "openai"),
            Provider::Google => write!(f, "google"),
        }
    }
}

/// A concrete hosted model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub provider: Provider,
    pub model_id: String,
}

const MODELS: [(&str, Provider, &str); 3] = [
    ("gpt-4o-mini", Provider::OpenAi, "gpt-4o-mini"),
    ("gemini-flash-1.5", Provider::Google, "gemini-1.5-flash-latest"),
    ("gemini-flash-2.0", Provider::Google, "gemini-2.0-flash-exp"),
];

/// Resolve a model value from the form.
pub fn resolve_model(value: &str) -> Result<ModelSpec> {
    MODELS
        .iter()
        .find(|(v, _, _)| *v == value)
        .map(|(_, provider, id)| ModelSpec { provider: *provider, model_id: (*id).to_string() })
        .ok_or_else(|| LlmError::InvalidModel(value.to_string()))
}

/// All accepted model values.
pub fn model_values() -> impl Iterator<Item = &'static str> {
    MODELS.iter().map(|(v, _, _)| *v)
}
