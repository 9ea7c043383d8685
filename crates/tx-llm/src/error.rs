use thiserror::Error;

use crate::registry::Provider;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("Invalid model: {0}")]
    InvalidModel(String),
    #[error("Missing API key for {provider} (set {env_var})")]
    MissingApiKey { provider: Provider, env_var: &'static str },
    #[error("{provider} request failed: {message}")]
    Request { provider: Provider, message: String },
    #[error("{provider} returned HTTP {status}: {body}")]
    Status { provider: Provider, status: u16, body: String },
    #[error("{provider} stream error: {message}")]
    Upstream { provider: Provider, message: String },
    #[error("Failed to parse {provider} stream event: {message}")]
    Parse { provider: Provider, message: String },
    #[error("Malformed data stream line: {0}")]
    Protocol(String),
}

impl LlmError {
    pub fn request(provider: Provider, err: impl std::fmt::Display) -> Self {
        LlmError::Request { provider, message: err.to_string() }
    }

    pub fn parse(provider: Provider, err: impl std::fmt::Display) -> Self {
        LlmError::Parse { provider, message: err.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, LlmError>;
