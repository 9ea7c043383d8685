//! Shared types for the Tractatus generator: configuration, errors, prompt
//! templates and the client-side form and chat state.

pub mod chat;
pub mod config;
pub mod error;
pub mod form;
pub mod prompts;
pub mod types;

pub use chat::{ChatTranscript, TranscriptMessage};
pub use config::TractatusConfig;
pub use error::{Result, TxError};
pub use form::{GeneratorForm, LoadingTicker, UploadedFile};
pub use types::{ChatRequestBody, Language, ReturnType, Role, TractatusRequest, WireMessage};
