use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::TxError;

/// Message role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::System => write!(f, "system"),
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

impl FromStr for Role {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(TxError::Other(anyhow::anyhow!("unknown role: {other}"))),
        }
    }
}

/// Output format requested from the model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReturnType {
    Json,
    #[default]
    Text,
}

impl ReturnType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReturnType::Json => "json",
            ReturnType::Text => "text",
        }
    }
}

impl FromStr for ReturnType {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ReturnType::Json),
            "text" => Ok(ReturnType::Text),
            other => Err(TxError::Other(anyhow::anyhow!("unknown output format: {other}"))),
        }
    }
}

/// Output language. `Same` keeps the language of the source material.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "same")]
    Same,
    #[serde(rename = "en")]
    English,
    #[serde(rename = "pt-BR")]
    BrazilianPortuguese,
    #[serde(rename = "es")]
    Spanish,
    #[serde(rename = "fr")]
    French,
    #[serde(rename = "it")]
    Italian,
}

impl Language {
    pub const ALL: [Language; 6] = [
        Language::Same,
        Language::English,
        Language::BrazilianPortuguese,
        Language::Spanish,
        Language::French,
        Language::Italian,
    ];

    /// Wire code, as sent by the generator form.
    pub fn code(&self) -> &'static str {
        match self {
            Language::Same => "same",
            Language::English => "en",
            Language::BrazilianPortuguese => "pt-BR",
            Language::Spanish => "es",
            Language::French => "fr",
            Language::Italian => "it",
        }
    }

    /// Name used inside the prompt. `None` for `Same`.
    pub fn display_name(&self) -> Option<&'static str> {
        match self {
            Language::Same => None,
            Language::English => Some("English"),
            Language::BrazilianPortuguese => Some("Brazilian Portuguese"),
            Language::Spanish => Some("Spanish"),
            Language::French => Some("French"),
            Language::Italian => Some("Italian"),
        }
    }
}

impl FromStr for Language {
    type Err = TxError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Language::ALL
            .into_iter()
            .find(|l| l.code().eq_ignore_ascii_case(s))
            .ok_or_else(|| TxError::Other(anyhow::anyhow!("unknown language: {s}")))
    }
}

/// Model values offered by the generator form.
pub const MODEL_VALUES: [&str; 3] = ["gpt-4o-mini", "gemini-flash-1.5", "gemini-flash-2.0"];

pub const DEFAULT_MODEL_VALUE: &str = "gpt-4o-mini";

/// Body of `POST /api/tractatus`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TractatusRequest {
    pub prompt: String,
    #[serde(default)]
    pub return_type: ReturnType,
    pub model_value: String,
    #[serde(default)]
    pub language: Language,
}

/// A chat message as exchanged with the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WireMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub role: String,
    pub content: String,
}

/// Body of `POST /api/chat`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequestBody {
    #[serde(default)]
    pub messages: Vec<WireMessage>,
    #[serde(default)]
    pub tractatus: Option<String>,
}
