use serde::{Deserialize, Serialize};
use std::ops::AddAssign;
use tx_core::types::{Role, WireMessage};

/// One conversational turn sent to a provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { role, content: content.into() }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Convert browser messages, dropping unknown roles and empty contents.
    pub fn from_wire(messages: &[WireMessage]) -> Vec<ChatMessage> {
        messages
            .iter()
            .filter(|m| !m.content.trim().is_empty())
            .filter_map(|m| {
                m.role
                    .parse::<Role>()
                    .ok()
                    .map(|role| ChatMessage::new(role, m.content.clone()))
            })
            .collect()
    }
}

/// Provider-neutral request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChatRequest {
    pub system: Option<String>,
    pub messages: Vec<ChatMessage>,
}

impl ChatRequest {
    pub fn new(system: impl Into<String>) -> Self {
        Self { system: Some(system.into()), messages: Vec::new() }
    }

    pub fn with_message(mut self, message: ChatMessage) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_messages(mut self, messages: impl IntoIterator<Item = ChatMessage>) -> Self {
        self.messages.extend(messages);
        self
    }

    /// Request for the next step: the text generated so far is replayed as an
    /// assistant turn.
    pub fn continued(&self, generated: &str) -> Self {
        let mut next = self.clone();
        next.messages.push(ChatMessage::assistant(generated));
        next
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FinishReason {
    Stop,
    Length,
    ContentFilter,
    Error,
    Other,
    #[default]
    Unknown,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Usage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

impl AddAssign for Usage {
    fn add_assign(&mut self, rhs: Self) {
        self.prompt_tokens += rhs.prompt_tokens;
        self.completion_tokens += rhs.completion_tokens;
    }
}

/// Item produced by a provider stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StreamDelta {
    Text(String),
    Finish { reason: FinishReason, usage: Usage },
}
