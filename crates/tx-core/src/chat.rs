//! Chat transcript state for follow-up questions about a tractatus.

use uuid::Uuid;

use crate::error::{Result, TxError};
use crate::prompts::CHAT_GREETING;
use crate::types::{ChatRequestBody, Role, WireMessage};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptMessage {
    pub id: String,
    pub role: Role,
    pub content: String,
}

impl TranscriptMessage {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: format!("msg_{}", Uuid::new_v4().simple()),
            role,
            content: content.into(),
        }
    }

    fn to_wire(&self) -> WireMessage {
        WireMessage {
            id: Some(self.id.clone()),
            role: self.role.to_string(),
            content: self.content.clone(),
        }
    }
}

/// Conversation about one generated tractatus.
#[derive(Debug, Clone)]
pub struct ChatTranscript {
    tractatus: String,
    messages: Vec<TranscriptMessage>,
    streaming: bool,
}

impl ChatTranscript {
    /// Fails when there is no tractatus to talk about.
    pub fn new(tractatus: impl Into<String>) -> Result<Self> {
        let tractatus = tractatus.into();
        if tractatus.trim().is_empty() {
            return Err(TxError::MissingTractatus);
        }
        Ok(Self {
            tractatus,
            messages: vec![TranscriptMessage::new(Role::Assistant, CHAT_GREETING)],
            streaming: false,
        })
    }

    pub fn tractatus(&self) -> &str {
        &self.tractatus
    }

    pub fn messages(&self) -> &[TranscriptMessage] {
        &self.messages
    }

    pub fn is_streaming(&self) -> bool {
        self.streaming
    }

    pub fn can_send(&self, input: &str) -> bool {
        !self.streaming && !input.trim().is_empty()
    }

    /// Append the user's message and build the `/api/chat` body.
    pub fn send(&mut self, input: &str) -> Result<ChatRequestBody> {
        if self.streaming {
            return Err(TxError::Busy);
        }
        if input.trim().is_empty() {
            return Err(TxError::EmptyPrompt);
        }
        self.messages.push(TranscriptMessage::new(Role::User, input));
        self.streaming = true;
        Ok(ChatRequestBody {
            messages: self.messages.iter().map(TranscriptMessage::to_wire).collect(),
            tractatus: Some(self.tractatus.clone()),
        })
    }

    /// Append streamed assistant text, opening the reply on the first delta.
    pub fn push_delta(&mut self, delta: &str) {
        if !self.streaming {
            return;
        }
        match self.messages.last_mut() {
            Some(last) if last.role == Role::Assistant => last.content.push_str(delta),
            _ => self
                .messages
                .push(TranscriptMessage::new(Role::Assistant, delta)),
        }
    }

    pub fn finish(&mut self) {
        self.streaming = false;
    }
}
