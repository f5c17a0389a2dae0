//! Outbound chat request body.
//!
//! Messages are converted to a `{role, content}` shape without leaking internal
//! `ChatMessage` fields (`id` / `created_at`).

use chat_core::{ChatMessage, MessageContent, Role};
use serde::Serialize;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct WireMessage {
    pub role: Role,
    pub content: MessageContent,
}

impl From<&ChatMessage> for WireMessage {
    fn from(message: &ChatMessage) -> Self {
        Self {
            role: message.role,
            content: message.content.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct SearchOptions {
    pub mode: String,
}

/// JSON body POSTed to the upstream endpoint.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ChatPayload {
    pub model: String,
    #[serde(rename = "conversationId", skip_serializing_if = "Option::is_none")]
    pub conversation_id: Option<String>,
    pub messages: Vec<WireMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search: Option<SearchOptions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stream: Option<bool>,
}

impl ChatPayload {
    pub fn new(model: impl Into<String>, messages: &[ChatMessage]) -> Self {
        Self {
            model: model.into(),
            conversation_id: None,
            messages: messages.iter().map(WireMessage::from).collect(),
            temperature: None,
            max_tokens: None,
            search: None,
            stream: Some(true),
        }
    }

    pub fn with_conversation_id(mut self, id: Option<String>) -> Self {
        self.conversation_id = id;
        self
    }

    pub fn with_temperature(mut self, temperature: Option<f32>) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn with_search_mode(mut self, mode: Option<String>) -> Self {
        self.search = mode.map(|mode| SearchOptions { mode });
        self
    }
}
