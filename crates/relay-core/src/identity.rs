//! Model identity and the system prompt derived from it.

use chat_core::{ChatMessage, MessageContent};
use serde::{Deserialize, Serialize};

/// A model as resolved by the caller's catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIdentity {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
}

impl ModelIdentity {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: None,
        }
    }

    pub fn with_display_name(mut self, name: Option<String>) -> Self {
        self.display_name = name.filter(|n| !n.trim().is_empty());
        self
    }

    /// Display name, falling back to the raw id.
    pub fn label(&self) -> &str {
        self.display_name.as_deref().unwrap_or(&self.id)
    }

    /// Render the identity prompt; `{model}` is replaced by [`label`](Self::label).
    pub fn system_prompt(&self, template: &str) -> String {
        template.replace("{model}", self.label())
    }
}

/// Put the identity prompt into the history.
///
/// The most recent system message has its content replaced in place; without
/// one, a new system message is inserted at the front.
pub fn merge_identity(messages: &mut Vec<ChatMessage>, prompt: &str) {
    if let Some(system_message) = messages.iter_mut().rev().find(|m| m.is_system()) {
        system_message.content = MessageContent::Text(prompt.to_string());
    } else {
        messages.insert(0, ChatMessage::system(prompt));
    }
}
