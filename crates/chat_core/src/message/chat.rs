use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::content::{ContentPart, MessageContent};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

/// One turn of a conversation.
///
/// `id` and `created_at` are internal bookkeeping and are never sent upstream.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default = "generate_id")]
    pub id: String,
    pub role: Role,
    pub content: MessageContent,
    #[serde(default = "Utc::now")]
    pub created_at: DateTime<Utc>,
}

fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

impl ChatMessage {
    pub fn new(role: Role, content: impl Into<MessageContent>) -> Self {
        Self {
            id: generate_id(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::System, content)
    }

    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// Build a user message from typed text plus image attachments.
    ///
    /// Without attachments the content stays plain text.
    pub fn user_with_attachments(text: impl Into<String>, image_urls: &[String]) -> Self {
        let text = text.into();
        if image_urls.is_empty() {
            return Self::user(text);
        }

        let mut parts = Vec::with_capacity(image_urls.len() + 1);
        if !text.is_empty() {
            parts.push(ContentPart::text(text));
        }
        parts.extend(image_urls.iter().map(|url| ContentPart::image(url.clone())));
        Self::user(parts)
    }

    pub fn is_system(&self) -> bool {
        self.role == Role::System
    }

    /// Concatenated text of the message body
    pub fn text(&self) -> String {
        self.content.as_text()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_assign_roles_and_unique_ids() {
        let a = ChatMessage::user("hi");
        let b = ChatMessage::user("hi");
        assert_eq!(a.role, Role::User);
        assert_ne!(a.id, b.id);
        assert!(ChatMessage::system("S").is_system());
    }

    #[test]
    fn attachments_produce_multipart_content() {
        let message =
            ChatMessage::user_with_attachments("what is this?", &["https://x/y.png".to_string()]);
        match &message.content {
            MessageContent::Parts(parts) => {
                assert_eq!(parts.len(), 2);
                assert_eq!(parts[0].as_text(), Some("what is this?"));
                assert!(parts[1].is_image());
            }
            other => panic!("expected parts, got {other:?}"),
        }

        let image_only = ChatMessage::user_with_attachments("", &["https://x/y.png".to_string()]);
        assert_eq!(image_only.content.image_count(), 1);
        assert_eq!(image_only.text(), "");
    }

    #[test]
    fn role_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Role::Assistant).unwrap(), "assistant");
        assert_eq!(Role::System.as_str(), "system");
    }
}
