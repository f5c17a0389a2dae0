use std::collections::HashMap;

use async_trait::async_trait;
use chat_core::ChatMessage;
use tokio::sync::RwLock;

use super::ExchangeStore;
use crate::error::StoreError;

/// In-process transcript store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    conversations: RwLock<HashMap<String, Vec<ChatMessage>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ExchangeStore for MemoryStore {
    async fn append(
        &self,
        conversation_id: &str,
        messages: &[ChatMessage],
    ) -> Result<(), StoreError> {
        self.conversations
            .write()
            .await
            .entry(conversation_id.to_string())
            .or_default()
            .extend_from_slice(messages);
        Ok(())
    }

    async fn load(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        Ok(self
            .conversations
            .read()
            .await
            .get(conversation_id)
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn appends_in_order_per_conversation() {
        let store = MemoryStore::new();
        store
            .append("a", &[ChatMessage::user("1"), ChatMessage::assistant("2")])
            .await
            .unwrap();
        store.append("b", &[ChatMessage::user("x")]).await.unwrap();
        store.append("a", &[ChatMessage::user("3")]).await.unwrap();

        let texts: Vec<String> = store.load("a").await.unwrap().iter().map(|m| m.text()).collect();
        assert_eq!(texts, vec!["1", "2", "3"]);
        assert_eq!(store.load("b").await.unwrap().len(), 1);
        assert!(store.load("missing").await.unwrap().is_empty());
    }
}
