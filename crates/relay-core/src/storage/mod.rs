//! Persistence collaborator for finished exchanges.

mod jsonl;
mod memory;

pub use jsonl::JsonlStore;
pub use memory::MemoryStore;

use async_trait::async_trait;
use chat_core::ChatMessage;

use crate::error::StoreError;

#[async_trait]
pub trait ExchangeStore: Send + Sync {
    /// Append messages to the end of a conversation's transcript.
    async fn append(&self, conversation_id: &str, messages: &[ChatMessage])
        -> Result<(), StoreError>;

    /// Whole transcript in insertion order; empty when unknown.
    async fn load(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, StoreError>;
}
