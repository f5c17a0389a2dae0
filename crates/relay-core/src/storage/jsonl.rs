use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chat_core::ChatMessage;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use super::ExchangeStore;
use crate::error::StoreError;

/// One `<conversation_id>.jsonl` file per conversation, one message per line.
#[derive(Debug, Clone)]
pub struct JsonlStore {
    base_path: PathBuf,
}

impl JsonlStore {
    pub fn new(base_path: impl AsRef<Path>) -> Self {
        Self {
            base_path: base_path.as_ref().to_path_buf(),
        }
    }

    pub async fn init(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.base_path).await
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn transcript_path(&self, conversation_id: &str) -> PathBuf {
        let file_name: String = conversation_id
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect();
        self.base_path.join(format!("{}.jsonl", file_name))
    }
}

#[async_trait]
impl ExchangeStore for JsonlStore {
    async fn append(
        &self,
        conversation_id: &str,
        messages: &[ChatMessage],
    ) -> Result<(), StoreError> {
        if messages.is_empty() {
            return Ok(());
        }

        let mut buffer = String::new();
        for message in messages {
            buffer.push_str(&serde_json::to_string(message)?);
            buffer.push('\n');
        }

        self.init().await?;
        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.transcript_path(conversation_id))
            .await?;
        file.write_all(buffer.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    async fn load(&self, conversation_id: &str) -> Result<Vec<ChatMessage>, StoreError> {
        let path = self.transcript_path(conversation_id);
        if !path.exists() {
            return Ok(Vec::new());
        }

        let file = fs::File::open(path).await?;
        let mut lines = BufReader::new(file).lines();
        let mut messages = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            match serde_json::from_str(&line) {
                Ok(message) => messages.push(message),
                Err(e) => log::warn!("Skipping unreadable transcript line for {}: {}", conversation_id, e),
            }
        }

        Ok(messages)
    }
}
