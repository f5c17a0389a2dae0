//! Character cost of messages for budget management.

use std::sync::Arc;

use chat_core::{ChatMessage, ContentPart, MessageContent};

/// Trait for message cost implementations.
pub trait CostEstimator: Send + Sync {
    /// Cost of a single message in characters.
    fn message_cost(&self, message: &ChatMessage) -> usize;

    fn total_cost(&self, messages: &[ChatMessage]) -> usize {
        messages.iter().map(|m| self.message_cost(m)).sum()
    }
}

/// Counts text in chars (not bytes) and charges a flat cost per image part.
#[derive(Debug, Clone)]
pub struct CharCostEstimator {
    image_char_cost: usize,
}

impl CharCostEstimator {
    pub fn new(image_char_cost: usize) -> Self {
        Self { image_char_cost }
    }
}

impl Default for CharCostEstimator {
    fn default() -> Self {
        Self::new(chat_core::budget::DEFAULT_IMAGE_CHAR_COST)
    }
}

impl CostEstimator for CharCostEstimator {
    fn message_cost(&self, message: &ChatMessage) -> usize {
        match &message.content {
            MessageContent::Text(text) => text.chars().count(),
            MessageContent::Parts(parts) => parts
                .iter()
                .map(|part| match part {
                    ContentPart::Text { text } => text.chars().count(),
                    ContentPart::ImageUrl { .. } => self.image_char_cost,
                })
                .fold(0usize, |acc, cost| acc.saturating_add(cost)),
        }
    }
}

pub type SharedCostEstimator = Arc<dyn CostEstimator>;
