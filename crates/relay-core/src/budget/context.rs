//! Newest-first history selection under a character budget.

use std::sync::Arc;

use chat_core::{Budget, ChatMessage};
use serde::{Deserialize, Serialize};

use crate::budget::counter::{CharCostEstimator, SharedCostEstimator};

/// Result of fitting a conversation into the budget.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BudgetedHistory {
    /// Messages to send, in original order; at most one system message, first.
    pub messages: Vec<ChatMessage>,
    /// Character cost of `messages`
    pub total_chars: usize,
    /// Messages left out of `messages`
    pub dropped: usize,
    /// Whether the input was changed at all
    pub truncated: bool,
}

impl BudgetedHistory {
    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

pub struct ContextBudgeter {
    budget: Budget,
    estimator: SharedCostEstimator,
}

impl ContextBudgeter {
    pub fn new(budget: Budget) -> Self {
        let estimator = Arc::new(CharCostEstimator::new(budget.image_char_cost));
        Self { budget, estimator }
    }

    pub fn with_estimator(mut self, estimator: SharedCostEstimator) -> Self {
        self.estimator = estimator;
        self
    }

    /// Select the messages to send.
    ///
    /// A history that already fits and has at most one system message at the
    /// front comes back unchanged. Otherwise non-system messages are taken newest
    /// to oldest until the next one would break `max_history_chars` or
    /// `max_history_messages` (the newest is always kept), and the most recent
    /// system message is put in front. That system message is not counted
    /// against the walk, so it may push the result over budget.
    pub fn fit(&self, messages: &[ChatMessage]) -> BudgetedHistory {
        let total_chars = self.estimator.total_cost(messages);
        if self.fits_unchanged(messages, total_chars) {
            return BudgetedHistory {
                messages: messages.to_vec(),
                total_chars,
                dropped: 0,
                truncated: false,
            };
        }

        let mut kept: Vec<ChatMessage> = Vec::new();
        let mut kept_chars = 0usize;

        for message in messages.iter().rev().filter(|m| !m.is_system()) {
            let cost = self.estimator.message_cost(message);
            if !kept.is_empty() {
                let over_chars = kept_chars.saturating_add(cost) > self.budget.max_history_chars;
                let over_count = kept.len() >= self.budget.max_history_messages;
                if over_chars || over_count {
                    break;
                }
            }
            kept_chars = kept_chars.saturating_add(cost);
            kept.push(message.clone());
        }
        kept.reverse();

        if let Some(system) = messages.iter().rev().find(|m| m.is_system()) {
            kept_chars = kept_chars.saturating_add(self.estimator.message_cost(system));
            kept.insert(0, system.clone());
        }

        let dropped = messages.len() - kept.len();
        log::debug!(
            "History budget: kept {} of {} messages ({} chars, limit {})",
            kept.len(),
            messages.len(),
            kept_chars,
            self.budget.max_history_chars
        );

        BudgetedHistory {
            messages: kept,
            total_chars: kept_chars,
            dropped,
            truncated: true,
        }
    }

    fn fits_unchanged(&self, messages: &[ChatMessage], total_chars: usize) -> bool {
        if total_chars > self.budget.max_history_chars {
            return false;
        }
        let non_system = messages.iter().filter(|m| !m.is_system()).count();
        if non_system > self.budget.max_history_messages {
            return false;
        }
        let system_positions: Vec<usize> = messages
            .iter()
            .enumerate()
            .filter(|(_, m)| m.is_system())
            .map(|(i, _)| i)
            .collect();
        matches!(system_positions.as_slice(), [] | [0])
    }
}
