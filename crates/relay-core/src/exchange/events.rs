use chat_core::ChatMessage;
use serde::{Deserialize, Serialize};

use crate::exchange::state::ExchangeState;
use crate::signal::SearchStatus;

/// What the caller sees while an exchange runs. The last event is one of
/// `completed`, `aborted` or `errored`, unless the exchange was cancelled while
/// the caller left the channel full, in which case trailing events are dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExchangeEvent {
    Delta {
        content: String,
    },

    SearchStatus {
        status: SearchStatus,
    },

    SearchCleared,

    /// Upstream reported a silent downgrade; the caller may switch models
    Fallback {
        suggested_model: String,
        reason: String,
    },

    Completed {
        content: String,
    },

    Aborted {
        content: String,
    },

    Errored {
        message: String,
        content: String,
    },
}

impl ExchangeEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExchangeEvent::Completed { .. }
                | ExchangeEvent::Aborted { .. }
                | ExchangeEvent::Errored { .. }
        )
    }
}

/// Final record of an exchange, sealed into the conversation history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeOutcome {
    pub exchange_id: String,
    pub state: ExchangeState,
    pub user_message: ChatMessage,
    /// Present when any content was accumulated, even if aborted or errored
    pub assistant_message: Option<ChatMessage>,
    pub content: String,
    pub error: Option<String>,
}

impl ExchangeOutcome {
    /// Messages to append to the history, in order.
    pub fn sealed_messages(&self) -> Vec<ChatMessage> {
        let mut messages = vec![self.user_message.clone()];
        messages.extend(self.assistant_message.clone());
        messages
    }

    /// The terminal event matching this outcome.
    pub fn terminal_event(&self) -> ExchangeEvent {
        match self.state {
            ExchangeState::Aborted => ExchangeEvent::Aborted {
                content: self.content.clone(),
            },
            ExchangeState::Errored => ExchangeEvent::Errored {
                message: self.error.clone().unwrap_or_default(),
                content: self.content.clone(),
            },
            _ => ExchangeEvent::Completed {
                content: self.content.clone(),
            },
        }
    }
}
