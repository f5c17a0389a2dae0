//! Process-wide size limits applied before a request is dispatched.

use serde::{Deserialize, Serialize};

/// Default number of history messages sent upstream.
pub const DEFAULT_MAX_HISTORY_MESSAGES: usize = 40;
/// Default character budget for the outgoing history.
pub const DEFAULT_MAX_HISTORY_CHARS: usize = 48_000;
/// Hard upper bound for the response-token cap.
pub const DEFAULT_MAX_RESPONSE_TOKENS_CEILING: u32 = 4096;
/// Response-token cap used when the prompt leaves plenty of room.
pub const DEFAULT_RESPONSE_TOKENS: u32 = 2048;
/// Flat cost charged for an image part instead of its URL length.
pub const DEFAULT_IMAGE_CHAR_COST: usize = 256;

/// History and response limits.
///
/// Exceeding any of these is never an error: history is truncated and the
/// response cap is clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Budget {
    /// Maximum number of messages included in the outgoing history
    pub max_history_messages: usize,
    /// Maximum estimated character cost of the outgoing history
    pub max_history_chars: usize,
    /// Absolute ceiling for `max_tokens`
    pub max_response_tokens_ceiling: u32,
    /// `max_tokens` used when the prompt is comfortably small
    pub default_response_tokens: u32,
    /// Character cost charged per image part
    pub image_char_cost: usize,
}

impl Default for Budget {
    fn default() -> Self {
        Self {
            max_history_messages: DEFAULT_MAX_HISTORY_MESSAGES,
            max_history_chars: DEFAULT_MAX_HISTORY_CHARS,
            max_response_tokens_ceiling: DEFAULT_MAX_RESPONSE_TOKENS_CEILING,
            default_response_tokens: DEFAULT_RESPONSE_TOKENS,
            image_char_cost: DEFAULT_IMAGE_CHAR_COST,
        }
    }
}

impl Budget {
    pub fn with_max_history_chars(mut self, chars: usize) -> Self {
        self.max_history_chars = chars;
        self
    }

    pub fn with_max_history_messages(mut self, messages: usize) -> Self {
        self.max_history_messages = messages;
        self
    }
}
