//! Dispatch-time response size cap.

use chat_core::Budget;

use crate::budget::context::BudgetedHistory;

const CHARS_PER_TOKEN: usize = 4;

/// Rough prompt size: one token per four characters, rounded up.
pub fn estimate_prompt_tokens(chars: usize) -> u32 {
    u32::try_from(chars.div_ceil(CHARS_PER_TOKEN)).unwrap_or(u32::MAX)
}

/// `max_tokens` for the outgoing request, or `None` for an empty history.
///
/// A prompt well under the history budget (below 90%) gets the default
/// response size; a large prompt gets half its own token estimate. Both are
/// clamped to the ceiling and the result is at least 1.
pub fn response_token_cap(history: &BudgetedHistory, budget: &Budget) -> Option<u32> {
    if history.is_empty() {
        return None;
    }

    let prompt_tokens = estimate_prompt_tokens(history.total_chars);
    let prompt_chars = f64::from(prompt_tokens) * CHARS_PER_TOKEN as f64;
    let roomy = prompt_chars < 0.9 * budget.max_history_chars as f64;

    let cap = if roomy {
        budget
            .default_response_tokens
            .min(budget.max_response_tokens_ceiling)
    } else {
        (prompt_tokens / 2).min(budget.max_response_tokens_ceiling)
    };

    Some(cap.max(1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chat_core::ChatMessage;

    fn history_of(chars: usize) -> BudgetedHistory {
        BudgetedHistory {
            messages: vec![ChatMessage::user("x".repeat(chars))],
            total_chars: chars,
            dropped: 0,
            truncated: false,
        }
    }

    #[test]
    fn estimates_round_up() {
        assert_eq!(estimate_prompt_tokens(0), 0);
        assert_eq!(estimate_prompt_tokens(1), 1);
        assert_eq!(estimate_prompt_tokens(8), 2);
        assert_eq!(estimate_prompt_tokens(9), 3);
    }

    #[test]
    fn empty_history_has_no_cap() {
        let empty = BudgetedHistory {
            messages: Vec::new(),
            total_chars: 0,
            dropped: 0,
            truncated: false,
        };
        assert_eq!(response_token_cap(&empty, &Budget::default()), None);
    }

    #[test]
    fn small_prompt_gets_default() {
        let budget = Budget::default();
        assert_eq!(response_token_cap(&history_of(100), &budget), Some(2048));
    }

    #[test]
    fn default_is_clamped_to_ceiling() {
        let budget = Budget {
            default_response_tokens: 8000,
            max_response_tokens_ceiling: 1000,
            ..Budget::default()
        };
        assert_eq!(response_token_cap(&history_of(100), &budget), Some(1000));
    }

    #[test]
    fn large_prompt_gets_half_its_size() {
        let budget = Budget::default().with_max_history_chars(1000);
        // 950 chars -> 238 tokens -> 952 chars, not below 900
        assert_eq!(response_token_cap(&history_of(950), &budget), Some(119));
    }

    #[test]
    fn large_prompt_is_clamped_to_ceiling_and_floor() {
        let budget = Budget::default().with_max_history_chars(10);
        assert_eq!(response_token_cap(&history_of(100_000), &budget), Some(4096));
        assert_eq!(response_token_cap(&history_of(9), &budget), Some(1));
    }
}
