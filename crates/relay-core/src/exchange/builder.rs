//! The `building` step: identity merge, budgeting and payload assembly.

use chat_core::ChatMessage;
use relay_llm::ChatPayload;

use crate::budget::{response_token_cap, BudgetedHistory, ContextBudgeter};
use crate::config::ConversationConfig;
use crate::identity::{merge_identity, ModelIdentity};

/// Everything needed to put one exchange in flight.
#[derive(Debug, Clone)]
pub struct PreparedExchange {
    pub user_message: ChatMessage,
    pub history: BudgetedHistory,
    pub payload: ChatPayload,
}

/// Assemble the outgoing request for `user_message` on top of the sealed `history`.
///
/// The sealed history itself is not modified.
pub fn prepare_exchange(
    conversation_id: &str,
    history: &[ChatMessage],
    user_message: ChatMessage,
    model: &ModelIdentity,
    config: &ConversationConfig,
) -> PreparedExchange {
    let mut outgoing = Vec::with_capacity(history.len() + 2);
    outgoing.extend_from_slice(history);
    outgoing.push(user_message.clone());
    merge_identity(&mut outgoing, &model.system_prompt(&config.identity_template));

    let budgeted = ContextBudgeter::new(config.budget.clone()).fit(&outgoing);
    let max_tokens = response_token_cap(&budgeted, &config.budget);

    let payload = ChatPayload::new(model.id.clone(), &budgeted.messages)
        .with_conversation_id(Some(conversation_id.to_string()))
        .with_temperature(config.temperature)
        .with_max_tokens(max_tokens)
        .with_search_mode(config.search_mode.clone());

    PreparedExchange {
        user_message,
        history: budgeted,
        payload,
    }
}
