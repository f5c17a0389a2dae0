use serde::{Deserialize, Serialize};

/// Lifecycle of one exchange.
///
/// `idle → building → in_flight → {completed | aborted | errored}`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExchangeState {
    /// Nothing in flight; reported by `Conversation::state`, never held by an `Exchange`
    Idle,
    Building,
    InFlight,
    Completed,
    Aborted,
    Errored,
}

impl ExchangeState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExchangeState::Completed | ExchangeState::Aborted | ExchangeState::Errored
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ExchangeState::Idle => "idle",
            ExchangeState::Building => "building",
            ExchangeState::InFlight => "in_flight",
            ExchangeState::Completed => "completed",
            ExchangeState::Aborted => "aborted",
            ExchangeState::Errored => "errored",
        }
    }
}

impl std::fmt::Display for ExchangeState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
