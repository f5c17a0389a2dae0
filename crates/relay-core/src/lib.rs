//! relay-core - conversation budgeting, pacing and the exchange lifecycle
//!
//! - `budget` - history selection and response sizing
//! - `flow` - typewriter pacing of content deltas
//! - `signal` - search status markers and fallback detection
//! - `exchange` - the per-turn state machine and the `Conversation` orchestrator
//! - `storage` - transcript persistence collaborators

pub mod budget;
pub mod config;
pub mod error;
pub mod exchange;
pub mod flow;
pub mod identity;
pub mod signal;
pub mod storage;

pub use budget::{BudgetedHistory, ContextBudgeter};
pub use config::ConversationConfig;
pub use error::{StoreError, SubmitRejected};
pub use exchange::{
    Conversation, Exchange, ExchangeEvent, ExchangeHandle, ExchangeOutcome, ExchangeState,
};
pub use flow::FlowRegulator;
pub use identity::ModelIdentity;
pub use signal::{FallbackDetector, SearchStatus, SearchStatusChannel};
pub use storage::{ExchangeStore, JsonlStore, MemoryStore};
