//! Exchange lifecycle: building, dispatch, streaming and settlement.

pub mod builder;
pub mod conversation;
pub mod events;
pub mod runner;
pub mod state;

pub use builder::{prepare_exchange, PreparedExchange};
pub use conversation::{Conversation, ExchangeHandle, EVENT_CHANNEL_CAPACITY};
pub use events::{ExchangeEvent, ExchangeOutcome};
pub use runner::Exchange;
pub use state::ExchangeState;
