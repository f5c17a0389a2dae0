//! History budgeting applied before an exchange is dispatched.
//!
//! - [`counter`]: per-message character cost (images at a flat rate)
//! - [`context`]: newest-first selection that keeps one system message
//! - [`sizer`]: prompt token estimate and the response token cap

pub mod context;
pub mod counter;
pub mod sizer;

pub use context::{BudgetedHistory, ContextBudgeter};
pub use counter::{CharCostEstimator, CostEstimator, SharedCostEstimator};
pub use sizer::{estimate_prompt_tokens, response_token_cap};
