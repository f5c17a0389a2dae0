//! Message module - conversation message types
//!
//! Shared message types used across the relay crates.

mod chat;
mod content;

pub use chat::{ChatMessage, Role};
pub use content::{ContentPart, ImageUrl, MessageContent};
