//! chat_core - Core types shared by the relay crates
//!
//! - `message` - ChatMessage, Role and multipart content
//! - `budget` - history and response size limits
//! - `config` - layered file + environment configuration

pub mod budget;
pub mod config;
pub mod message;

pub use budget::Budget;
pub use config::{Config, FallbackConfig, FlowConfig};
pub use message::{ChatMessage, ContentPart, ImageUrl, MessageContent, Role};
