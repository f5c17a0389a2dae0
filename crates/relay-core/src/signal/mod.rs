//! In-band signals carried inside the content stream.

pub mod fallback;
pub mod search;

pub use fallback::{FallbackDetector, FallbackNotice, FALLBACK_REASON};
pub use search::{Routed, SearchStatus, SearchStatusChannel, SEARCH_STATUS_MARKER};
