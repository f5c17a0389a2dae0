//! Search progress markers embedded by the upstream.
//!
//! A delta that begins with [`SEARCH_STATUS_MARKER`] is a status update, not
//! content: `[[search_status]]{"state":"start","query":"..."}`.

use serde::{Deserialize, Serialize};

pub const SEARCH_STATUS_MARKER: &str = "[[search_status]]";

const START_STATE: &str = "start";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchStatus {
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
}

impl SearchStatus {
    pub fn start(query: Option<String>) -> Self {
        Self {
            state: START_STATE.to_string(),
            query,
        }
    }

    pub fn is_start(&self) -> bool {
        self.state == START_STATE
    }
}

impl Default for SearchStatus {
    fn default() -> Self {
        Self::start(None)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Routed {
    Status(SearchStatus),
    Content {
        text: String,
        /// An active status was cleared by this content
        cleared: bool,
    },
}

/// Splits status markers from content for one exchange.
#[derive(Debug, Default)]
pub struct SearchStatusChannel {
    active: Option<SearchStatus>,
}

impl SearchStatusChannel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(&mut self, delta: String) -> Routed {
        if !delta.starts_with(SEARCH_STATUS_MARKER) {
            let cleared = self.active.take().is_some();
            return Routed::Content {
                text: delta,
                cleared,
            };
        }

        let body = &delta[SEARCH_STATUS_MARKER.len()..];

        let status = serde_json::from_str::<SearchStatus>(body.trim()).unwrap_or_else(|e| {
            log::debug!("Malformed search status payload ({}), assuming start", e);
            SearchStatus::default()
        });
        self.active = Some(status.clone());
        Routed::Status(status)
    }

    pub fn active(&self) -> Option<&SearchStatus> {
        self.active.as_ref()
    }

    /// Clear at exchange end; true if a status was active.
    pub fn clear(&mut self) -> bool {
        self.active.take().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn marker_delta_becomes_status() {
        let mut channel = SearchStatusChannel::new();
        let routed = channel.route(format!(
            "{SEARCH_STATUS_MARKER}{{\"state\":\"start\",\"query\":\"rust async\"}}"
        ));
        assert_eq!(
            routed,
            Routed::Status(SearchStatus::start(Some("rust async".to_string())))
        );
        assert!(channel.active().is_some_and(SearchStatus::is_start));
    }

    #[test]
    fn malformed_marker_fails_open_and_never_reaches_content() {
        let mut channel = SearchStatusChannel::new();
        for body in ["{broken", "", "   ", "[1,2]", "{\"query\":\"no state\"}"] {
            match channel.route(format!("{SEARCH_STATUS_MARKER}{body}")) {
                Routed::Status(status) => assert!(status.is_start()),
                Routed::Content { text, .. } => panic!("marker leaked into content: {text}"),
            }
        }
    }

    #[test]
    fn other_states_are_kept() {
        let mut channel = SearchStatusChannel::new();
        let routed = channel.route(format!("{SEARCH_STATUS_MARKER}{{\"state\":\"done\"}}"));
        match routed {
            Routed::Status(status) => {
                assert_eq!(status.state, "done");
                assert!(!status.is_start());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn content_passes_unchanged_and_clears_status_once() {
        let mut channel = SearchStatusChannel::new();
        channel.route(format!("{SEARCH_STATUS_MARKER}{{\"state\":\"start\"}}"));

        assert_eq!(
            channel.route("Found it".to_string()),
            Routed::Content {
                text: "Found it".to_string(),
                cleared: true
            }
        );
        assert_eq!(
            channel.route(" again".to_string()),
            Routed::Content {
                text: " again".to_string(),
                cleared: false
            }
        );
        assert!(!channel.clear());
    }

    #[test]
    fn marker_must_be_a_prefix() {
        let mut channel = SearchStatusChannel::new();
        let text = format!("see {SEARCH_STATUS_MARKER}");
        assert_eq!(
            channel.route(text.clone()),
            Routed::Content {
                text,
                cleared: false
            }
        );
    }
}
