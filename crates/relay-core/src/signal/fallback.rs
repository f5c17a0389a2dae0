//! Detection of a silent upstream model downgrade.

use serde::{Deserialize, Serialize};

pub const FALLBACK_REASON: &str = "upstream_model_degraded";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FallbackNotice {
    pub suggested_model: String,
    pub reason: String,
}

/// Watches content for the degradation phrase and fires at most once.
///
/// Matching is case-insensitive and spans delta boundaries. Content is only
/// observed, never changed.
#[derive(Debug)]
pub struct FallbackDetector {
    phrase: String,
    suggested_model: String,
    tail: String,
    fired: bool,
}

impl FallbackDetector {
    pub fn new(phrase: &str, suggested_model: impl Into<String>) -> Self {
        Self {
            phrase: phrase.to_lowercase(),
            suggested_model: suggested_model.into(),
            tail: String::new(),
            fired: false,
        }
    }

    pub fn from_config(config: &chat_core::FallbackConfig) -> Self {
        Self::new(&config.phrase, config.model.clone())
    }

    pub fn has_fired(&self) -> bool {
        self.fired
    }

    pub fn observe(&mut self, delta: &str) -> Option<FallbackNotice> {
        if self.fired || self.phrase.is_empty() {
            return None;
        }

        let mut window = std::mem::take(&mut self.tail);
        window.push_str(delta);

        if window.to_lowercase().contains(&self.phrase) {
            self.fired = true;
            return Some(FallbackNotice {
                suggested_model: self.suggested_model.clone(),
                reason: FALLBACK_REASON.to_string(),
            });
        }

        let keep = self.phrase.chars().count().saturating_sub(1);
        let skip = window.chars().count().saturating_sub(keep);
        self.tail = window.chars().skip(skip).collect();
        None
    }
}
