use std::time::Duration;

use chat_core::FlowConfig;
use tokio::time::{interval_at, Instant, Interval, MissedTickBehavior};

/// Re-emits pushed text in fixed-size slices on a timer ("typewriter").
///
/// The timer runs only while text is pending. Text leaves in the order it was
/// pushed, exactly once, whether through [`tick`](Self::tick) or
/// [`drain`](Self::drain).
#[derive(Debug)]
pub struct FlowRegulator {
    pending: String,
    slice_chars: usize,
    period: Duration,
    interval: Option<Interval>,
}

impl FlowRegulator {
    pub fn new(period: Duration, slice_chars: usize) -> Self {
        Self {
            pending: String::new(),
            slice_chars: slice_chars.max(1),
            period: period.max(Duration::from_millis(1)),
            interval: None,
        }
    }

    pub fn from_config(config: &FlowConfig) -> Self {
        Self::new(Duration::from_millis(config.tick_ms), config.slice_chars)
    }

    /// Append text and start the timer if it is stopped.
    pub fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.pending.push_str(text);
        if self.interval.is_none() {
            let mut interval = interval_at(Instant::now() + self.period, self.period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            self.interval = Some(interval);
        }
    }

    pub fn is_running(&self) -> bool {
        self.interval.is_some()
    }

    /// Wait for the next tick and take one slice.
    ///
    /// Returns `None` (and stops the timer) when the tick finds nothing pending.
    /// Returns `None` immediately when the timer is stopped.
    pub async fn tick(&mut self) -> Option<String> {
        let interval = self.interval.as_mut()?;
        interval.tick().await;

        let slice = self.take_slice();
        if slice.is_none() {
            self.interval = None;
        }
        slice
    }

    /// Remove up to `slice_chars` characters from the front of the buffer.
    pub fn take_slice(&mut self) -> Option<String> {
        if self.pending.is_empty() {
            return None;
        }
        let end = self
            .pending
            .char_indices()
            .nth(self.slice_chars)
            .map(|(idx, _)| idx)
            .unwrap_or(self.pending.len());
        Some(self.pending.drain(..end).collect())
    }

    /// Take everything still pending and stop the timer.
    pub fn drain(&mut self) -> Option<String> {
        self.interval = None;
        if self.pending.is_empty() {
            None
        } else {
            Some(std::mem::take(&mut self.pending))
        }
    }
}

impl Default for FlowRegulator {
    fn default() -> Self {
        Self::from_config(&FlowConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn slices_respect_char_boundaries() {
        let mut regulator = FlowRegulator::new(Duration::from_millis(16), 3);
        regulator.push("héllo wörld");
        let mut out = Vec::new();
        while let Some(slice) = regulator.take_slice() {
            out.push(slice);
        }
        assert_eq!(out, vec!["hél", "lo ", "wör", "ld"]);
    }

    #[tokio::test]
    async fn drain_returns_remainder_and_stops() {
        let mut regulator = FlowRegulator::default();
        regulator.push("abcdef");
        assert!(regulator.is_running());
        assert_eq!(regulator.take_slice().as_deref(), Some("abc"));
        assert_eq!(regulator.drain().as_deref(), Some("def"));
        assert!(!regulator.is_running());
        assert_eq!(regulator.drain(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn ticks_emit_slices_then_stop() {
        let mut regulator = FlowRegulator::new(Duration::from_millis(16), 3);
        regulator.push("abcdefg");

        let start = Instant::now();
        assert_eq!(regulator.tick().await.as_deref(), Some("abc"));
        assert!(start.elapsed() >= Duration::from_millis(16));
        assert_eq!(regulator.tick().await.as_deref(), Some("def"));
        assert_eq!(regulator.tick().await.as_deref(), Some("g"));
        assert!(regulator.is_running());
        assert_eq!(regulator.tick().await, None);
        assert!(!regulator.is_running());
        assert_eq!(regulator.tick().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn pushes_interleaved_with_ticks_are_emitted_once_in_order() {
        let mut regulator = FlowRegulator::new(Duration::from_millis(16), 2);
        let pushes = ["Hel", "lo, ", "", "wo", "rld!"];
        let mut emitted = String::new();

        for (i, piece) in pushes.iter().enumerate() {
            regulator.push(piece);
            if i % 2 == 0 {
                if let Some(slice) = regulator.tick().await {
                    emitted.push_str(&slice);
                }
            }
        }
        if let Some(rest) = regulator.drain() {
            emitted.push_str(&rest);
        }

        assert_eq!(emitted, pushes.concat());
    }
}
