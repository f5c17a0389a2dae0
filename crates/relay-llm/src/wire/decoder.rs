//! Push-based delta decoder for the three upstream wire formats.
//!
//! [`DeltaDecoder`] is fed decoded text in whatever pieces the network delivers
//! and returns the deltas that became complete. It never fails: malformed frames
//! degrade to raw text.

use serde_json::Value;

use super::extract::extract_text;
use super::WireFormat;

const DATA_PREFIX: &str = "data:";
const DONE_SENTINEL: &str = "[DONE]";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    EventStream,
    PlainText,
    SingleShot,
    /// Untyped body: emit line-framed plain text until a `data:` line shows up.
    Sniff,
}

#[derive(Debug)]
pub struct DeltaDecoder {
    mode: Mode,
    carry: String,
    done: bool,
}

impl DeltaDecoder {
    pub fn new(format: WireFormat) -> Self {
        let mode = match format {
            WireFormat::EventStream => Mode::EventStream,
            WireFormat::PlainText => Mode::PlainText,
            WireFormat::SingleShot => Mode::SingleShot,
            WireFormat::Unknown => Mode::Sniff,
        };
        Self {
            mode,
            carry: String::new(),
            done: false,
        }
    }

    /// Format currently in effect (an untyped body may have switched to SSE).
    pub fn format(&self) -> WireFormat {
        match self.mode {
            Mode::EventStream => WireFormat::EventStream,
            Mode::PlainText => WireFormat::PlainText,
            Mode::SingleShot => WireFormat::SingleShot,
            Mode::Sniff => WireFormat::Unknown,
        }
    }

    /// True once the `[DONE]` sentinel has been seen.
    pub fn is_done(&self) -> bool {
        self.done
    }

    pub fn push(&mut self, text: &str) -> Vec<String> {
        let mut out = Vec::new();
        if self.done || text.is_empty() {
            return out;
        }

        match self.mode {
            Mode::PlainText => out.push(text.to_string()),
            Mode::SingleShot => self.carry.push_str(text),
            Mode::EventStream => {
                self.carry.push_str(text);
                self.drain_event_lines(&mut out);
            }
            Mode::Sniff => {
                self.carry.push_str(text);
                self.sniff(&mut out);
            }
        }

        out
    }

    /// Flush at end of stream.
    pub fn finish(&mut self) -> Vec<String> {
        let carry = std::mem::take(&mut self.carry);
        if self.done {
            return Vec::new();
        }

        match self.mode {
            Mode::PlainText => Vec::new(),
            Mode::EventStream => {
                if !carry.trim().is_empty() {
                    log::debug!(
                        "Dropping unterminated SSE line at end of stream ({} bytes)",
                        carry.len()
                    );
                }
                Vec::new()
            }
            // SSE was never detected, so the tail is plain text; only a bare
            // terminator is swallowed.
            Mode::Sniff => {
                if carry.is_empty() || is_done_line(&carry) {
                    Vec::new()
                } else {
                    vec![carry]
                }
            }
            Mode::SingleShot => decode_single_shot(&carry).into_iter().collect(),
        }
    }

    fn drain_event_lines(&mut self, out: &mut Vec<String>) {
        while !self.done {
            let Some(pos) = self.carry.find('\n') else {
                break;
            };
            let line: String = self.carry.drain(..=pos).collect();
            self.event_line(&line[..line.len() - 1], out);
        }
        if self.done {
            self.carry.clear();
        }
    }

    fn event_line(&mut self, line: &str, out: &mut Vec<String>) {
        let line = line.strip_suffix('\r').unwrap_or(line);
        let Some(payload) = line.strip_prefix(DATA_PREFIX) else {
            // event:, id:, retry:, comments and blank separators carry no text
            return;
        };

        let payload = payload.trim();
        if payload.is_empty() {
            return;
        }
        if payload == DONE_SENTINEL {
            self.done = true;
            return;
        }

        match serde_json::from_str::<Value>(payload) {
            Ok(value @ (Value::Object(_) | Value::Array(_) | Value::String(_))) => {
                if let Some(text) = extract_text(&value).filter(|t| !t.is_empty()) {
                    out.push(text);
                }
            }
            Ok(_) | Err(_) => out.push(payload.to_string()),
        }
    }

    fn sniff(&mut self, out: &mut Vec<String>) {
        let mut plain = String::new();
        while let Some(pos) = self.carry.find('\n') {
            if self.carry.starts_with(DATA_PREFIX) {
                log::debug!("SSE framing detected in untyped response; switching to event-stream parsing");
                self.mode = Mode::EventStream;
                break;
            }
            plain.extend(self.carry.drain(..=pos));
        }

        if !plain.is_empty() {
            out.push(plain);
        }
        if self.mode == Mode::EventStream {
            self.drain_event_lines(out);
        }
    }
}

fn is_done_line(line: &str) -> bool {
    line.strip_prefix(DATA_PREFIX)
        .is_some_and(|payload| payload.trim() == DONE_SENTINEL)
}

/// Decode a complete, non-streamed body.
///
/// JSON bodies yield their text field; anything else (including JSON without a
/// known text field) is returned verbatim. Blank bodies yield nothing.
pub fn decode_single_shot(body: &str) -> Option<String> {
    if body.trim().is_empty() {
        return None;
    }

    match serde_json::from_str::<Value>(body) {
        Ok(value) => match extract_text(&value) {
            Some(text) if !text.is_empty() => Some(text),
            Some(_) => None,
            None => Some(body.to_string()),
        },
        Err(_) => Some(body.to_string()),
    }
}
