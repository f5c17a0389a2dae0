//! Text extraction from the JSON shapes upstream providers emit.

use serde_json::Value;

/// Generic top-level fields checked after the provider-specific shapes, in order.
pub const TEXT_FIELDS: &[&str] = &["text", "delta", "content", "response", "output_text"];

/// Pull the generated text out of a parsed JSON payload.
///
/// Shapes are checked in order:
/// 1. OpenAI stream delta `choices[0].delta.content`
/// 2. OpenAI completion `choices[0].message.content`
/// 3. legacy completion `choices[0].text`
/// 4. content-block delta `delta.text`
/// 5. Gemini `candidates[0].content.parts[0].text`
/// 6. chat-style `message.content`
/// 7. the generic [`TEXT_FIELDS`]
///
/// A bare JSON string is the text itself. Returns `None` when no shape matches,
/// e.g. role-only or usage-only stream chunks.
pub fn extract_text(value: &Value) -> Option<String> {
    if let Value::String(text) = value {
        return Some(text.clone());
    }

    if let Some(choice) = value.get("choices").and_then(|c| c.get(0)) {
        let from_choice = string_at(choice, &["delta", "content"])
            .or_else(|| string_at(choice, &["message", "content"]))
            .or_else(|| string_at(choice, &["text"]));
        if from_choice.is_some() {
            return from_choice;
        }
    }

    if let Some(text) = string_at(value, &["delta", "text"]) {
        return Some(text);
    }

    if let Some(text) = value
        .get("candidates")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("content"))
        .and_then(|c| c.get("parts"))
        .and_then(|p| p.get(0))
        .and_then(|p| p.get("text"))
        .and_then(Value::as_str)
    {
        return Some(text.to_string());
    }

    if let Some(text) = string_at(value, &["message", "content"]) {
        return Some(text);
    }

    TEXT_FIELDS
        .iter()
        .find_map(|field| value.get(*field).and_then(Value::as_str))
        .map(str::to_string)
}

fn string_at(value: &Value, path: &[&str]) -> Option<String> {
    path.iter()
        .try_fold(value, |node, key| node.get(*key))
        .and_then(Value::as_str)
        .map(str::to_string)
}
