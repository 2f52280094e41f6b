//! Answer extraction from provider responses.
//!
//! The provider payload is not versioned together with this crate. Newer
//! responses carry a flat `output_text` convenience field, older ones only
//! the nested `output[].content[]` parts, so both are probed in turn.

use serde_json::Value;

/// Answer returned when a response holds no usable text.
pub const FALLBACK_ANSWER: &str = "I couldn't find an answer in the attached notes.";

/// Part tags that carry answer text.
const TEXT_PART_TYPES: [&str; 2] = ["output_text", "text"];

/// Best-effort classification of a provider response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponseShape {
    /// Non-empty `output_text` convenience field (already trimmed).
    FlatText(String),
    /// Text-bearing content parts, in encounter order.
    StructuredParts(Vec<String>),
    /// Nothing recognisable.
    Unrecognized,
}

impl ResponseShape {
    /// Classify a response without failing on any input.
    pub fn probe(response: &Value) -> Self {
        if let Some(text) = response.get("output_text").and_then(Value::as_str) {
            let text = text.trim();
            if !text.is_empty() {
                return ResponseShape::FlatText(text.to_string());
            }
        }

        let parts = collect_text_parts(response);
        if parts.is_empty() {
            ResponseShape::Unrecognized
        } else {
            ResponseShape::StructuredParts(parts)
        }
    }

    /// Text this shape resolves to, if any.
    pub fn text(&self) -> Option<String> {
        match self {
            ResponseShape::FlatText(text) => Some(text.clone()),
            ResponseShape::StructuredParts(parts) => {
                let joined = parts.join("\n");
                let joined = joined.trim();
                (!joined.is_empty()).then(|| joined.to_string())
            }
            ResponseShape::Unrecognized => None,
        }
    }
}

fn collect_text_parts(response: &Value) -> Vec<String> {
    let Some(items) = response.get("output").and_then(Value::as_array) else {
        return Vec::new();
    };

    items
        .iter()
        .filter_map(|item| item.get("content").and_then(Value::as_array))
        .flatten()
        .filter(|part| {
            part.get("type")
                .and_then(Value::as_str)
                .is_some_and(|t| TEXT_PART_TYPES.contains(&t))
        })
        .filter_map(part_text)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
        .collect()
}

/// A part's text is usually a string; assistant-era payloads nest it as
/// `{ "value": "..." }`.
fn part_text(part: &Value) -> Option<&str> {
    match part.get("text")? {
        Value::String(s) => Some(s.as_str()),
        Value::Object(obj) => obj.get("value").and_then(Value::as_str),
        _ => None,
    }
}

/// Extract a plain-text answer from a provider response.
///
/// Never fails and never returns an empty string. With `single_line` set,
/// line breaks are collapsed into single spaces.
pub fn extract_answer(response: &Value, single_line: bool) -> String {
    let answer = ResponseShape::probe(response)
        .text()
        .unwrap_or_else(|| FALLBACK_ANSWER.to_string());

    if single_line {
        flatten_lines(&answer)
    } else {
        answer
    }
}

/// Replace every line break (`\r\n`, `\n`, `\r`) with a space.
pub fn flatten_lines(text: &str) -> String {
    text.replace("\r\n", " ").replace(['\n', '\r'], " ")
}
