//! Structured content extraction
//!
//! Agent output interleaves prose with a machine-readable payload, either
//! as a ```json fenced block inside the text or as a response that is
//! itself one JSON object. This module finds that payload, promotes the
//! recognized fields onto [`StructuredContent`], and returns the leftover
//! prose for display.
//!
//! ## Rules (ordered, first match wins)
//!
//! 1. A ```json fenced block whose body parses as an object: the block is
//!    spliced out of the text, outer whitespace trimmed.
//! 2. The whole trimmed text starts with `{` and ends with `}` and parses
//!    as an object: the residual text is empty.
//! 3. Otherwise no payload; the text is returned unchanged.
//!
//! Parse failures are silent. Streamed content is routinely syntactically
//! incomplete mid-turn, so an unparseable block is simply "no structured
//! data yet", never an error surfaced to the user.

use crate::types::StructuredContent;
use serde_json::Value;

const FENCE_OPEN: &str = "```json";
const FENCE_CLOSE: &str = "```";

/// Outcome of one extraction pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    /// Promoted fields, when a payload was found (possibly all-empty if the
    /// payload carried no recognized keys).
    pub content: Option<StructuredContent>,
    /// Prose left for display after the payload was removed.
    pub display_text: String,
}

/// Extract the structured payload, if any, from one entry's raw text.
///
/// Extraction is idempotent: running it again over the returned
/// `display_text` finds no further payload.
pub fn extract(raw_text: &str) -> Extraction {
    if let Some(extraction) = extract_fenced(raw_text) {
        return extraction;
    }
    if let Some(content) = extract_bare_object(raw_text) {
        return Extraction {
            content: Some(content),
            display_text: String::new(),
        };
    }
    Extraction {
        content: None,
        display_text: raw_text.to_string(),
    }
}

/// Rule 1: a ```json fenced block somewhere in the text.
fn extract_fenced(raw: &str) -> Option<Extraction> {
    let open = raw.find(FENCE_OPEN)?;
    let body_start = open + FENCE_OPEN.len();
    let close = raw[body_start..].find(FENCE_CLOSE)?;
    let body = &raw[body_start..body_start + close];

    let value: Value = serde_json::from_str(body.trim()).ok()?;
    let object = value.as_object()?;
    let content = promote(object);

    let mut residual = String::with_capacity(raw.len());
    residual.push_str(&raw[..open]);
    residual.push_str(&raw[body_start + close + FENCE_CLOSE.len()..]);

    Some(Extraction {
        content: Some(content),
        display_text: residual.trim().to_string(),
    })
}

/// Rule 2: the whole trimmed text is one JSON object.
fn extract_bare_object(raw: &str) -> Option<StructuredContent> {
    let trimmed = raw.trim();
    if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
        return None;
    }
    let value: Value = serde_json::from_str(trimmed).ok()?;
    let object = value.as_object()?;
    Some(promote(object))
}

/// Copy recognized top-level keys onto typed slots.
fn promote(object: &serde_json::Map<String, Value>) -> StructuredContent {
    StructuredContent {
        query_text: string_field(object, "sql"),
        summary: string_field(object, "summary"),
        insights: object.get("insights").and_then(normalize_lines),
        chart_suggestions: object.get("chart_recommendations").and_then(normalize_lines),
        reasoning: string_field(object, "reasoning"),
    }
}

fn string_field(object: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// Normalize an insight/chart-suggestion value to line-oriented text.
///
/// Arrays become one bullet per item; a plain string passes through; a
/// single object becomes one bullet.
fn normalize_lines(value: &Value) -> Option<String> {
    let text = match value {
        Value::Array(items) => items
            .iter()
            .map(bullet_line)
            .collect::<Vec<_>>()
            .join("\n"),
        Value::String(s) => s.trim().to_string(),
        other => bullet_line(other),
    };
    if text.trim().is_empty() {
        None
    } else {
        Some(text)
    }
}

/// One list item as a bullet line.
///
/// Recognized object shapes are `title` + `description` and `chart_type` +
/// `reason`; anything else is serialized verbatim as the fallback.
fn bullet_line(item: &Value) -> String {
    match item {
        Value::String(s) => format!("- {}", s),
        Value::Object(fields) => {
            let pair = |a: &str, b: &str| {
                match (
                    fields.get(a).and_then(Value::as_str),
                    fields.get(b).and_then(Value::as_str),
                ) {
                    (Some(left), Some(right)) => Some(format!("- {}: {}", left, right)),
                    _ => None,
                }
            };
            pair("title", "description")
                .or_else(|| pair("chart_type", "reason"))
                .unwrap_or_else(|| format!("- {}", Value::Object(fields.clone())))
        }
        other => format!("- {}", other),
    }
}
