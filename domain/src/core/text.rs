//! Text helpers for handling raw model output.

use serde_json::Value;

/// Truncate a string to approximately `max_bytes` without splitting a UTF-8
/// character boundary.
pub fn truncate_str(s: &str, max_bytes: usize) -> &str {
    if s.len() <= max_bytes {
        return s;
    }
    let mut end = max_bytes;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Strip incidental Markdown code fences around a JSON answer.
///
/// Models asked for strict JSON still sometimes wrap it in a fenced block
/// with or without a language tag. Leading prose before the fence is kept
/// out; text without fences is returned trimmed.
pub fn strip_code_fences(response: &str) -> &str {
    let trimmed = response.trim();
    let Some(start) = trimmed.find("```") else {
        return trimmed;
    };
    let after_open = &trimmed[start + 3..];
    // Drop the info string (e.g. `json`) up to the first newline.
    let body = match after_open.find('\n') {
        Some(newline) => &after_open[newline + 1..],
        None => after_open,
    };
    match body.rfind("```") {
        Some(end) => body[..end].trim(),
        None => body.trim(),
    }
}

/// Render a JSON value as display text.
///
/// Strings are returned verbatim; every other value is rendered as compact
/// JSON so nested structures survive a text-only field.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
