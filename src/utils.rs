//! Small helpers for recovering structured values from model text.
//!
//! Models frequently wrap JSON in markdown code fences. These helpers strip
//! the wrapping before parsing; anything still unparseable is reported to
//! the caller rather than repaired.

use serde_json::Value;

/// Strip markdown code fences from text, leaving the inner content.
///
/// Handles both ```` ```json ```` and bare ```` ``` ```` fences with an
/// optional language tag. Text without fences is returned trimmed.
#[must_use]
pub fn strip_code_fences(text: &str) -> String {
    let trimmed = text.trim();

    if let Some(start) = trimmed.find("```json") {
        let after = &trimmed[start + 7..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    if let Some(start) = trimmed.find("```") {
        let after = &trimmed[start + 3..];
        // Skip optional language tag on the same line.
        let content_start = after.find('\n').map_or(0, |p| p + 1);
        let after = &after[content_start..];
        if let Some(end) = after.find("```") {
            return after[..end].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Attempt to parse model text as a JSON value, tolerating code fences.
///
/// Returns `None` when the text is not valid JSON even after fence
/// stripping. Callers decide whether that is a malformed-output failure.
#[must_use]
pub fn parse_structured(text: &str) -> Option<Value> {
    serde_json::from_str(&strip_code_fences(text)).ok()
}
