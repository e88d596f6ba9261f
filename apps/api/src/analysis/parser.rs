//! Response parsing: untrusted generation text → validated stage values.
//!
//! Two steps, kept separate so failures are classified correctly:
//! 1. `parse_structured`: normalization pass + JSON parse. Failure is a
//!    malformed response.
//! 2. `decode`: typed shape check against the stage model. Failure is a
//!    shape mismatch.

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::analysis::error::StageError;

/// Normalization pass applied to every generation response before parsing:
/// - strip a surrounding markdown code fence (```json ... ``` or ``` ... ```)
/// - delete `\n`, `\r` and `\t`
///
/// Deleting the control characters is safe for JSON structure (they are only
/// insignificant whitespace between tokens) and repairs raw line breaks that
/// some generations emit inside string literals.
pub fn normalize_response(raw: &str) -> String {
    strip_json_fences(raw)
        .chars()
        .filter(|c| !matches!(c, '\n' | '\r' | '\t'))
        .collect()
}

/// Parses a generation response as JSON after normalization.
pub fn parse_structured(raw: &str) -> Result<Value, StageError> {
    let normalized = normalize_response(raw);
    serde_json::from_str(&normalized).map_err(|e| StageError::MalformedResponse(e.to_string()))
}

/// Checks a parsed value against the stage's model.
pub fn decode<T: DeserializeOwned>(value: Value) -> Result<T, StageError> {
    if !value.is_object() {
        return Err(StageError::ShapeMismatch(format!(
            "expected a JSON object, got {}",
            json_kind(&value)
        )));
    }
    serde_json::from_value(value).map_err(|e| StageError::ShapeMismatch(e.to_string()))
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
