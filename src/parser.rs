//! Response parsing for model output.
//!
//! Model responses are free-form text expected to contain a JSON array of
//! per-paper verdicts. This module locates the array (falling back to a lone
//! object), parses it, and rejects anything that is not a list.

use crate::error::{Result, ScreenError};
use regex::Regex;
use serde_json::Value;

/// Extract the verdict entries from raw model output.
///
/// Locates the first `[...]` span (dot matches newline, first bracket to last);
/// if none exists, falls back to the first `{...}` span. The located span must
/// parse as JSON and must be an array.
pub fn extract_entries(raw: &str) -> Result<Vec<Value>> {
    let snippet = locate_json(raw)?.ok_or_else(|| {
        ScreenError::Parse("No JSON array/object found in model response".to_string())
    })?;

    let value: Value = serde_json::from_str(snippet)
        .map_err(|e| ScreenError::Parse(format!("Extracted text is not valid JSON: {}", e)))?;

    match value {
        Value::Array(entries) => Ok(entries),
        _ => Err(ScreenError::Parse(
            "Model returned JSON that is not a list".to_string(),
        )),
    }
}

/// Find the first array-shaped span, then the first object-shaped span.
fn locate_json(raw: &str) -> Result<Option<&str>> {
    let array_re = Regex::new(r"(?s)\[.*\]")
        .map_err(|e| ScreenError::Parse(format!("Invalid extraction pattern: {}", e)))?;
    if let Some(m) = array_re.find(raw) {
        return Ok(Some(m.as_str()));
    }

    let object_re = Regex::new(r"(?s)\{.*\}")
        .map_err(|e| ScreenError::Parse(format!("Invalid extraction pattern: {}", e)))?;
    Ok(object_re.find(raw).map(|m| m.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_array_surrounded_by_noise() -> Result<()> {
        let raw = "noise [{\"index\":0,\"TEST\":\"INCLUDE\"}] trailing";
        let entries = extract_entries(raw)?;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0]["index"], 0);
        assert_eq!(entries[0]["TEST"], "INCLUDE");
        Ok(())
    }

    #[test]
    fn test_extract_array_spanning_lines() -> Result<()> {
        let raw = "Here are the results:\n[\n  {\"index\": 0, \"TEST\": \"INCLUDE\"},\n  {\"index\": 1, \"TEST\": \"EXCLUDE\", \"REASON\": \"TOPIC\"}\n]\nDone.";
        let entries = extract_entries(raw)?;
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1]["REASON"], "TOPIC");
        Ok(())
    }

    #[test]
    fn test_no_brackets_is_parse_error() {
        let err = extract_entries("the model refused to answer").expect_err("should fail");
        assert!(matches!(err, ScreenError::Parse(_)));
    }

    #[test]
    fn test_object_fallback_is_not_a_list() {
        // An object-shaped response is located by the fallback but still
        // rejected: the contract requires an array.
        let err = extract_entries("{\"index\":0,\"TEST\":\"INCLUDE\"}").expect_err("should fail");
        assert!(matches!(err, ScreenError::Parse(_)));
        assert!(err.to_string().contains("not a list"));
    }

    #[test]
    fn test_invalid_json_in_brackets() {
        let err = extract_entries("[{index: unquoted}]").expect_err("should fail");
        assert!(matches!(err, ScreenError::Parse(_)));
    }

    #[test]
    fn test_empty_array_is_valid() -> Result<()> {
        let entries = extract_entries("[]")?;
        assert!(entries.is_empty());
        Ok(())
    }
}
