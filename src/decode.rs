//! JSON document decoding and structural validation
//!
//! Everything downstream works on already-decoded documents: schema input
//! must be a non-empty JSON object, record input a non-empty JSON array.
//! This module is the single place raw text is parsed and those shapes are
//! enforced, so the mappers never see malformed or degenerate input.

use serde_json::{Map, Value};
use thiserror::Error;

/// Errors produced while decoding raw input into a document.
#[derive(Error, Debug)]
pub enum DecodeError {
    /// Malformed JSON, carrying the parser's own message.
    #[error("invalid JSON: {0}")]
    Syntax(#[from] serde_json::Error),

    /// Parsed fine, but the top-level value is not an object.
    #[error("expected a JSON object, got {found}")]
    NotAnObject { found: &'static str },

    /// Parsed fine, but the top-level value is not an array.
    #[error("expected a JSON array, got {found}")]
    NotAnArray { found: &'static str },

    /// The object or array has zero entries.
    #[error("document has no entries")]
    Empty,
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Decode raw text into a non-empty JSON object.
///
/// This is the entry shape for schema documents: one entry per field,
/// mapping a label to a type or a field definition.
pub fn decode_object(raw: &str) -> Result<Map<String, Value>, DecodeError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    match value {
        Value::Object(map) if map.is_empty() => Err(DecodeError::Empty),
        Value::Object(map) => Ok(map),
        other => Err(DecodeError::NotAnObject {
            found: value_kind(&other),
        }),
    }
}

/// Decode raw text into a non-empty JSON array.
///
/// This is the entry shape for record documents: one element per record.
pub fn decode_array(raw: &str) -> Result<Vec<Value>, DecodeError> {
    let value: Value = serde_json::from_str(raw.trim())?;
    match value {
        Value::Array(items) if items.is_empty() => Err(DecodeError::Empty),
        Value::Array(items) => Ok(items),
        other => Err(DecodeError::NotAnArray {
            found: value_kind(&other),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_object() {
        let map = decode_object(r#"{"title": "string", "body": "text"}"#).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("title").unwrap(), "string");
    }

    #[test]
    fn test_malformed_json_is_syntax_error() {
        let err = decode_object(r#"{"title": "string", "body": }"#).unwrap_err();
        assert!(matches!(err, DecodeError::Syntax(_)));
    }

    #[test]
    fn test_object_wrong_shape() {
        let err = decode_object(r#"[1, 2]"#).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject { found: "an array" }));

        let err = decode_object(r#""just a string""#).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnObject { found: "a string" }));
    }

    #[test]
    fn test_empty_object_rejected() {
        let err = decode_object("{}").unwrap_err();
        assert!(matches!(err, DecodeError::Empty));
    }

    #[test]
    fn test_decode_array() {
        let items = decode_array(r#"[{"title": "A"}, {"title": "B"}]"#).unwrap();
        assert_eq!(items.len(), 2);
    }

    #[test]
    fn test_empty_array_rejected() {
        // Zero elements are rejected here, before any per-element checks
        let err = decode_array("[]").unwrap_err();
        assert!(matches!(err, DecodeError::Empty));
    }

    #[test]
    fn test_array_wrong_shape() {
        let err = decode_array(r#"{"title": "A"}"#).unwrap_err();
        assert!(matches!(err, DecodeError::NotAnArray { found: "an object" }));
    }

    #[test]
    fn test_input_is_trimmed() {
        let map = decode_object("  {\"a\": \"string\"}\n").unwrap();
        assert_eq!(map.len(), 1);
    }
}
