//! JSON payload extraction from free-form oracle text.

use std::fmt;

use serde_json::Value;

/// Why no JSON object could be recovered from oracle text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    /// No `{ ... }` span in the text.
    NoObject,
    /// A span was found but did not parse.
    InvalidJson(String),
}

impl fmt::Display for ExtractError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractError::NoObject => f.write_str("no JSON object found in oracle output"),
            ExtractError::InvalidJson(err) => write!(f, "invalid JSON in oracle output: {err}"),
        }
    }
}

impl std::error::Error for ExtractError {}

/// Extract the trailing JSON object: the span from the last `{` to the last `}`.
///
/// Proposals are flat objects, so the last opening brace starts the payload
/// even when the oracle reasons in prose (or earlier JSON) before it.
pub fn extract_json_object(text: &str) -> Result<Value, ExtractError> {
    let start = text.rfind('{').ok_or(ExtractError::NoObject)?;
    let end = text.rfind('}').ok_or(ExtractError::NoObject)?;
    parse_span(text, start, end)
}

/// Extract the outermost JSON object: the span from the first `{` to the last `}`.
///
/// Used for nested payloads (clue rewrites), where the last `{` would land
/// inside the final array element.
pub fn extract_outer_json_object(text: &str) -> Result<Value, ExtractError> {
    let start = text.find('{').ok_or(ExtractError::NoObject)?;
    let end = text.rfind('}').ok_or(ExtractError::NoObject)?;
    parse_span(text, start, end)
}

fn parse_span(text: &str, start: usize, end: usize) -> Result<Value, ExtractError> {
    if end < start {
        return Err(ExtractError::InvalidJson(
            "closing brace precedes opening brace".to_string(),
        ));
    }
    serde_json::from_str(&text[start..=end]).map_err(|err| ExtractError::InvalidJson(err.to_string()))
}

/// True if the object is the oracle's "no answer" sentinel.
pub fn is_message_sentinel(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|object| object.contains_key("message"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_trailing_object_after_prose() {
        let text = "Thinking about it {not json}... final answer:\n{\"word\": \"air\", \"row\": 0}\nDone.";
        let value = extract_json_object(text).expect("extract");
        assert_eq!(value, json!({"word": "air", "row": 0}));
    }

    #[test]
    fn missing_braces_is_no_object() {
        assert_eq!(extract_json_object("no payload here"), Err(ExtractError::NoObject));
    }

    #[test]
    fn reversed_braces_are_invalid() {
        let err = extract_json_object("} then {").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidJson(_)));
    }

    #[test]
    fn malformed_span_is_invalid() {
        let err = extract_json_object("{\"word\": }").unwrap_err();
        assert!(matches!(err, ExtractError::InvalidJson(_)));
    }

    #[test]
    fn outer_extraction_keeps_nested_payload() {
        let text = "```json\n{\"words\": [{\"word\": \"a\"}, {\"word\": \"b\"}]}\n```";
        let value = extract_outer_json_object(text).expect("extract");
        assert_eq!(value["words"].as_array().map(Vec::len), Some(2));
        // The trailing rule would only see the last element.
        assert!(extract_json_object(text).is_err());
    }

    #[test]
    fn message_key_marks_sentinel() {
        assert!(is_message_sentinel(&json!({"message": "no word fits"})));
        assert!(!is_message_sentinel(&json!({"word": "air"})));
        assert!(!is_message_sentinel(&json!(["message"])));
    }
}
