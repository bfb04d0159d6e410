// src/sheets/systems/ai/parser.rs
//! Model Output Parser
//!
//! Turns raw completion text into the structures the collaborators return.
//!
//! ## Responsibilities
//!
//! - Unwrap JSON that the model wrapped in Markdown fences or prose
//! - Extract string lists (Find) and string maps (RunCells / Aggregate)
//! - Degrade to empty structures on unparsable output, never fail

use std::collections::HashMap;

use serde_json::Value;
use tracing::warn;

/// Parses `text` as JSON, falling back to the first fenced or bracketed
/// block inside it.
pub fn parse_json_value(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str(trimmed) {
        Ok(v) => Some(v),
        Err(e) => {
            let extracted = extract_json_from_markdown(trimmed)?;
            match serde_json::from_str(&extracted) {
                Ok(v) => Some(v),
                Err(e2) => {
                    warn!("Failed to parse model output as JSON: {} / extracted: {}", e, e2);
                    None
                }
            }
        }
    }
}

/// List of names. Accepts `["a", "b"]`, `[{"name": "a"}]` and objects that
/// wrap such an array under `results`/`items`/`data`.
pub fn parse_string_list(text: &str) -> Vec<String> {
    let Some(value) = parse_json_value(text) else {
        return Vec::new();
    };
    let array = match &value {
        Value::Array(arr) => arr,
        Value::Object(map) => match ["results", "items", "data"]
            .iter()
            .find_map(|k| map.get(*k).and_then(Value::as_array))
        {
            Some(arr) => arr,
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };
    array
        .iter()
        .filter_map(|item| match item {
            Value::Object(obj) => obj.get("name").map(value_to_cell_text),
            Value::Null => None,
            other => Some(value_to_cell_text(other)),
        })
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Flat key → text map. When `wrapper` is present under that key it is
/// used instead of the top-level object.
pub fn parse_string_map(text: &str, wrapper: Option<&str>) -> HashMap<String, String> {
    let Some(value) = parse_json_value(text) else {
        return HashMap::new();
    };
    let object = match (&value, wrapper) {
        (Value::Object(map), Some(key)) => match map.get(key) {
            Some(Value::Object(inner)) => inner,
            _ => map,
        },
        (Value::Object(map), None) => map,
        // Single-element array of objects: take the object
        (Value::Array(arr), _) => match arr.first() {
            Some(Value::Object(inner)) => inner,
            _ => return HashMap::new(),
        },
        _ => return HashMap::new(),
    };
    object
        .iter()
        .map(|(k, v)| (k.clone(), value_to_cell_text(v)))
        .collect()
}

/// Cell text for a JSON value: strings unquoted, null blank, arrays joined.
pub fn value_to_cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Array(items) => items
            .iter()
            .map(value_to_cell_text)
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

fn extract_json_from_markdown(text: &str) -> Option<String> {
    if let Some(start) = text.find("```json") {
        let content_start = start + 7;
        if let Some(end) = text[content_start..].find("```") {
            return Some(text[content_start..content_start + end].trim().to_string());
        }
    }

    if let Some(start) = text.find("```") {
        let content_start = start + 3;
        // Skip language identifier if present
        let content_start = text[content_start..]
            .find('\n')
            .map(|i| content_start + i + 1)
            .unwrap_or(content_start);

        if let Some(end) = text[content_start..].find("```") {
            return Some(text[content_start..content_start + end].trim().to_string());
        }
    }

    let array_span = text.find('[').zip(text.rfind(']')).filter(|(s, e)| e > s);
    let object_span = text.find('{').zip(text.rfind('}')).filter(|(s, e)| e > s);
    // Whichever bracket opens first is the outer structure
    let span = match (array_span, object_span) {
        (Some(a), Some(o)) => Some(if a.0 < o.0 { a } else { o }),
        (a, o) => a.or(o),
    };
    span.map(|(start, end)| text[start..=end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_string_list_plain_array() {
        assert_eq!(parse_string_list(r#"["A", "B"]"#), vec!["A", "B"]);
    }

    #[test]
    fn test_parse_string_list_fenced_objects() {
        let text = "Here you go:\n```json\n[{\"name\": \"Acme\"}, {\"name\": \" Globex \"}]\n```";
        assert_eq!(parse_string_list(text), vec!["Acme", "Globex"]);
    }

    #[test]
    fn test_parse_string_list_wrapped() {
        assert_eq!(parse_string_list(r#"{"results": ["x", 3]}"#), vec!["x", "3"]);
    }

    #[test]
    fn test_parse_string_list_garbage_is_empty() {
        assert!(parse_string_list("no json here").is_empty());
        assert!(parse_string_list("").is_empty());
    }

    #[test]
    fn test_parse_string_map_with_wrapper() {
        let map = parse_string_map(
            r#"{"sheetName": "Acme", "aggregatedInsights": {"Revenue": 10, "Notes": null}}"#,
            Some("aggregatedInsights"),
        );
        assert_eq!(map.get("Revenue").map(String::as_str), Some("10"));
        assert_eq!(map.get("Notes").map(String::as_str), Some(""));
        assert!(!map.contains_key("sheetName"));
    }

    #[test]
    fn test_parse_string_map_prose_around_object() {
        let map = parse_string_map("Sure! {\"CEO\": \"Jane\", \"Tags\": [\"a\", \"b\"]} hope it helps", None);
        assert_eq!(map.get("CEO").map(String::as_str), Some("Jane"));
        assert_eq!(map.get("Tags").map(String::as_str), Some("a, b"));
    }

    #[test]
    fn test_parse_string_map_malformed_is_empty() {
        assert!(parse_string_map("{not json", None).is_empty());
    }
}
