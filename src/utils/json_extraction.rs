use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static JSON_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?s)```json\s*(.+?)\s*```")
        .expect("JSON fence regex pattern should be valid")
});

static LEADING_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^```json\s*")
        .expect("Leading fence regex pattern should be valid")
});

static TRAILING_FENCE_REGEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\s*```$")
        .expect("Trailing fence regex pattern should be valid")
});

fn parses(candidate: &str) -> bool {
    serde_json::from_str::<Value>(candidate).is_ok()
}

fn fenced_block(text: &str) -> Option<String> {
    JSON_FENCE_REGEX
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Span from the first `open` to the last `close`, if it is valid JSON.
fn delimited_span(text: &str, open: char, close: char) -> Option<String> {
    let start = text.find(open)?;
    let end = text.rfind(close)?;
    if end <= start {
        return None;
    }
    let candidate = &text[start..=end];
    parses(candidate).then(|| candidate.to_string())
}

fn whole_text(text: &str, delimiters: &[(char, char)]) -> Option<String> {
    let trimmed = text.trim();
    let shaped = delimiters
        .iter()
        .any(|(open, close)| trimmed.starts_with(*open) && trimmed.ends_with(*close));
    (shaped && parses(trimmed)).then(|| trimmed.to_string())
}

/// Pulls a JSON object out of free-form model output.
///
/// Tries, in order: a ```` ```json ```` fenced block (returned as-is, not validated),
/// the span between the first `{` and the last `}`, and finally the whole trimmed text.
pub fn extract_json_object(text: &str) -> Option<String> {
    fenced_block(text)
        .or_else(|| delimited_span(text, '{', '}'))
        .or_else(|| whole_text(text, &[('{', '}')]))
}

/// Like [`extract_json_object`] but also accepts a top-level JSON array.
pub fn extract_json_value(text: &str) -> Option<String> {
    fenced_block(text)
        .or_else(|| delimited_span(text, '{', '}'))
        .or_else(|| delimited_span(text, '[', ']'))
        .or_else(|| whole_text(text, &[('{', '}'), ('[', ']')]))
}

/// Removes a leading ```` ```json ```` and a trailing ```` ``` ```` marker.
pub fn strip_json_fence(text: &str) -> String {
    let without_leading = LEADING_FENCE_REGEX.replace(text, "");
    TRAILING_FENCE_REGEX.replace(&without_leading, "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_fenced_block_wins() {
        let text = "Here you go!\n```json\n{\"name\": \"Captain Sparkle\"}\n```\nHave fun {not json}";
        assert_eq!(
            extract_json_object(text).as_deref(),
            Some("{\"name\": \"Captain Sparkle\"}")
        );
    }

    #[test]
    fn test_fenced_block_is_not_validated() {
        let text = "```json\n{broken\n```";
        assert_eq!(extract_json_object(text).as_deref(), Some("{broken"));
    }

    #[test]
    fn test_brace_span_with_surrounding_prose() {
        let text = "Sure! {\"steps\": [{\"instruction\": \"Wash\", \"encouragement\": \"Yay\"}]} Enjoy.";
        assert_eq!(
            extract_json_object(text).as_deref(),
            Some("{\"steps\": [{\"instruction\": \"Wash\", \"encouragement\": \"Yay\"}]}")
        );
    }

    #[test]
    fn test_invalid_brace_span_yields_none() {
        assert_eq!(extract_json_object("oops {not: valid} again"), None);
        assert_eq!(extract_json_object("no json at all"), None);
        assert_eq!(extract_json_object("} backwards {"), None);
    }

    #[test]
    fn test_object_extraction_ignores_arrays() {
        assert_eq!(extract_json_object("[\"Make your bed\"]"), None);
    }

    #[test]
    fn test_value_extraction_accepts_arrays() {
        let text = "Tasks: [\"Make your bed\", \"Water the plants\"] done";
        assert_eq!(
            extract_json_value(text).as_deref(),
            Some("[\"Make your bed\", \"Water the plants\"]")
        );
    }

    #[test]
    fn test_value_extraction_prefers_object_span() {
        let text = "[1, {\"a\": 2}]";
        assert_eq!(extract_json_value(text).as_deref(), Some("{\"a\": 2}"));
    }

    #[test]
    fn test_strip_json_fence() {
        assert_eq!(strip_json_fence("```json\n[\"a\"]\n```"), "[\"a\"]");
        assert_eq!(strip_json_fence("  [\"a\"]  "), "[\"a\"]");
        assert_eq!(strip_json_fence("```json[]```"), "[]");
    }

    proptest! {
        #[test]
        fn unfenced_extractions_always_parse(text in "[^`]{0,64}") {
            if let Some(found) = extract_json_value(&text) {
                prop_assert!(serde_json::from_str::<Value>(&found).is_ok());
            }
            if let Some(found) = extract_json_object(&text) {
                prop_assert!(serde_json::from_str::<Value>(&found).is_ok());
            }
        }

        #[test]
        fn embedded_objects_are_recovered(key in "[a-z]{1,8}", value in "[a-zA-Z ]{0,16}") {
            let json = serde_json::json!({ key.clone(): value.clone() }).to_string();
            let text = format!("Here is the result: {} Thanks!", json);
            prop_assert_eq!(extract_json_object(&text), Some(json));
        }
    }
}
