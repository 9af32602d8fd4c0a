use serde_json::Value;

/// Result of looking for a question array in model text.
#[derive(Debug, Clone, PartialEq)]
pub enum Extraction {
    /// A JSON array was found and parsed.
    Parsed(Vec<Value>),
    /// A ```json block was present but neither it nor a bracketed span parsed.
    FencedInvalid { reason: String },
    /// Nothing resembling a JSON array was found.
    NoStructure,
}

impl Extraction {
    /// Short label for logs and status payloads.
    pub fn as_str(&self) -> &'static str {
        match self {
            Extraction::Parsed(_) => "parsed",
            Extraction::FencedInvalid { .. } => "fenced_invalid",
            Extraction::NoStructure => "no_structure",
        }
    }
}

/// Extract a JSON array of candidate questions from free text.
///
/// Tried in order:
/// 1. the whole text, as an array or an object with a `questions` array
/// 2. the first ```json fenced block
/// 3. the span from the first `[` to the last `]`
pub fn extract_question_array(text: &str) -> Extraction {
    let trimmed = text.trim();
    if let Some(items) = parse_array(trimmed) {
        return Extraction::Parsed(items);
    }

    let mut fence_error = None;
    if let Some(block) = fenced_json_block(text) {
        match serde_json::from_str::<Value>(block) {
            Ok(value) => match into_items(value) {
                Some(items) => return Extraction::Parsed(items),
                None => fence_error = Some("fenced JSON is not a question array".to_string()),
            },
            Err(e) => fence_error = Some(e.to_string()),
        }
    }

    if let Some(items) = bracketed_span(text).and_then(parse_array) {
        return Extraction::Parsed(items);
    }

    match fence_error {
        Some(reason) => Extraction::FencedInvalid { reason },
        None => Extraction::NoStructure,
    }
}

fn fenced_json_block(text: &str) -> Option<&str> {
    text.split("```json")
        .nth(1)
        .and_then(|s| s.split("```").next())
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

fn bracketed_span(text: &str) -> Option<&str> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    (end > start).then(|| &text[start..=end])
}

fn parse_array(text: &str) -> Option<Vec<Value>> {
    if !(text.starts_with('[') || text.starts_with('{')) {
        return None;
    }
    serde_json::from_str::<Value>(text).ok().and_then(into_items)
}

fn into_items(value: Value) -> Option<Vec<Value>> {
    match value {
        Value::Array(items) => Some(items),
        Value::Object(mut map) => match map.remove("questions") {
            Some(Value::Array(items)) => Some(items),
            _ => None,
        },
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_raw_array() {
        let outcome = extract_question_array(r#"  [{"title": "Age?"}] "#);
        assert_eq!(outcome, Extraction::Parsed(vec![json!({ "title": "Age?" })]));
    }

    #[test]
    fn test_questions_object() {
        let outcome = extract_question_array(r#"{"questions": [{"title": "Age?"}, {"title": "Income?"}]}"#);
        match outcome {
            Extraction::Parsed(items) => assert_eq!(items.len(), 2),
            other => panic!("expected parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_fenced_block() {
        let text = "Here you go:\n```json\n[{\"title\": \"Crop grown?\"}]\n```\nHope it helps [1].";
        assert_eq!(
            extract_question_array(text),
            Extraction::Parsed(vec![json!({ "title": "Crop grown?" })])
        );
    }

    #[test]
    fn test_bracketed_span() {
        let text = "Sure! [{\"title\": \"A\"}, {\"title\": \"B\"}] Let me know.";
        match extract_question_array(text) {
            Extraction::Parsed(items) => assert_eq!(items.len(), 2),
            other => panic!("expected parsed, got {:?}", other),
        }
    }

    #[test]
    fn test_invalid_fence_falls_back_to_brackets() {
        let text = "```json\n{oops\n```\nBut also [\"Plain question?\"]";
        assert_eq!(
            extract_question_array(text),
            Extraction::Parsed(vec![json!("Plain question?")])
        );
    }

    #[test]
    fn test_fenced_but_invalid() {
        let outcome = extract_question_array("```json\n[{\"title\": }\n```");
        assert!(matches!(outcome, Extraction::FencedInvalid { .. }));
        assert_eq!(outcome.as_str(), "fenced_invalid");
    }

    #[test]
    fn test_no_structure() {
        assert_eq!(
            extract_question_array("1. What is your age?\n2. Where do you work?"),
            Extraction::NoStructure
        );
        assert_eq!(extract_question_array("] backwards ["), Extraction::NoStructure);
        assert_eq!(extract_question_array(""), Extraction::NoStructure);
    }
}
