use serde::{Deserialize, Serialize};

/// A respondent's answer to one question.
///
/// Free text and option selections get their own variants; anything else the
/// UI hands over (numbers, objects, `null`) is kept as raw JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Answer {
    /// Free-text or single-choice answer.
    Text(String),
    /// Multi-select answer.
    Choices(Vec<String>),
    /// Any other JSON value, including `null`.
    Other(serde_json::Value),
}

impl Answer {
    /// No answer was given.
    pub fn none() -> Self {
        Answer::Other(serde_json::Value::Null)
    }

    /// Empty string, empty selection or `null`.
    pub fn is_empty(&self) -> bool {
        match self {
            Answer::Text(s) => s.is_empty(),
            Answer::Choices(c) => c.is_empty(),
            Answer::Other(v) => v.is_null(),
        }
    }

    /// First `max_chars` characters of the answer's flat text form.
    pub fn preview(&self, max_chars: usize) -> String {
        let full = match self {
            Answer::Text(s) => s.clone(),
            Answer::Choices(c) => c.join(","),
            Answer::Other(v) => v.to_string(),
        };
        full.chars().take(max_chars).collect()
    }

    /// The text of a free-text answer.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Answer::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl Default for Answer {
    fn default() -> Self {
        Answer::none()
    }
}

impl From<&str> for Answer {
    fn from(s: &str) -> Self {
        Answer::Text(s.to_string())
    }
}

impl From<String> for Answer {
    fn from(s: String) -> Self {
        Answer::Text(s)
    }
}

impl From<Vec<String>> for Answer {
    fn from(c: Vec<String>) -> Self {
        Answer::Choices(c)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_empty_answers() {
        assert!(Answer::from("").is_empty());
        assert!(Answer::Choices(vec![]).is_empty());
        assert!(Answer::none().is_empty());
        assert!(!Answer::from(" ").is_empty());
        assert!(!Answer::Other(json!(0)).is_empty());
    }

    #[test]
    fn test_preview_is_bounded_by_chars() {
        let long = "क".repeat(100);
        assert_eq!(Answer::from(long).preview(40).chars().count(), 40);

        let choices = Answer::from(vec!["TV".to_string(), "Bicycle".to_string()]);
        assert_eq!(choices.preview(40), "TV,Bicycle");

        let other = Answer::Other(json!({ "lat": 28.6 }));
        assert_eq!(other.preview(40), r#"{"lat":28.6}"#);
    }

    #[test]
    fn test_untagged_deserialization() {
        assert_eq!(
            serde_json::from_value::<Answer>(json!("yes")).unwrap(),
            Answer::from("yes")
        );
        assert_eq!(
            serde_json::from_value::<Answer>(json!(["a", "b"])).unwrap(),
            Answer::Choices(vec!["a".to_string(), "b".to_string()])
        );
        assert_eq!(serde_json::from_value::<Answer>(json!(null)).unwrap(), Answer::none());
        assert_eq!(
            serde_json::from_value::<Answer>(json!(42)).unwrap(),
            Answer::Other(json!(42))
        );
    }
}
