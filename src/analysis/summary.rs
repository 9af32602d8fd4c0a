use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::survey::RecordedResponse;

/// Number of most recent free-text answers considered.
pub const SUMMARY_WINDOW: usize = 25;

const NO_RESPONSES: &str = "No open-ended responses yet.";

/// A generated digest of recent free-text answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseSummary {
    pub id: String,
    pub text: String,
    pub created_at: i64,
    pub sample_size: usize,
}

/// Placeholder summarizer over the response ledger.
///
/// Keeps its summaries newest first.
#[derive(Debug, Clone, Default)]
pub struct Summarizer {
    delay: Duration,
    summaries: Vec<ResponseSummary>,
}

impl Summarizer {
    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            summaries: Vec::new(),
        }
    }

    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Store a summary in front of the earlier ones.
    pub fn push(&mut self, summary: ResponseSummary) {
        self.summaries.insert(0, summary);
    }

    pub fn summaries(&self) -> &[ResponseSummary] {
        &self.summaries
    }

    pub fn clear(&mut self) {
        self.summaries.clear();
    }
}

/// Summarize the last [`SUMMARY_WINDOW`] non-empty text answers of `ordered`.
pub fn summarize_responses(ordered: &[RecordedResponse], now_ms: i64) -> ResponseSummary {
    let texts: Vec<&str> = ordered
        .iter()
        .filter_map(|r| r.answer.as_text())
        .filter(|t| !t.is_empty())
        .collect();
    let window = &texts[texts.len().saturating_sub(SUMMARY_WINDOW)..];

    let text = if window.is_empty() {
        NO_RESPONSES.to_string()
    } else {
        let themes: Vec<String> = window
            .iter()
            .take(3)
            .map(|answer| answer.split(' ').take(3).collect::<Vec<_>>().join(" "))
            .collect();
        format!("Top themes: {}... (auto summary placeholder)", themes.join("; "))
    };

    debug!(sample_size = window.len(), "Responses summarized");
    ResponseSummary {
        id: now_ms.to_string(),
        text,
        created_at: now_ms,
        sample_size: window.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::{Answer, ManualClock, ResponseLedger};
    use std::sync::Arc;

    fn ledger_with(answers: &[Answer]) -> ResponseLedger {
        let clock = Arc::new(ManualClock::new(0));
        let mut ledger = ResponseLedger::new(clock.clone());
        for (i, answer) in answers.iter().enumerate() {
            clock.advance(1);
            ledger.record_response(&format!("q{}", i), &format!("Q{}", i), answer.clone());
        }
        ledger
    }

    #[test]
    fn test_no_open_responses() {
        let ledger = ledger_with(&[Answer::Choices(vec!["a".to_string()])]);
        let summary = summarize_responses(&ledger.ordered(), 7);
        assert_eq!(summary.text, "No open-ended responses yet.");
        assert_eq!(summary.sample_size, 0);
        assert_eq!(summary.id, "7");
    }

    #[test]
    fn test_top_themes() {
        let ledger = ledger_with(&[
            Answer::from("Rising food prices hurt us"),
            Answer::from("Need better roads"),
            Answer::from(""),
            Answer::from("Water supply is irregular here"),
            Answer::from("More jobs please"),
        ]);
        let summary = summarize_responses(&ledger.ordered(), 0);
        assert_eq!(
            summary.text,
            "Top themes: Rising food prices; Need better roads; Water supply is... (auto summary placeholder)"
        );
        assert_eq!(summary.sample_size, 4);
    }

    #[test]
    fn test_window_keeps_latest_answers() {
        let answers: Vec<Answer> = (0..30).map(|i| Answer::from(format!("answer {}", i))).collect();
        let ledger = ledger_with(&answers);
        let summary = summarize_responses(&ledger.ordered(), 0);
        assert_eq!(summary.sample_size, 25);
        assert!(summary.text.starts_with("Top themes: answer 5; answer 6; answer 7"));
    }

    #[test]
    fn test_summarizer_keeps_newest_first() {
        let mut summarizer = Summarizer::new(Duration::ZERO);
        summarizer.push(summarize_responses(&[], 1));
        summarizer.push(summarize_responses(&[], 2));
        assert_eq!(summarizer.summaries()[0].created_at, 2);
        summarizer.clear();
        assert!(summarizer.summaries().is_empty());
    }
}
