use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::{normalize_title, Answer, Clock};

/// Latest answer to one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedResponse {
    pub question_id: String,
    /// Title at the time the answer was given.
    pub title: String,
    pub answer: Answer,
    pub answered_at: i64,
    #[serde(skip)]
    seq: u64,
}

/// Latest-write-wins store of answers, keyed by question id.
#[derive(Debug)]
pub struct ResponseLedger {
    clock: Arc<dyn Clock>,
    responses: HashMap<String, RecordedResponse>,
    next_seq: u64,
}

impl ResponseLedger {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            responses: HashMap::new(),
            next_seq: 0,
        }
    }

    /// Upsert the answer for a question.
    pub fn record_response(&mut self, question_id: &str, title: &str, answer: Answer) {
        self.next_seq += 1;
        let response = RecordedResponse {
            question_id: question_id.to_string(),
            title: title.to_string(),
            answer,
            answered_at: self.clock.now_ms(),
            seq: self.next_seq,
        };
        self.responses.insert(question_id.to_string(), response);
    }

    pub fn get(&self, question_id: &str) -> Option<&RecordedResponse> {
        self.responses.get(question_id)
    }

    pub fn len(&self) -> usize {
        self.responses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.responses.is_empty()
    }

    /// All responses, oldest answer first. Equal timestamps keep write order.
    pub fn ordered(&self) -> Vec<RecordedResponse> {
        let mut ordered: Vec<RecordedResponse> = self.responses.values().cloned().collect();
        ordered.sort_by_key(|r| (r.answered_at, r.seq));
        ordered
    }

    /// Normalized titles of every answered question.
    pub fn answered_titles(&self) -> HashSet<String> {
        self.responses
            .values()
            .map(|r| normalize_title(&r.title))
            .collect()
    }

    pub fn reset_responses(&mut self) {
        self.responses.clear();
    }
}
