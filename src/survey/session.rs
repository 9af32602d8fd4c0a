use std::sync::Arc;

use serde::Serialize;
use tracing::debug;

use super::{
    Answer, Clock, ParadataRecorder, ResponseLedger, SuggestionChannel, TimingRecord,
    QuestionStore,
};
use crate::config::ParadataConfig;
use crate::prompts::follow_up_prompt;

/// Result of submitting an answer.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitOutcome {
    /// Closed timing record, absent when the question was not open.
    pub record: Option<TimingRecord>,
    /// Whether the answer was written to the ledger.
    pub recorded: bool,
}

/// One respondent's survey context.
///
/// Owns a question store, a paradata recorder, a response ledger and a
/// suggestion channel, all sharing one clock.
#[derive(Debug)]
pub struct SurveySession {
    clock: Arc<dyn Clock>,
    store: QuestionStore,
    paradata: ParadataRecorder,
    ledger: ResponseLedger,
    suggestions: SuggestionChannel,
}

impl SurveySession {
    pub fn new(clock: Arc<dyn Clock>, config: ParadataConfig) -> Self {
        Self {
            store: QuestionStore::new(),
            paradata: ParadataRecorder::new(clock.clone(), config),
            ledger: ResponseLedger::new(clock.clone()),
            suggestions: SuggestionChannel::new(),
            clock,
        }
    }

    pub fn now_ms(&self) -> i64 {
        self.clock.now_ms()
    }

    pub fn store(&self) -> &QuestionStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut QuestionStore {
        &mut self.store
    }

    pub fn paradata(&self) -> &ParadataRecorder {
        &self.paradata
    }

    pub fn paradata_mut(&mut self) -> &mut ParadataRecorder {
        &mut self.paradata
    }

    pub fn ledger(&self) -> &ResponseLedger {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut ResponseLedger {
        &mut self.ledger
    }

    pub fn suggestions(&self) -> &SuggestionChannel {
        &self.suggestions
    }

    pub fn suggestions_mut(&mut self) -> &mut SuggestionChannel {
        &mut self.suggestions
    }

    /// Begin administering the survey.
    pub fn start(&mut self, language: Option<String>, survey_id: Option<String>) {
        self.paradata.set_survey_id(survey_id);
        self.paradata.start_survey(language);
    }

    /// The question became current: open its timer.
    pub fn present_question(&mut self, question_id: &str) -> bool {
        if self.store.get(question_id).is_none() {
            debug!(question_id, "Presenting a question that is not in the store");
        }
        self.paradata.start_question(question_id)
    }

    /// Close the question's timer and keep a non-empty answer in the ledger.
    ///
    /// Submitting for a question that is not open changes nothing.
    pub fn submit_answer(&mut self, question_id: &str, answer: Answer) -> SubmitOutcome {
        let Some(record) = self.paradata.end_question(question_id, &answer) else {
            return SubmitOutcome {
                record: None,
                recorded: false,
            };
        };

        let recorded = !answer.is_empty();
        if recorded {
            let title = self
                .store
                .get(question_id)
                .map(|q| q.title.clone())
                .unwrap_or_else(|| question_id.to_string());
            self.ledger.record_response(question_id, &title, answer);
        }

        SubmitOutcome {
            record: Some(record),
            recorded,
        }
    }

    /// Build a follow-up prompt from the recorded answer and post it to the channel.
    pub fn follow_up_for(&mut self, question_id: &str) -> Option<String> {
        let response = self.ledger.get(question_id)?;
        let prompt = follow_up_prompt(&response.title, &response.answer.preview(200));
        self.suggestions.request_follow_up(prompt.clone());
        Some(prompt)
    }

    /// Start over for a new respondent. Questions are kept.
    pub fn restart(&mut self) {
        self.paradata.reset();
        self.ledger.reset_responses();
        self.suggestions.clear_suggestion();
    }
}
