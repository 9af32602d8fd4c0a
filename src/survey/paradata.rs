use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{Answer, Clock};
use crate::config::ParadataConfig;

/// Quality flag attached to a closed timing record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityFlag {
    /// Answered faster than the configured threshold.
    TooFast,
    /// Closed with an empty answer.
    Empty,
}

/// Timing of one question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingRecord {
    pub question_id: String,
    pub start_time: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<QualityFlag>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_preview: Option<String>,
}

impl TimingRecord {
    fn open(question_id: &str, start_time: i64) -> Self {
        Self {
            question_id: question_id.to_string(),
            start_time,
            end_time: None,
            duration_ms: None,
            flags: Vec::new(),
            response_preview: None,
        }
    }

    /// Whether the record has been closed.
    pub fn is_closed(&self) -> bool {
        self.end_time.is_some()
    }

    /// Whether the record carries the given flag.
    pub fn has_flag(&self, flag: QualityFlag) -> bool {
        self.flags.contains(&flag)
    }
}

/// Per-question timing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimingState {
    Idle,
    Open,
    Closed,
}

/// Aggregate quality counters over closed records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityCounters {
    /// Records carrying at least one flag.
    pub flagged: usize,
    /// Records answered too fast.
    pub fast: usize,
}

/// Read-only snapshot of the survey's paradata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParadataSummary {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    pub device_platform: String,
    #[serde(
        default,
        rename = "deviceOSVersion",
        skip_serializing_if = "Option::is_none"
    )]
    pub device_os_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<i64>,
    /// All records, ordered by start time.
    pub records: Vec<TimingRecord>,
    pub quality: QualityCounters,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_hash: Option<String>,
}

/// 32-bit multiply-by-31 rolling hash over the UTF-16 code units of `payload`.
///
/// This is an audit fingerprint. It is not collision resistant and does not
/// prove that a consent record was left untouched.
pub fn consent_fingerprint(payload: &str) -> u32 {
    payload
        .encode_utf16()
        .fold(0u32, |hash, unit| hash.wrapping_mul(31).wrapping_add(u32::from(unit)))
}

/// Per-question timing state machine plus survey lifecycle.
#[derive(Debug)]
pub struct ParadataRecorder {
    clock: Arc<dyn Clock>,
    config: ParadataConfig,
    records: HashMap<String, TimingRecord>,
    survey_id: Option<String>,
    language: Option<String>,
    started_at: Option<i64>,
    completed_at: Option<i64>,
    total_duration_ms: Option<i64>,
    consent_at: Option<i64>,
    consent_hash: Option<String>,
}

impl ParadataRecorder {
    /// Create a recorder with no survey in progress.
    pub fn new(clock: Arc<dyn Clock>, config: ParadataConfig) -> Self {
        Self {
            clock,
            config,
            records: HashMap::new(),
            survey_id: None,
            language: None,
            started_at: None,
            completed_at: None,
            total_duration_ms: None,
            consent_at: None,
            consent_hash: None,
        }
    }

    /// Begin a survey: drop all question records and stamp start time and language.
    pub fn start_survey(&mut self, language: Option<String>) {
        self.records.clear();
        self.started_at = Some(self.clock.now_ms());
        self.completed_at = None;
        self.total_duration_ms = None;
        debug!(language = ?language, "Survey started");
        self.language = language;
    }

    /// Tag the summary with the survey being administered.
    pub fn set_survey_id(&mut self, survey_id: Option<String>) {
        self.survey_id = survey_id;
    }

    /// Stamp completion time and total duration.
    ///
    /// Completion is never stamped before the start, so a wall clock stepped
    /// backwards yields a zero duration.
    pub fn complete_survey(&mut self) {
        let now = self.clock.now_ms();
        let completed = self.started_at.map_or(now, |start| now.max(start));
        self.completed_at = Some(completed);
        self.total_duration_ms = self.started_at.map(|start| completed - start);
        debug!(total_duration_ms = ?self.total_duration_ms, "Survey completed");
    }

    /// Open timing for a question.
    ///
    /// A no-op while the question is already open. A closed question is
    /// reopened with a fresh record. Returns whether a record was opened.
    pub fn start_question(&mut self, question_id: &str) -> bool {
        if self.state(question_id) == TimingState::Open {
            debug!(question_id, "Question already open, ignoring start");
            return false;
        }
        let record = TimingRecord::open(question_id, self.clock.now_ms());
        self.records.insert(question_id.to_string(), record);
        true
    }

    /// Close timing for a question and compute its flags.
    ///
    /// Returns the closed record, or `None` if the question was never opened
    /// or is already closed. The end time is clamped to the start time, so a
    /// wall clock stepped backwards records a zero duration.
    pub fn end_question(&mut self, question_id: &str, answer: &Answer) -> Option<TimingRecord> {
        let now = self.clock.now_ms();
        let record = match self.records.get_mut(question_id) {
            Some(record) if !record.is_closed() => record,
            Some(_) => {
                debug!(question_id, "Question already closed, ignoring end");
                return None;
            }
            None => {
                debug!(question_id, "Question never opened, ignoring end");
                return None;
            }
        };

        let end = now.max(record.start_time);
        let duration = end - record.start_time;
        record.end_time = Some(end);
        record.duration_ms = Some(duration);

        record.flags.clear();
        if duration < self.config.too_fast_ms {
            record.flags.push(QualityFlag::TooFast);
        }
        if answer.is_empty() {
            record.flags.push(QualityFlag::Empty);
        }
        record.response_preview = Some(answer.preview(self.config.preview_chars));

        debug!(
            question_id,
            duration_ms = duration,
            flags = ?record.flags,
            "Question closed"
        );
        Some(record.clone())
    }

    /// Store a fingerprint of the consent payload with the current time.
    pub fn record_consent(&mut self, payload: &str) -> String {
        let hash = format!("{:x}", consent_fingerprint(payload));
        self.consent_at = Some(self.clock.now_ms());
        self.consent_hash = Some(hash.clone());
        hash
    }

    /// Forget everything, including consent.
    pub fn reset(&mut self) {
        self.records.clear();
        self.survey_id = None;
        self.language = None;
        self.started_at = None;
        self.completed_at = None;
        self.total_duration_ms = None;
        self.consent_at = None;
        self.consent_hash = None;
    }

    /// Timing state of one question.
    pub fn state(&self, question_id: &str) -> TimingState {
        match self.records.get(question_id) {
            None => TimingState::Idle,
            Some(record) if record.is_closed() => TimingState::Closed,
            Some(_) => TimingState::Open,
        }
    }

    /// The record of one question.
    pub fn record(&self, question_id: &str) -> Option<&TimingRecord> {
        self.records.get(question_id)
    }

    /// Snapshot the summary. Quality counters are recomputed from the closed records.
    pub fn summary(&self) -> ParadataSummary {
        let mut records: Vec<TimingRecord> = self.records.values().cloned().collect();
        records.sort_by(|a, b| {
            a.start_time
                .cmp(&b.start_time)
                .then_with(|| a.question_id.cmp(&b.question_id))
        });

        let closed = records.iter().filter(|r| r.is_closed());
        let quality = closed.fold(QualityCounters::default(), |mut q, r| {
            if r.has_flag(QualityFlag::TooFast) {
                q.fast += 1;
            }
            if !r.flags.is_empty() {
                q.flagged += 1;
            }
            q
        });

        ParadataSummary {
            survey_id: self.survey_id.clone(),
            language: self.language.clone(),
            device_platform: self.config.device_platform.clone(),
            device_os_version: self.config.device_os_version.clone(),
            started_at: self.started_at,
            completed_at: self.completed_at,
            total_duration_ms: self.total_duration_ms,
            records,
            quality,
            consent_at: self.consent_at,
            consent_hash: self.consent_hash.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::survey::ManualClock;

    fn recorder() -> (ParadataRecorder, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(1_000));
        let recorder = ParadataRecorder::new(clock.clone(), ParadataConfig::default());
        (recorder, clock)
    }

    #[test]
    fn test_fast_empty_answer_is_flagged_twice() {
        let (mut rec, clock) = recorder();
        rec.start_survey(Some("Hindi".to_string()));
        assert!(rec.start_question("q1"));
        clock.advance(800);

        let closed = rec.end_question("q1", &Answer::from("")).unwrap();
        assert_eq!(closed.duration_ms, Some(800));
        assert!(closed.has_flag(QualityFlag::TooFast));
        assert!(closed.has_flag(QualityFlag::Empty));

        let summary = rec.summary();
        assert_eq!(summary.language.as_deref(), Some("Hindi"));
        assert_eq!(summary.quality, QualityCounters { flagged: 1, fast: 1 });
    }

    #[test]
    fn test_slow_answer_has_no_flags() {
        let (mut rec, clock) = recorder();
        rec.start_question("q1");
        clock.advance(1500);
        let closed = rec.end_question("q1", &Answer::from("Farmer")).unwrap();
        assert!(closed.flags.is_empty());
        assert_eq!(closed.response_preview.as_deref(), Some("Farmer"));
        assert_eq!(rec.summary().quality, QualityCounters::default());
    }

    #[test]
    fn test_duration_matches_recorded_timestamps() {
        let (mut rec, clock) = recorder();
        rec.start_question("q1");
        clock.advance(2_345);
        let closed = rec.end_question("q1", &Answer::from("x")).unwrap();
        let end = closed.end_time.unwrap();
        assert_eq!(closed.duration_ms, Some(end - closed.start_time));
        assert!(closed.duration_ms.unwrap() >= 0);
    }

    #[test]
    fn test_clock_stepping_back_records_zero_duration() {
        let (mut rec, clock) = recorder();
        rec.start_survey(None);
        clock.advance(5_000);
        rec.start_question("q1");
        clock.set(2_000);

        let closed = rec.end_question("q1", &Answer::from("Farmer")).unwrap();
        assert_eq!(closed.duration_ms, Some(0));
        assert_eq!(closed.end_time, Some(closed.start_time));
        assert!(closed.has_flag(QualityFlag::TooFast));

        clock.set(0);
        rec.complete_survey();
        let summary = rec.summary();
        assert_eq!(summary.total_duration_ms, Some(0));
        assert_eq!(summary.completed_at, summary.started_at);
    }

    #[test]
    fn test_end_without_start_is_noop() {
        let (mut rec, _) = recorder();
        let before = rec.summary();
        assert!(rec.end_question("ghost", &Answer::from("x")).is_none());
        assert_eq!(rec.summary(), before);
    }

    #[test]
    fn test_double_start_keeps_first_timer() {
        let (mut rec, clock) = recorder();
        rec.start_question("q1");
        let first_start = rec.record("q1").unwrap().start_time;
        clock.advance(500);
        assert!(!rec.start_question("q1"));
        assert_eq!(rec.record("q1").unwrap().start_time, first_start);
    }

    #[test]
    fn test_double_end_is_noop() {
        let (mut rec, clock) = recorder();
        rec.start_question("q1");
        clock.advance(2_000);
        assert!(rec.end_question("q1", &Answer::from("a")).is_some());
        clock.advance(5_000);
        assert!(rec.end_question("q1", &Answer::from("")).is_none());
        let record = rec.record("q1").unwrap();
        assert_eq!(record.duration_ms, Some(2_000));
        assert!(record.flags.is_empty());
    }

    #[test]
    fn test_reopen_after_close_replaces_record() {
        let (mut rec, clock) = recorder();
        rec.start_question("q1");
        clock.advance(100);
        rec.end_question("q1", &Answer::from("a"));
        assert_eq!(rec.summary().quality.fast, 1);

        clock.advance(100);
        assert!(rec.start_question("q1"));
        assert_eq!(rec.state("q1"), TimingState::Open);
        // The open record no longer counts
        assert_eq!(rec.summary().quality.fast, 0);
        assert_eq!(rec.summary().records.len(), 1);
    }

    #[test]
    fn test_state_machine() {
        let (mut rec, clock) = recorder();
        assert_eq!(rec.state("q1"), TimingState::Idle);
        rec.start_question("q1");
        assert_eq!(rec.state("q1"), TimingState::Open);
        clock.advance(10);
        rec.end_question("q1", &Answer::none());
        assert_eq!(rec.state("q1"), TimingState::Closed);
    }

    #[test]
    fn test_records_ordered_by_start() {
        let (mut rec, clock) = recorder();
        rec.start_question("b");
        clock.advance(10);
        rec.start_question("a");
        let ids: Vec<_> = rec
            .summary()
            .records
            .into_iter()
            .map(|r| r.question_id)
            .collect();
        assert_eq!(ids, ["b", "a"]);
    }

    #[test]
    fn test_quality_counts_recomputed_from_records() {
        let (mut rec, clock) = recorder();
        for (id, wait, answer) in [("q1", 200, "a"), ("q2", 3_000, ""), ("q3", 3_000, "ok")] {
            rec.start_question(id);
            clock.advance(wait);
            rec.end_question(id, &Answer::from(answer));
        }
        let summary = rec.summary();
        assert_eq!(summary.quality.fast, 1);
        assert_eq!(summary.quality.flagged, 2);
    }

    #[test]
    fn test_survey_lifecycle() {
        let (mut rec, clock) = recorder();
        rec.record_consent("agree");
        rec.start_question("stale");
        rec.start_survey(None);
        assert!(rec.summary().records.is_empty());
        clock.advance(60_000);
        rec.complete_survey();

        let summary = rec.summary();
        assert_eq!(summary.started_at, Some(1_000));
        assert_eq!(summary.completed_at, Some(61_000));
        assert_eq!(summary.total_duration_ms, Some(60_000));
        // Consent survives a survey start
        assert!(summary.consent_hash.is_some());

        rec.reset();
        let summary = rec.summary();
        assert!(summary.started_at.is_none());
        assert!(summary.consent_hash.is_none());
        assert_eq!(summary.device_platform, std::env::consts::OS);
    }

    #[test]
    fn test_complete_without_start_has_no_duration() {
        let (mut rec, _) = recorder();
        rec.complete_survey();
        assert!(rec.summary().completed_at.is_some());
        assert!(rec.summary().total_duration_ms.is_none());
    }

    #[test]
    fn test_consent_fingerprint() {
        assert_eq!(consent_fingerprint(""), 0);
        assert_eq!(consent_fingerprint("a"), 97);
        assert_eq!(consent_fingerprint("ab"), 97 * 31 + 98);
        // Wraps at 32 bits instead of overflowing
        let long = "consent granted by respondent ".repeat(20);
        let _ = consent_fingerprint(&long);

        let (mut rec, clock) = recorder();
        clock.set(42);
        assert_eq!(rec.record_consent("ab"), format!("{:x}", 97 * 31 + 98));
        assert_eq!(rec.summary().consent_at, Some(42));
    }

    #[test]
    fn test_preview_is_bounded() {
        let (mut rec, clock) = recorder();
        rec.start_question("q1");
        clock.advance(2_000);
        let long = "x".repeat(100);
        let closed = rec.end_question("q1", &Answer::from(long)).unwrap();
        assert_eq!(closed.response_preview.unwrap().len(), 40);
    }

    #[test]
    fn test_summary_serializes_camel_case() {
        let (mut rec, clock) = recorder();
        rec.start_survey(Some("English".to_string()));
        rec.start_question("q1");
        clock.advance(100);
        rec.end_question("q1", &Answer::from(""));
        let value = serde_json::to_value(rec.summary()).unwrap();
        assert_eq!(value["records"][0]["questionId"], "q1");
        assert_eq!(value["records"][0]["durationMs"], 100);
        assert_eq!(value["records"][0]["flags"][0], "too_fast");
        assert_eq!(value["quality"]["fast"], 1);
        assert!(value.get("startedAt").is_some());
    }
}
