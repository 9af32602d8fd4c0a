use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use super::{
    ParadataSummary, QualityCounters, QualityFlag, Question, QuestionCandidate, QuestionKind,
    QuestionSource, SurveySession,
};

/// Version of the interchange format written by [`SurveyExport::build`].
pub const EXPORT_VERSION: u32 = 1;

const DEFAULT_TITLE: &str = "Untitled Survey";

/// Survey interchange document: questions plus optional paradata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SurveyExport {
    pub version: u32,
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// ISO-8601 timestamp with millisecond precision.
    pub created_at: String,
    pub question_count: usize,
    pub questions: Vec<ExportedQuestion>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paradata: Option<ExportedParadata>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedQuestion {
    pub id: String,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<QuestionSource>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedParadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_duration_ms: Option<i64>,
    pub quality: QualityCounters,
    pub device_platform: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consent_hash: Option<String>,
    pub records: Vec<ExportedRecord>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedRecord {
    pub question_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub flags: Vec<QualityFlag>,
}

impl From<&Question> for ExportedQuestion {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id.clone(),
            kind: q.kind.clone(),
            title: q.title.clone(),
            required: q.required,
            source: q.source,
        }
    }
}

impl From<&ParadataSummary> for ExportedParadata {
    fn from(summary: &ParadataSummary) -> Self {
        Self {
            started_at: summary.started_at,
            completed_at: summary.completed_at,
            total_duration_ms: summary.total_duration_ms,
            quality: summary.quality,
            device_platform: summary.device_platform.clone(),
            consent_at: summary.consent_at,
            consent_hash: summary.consent_hash.clone(),
            records: summary
                .records
                .iter()
                .map(|r| ExportedRecord {
                    question_id: r.question_id.clone(),
                    duration_ms: r.duration_ms,
                    flags: r.flags.clone(),
                })
                .collect(),
        }
    }
}

impl SurveyExport {
    /// Assemble an export document at `now_ms`.
    ///
    /// Paradata is included only when at least one question was timed.
    pub fn build(
        questions: &[Question],
        paradata: &ParadataSummary,
        title: Option<&str>,
        description: Option<&str>,
        now_ms: i64,
    ) -> Self {
        let created_at = DateTime::<Utc>::from_timestamp_millis(now_ms)
            .unwrap_or_default()
            .to_rfc3339_opts(SecondsFormat::Millis, true);

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(DEFAULT_TITLE);

        Self {
            version: EXPORT_VERSION,
            id: format!("survey_{}", now_ms),
            title: title.to_string(),
            description: description.unwrap_or_default().to_string(),
            created_at,
            question_count: questions.len(),
            questions: questions.iter().map(ExportedQuestion::from).collect(),
            paradata: (!paradata.records.is_empty()).then(|| ExportedParadata::from(paradata)),
        }
    }

    /// Export the session's current questions and paradata.
    pub fn from_session(session: &SurveySession, title: Option<&str>, description: Option<&str>) -> Self {
        Self::build(
            session.store().questions(),
            &session.paradata().summary(),
            title,
            description,
            session.now_ms(),
        )
    }

    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    /// Turn the exported questions back into candidates for a store.
    pub fn into_candidates(self) -> Vec<QuestionCandidate> {
        self.questions
            .into_iter()
            .map(|q| QuestionCandidate {
                id: Some(q.id),
                kind: q.kind,
                title: q.title,
                required: q.required,
                source: q.source,
                domain: None,
                hi_title: None,
                note: None,
            })
            .collect()
    }
}
