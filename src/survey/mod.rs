//! Survey core: questions, paradata, responses and adaptive follow-ups.
//!
//! Every component here owns its state slice exclusively and reports ordinary
//! misuse (duplicate titles, unknown ids, double submits) through return
//! values instead of errors. [`SurveySession`] bundles one instance of each
//! component so that several respondents can be served side by side.

mod adaptive;
mod answer;
mod clock;
mod export;
mod ledger;
mod localize;
mod paradata;
mod session;
mod store;

pub use adaptive::*;
pub use answer::*;
pub use clock::*;
pub use export::*;
pub use ledger::*;
pub use localize::*;
pub use paradata::*;
pub use session::*;
pub use store::*;

use serde::{Deserialize, Serialize};

/// Normalize a question title for duplicate detection (trim + lower-case).
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}

/// Supported question types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    /// Free-text answer.
    Text,
    /// Single choice among options.
    Radio,
    /// Any number of options.
    Checkbox,
    /// Single choice rendered as a dropdown.
    MultipleChoice,
}

impl QuestionType {
    /// Get the type name as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Text => "text",
            QuestionType::Radio => "radio",
            QuestionType::Checkbox => "checkbox",
            QuestionType::MultipleChoice => "multiple_choice",
        }
    }

    /// Map a loosely typed name onto a supported type, defaulting to `Text`.
    pub fn clamp(name: &str) -> Self {
        name.parse().unwrap_or(QuestionType::Text)
    }

    /// Whether answers are picked from an option list.
    pub fn has_options(&self) -> bool {
        !matches!(self, QuestionType::Text)
    }
}

impl std::fmt::Display for QuestionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "text" => Ok(QuestionType::Text),
            "radio" => Ok(QuestionType::Radio),
            "checkbox" => Ok(QuestionType::Checkbox),
            "multiple_choice" => Ok(QuestionType::MultipleChoice),
            _ => Err(format!("Unknown question type: {}", s)),
        }
    }
}

/// Question shape, tagged by type. Only choice types carry options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free-text question.
    Text,
    /// Single-choice question.
    Radio {
        /// Selectable options.
        #[serde(default)]
        options: Vec<String>,
    },
    /// Multi-select question.
    Checkbox {
        /// Selectable options.
        #[serde(default)]
        options: Vec<String>,
    },
    /// Dropdown question.
    MultipleChoice {
        /// Selectable options.
        #[serde(default)]
        options: Vec<String>,
    },
}

impl QuestionKind {
    /// Build a kind from a type and an option list. Options are dropped for `Text`.
    pub fn new(question_type: QuestionType, options: Vec<String>) -> Self {
        match question_type {
            QuestionType::Text => QuestionKind::Text,
            QuestionType::Radio => QuestionKind::Radio { options },
            QuestionType::Checkbox => QuestionKind::Checkbox { options },
            QuestionType::MultipleChoice => QuestionKind::MultipleChoice { options },
        }
    }

    /// The discriminant of this kind.
    pub fn question_type(&self) -> QuestionType {
        match self {
            QuestionKind::Text => QuestionType::Text,
            QuestionKind::Radio { .. } => QuestionType::Radio,
            QuestionKind::Checkbox { .. } => QuestionType::Checkbox,
            QuestionKind::MultipleChoice { .. } => QuestionType::MultipleChoice,
        }
    }

    /// Options of a choice question, empty for text.
    pub fn options(&self) -> &[String] {
        match self {
            QuestionKind::Text => &[],
            QuestionKind::Radio { options }
            | QuestionKind::Checkbox { options }
            | QuestionKind::MultipleChoice { options } => options,
        }
    }

    /// Convert to another type, carrying the options over.
    pub fn with_type(self, question_type: QuestionType) -> Self {
        let options = self.options().to_vec();
        QuestionKind::new(question_type, options)
    }

    /// Replace the options, keeping the type.
    pub fn with_options(self, options: Vec<String>) -> Self {
        QuestionKind::new(self.question_type(), options)
    }
}

impl Default for QuestionKind {
    fn default() -> Self {
        QuestionKind::Text
    }
}

/// Where a question came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QuestionSource {
    /// Generated by the question generator.
    #[serde(rename = "AI")]
    Ai,
    /// Loaded from the official question bank.
    #[serde(rename = "Official", alias = "MoSPI")]
    Official,
    /// Added from a builder template.
    Template,
    /// Local sample produced when generation failed.
    Mock,
}

impl QuestionSource {
    /// Get the provenance tag as a string
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionSource::Ai => "AI",
            QuestionSource::Official => "Official",
            QuestionSource::Template => "Template",
            QuestionSource::Mock => "Mock",
        }
    }
}

impl std::fmt::Display for QuestionSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A committed survey question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique question identifier.
    pub id: String,
    /// Type and options.
    #[serde(flatten)]
    pub kind: QuestionKind,
    /// Display title.
    pub title: String,
    /// Whether an answer is mandatory.
    #[serde(default)]
    pub required: bool,
    /// Provenance tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<QuestionSource>,
    /// Coarse topical tag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    /// Cached Hindi title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hi_title: Option<String>,
    /// Raw generator text kept for unstructured drafts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl Question {
    /// Title normalized for duplicate detection.
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }

    /// Question type.
    pub fn question_type(&self) -> QuestionType {
        self.kind.question_type()
    }

    /// Options (empty for text questions).
    pub fn options(&self) -> &[String] {
        self.kind.options()
    }
}

/// An uncommitted question proposal awaiting merge into a [`QuestionStore`].
///
/// Deserialization is lenient: a missing or unknown `type` becomes `text`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "CandidateWire")]
pub struct QuestionCandidate {
    /// Identifier to keep; a fresh one is assigned when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub kind: QuestionKind,
    pub title: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<QuestionSource>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hi_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl QuestionCandidate {
    /// Create a candidate with the given type and title.
    pub fn new(question_type: QuestionType, title: impl Into<String>) -> Self {
        Self {
            id: None,
            kind: QuestionKind::new(question_type, Vec::new()),
            title: title.into(),
            required: false,
            source: None,
            domain: None,
            hi_title: None,
            note: None,
        }
    }

    /// Create a free-text candidate.
    pub fn text(title: impl Into<String>) -> Self {
        Self::new(QuestionType::Text, title)
    }

    /// Set the options (ignored for text candidates).
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.kind = self
            .kind
            .with_options(options.into_iter().map(Into::into).collect());
        self
    }

    /// Mark as required or optional.
    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Set the provenance tag.
    pub fn with_source(mut self, source: QuestionSource) -> Self {
        self.source = Some(source);
        self
    }

    /// Set the domain tag.
    pub fn with_domain(mut self, domain: impl Into<String>) -> Self {
        self.domain = Some(domain.into());
        self
    }

    /// Attach raw text.
    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    /// Keep a specific identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Title normalized for duplicate detection.
    pub fn normalized_title(&self) -> String {
        normalize_title(&self.title)
    }

    /// Commit the candidate under the given id.
    pub fn into_question(self, id: String) -> Question {
        Question {
            id,
            kind: self.kind,
            title: self.title.trim().to_string(),
            required: self.required,
            source: self.source,
            domain: self.domain,
            hi_title: self.hi_title,
            note: self.note,
        }
    }
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CandidateWire {
    #[serde(default)]
    id: Option<String>,
    #[serde(default, rename = "type")]
    question_type: Option<String>,
    #[serde(default)]
    title: String,
    #[serde(default)]
    options: Option<Vec<String>>,
    #[serde(default)]
    required: bool,
    #[serde(default)]
    source: Option<QuestionSource>,
    #[serde(default)]
    domain: Option<String>,
    #[serde(default)]
    hi_title: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

impl From<CandidateWire> for QuestionCandidate {
    fn from(wire: CandidateWire) -> Self {
        let question_type = wire
            .question_type
            .as_deref()
            .map(QuestionType::clamp)
            .unwrap_or(QuestionType::Text);
        Self {
            id: wire.id.filter(|id| !id.trim().is_empty()),
            kind: QuestionKind::new(question_type, wire.options.unwrap_or_default()),
            title: wire.title,
            required: wire.required,
            source: wire.source,
            domain: wire.domain,
            hi_title: wire.hi_title,
            note: wire.note,
        }
    }
}

impl From<Question> for QuestionCandidate {
    fn from(q: Question) -> Self {
        Self {
            id: Some(q.id),
            kind: q.kind,
            title: q.title,
            required: q.required,
            source: q.source,
            domain: q.domain,
            hi_title: q.hi_title,
            note: q.note,
        }
    }
}
