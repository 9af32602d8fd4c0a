use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{debug, info, warn};

use super::{extract_question_array, mock_candidates, DomainPolicy, Extraction};
use crate::config::IngestionConfig;
use crate::error::{GeneratorError, GeneratorResult};
use crate::generator::{Message, TextGenerator};
use crate::prompts::{generation_request, QUESTION_GENERATION_PROMPT};
use crate::survey::{normalize_title, QuestionCandidate, QuestionKind, QuestionSource, QuestionType};

const DRAFT_SUFFIX: &str = " (AI draft)";

/// How the candidates of an [`IngestionOutcome`] were obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftOrigin {
    /// Parsed from a JSON array in the model text.
    Parsed,
    /// The model text had no usable structure and was wrapped as one draft.
    Unstructured,
    /// Generation failed and local samples were used.
    Mock,
}

/// Candidates ready for a question store, plus feedback for the operator.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IngestionOutcome {
    pub candidates: Vec<QuestionCandidate>,
    /// Candidates dropped because their title was already answered.
    pub removed_duplicates: usize,
    pub domain: Option<String>,
    pub origin: DraftOrigin,
    pub status: String,
}

/// Loosely typed draft item as produced by a model.
///
/// Fields are read one by one so that a single oddly typed field does not
/// cost the whole question.
#[derive(Debug, Default)]
struct DraftItem {
    question_type: Option<String>,
    title: Option<String>,
    options: Vec<Value>,
    required: Option<bool>,
}

impl DraftItem {
    fn from_object(map: &Map<String, Value>) -> Self {
        let title = ["title", "question", "text"]
            .iter()
            .find_map(|key| map.get(*key))
            .and_then(Value::as_str)
            .map(str::to_string);

        let options = match map.get("options") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };

        let required = match map.get("required") {
            Some(Value::Bool(b)) => Some(*b),
            Some(Value::String(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" | "yes" => Some(true),
                "false" | "no" => Some(false),
                _ => None,
            },
            _ => None,
        };

        Self {
            question_type: map.get("type").and_then(Value::as_str).map(str::to_string),
            title,
            options,
            required,
        }
    }
}

/// Turns generator output into bounded, deduplicated question candidates.
#[derive(Debug, Clone)]
pub struct DraftIngestor {
    config: IngestionConfig,
    policy: DomainPolicy,
}

impl DraftIngestor {
    pub fn new(config: IngestionConfig, policy: DomainPolicy) -> Self {
        Self { config, policy }
    }

    pub fn policy(&self) -> &DomainPolicy {
        &self.policy
    }

    /// Ingest a completion produced for `prompt`.
    ///
    /// Candidates whose normalized title is in `answered_titles` are removed and counted.
    pub fn ingest_completion(
        &self,
        prompt: &str,
        completion: &str,
        answered_titles: &HashSet<String>,
    ) -> IngestionOutcome {
        let rule = self.policy.infer(prompt);
        let domain = rule.map(|r| r.domain.clone());
        let default_type = rule.map(|r| r.default_type);

        let extraction = extract_question_array(completion);
        debug!(outcome = extraction.as_str(), "Draft extraction finished");

        let (candidates, origin) = match extraction {
            Extraction::Parsed(items) => {
                let candidates: Vec<QuestionCandidate> = items
                    .into_iter()
                    .filter_map(|item| self.candidate_from_value(item, default_type))
                    .take(self.config.max_candidates)
                    .collect();
                if candidates.is_empty() {
                    debug!("Parsed array held no usable question, keeping the raw text");
                    (vec![self.unstructured(prompt, completion)], DraftOrigin::Unstructured)
                } else {
                    (candidates, DraftOrigin::Parsed)
                }
            }
            Extraction::FencedInvalid { reason } => {
                warn!(reason = %reason, "Fenced JSON in completion did not parse");
                (vec![self.unstructured(prompt, completion)], DraftOrigin::Unstructured)
            }
            Extraction::NoStructure => {
                (vec![self.unstructured(prompt, completion)], DraftOrigin::Unstructured)
            }
        };

        let candidates = tag(candidates, QuestionSource::Ai, domain.as_deref());
        self.finish(candidates, answered_titles, domain, origin, None)
    }

    /// Local samples used when generation failed for `reason`.
    pub fn ingest_failure(
        &self,
        prompt: &str,
        reason: &str,
        answered_titles: &HashSet<String>,
    ) -> IngestionOutcome {
        let domain = self.policy.infer(prompt).map(|r| r.domain.clone());
        let candidates = mock_candidates(prompt, domain.as_deref());
        let status = format!("Generation failed ({}); showing sample questions", reason);
        self.finish(candidates, answered_titles, domain, DraftOrigin::Mock, Some(status))
    }

    /// Ask `generator` for questions about `prompt` and ingest the answer.
    ///
    /// A missing credential is returned as an error. Every other failure
    /// degrades to local samples with the reason in the status.
    pub async fn generate(
        &self,
        generator: &dyn TextGenerator,
        prompt: &str,
        answered_titles: &HashSet<String>,
    ) -> GeneratorResult<IngestionOutcome> {
        let mut avoid: Vec<String> = answered_titles.iter().cloned().collect();
        avoid.sort();
        let messages = vec![
            Message::system(QUESTION_GENERATION_PROMPT),
            Message::user(generation_request(prompt, &avoid)),
        ];

        match generator.generate(messages).await {
            Ok(completion) => Ok(self.ingest_completion(prompt, &completion, answered_titles)),
            Err(GeneratorError::MissingCredential) => Err(GeneratorError::MissingCredential),
            Err(e) => {
                warn!(error = %e, "Question generation failed, using sample questions");
                Ok(self.ingest_failure(prompt, &e.to_string(), answered_titles))
            }
        }
    }

    fn finish(
        &self,
        candidates: Vec<QuestionCandidate>,
        answered_titles: &HashSet<String>,
        domain: Option<String>,
        origin: DraftOrigin,
        status: Option<String>,
    ) -> IngestionOutcome {
        let before = candidates.len();
        let candidates: Vec<QuestionCandidate> = candidates
            .into_iter()
            .filter(|c| !answered_titles.contains(&c.normalized_title()))
            .collect();
        let removed_duplicates = before - candidates.len();

        let status = status.unwrap_or_else(|| {
            format!(
                "Generated {} new questions (removed {} duplicates)",
                candidates.len(),
                removed_duplicates
            )
        });

        info!(
            kept = candidates.len(),
            removed_duplicates,
            domain = ?domain,
            origin = ?origin,
            "Drafts ingested"
        );

        IngestionOutcome {
            candidates,
            removed_duplicates,
            domain,
            origin,
            status,
        }
    }

    fn candidate_from_value(
        &self,
        value: Value,
        default_type: Option<QuestionType>,
    ) -> Option<QuestionCandidate> {
        let item = match value {
            Value::String(title) => DraftItem {
                title: Some(title),
                ..DraftItem::default()
            },
            Value::Object(map) => DraftItem::from_object(&map),
            _ => return None,
        };

        let title = item.title.map(|t| t.trim().to_string()).filter(|t| !t.is_empty())?;

        let options: Vec<String> = item
            .options
            .into_iter()
            .filter_map(|o| match o {
                Value::String(s) => Some(s),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            })
            .map(|o| o.trim().chars().take(self.config.max_option_chars).collect::<String>())
            .filter(|o| !o.is_empty())
            .take(self.config.max_options)
            .collect();

        let mut question_type = item
            .question_type
            .as_deref()
            .map(QuestionType::clamp)
            .unwrap_or(QuestionType::Text);
        if question_type == QuestionType::Text && !options.is_empty() {
            if let Some(remapped) = default_type {
                question_type = remapped;
            }
        }

        Some(QuestionCandidate {
            id: None,
            kind: QuestionKind::new(question_type, options),
            title,
            required: item.required.unwrap_or(false),
            source: None,
            domain: None,
            hi_title: None,
            note: None,
        })
    }

    fn unstructured(&self, prompt: &str, completion: &str) -> QuestionCandidate {
        let note: String = completion.chars().take(self.config.max_note_chars).collect();
        QuestionCandidate::text(format!("{}{}", prompt.trim(), DRAFT_SUFFIX)).with_note(note)
    }
}

impl Default for DraftIngestor {
    fn default() -> Self {
        Self::new(IngestionConfig::default(), DomainPolicy::default())
    }
}

fn tag(
    candidates: Vec<QuestionCandidate>,
    source: QuestionSource,
    domain: Option<&str>,
) -> Vec<QuestionCandidate> {
    candidates
        .into_iter()
        .map(|c| {
            let c = c.with_source(source);
            match domain {
                Some(d) => c.with_domain(d),
                None => c,
            }
        })
        .collect()
}

/// Titles normalized the way the ledger reports them.
pub fn answered_set<I, S>(titles: I) -> HashSet<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    titles.into_iter().map(|t| normalize_title(t.as_ref())).collect()
}
