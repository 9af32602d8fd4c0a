use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use super::{normalize_title, Question, QuestionCandidate, QuestionKind, QuestionType};

/// Outcome of a batch insert.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddResult {
    /// Candidates appended to the store.
    pub added: usize,
    /// Candidates rejected because their normalized title already existed.
    pub duplicates: usize,
    /// Candidates in the batch.
    pub total: usize,
    /// Ids of the appended questions, in batch order.
    pub ids_added: Vec<String>,
}

/// Outcome of an in-place update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateOutcome {
    /// The question was changed.
    Updated,
    /// No question has that id.
    NotFound,
    /// The new title collides with another question.
    DuplicateTitle,
    /// The new title is blank.
    EmptyTitle,
}

/// Field-wise patch for [`QuestionStore::update_question`]. Absent fields are kept.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuestionPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub question_type: Option<QuestionType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hi_title: Option<String>,
}

impl QuestionPatch {
    fn apply(self, question: &mut Question) {
        if let Some(title) = self.title {
            question.title = title.trim().to_string();
        }
        if let Some(question_type) = self.question_type {
            question.kind = std::mem::take(&mut question.kind).with_type(question_type);
        }
        if let Some(options) = self.options {
            question.kind = std::mem::take(&mut question.kind).with_options(options);
        }
        if let Some(required) = self.required {
            question.required = required;
        }
        if let Some(domain) = self.domain {
            question.domain = Some(domain);
        }
        if let Some(hi_title) = self.hi_title {
            question.hi_title = Some(hi_title);
        }
    }
}

/// A transient edit of one committed question.
///
/// Obtained from [`QuestionStore::begin_edit`]. The committed question is left
/// untouched until [`QuestionStore::commit_edit`]; dropping the edit discards it.
#[derive(Debug, Clone, PartialEq)]
pub struct QuestionEdit {
    question_id: String,
    /// Title in progress.
    pub title: String,
    /// Options in progress (ignored for text questions).
    pub options: Vec<String>,
    /// Required flag in progress.
    pub required: bool,
}

impl QuestionEdit {
    /// Id of the question being edited.
    pub fn question_id(&self) -> &str {
        &self.question_id
    }
}

/// Ordered list of the questions in the survey being built.
///
/// Normalized titles are unique across the store at all times.
#[derive(Debug, Clone, Default)]
pub struct QuestionStore {
    questions: Vec<Question>,
    recently_added: HashSet<String>,
    domain_counts: HashMap<String, usize>,
}

impl QuestionStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current questions in survey order.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Look up a question by id.
    pub fn get(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    /// Number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Whether the store has no questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Ids appended by the latest insert that added anything.
    pub fn recently_added(&self) -> &HashSet<String> {
        &self.recently_added
    }

    /// Drop the highlight set once the caller's display delay has passed.
    pub fn clear_recently_added(&mut self) {
        self.recently_added.clear();
    }

    /// Append candidates whose normalized title is new to the store and to the batch.
    ///
    /// Blank titles are skipped without being counted as duplicates.
    pub fn add_questions<I>(&mut self, candidates: I) -> AddResult
    where
        I: IntoIterator<Item = QuestionCandidate>,
    {
        let mut seen: HashSet<String> = self.questions.iter().map(|q| q.normalized_title()).collect();
        let mut result = AddResult::default();

        for candidate in candidates {
            result.total += 1;

            let key = candidate.normalized_title();
            if key.is_empty() {
                debug!("Skipping candidate with blank title");
                continue;
            }
            if !seen.insert(key) {
                debug!(title = %candidate.title, "Duplicate question title rejected");
                result.duplicates += 1;
                continue;
            }

            let id = match candidate.id.as_deref() {
                Some(id) if !self.contains_id(id) => id.to_string(),
                _ => Uuid::new_v4().to_string(),
            };
            self.questions.push(candidate.into_question(id.clone()));
            result.ids_added.push(id);
            result.added += 1;
        }

        if !result.ids_added.is_empty() {
            self.recently_added = result.ids_added.iter().cloned().collect();
        }

        debug!(
            added = result.added,
            duplicates = result.duplicates,
            total = result.total,
            "Questions merged into store"
        );
        result
    }

    /// Insert a single candidate.
    pub fn add_question(&mut self, candidate: QuestionCandidate) -> AddResult {
        self.add_questions(std::iter::once(candidate))
    }

    /// Remove a question by id. Returns whether anything was removed.
    pub fn remove_question(&mut self, id: &str) -> bool {
        let before = self.questions.len();
        self.questions.retain(|q| q.id != id);
        self.recently_added.remove(id);
        before != self.questions.len()
    }

    /// Shallow-merge `patch` into the question with the given id.
    pub fn update_question(&mut self, id: &str, patch: QuestionPatch) -> UpdateOutcome {
        let Some(index) = self.position(id) else {
            return UpdateOutcome::NotFound;
        };

        if let Some(title) = patch.title.as_deref() {
            let key = normalize_title(title);
            if key.is_empty() {
                return UpdateOutcome::EmptyTitle;
            }
            if self.title_taken(&key, id) {
                return UpdateOutcome::DuplicateTitle;
            }
        }

        patch.apply(&mut self.questions[index]);
        UpdateOutcome::Updated
    }

    /// Apply `mutator` to every question.
    ///
    /// Ids are preserved. A result whose title would collide with another
    /// question is discarded and the original kept. Returns how many questions changed.
    pub fn update_questions<F>(&mut self, mut mutator: F) -> usize
    where
        F: FnMut(&Question) -> Question,
    {
        let mut changed = 0;
        for index in 0..self.questions.len() {
            let current = &self.questions[index];
            let mut updated = mutator(current);
            updated.id = current.id.clone();

            if updated == *current {
                continue;
            }

            let key = updated.normalized_title();
            if key != current.normalized_title() && (key.is_empty() || self.title_taken(&key, &current.id)) {
                debug!(id = %current.id, "Bulk update would break title uniqueness, keeping original");
                continue;
            }

            self.questions[index] = updated;
            changed += 1;
        }
        changed
    }

    /// Move the question at `from` to position `to`.
    ///
    /// An out-of-range `from` is rejected; `to` is clamped to the last position.
    pub fn reorder_questions(&mut self, from: usize, to: usize) -> bool {
        if from >= self.questions.len() {
            debug!(from, len = self.questions.len(), "Reorder source out of range");
            return false;
        }
        let item = self.questions.remove(from);
        let to = to.min(self.questions.len());
        self.questions.insert(to, item);
        true
    }

    /// Start editing a question without touching the committed copy.
    pub fn begin_edit(&self, id: &str) -> Option<QuestionEdit> {
        self.get(id).map(|q| QuestionEdit {
            question_id: q.id.clone(),
            title: q.title.clone(),
            options: q.options().to_vec(),
            required: q.required,
        })
    }

    /// Apply an edit atomically.
    pub fn commit_edit(&mut self, edit: QuestionEdit) -> UpdateOutcome {
        let has_options = match self.get(&edit.question_id) {
            Some(q) => !matches!(q.kind, QuestionKind::Text),
            None => return UpdateOutcome::NotFound,
        };
        let patch = QuestionPatch {
            title: Some(edit.title),
            options: has_options.then_some(edit.options),
            required: Some(edit.required),
            ..QuestionPatch::default()
        };
        self.update_question(&edit.question_id, patch)
    }

    /// Count a question added for `domain`.
    pub fn increment_domain(&mut self, domain: Option<&str>) {
        if let Some(domain) = domain.filter(|d| !d.is_empty()) {
            *self.domain_counts.entry(domain.to_string()).or_insert(0) += 1;
        }
    }

    /// Per-domain counters.
    pub fn domain_counts(&self) -> &HashMap<String, usize> {
        &self.domain_counts
    }

    /// Remove all questions.
    pub fn reset(&mut self) {
        self.questions.clear();
        self.recently_added.clear();
    }

    fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id == id)
    }

    fn contains_id(&self, id: &str) -> bool {
        self.position(id).is_some()
    }

    fn title_taken(&self, key: &str, except_id: &str) -> bool {
        self.questions
            .iter()
            .any(|q| q.id != except_id && q.normalized_title() == key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn age_question() -> QuestionCandidate {
        QuestionCandidate::new(QuestionType::Radio, "What is your age group?")
            .with_options(["18-25", "26-35"])
            .with_required(true)
    }

    fn store_with(titles: &[&str]) -> QuestionStore {
        let mut store = QuestionStore::new();
        store.add_questions(titles.iter().map(|t| QuestionCandidate::text(*t)));
        store
    }

    #[test]
    fn test_add_then_duplicate() {
        let mut store = QuestionStore::new();

        let first = store.add_questions(vec![age_question()]);
        assert_eq!((first.added, first.duplicates, first.total), (1, 0, 1));
        assert_eq!(first.ids_added.len(), 1);

        let second = store.add_questions(vec![age_question()]);
        assert_eq!((second.added, second.duplicates, second.total), (0, 1, 1));
        assert!(second.ids_added.is_empty());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_duplicate_within_batch() {
        let mut store = QuestionStore::new();
        let result = store.add_questions(vec![age_question(), age_question()]);
        assert_eq!(result.added, 1);
        assert_eq!(result.duplicates, 1);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn test_duplicate_detection_ignores_case_and_whitespace() {
        let mut store = store_with(&["What is your age group?"]);
        let result = store.add_question(QuestionCandidate::text("  what is your AGE GROUP?  "));
        assert_eq!(result.duplicates, 1);
        assert_eq!(result.total, 1);
    }

    #[test]
    fn test_blank_titles_are_skipped() {
        let mut store = QuestionStore::new();
        let result = store.add_questions(vec![QuestionCandidate::text("   "), age_question()]);
        assert_eq!(result.added, 1);
        assert_eq!(result.duplicates, 0);
        assert_eq!(result.total, 2);
    }

    #[test]
    fn test_ids_kept_or_assigned() {
        let mut store = QuestionStore::new();
        let result = store.add_questions(vec![
            QuestionCandidate::text("A").with_id("keep-me"),
            QuestionCandidate::text("B").with_id("keep-me"),
            QuestionCandidate::text("C"),
        ]);
        assert_eq!(result.ids_added[0], "keep-me");
        assert_ne!(result.ids_added[1], "keep-me");
        assert!(!result.ids_added[2].is_empty());
        let unique: HashSet<_> = store.questions().iter().map(|q| q.id.clone()).collect();
        assert_eq!(unique.len(), 3);
    }

    #[test]
    fn test_recently_added_tracks_last_batch() {
        let mut store = QuestionStore::new();
        let first = store.add_question(QuestionCandidate::text("A"));
        assert!(store.recently_added().contains(&first.ids_added[0]));

        let second = store.add_question(QuestionCandidate::text("B"));
        assert_eq!(store.recently_added().len(), 1);
        assert!(store.recently_added().contains(&second.ids_added[0]));

        // A batch of only duplicates leaves the highlight alone
        store.add_question(QuestionCandidate::text("b"));
        assert!(store.recently_added().contains(&second.ids_added[0]));

        store.clear_recently_added();
        assert!(store.recently_added().is_empty());
    }

    #[test]
    fn test_batch_order_is_preserved() {
        let store = store_with(&["one", "two", "three"]);
        let titles: Vec<_> = store.questions().iter().map(|q| q.title.as_str()).collect();
        assert_eq!(titles, ["one", "two", "three"]);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let mut store = store_with(&["A"]);
        let id = store.questions()[0].id.clone();
        assert!(store.remove_question(&id));
        assert!(!store.remove_question(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn test_update_question_outcomes() {
        let mut store = store_with(&["A", "B"]);
        let id_a = store.questions()[0].id.clone();

        let patch = QuestionPatch {
            title: Some("b".to_string()),
            ..Default::default()
        };
        assert_eq!(store.update_question(&id_a, patch), UpdateOutcome::DuplicateTitle);

        let patch = QuestionPatch {
            title: Some("  ".to_string()),
            ..Default::default()
        };
        assert_eq!(store.update_question(&id_a, patch), UpdateOutcome::EmptyTitle);

        let patch = QuestionPatch {
            title: Some("a".to_string()),
            required: Some(true),
            question_type: Some(QuestionType::Radio),
            options: Some(vec!["x".to_string()]),
            ..Default::default()
        };
        assert_eq!(store.update_question(&id_a, patch), UpdateOutcome::Updated);
        let q = store.get(&id_a).unwrap();
        assert_eq!(q.title, "a");
        assert!(q.required);
        assert_eq!(q.question_type(), QuestionType::Radio);
        assert_eq!(q.options(), ["x".to_string()]);

        assert_eq!(
            store.update_question("missing", QuestionPatch::default()),
            UpdateOutcome::NotFound
        );
    }

    #[test]
    fn test_update_questions_fills_only_missing_fields() {
        let mut store = store_with(&["A", "B"]);
        let id_b = store.questions()[1].id.clone();
        store.update_question(
            &id_b,
            QuestionPatch {
                hi_title: Some("existing".to_string()),
                ..Default::default()
            },
        );

        let changed = store.update_questions(|q| {
            let mut q = q.clone();
            if q.hi_title.is_none() {
                q.hi_title = Some(format!("hi:{}", q.title));
            }
            q
        });

        assert_eq!(changed, 1);
        assert_eq!(store.questions()[0].hi_title.as_deref(), Some("hi:A"));
        assert_eq!(store.questions()[1].hi_title.as_deref(), Some("existing"));
    }

    #[test]
    fn test_update_questions_keeps_titles_unique() {
        let mut store = store_with(&["A", "B"]);
        let changed = store.update_questions(|q| {
            let mut q = q.clone();
            q.title = "same".to_string();
            q
        });
        // The first rename succeeds, the second would collide
        assert_eq!(changed, 1);
        let titles: Vec<_> = store.questions().iter().map(|q| q.title.as_str()).collect();
        assert_eq!(titles, ["same", "B"]);
    }

    #[test]
    fn test_reorder_guards_indices() {
        let mut store = store_with(&["one", "two", "three"]);

        assert!(store.reorder_questions(0, 2));
        let titles: Vec<_> = store.questions().iter().map(|q| q.title.as_str()).collect();
        assert_eq!(titles, ["two", "three", "one"]);

        assert!(store.reorder_questions(2, 99));
        let titles: Vec<_> = store.questions().iter().map(|q| q.title.as_str()).collect();
        assert_eq!(titles, ["two", "three", "one"]);

        assert!(!store.reorder_questions(3, 0));
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_edit_commits_atomically() {
        let mut store = QuestionStore::new();
        store.add_question(age_question());
        store.add_question(QuestionCandidate::text("Household size?"));
        let id = store.questions()[0].id.clone();

        let mut edit = store.begin_edit(&id).unwrap();
        edit.title = "Age bracket?".to_string();
        edit.options.push("36-45".to_string());
        // Committed copy is untouched while editing
        assert_eq!(store.get(&id).unwrap().title, "What is your age group?");

        assert_eq!(store.commit_edit(edit), UpdateOutcome::Updated);
        let q = store.get(&id).unwrap();
        assert_eq!(q.title, "Age bracket?");
        assert_eq!(q.options().len(), 3);

        let mut clash = store.begin_edit(&id).unwrap();
        clash.title = "household SIZE?".to_string();
        assert_eq!(store.commit_edit(clash), UpdateOutcome::DuplicateTitle);
        assert_eq!(store.get(&id).unwrap().title, "Age bracket?");

        assert!(store.begin_edit("missing").is_none());
    }

    #[test]
    fn test_domain_counts() {
        let mut store = QuestionStore::new();
        store.increment_domain(Some("employment"));
        store.increment_domain(Some("employment"));
        store.increment_domain(None);
        store.increment_domain(Some(""));
        assert_eq!(store.domain_counts().get("employment"), Some(&2));
        assert_eq!(store.domain_counts().len(), 1);
    }

    #[test]
    fn test_reset_clears_questions() {
        let mut store = store_with(&["A", "B"]);
        store.reset();
        assert!(store.is_empty());
        assert!(store.recently_added().is_empty());
    }

    #[test]
    fn test_no_duplicate_titles_across_many_batches() {
        let mut store = QuestionStore::new();
        let batches = [
            vec!["Age?", "Income?", " age? "],
            vec!["INCOME?", "Household size?"],
            vec!["household size?", "Occupation?", "occupation?"],
        ];
        for batch in batches {
            store.add_questions(batch.into_iter().map(QuestionCandidate::text));
        }
        let titles: HashSet<_> = store.questions().iter().map(|q| q.normalized_title()).collect();
        assert_eq!(titles.len(), store.len());
        assert_eq!(store.len(), 4);
    }
}
