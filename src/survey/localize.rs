use std::collections::HashMap;

use async_trait::async_trait;

use super::{Question, QuestionStore};

/// Provider that renders question titles in Hindi.
#[async_trait]
pub trait Localizer: Send + Sync {
    /// Hindi rendering of `text`.
    async fn to_hindi(&self, text: &str) -> String;
}

/// Placeholder translator that tags titles instead of translating them.
#[derive(Debug, Clone, Copy, Default)]
pub struct MockHindiLocalizer;

const HINDI_PREFIX: &str = "हिन्दी: ";

/// Whether `text` contains any Devanagari character.
pub fn contains_devanagari(text: &str) -> bool {
    text.chars()
        .any(|c| matches!(c, '\u{0900}'..='\u{097F}' | '\u{A8E0}'..='\u{A8FF}'))
}

#[async_trait]
impl Localizer for MockHindiLocalizer {
    async fn to_hindi(&self, text: &str) -> String {
        if contains_devanagari(text) {
            text.to_string()
        } else {
            format!("{}{}", HINDI_PREFIX, text)
        }
    }
}

/// Translate the titles of questions that have no Hindi title yet.
///
/// Returns translations keyed by question id.
pub async fn translate_missing(
    localizer: &dyn Localizer,
    questions: &[Question],
) -> HashMap<String, String> {
    let mut translations = HashMap::new();
    for question in questions.iter().filter(|q| q.hi_title.is_none()) {
        let hindi = localizer.to_hindi(&question.title).await;
        translations.insert(question.id.clone(), hindi);
    }
    translations
}

/// Fill `hiTitle` from `translations`, never overwriting an existing one.
///
/// Returns how many questions were filled.
pub fn apply_translations(store: &mut QuestionStore, translations: &HashMap<String, String>) -> usize {
    store.update_questions(|q| match (&q.hi_title, translations.get(&q.id)) {
        (None, Some(hindi)) => Question {
            hi_title: Some(hindi.clone()),
            ..q.clone()
        },
        _ => q.clone(),
    })
}

/// Translate and fill every missing Hindi title in the store.
pub async fn localize_questions(store: &mut QuestionStore, localizer: &dyn Localizer) -> usize {
    let translations = translate_missing(localizer, store.questions()).await;
    apply_translations(store, &translations)
}
