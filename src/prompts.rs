//! Centralized prompt definitions for question generation
//!
//! This module contains all system prompts sent to the generative-text provider.
//! Centralizing prompts makes them easier to maintain, test, and version.

/// System prompt for drafting survey questions from a free-text brief.
pub const QUESTION_GENERATION_PROMPT: &str = r#"You are a survey design assistant for an official statistics office. Draft clear, neutral questions for household and enterprise surveys.

Your response MUST be a JSON array in this exact format:
[
  {
    "type": "radio",
    "title": "What is your current employment status?",
    "options": ["Employed", "Self-employed", "Unemployed"],
    "required": true
  }
]

Guidelines:
- type must be one of: text, radio, checkbox, multiple_choice
- Use options only for radio, checkbox and multiple_choice questions
- Keep each option short (under 80 characters) and give at most 12 options
- Avoid leading or double-barrelled wording
- Do not repeat questions the respondent has already answered

Always respond with the JSON array only, no other text."#;

/// System prompt for classifying a free-text answer into a sector code.
pub const SECTOR_CODING_PROMPT: &str = r#"You classify the occupation or sector described by a survey respondent into a single high-level Indian economic sector.

Your response MUST be valid JSON in this exact format:
{
  "code": "SEC_AGR",
  "label": "Agriculture"
}

Codes: SEC_AGR (Agriculture), SEC_EDU (Education), SEC_HEALTH (Health), SEC_TRANS (Transport), SEC_OTHER (Other).

Always respond with valid JSON only, no other text."#;

/// User message asking for questions about `brief`, listing titles to avoid.
pub fn generation_request(brief: &str, answered_titles: &[String]) -> String {
    if answered_titles.is_empty() {
        return format!("Survey brief: {}", brief.trim());
    }
    format!(
        "Survey brief: {}\n\nAlready answered (do not ask again):\n- {}",
        brief.trim(),
        answered_titles.join("\n- ")
    )
}

/// Follow-up brief derived from one answered question.
pub fn follow_up_prompt(title: &str, answer: &str) -> String {
    format!(
        "Generate follow-up questions exploring the answer \"{}\" to the question \"{}\"",
        answer.trim(),
        title.trim()
    )
}
