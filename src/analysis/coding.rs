use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::generator::{Message, TextGenerator};
use crate::prompts::SECTOR_CODING_PROMPT;

/// How a code was assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CodingSystem {
    Rule,
    Ai,
}

/// Sector code assigned to a free-text answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CodedResponse {
    pub code: String,
    pub label: String,
    pub confidence: f64,
    pub system: CodingSystem,
}

struct SectorRule {
    keywords: &'static [&'static str],
    code: &'static str,
    label: &'static str,
}

const RULE_CONFIDENCE: f64 = 0.6;
const AI_CONFIDENCE: f64 = 0.8;
const FALLBACK_CONFIDENCE: f64 = 0.2;

const SECTOR_RULES: &[SectorRule] = &[
    SectorRule {
        keywords: &["agri", "farm", "crop"],
        code: "SEC_AGR",
        label: "Agriculture",
    },
    SectorRule {
        keywords: &["teach", "school", "educ"],
        code: "SEC_EDU",
        label: "Education",
    },
    SectorRule {
        keywords: &["health", "clinic", "hospital"],
        code: "SEC_HEALTH",
        label: "Health",
    },
    SectorRule {
        keywords: &["transpo", "bus", "train", "metro", "vehicle"],
        code: "SEC_TRANS",
        label: "Transport",
    },
];

/// Assign a sector code by keyword. Blank text gets no code.
pub fn classify_response(text: &str) -> Option<CodedResponse> {
    if text.trim().is_empty() {
        return None;
    }
    let haystack = text.to_lowercase();

    let coded = SECTOR_RULES
        .iter()
        .find(|rule| rule.keywords.iter().any(|k| haystack.contains(k)))
        .map(|rule| CodedResponse {
            code: rule.code.to_string(),
            label: rule.label.to_string(),
            confidence: RULE_CONFIDENCE,
            system: CodingSystem::Rule,
        })
        .unwrap_or_else(|| CodedResponse {
            code: "SEC_OTHER".to_string(),
            label: "Other / Uncoded".to_string(),
            confidence: FALLBACK_CONFIDENCE,
            system: CodingSystem::Rule,
        });
    Some(coded)
}

#[derive(Deserialize)]
struct SectorReply {
    code: Option<String>,
    label: Option<String>,
}

/// Ask `generator` for a sector code, falling back to the keyword rules.
pub async fn classify_with_generator(
    generator: &dyn TextGenerator,
    text: &str,
) -> Option<CodedResponse> {
    if text.trim().is_empty() {
        return None;
    }

    let messages = vec![
        Message::system(SECTOR_CODING_PROMPT),
        Message::user(format!("Classify: \"{}\"", text.trim())),
    ];
    let reply = match generator.generate(messages).await {
        Ok(reply) => reply,
        Err(e) => {
            warn!(error = %e, "Sector coding request failed, using keyword rules");
            return classify_response(text);
        }
    };

    let parsed = match (reply.find('{'), reply.rfind('}')) {
        (Some(start), Some(end)) if end > start => {
            serde_json::from_str::<SectorReply>(&reply[start..=end]).ok()
        }
        _ => None,
    };

    match parsed {
        Some(sector) => Some(CodedResponse {
            code: sector.code.unwrap_or_else(|| "SEC_OTHER".to_string()),
            label: sector.label.unwrap_or_else(|| "Other".to_string()),
            confidence: AI_CONFIDENCE,
            system: CodingSystem::Ai,
        }),
        None => classify_response(text),
    }
}
