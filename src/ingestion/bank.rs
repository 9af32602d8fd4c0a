use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{BankError, BankResult};
use crate::survey::{QuestionCandidate, QuestionKind, QuestionSource, QuestionType};

/// Structured record from the official question bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankEntry {
    pub id: String,
    #[serde(rename = "type", default = "default_type", deserialize_with = "lenient_type")]
    pub question_type: QuestionType,
    pub title: String,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub survey_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official_source_url: Option<String>,
}

fn default_type() -> QuestionType {
    QuestionType::Text
}

fn lenient_type<'de, D>(deserializer: D) -> Result<QuestionType, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let name = String::deserialize(deserializer)?;
    Ok(QuestionType::clamp(&name))
}

impl BankEntry {
    /// Candidate tagged as official, keeping the bank id.
    pub fn to_candidate(&self) -> QuestionCandidate {
        QuestionCandidate {
            id: Some(self.id.clone()),
            kind: QuestionKind::new(self.question_type, self.options.clone()),
            title: self.title.clone(),
            required: self.required,
            source: Some(QuestionSource::Official),
            domain: self.domain.clone(),
            hi_title: None,
            note: None,
        }
    }
}

/// Selects bank entries. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BankFilter {
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub survey_id: Option<String>,
}

impl BankFilter {
    pub fn matches(&self, entry: &BankEntry) -> bool {
        let domain_ok = self
            .domain
            .as_deref()
            .map_or(true, |d| entry.domain.as_deref() == Some(d));
        let survey_ok = self
            .survey_id
            .as_deref()
            .map_or(true, |s| entry.survey_id.as_deref() == Some(s));
        domain_ok && survey_ok
    }
}

/// Provider of official questions.
#[async_trait]
pub trait QuestionBank: Send + Sync {
    /// Entries matching `filter`, in bank order.
    async fn load(&self, filter: &BankFilter) -> BankResult<Vec<BankEntry>>;
}

/// In-memory bank, either built in or read from a JSON file.
#[derive(Debug, Clone)]
pub struct StaticQuestionBank {
    entries: Vec<BankEntry>,
}

impl StaticQuestionBank {
    pub fn new(entries: Vec<BankEntry>) -> Self {
        Self { entries }
    }

    /// Read a JSON array of entries from `path`.
    pub async fn from_path(path: &Path) -> BankResult<Self> {
        let raw = tokio::fs::read_to_string(path)
            .await
            .map_err(|e| BankError::Read {
                path: path.display().to_string(),
                message: e.to_string(),
            })?;
        let entries: Vec<BankEntry> = serde_json::from_str(&raw)?;
        info!(path = %path.display(), entries = entries.len(), "Question bank loaded");
        Ok(Self::new(entries))
    }

    /// Small built-in bank covering the default domains.
    pub fn builtin() -> Self {
        let entry = |id: &str, survey: &str, domain: &str, ty: QuestionType, title: &str, options: &[&str]| BankEntry {
            id: id.to_string(),
            question_type: ty,
            title: title.to_string(),
            options: options.iter().map(|o| o.to_string()).collect(),
            required: true,
            survey_id: Some(survey.to_string()),
            domain: Some(domain.to_string()),
            reference: None,
            official_source_url: None,
        };

        Self::new(vec![
            entry(
                "plfs_status", "PLFS", "employment", QuestionType::Radio,
                "What was your usual principal activity status during the last 365 days?",
                &["Self-employed", "Regular wage/salaried", "Casual labour", "Unemployed", "Not in labour force"],
            ),
            entry(
                "plfs_industry", "PLFS", "employment", QuestionType::Text,
                "Describe the industry or sector of your main work", &[],
            ),
            entry(
                "sas_land", "SAS", "agriculture", QuestionType::Radio,
                "How much land does your household operate?",
                &["None", "Less than 1 hectare", "1-2 hectares", "More than 2 hectares"],
            ),
            entry(
                "sas_crops", "SAS", "agriculture", QuestionType::MultipleChoice,
                "Which is the principal crop grown on your land?",
                &["Paddy", "Wheat", "Pulses", "Oilseeds", "Cotton", "Other"],
            ),
            entry(
                "cpi_rice", "CPI", "prices", QuestionType::Text,
                "What is the current retail price of rice per kilogram in your area?", &[],
            ),
            entry(
                "nss_health_ailment", "NSS-75H", "health", QuestionType::Checkbox,
                "Did any household member suffer from the following ailments in the last 15 days?",
                &["Fever", "Respiratory", "Diarrhoea", "Injury", "None"],
            ),
            entry(
                "nss_health_provider", "NSS-75H", "health", QuestionType::Radio,
                "Where was treatment sought for the most recent ailment?",
                &["Government hospital", "Private hospital", "Private doctor", "Not treated"],
            ),
            entry(
                "nss_transport_mode", "NSS-76T", "transport", QuestionType::Radio,
                "What is the usual mode of transport to the place of work?",
                &["Bus", "Train", "Own vehicle", "Shared auto", "On foot"],
            ),
        ])
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl QuestionBank for StaticQuestionBank {
    async fn load(&self, filter: &BankFilter) -> BankResult<Vec<BankEntry>> {
        let entries: Vec<BankEntry> = self
            .entries
            .iter()
            .filter(|e| filter.matches(e))
            .cloned()
            .collect();
        debug!(
            domain = ?filter.domain,
            survey_id = ?filter.survey_id,
            matched = entries.len(),
            "Question bank filtered"
        );
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::Write;

    #[tokio::test]
    async fn test_filter_by_domain_and_survey() {
        let bank = StaticQuestionBank::builtin();
        let all = bank.load(&BankFilter::default()).await.unwrap();
        assert_eq!(all.len(), bank.len());

        let health = bank
            .load(&BankFilter {
                domain: Some("health".to_string()),
                survey_id: None,
            })
            .await
            .unwrap();
        assert_eq!(health.len(), 2);

        let plfs_health = bank
            .load(&BankFilter {
                domain: Some("health".to_string()),
                survey_id: Some("PLFS".to_string()),
            })
            .await
            .unwrap();
        assert!(plfs_health.is_empty());
    }

    #[test]
    fn test_entry_deserializes_leniently() {
        let entry: BankEntry = serde_json::from_value(json!({
            "id": "x1",
            "type": "Radio",
            "title": "Age?",
            "options": ["18-25"],
            "surveyId": "PLFS",
            "officialSourceUrl": "https://example.org"
        }))
        .unwrap();
        assert_eq!(entry.question_type, QuestionType::Radio);
        assert_eq!(entry.survey_id.as_deref(), Some("PLFS"));

        let entry: BankEntry =
            serde_json::from_value(json!({ "id": "x2", "type": "slider", "title": "Rate" })).unwrap();
        assert_eq!(entry.question_type, QuestionType::Text);

        let candidate = entry.to_candidate();
        assert_eq!(candidate.source, Some(QuestionSource::Official));
        assert_eq!(candidate.id.as_deref(), Some("x2"));
    }

    #[tokio::test]
    async fn test_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            "{}",
            json!([{ "id": "a", "type": "text", "title": "Name?", "domain": "prices" }])
        )
        .unwrap();

        let bank = StaticQuestionBank::from_path(file.path()).await.unwrap();
        assert_eq!(bank.len(), 1);

        let missing = StaticQuestionBank::from_path(Path::new("/nonexistent/bank.json")).await;
        assert!(matches!(missing, Err(BankError::Read { .. })));
    }

    #[tokio::test]
    async fn test_malformed_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();
        let result = StaticQuestionBank::from_path(file.path()).await;
        assert!(matches!(result, Err(BankError::Malformed(_))));
    }
}
