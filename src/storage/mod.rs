//! Storage layer for saved survey exports.
//!
//! Exported surveys are kept as their JSON interchange document, alongside a
//! few columns used for listing.

mod sqlite;

pub use sqlite::SqliteStorage;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::StorageResult;
use crate::survey::SurveyExport;

/// Listing entry for a saved survey.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedSurvey {
    /// Export identifier (`survey_<millis>`).
    pub id: String,
    pub title: String,
    pub question_count: i64,
    /// ISO-8601 creation time from the export.
    pub created_at: String,
}

impl From<&SurveyExport> for SavedSurvey {
    fn from(export: &SurveyExport) -> Self {
        Self {
            id: export.id.clone(),
            title: export.title.clone(),
            question_count: export.question_count as i64,
            created_at: export.created_at.clone(),
        }
    }
}

/// Persistence for survey exports.
#[async_trait]
pub trait Storage: Send + Sync {
    /// Save an export, replacing one with the same id.
    async fn save_export(&self, export: &SurveyExport) -> StorageResult<()>;

    /// Load an export by id.
    async fn get_export(&self, id: &str) -> StorageResult<Option<SurveyExport>>;

    /// Most recent exports first.
    async fn list_exports(&self, limit: u32) -> StorageResult<Vec<SavedSurvey>>;

    /// Delete an export. Fails with `SurveyNotFound` if it does not exist.
    async fn delete_export(&self, id: &str) -> StorageResult<()>;
}
