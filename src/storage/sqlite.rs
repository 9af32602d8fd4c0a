use async_trait::async_trait;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use std::str::FromStr;
use tracing::{debug, info};

use super::{SavedSurvey, Storage};
use crate::config::DatabaseConfig;
use crate::error::{StorageError, StorageResult};
use crate::survey::SurveyExport;

/// Static migrator that embeds migrations at compile time
static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

/// SQLite-backed storage implementation
#[derive(Clone)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    /// Create a new SQLite storage instance
    pub async fn new(config: &DatabaseConfig) -> StorageResult<Self> {
        // Ensure parent directory exists
        if let Some(parent) = config.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| StorageError::Connection {
                message: format!("Failed to create database directory: {}", e),
            })?;
        }

        let database_url = format!("sqlite://{}?mode=rwc", config.path.display());

        let options = SqliteConnectOptions::from_str(&database_url)
            .map_err(|e| StorageError::Connection {
                message: format!("Invalid database URL: {}", e),
            })?
            .create_if_missing(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .connect_with(options)
            .await
            .map_err(|e| StorageError::Connection {
                message: format!("Failed to connect to database: {}", e),
            })?;

        let storage = Self { pool };
        storage.run_migrations().await?;

        Ok(storage)
    }

    /// Run database migrations using embedded sqlx migrations
    async fn run_migrations(&self) -> StorageResult<()> {
        info!("Running database migrations...");

        MIGRATOR.run(&self.pool).await.map_err(|e| StorageError::Migration {
            message: format!("Failed to run migrations: {}", e),
        })?;

        info!("Database migrations completed successfully");
        Ok(())
    }
}

#[async_trait]
impl Storage for SqliteStorage {
    async fn save_export(&self, export: &SurveyExport) -> StorageResult<()> {
        let payload = serde_json::to_string(export).map_err(|e| StorageError::Query {
            message: format!("Failed to serialize export: {}", e),
        })?;

        sqlx::query(
            r#"
            INSERT OR REPLACE INTO survey_exports (id, title, question_count, payload, created_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&export.id)
        .bind(&export.title)
        .bind(export.question_count as i64)
        .bind(&payload)
        .bind(&export.created_at)
        .execute(&self.pool)
        .await?;

        debug!(survey_id = %export.id, "Survey export saved");
        Ok(())
    }

    async fn get_export(&self, id: &str) -> StorageResult<Option<SurveyExport>> {
        let payload: Option<(String,)> =
            sqlx::query_as("SELECT payload FROM survey_exports WHERE id = ?")
                .bind(id)
                .fetch_optional(&self.pool)
                .await?;

        payload
            .map(|(json,)| {
                SurveyExport::from_json(&json).map_err(|e| StorageError::Query {
                    message: format!("Corrupt export payload for {}: {}", id, e),
                })
            })
            .transpose()
    }

    async fn list_exports(&self, limit: u32) -> StorageResult<Vec<SavedSurvey>> {
        let rows: Vec<SavedSurveyRow> = sqlx::query_as(
            r#"
            SELECT id, title, question_count, created_at
            FROM survey_exports
            ORDER BY created_at DESC, id DESC
            LIMIT ?
            "#,
        )
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Into::into).collect())
    }

    async fn delete_export(&self, id: &str) -> StorageResult<()> {
        let result = sqlx::query("DELETE FROM survey_exports WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StorageError::SurveyNotFound {
                survey_id: id.to_string(),
            });
        }

        Ok(())
    }
}

#[derive(sqlx::FromRow)]
struct SavedSurveyRow {
    id: String,
    title: String,
    question_count: i64,
    created_at: String,
}

impl From<SavedSurveyRow> for SavedSurvey {
    fn from(row: SavedSurveyRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            question_count: row.question_count,
            created_at: row.created_at,
        }
    }
}
