//! # Survey Paradata
//!
//! Survey authoring and administration core served as an MCP tool server.
//!
//! ## Features
//!
//! - **Question store**: ordered questions with title deduplication, patches and reordering
//! - **Paradata**: per-question timing with too-fast and empty-answer flags, consent fingerprint
//! - **Response ledger**: latest answer per question, answered-title set for generation
//! - **Adaptive follow-ups**: a single-slot suggestion channel feeding the draft generator
//! - **Draft ingestion**: tolerant JSON extraction, domain inference, caps and mock fallback
//! - **Analysis**: channel rendering (WhatsApp/IVR/web), sector coding, response summaries
//! - **Export**: versioned JSON documents saved to SQLite
//!
//! ## Architecture
//!
//! ```text
//! MCP Client → McpServer (stdio) → handlers → SurveySession (per session)
//!                                      ↓              ↓
//!                              TextGenerator     SQLite (exports)
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use survey_paradata::{AppState, Config, McpServer};
//! use survey_paradata::generator::HttpGenerator;
//! use survey_paradata::ingestion::StaticQuestionBank;
//! use survey_paradata::storage::SqliteStorage;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::from_env()?;
//!     let storage = SqliteStorage::new(&config.database).await?;
//!     let generator = HttpGenerator::new(&config.generator, config.request.clone())?;
//!     let state = AppState::new(
//!         config,
//!         Arc::new(storage),
//!         Arc::new(generator),
//!         Arc::new(StaticQuestionBank::builtin()),
//!     );
//!     McpServer::new(Arc::new(state)).run().await?;
//!     Ok(())
//! }
//! ```

/// Channel rendering, sector coding and response summaries.
pub mod analysis;
/// Configuration management.
pub mod config;
/// Error types and result aliases for the application.
pub mod error;
/// Generative-text provider client.
pub mod generator;
/// Draft ingestion, domain policy, question bank and generation gate.
pub mod ingestion;
/// Prompts sent to the generative-text provider.
pub mod prompts;
/// MCP server implementation and request handling.
pub mod server;
/// SQLite storage for saved exports.
pub mod storage;
/// Survey core: questions, paradata, responses, follow-ups.
pub mod survey;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use server::{AppState, McpServer, SharedState};
