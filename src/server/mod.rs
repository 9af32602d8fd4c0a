//! Server module for MCP protocol handling.
//!
//! This module provides:
//! - MCP server implementation over stdio
//! - Tool call handlers and routing
//! - Shared application state and the live session registry

mod handlers;
mod mcp;
mod sessions;

pub use handlers::*;
pub use mcp::*;
pub use sessions::*;

use std::sync::Arc;
use std::time::Duration;

use crate::config::Config;
use crate::generator::TextGenerator;
use crate::ingestion::{DomainPolicy, DraftIngestor, QuestionBank};
use crate::storage::Storage;
use crate::survey::{Clock, Localizer, MockHindiLocalizer, SystemClock};

/// Application state shared across handlers.
pub struct AppState {
    /// Application configuration.
    pub config: Config,
    /// Saved survey exports.
    pub storage: Arc<dyn Storage>,
    /// Generative-text provider used for drafts and AI coding.
    pub generator: Arc<dyn TextGenerator>,
    /// Official question bank.
    pub bank: Arc<dyn QuestionBank>,
    /// Hindi title provider.
    pub localizer: Arc<dyn Localizer>,
    /// Draft ingestion pipeline.
    pub ingestor: DraftIngestor,
    /// Live survey sessions.
    pub sessions: SessionRegistry,
}

impl AppState {
    /// Create new application state backed by the system clock
    pub fn new(
        config: Config,
        storage: Arc<dyn Storage>,
        generator: Arc<dyn TextGenerator>,
        bank: Arc<dyn QuestionBank>,
    ) -> Self {
        Self::with_clock(config, storage, generator, bank, Arc::new(SystemClock))
    }

    /// Create application state whose sessions read time from `clock`
    pub fn with_clock(
        config: Config,
        storage: Arc<dyn Storage>,
        generator: Arc<dyn TextGenerator>,
        bank: Arc<dyn QuestionBank>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        tracing::info!(
            model = %config.generator.model,
            streaming = config.generator.streaming,
            credential = config.generator.api_key.is_some(),
            "AppState initializing"
        );

        let ingestor = DraftIngestor::new(config.ingestion.clone(), DomainPolicy::default());
        let sessions = SessionRegistry::new(
            clock,
            config.paradata.clone(),
            Duration::from_millis(config.summary.delay_ms),
        );

        Self {
            config,
            storage,
            generator,
            bank,
            localizer: Arc::new(MockHindiLocalizer),
            ingestor,
            sessions,
        }
    }

    /// Replace the Hindi title provider.
    pub fn with_localizer(mut self, localizer: Arc<dyn Localizer>) -> Self {
        self.localizer = localizer;
        self
    }
}

/// Shared application state handle
pub type SharedState = Arc<AppState>;
