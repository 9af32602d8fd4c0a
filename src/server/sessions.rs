use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock};
use std::time::Duration;

use tracing::info;

use crate::analysis::Summarizer;
use crate::config::ParadataConfig;
use crate::error::ToolError;
use crate::ingestion::GenerationGate;
use crate::survey::{Clock, SurveySession};

/// One live survey session plus its generation gate and summary history.
///
/// The session itself sits behind a plain mutex. Handlers never hold the
/// guard across an `.await`: they snapshot what they need, release, await,
/// and lock again to apply the result.
#[derive(Debug)]
pub struct SessionHandle {
    id: String,
    session: Mutex<SurveySession>,
    generations: GenerationGate,
    summaries: Mutex<Summarizer>,
}

impl SessionHandle {
    fn new(id: String, session: SurveySession, summary_delay: Duration) -> Self {
        Self {
            id,
            session: Mutex::new(session),
            generations: GenerationGate::new(),
            summaries: Mutex::new(Summarizer::new(summary_delay)),
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// Lock the session state.
    pub fn lock(&self) -> MutexGuard<'_, SurveySession> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Lock the summary history.
    pub fn summaries(&self) -> MutexGuard<'_, Summarizer> {
        self.summaries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Draft generation gate for this session.
    pub fn generations(&self) -> &GenerationGate {
        &self.generations
    }
}

/// Registry of live sessions keyed by id.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, Arc<SessionHandle>>>,
    clock: Arc<dyn Clock>,
    paradata: ParadataConfig,
    summary_delay: Duration,
}

impl SessionRegistry {
    pub fn new(clock: Arc<dyn Clock>, paradata: ParadataConfig, summary_delay: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            clock,
            paradata,
            summary_delay,
        }
    }

    /// Create an empty session and return its handle.
    pub fn create(&self) -> Arc<SessionHandle> {
        let id = uuid::Uuid::new_v4().to_string();
        let session = SurveySession::new(self.clock.clone(), self.paradata.clone());
        let handle = Arc::new(SessionHandle::new(id.clone(), session, self.summary_delay));

        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(id.clone(), handle.clone());

        info!(session_id = %id, "Session created");
        handle
    }

    /// Look up a session.
    pub fn get(&self, session_id: &str) -> Result<Arc<SessionHandle>, ToolError> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(session_id)
            .cloned()
            .ok_or_else(|| ToolError::SessionNotFound {
                session_id: session_id.to_string(),
            })
    }

    /// Drop a session and cancel any draft generation still in flight for it.
    ///
    /// Returns whether a generation was cancelled.
    pub fn remove(&self, session_id: &str) -> Result<bool, ToolError> {
        let handle = self
            .sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(session_id)
            .ok_or_else(|| ToolError::SessionNotFound {
                session_id: session_id.to_string(),
            })?;

        let cancelled = handle.generations().cancel();
        info!(session_id = %session_id, cancelled_generation = cancelled, "Session closed");
        Ok(cancelled)
    }

    pub fn len(&self) -> usize {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
