use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{SessionHandle, SharedState};
use crate::analysis::{
    classify_response, classify_with_generator, summarize_responses, transform_for_channel,
    Channel, ChannelPayload, CodedResponse, Locale, ResponseSummary,
};
use crate::error::{McpError, McpResult, StorageError, ToolError};
use crate::ingestion::{mock_candidates, BankFilter, DraftOrigin, IngestionOutcome};
use crate::storage::SavedSurvey;
use crate::survey::{
    apply_translations, translate_missing, AddResult, Answer, ParadataSummary, Question,
    QuestionCandidate, QuestionPatch, QuestionStore, RecordedResponse, SubmitOutcome,
    SurveyExport, UpdateOutcome,
};

/// Tools whose handlers await a provider or a timer.
///
/// The stdio loop runs these on their own task so that a `drafts_cancel`
/// sent while a generation is in flight is handled right away.
pub const LONG_RUNNING_TOOLS: &[&str] = &[
    "drafts_generate",
    "bank_load",
    "questions_localize",
    "responses_summarize",
    "response_code",
];

/// Route tool calls to appropriate handlers
pub async fn handle_tool_call(
    state: &SharedState,
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<Value> {
    info!(tool = %tool_name, "Routing tool call");

    match tool_name {
        "session_create" => handle_session_create(state, arguments).await,
        "session_close" => handle_session_close(state, arguments).await,
        // Question store
        "questions_add" => handle_questions_add(state, arguments).await,
        "questions_list" => handle_questions_list(state, arguments).await,
        "questions_update" => handle_questions_update(state, arguments).await,
        "questions_remove" => handle_questions_remove(state, arguments).await,
        "questions_reorder" => handle_questions_reorder(state, arguments).await,
        "questions_reset" => handle_questions_reset(state, arguments).await,
        "questions_localize" => handle_questions_localize(state, arguments).await,
        "question_render" => handle_question_render(state, arguments).await,
        // Administration and paradata
        "survey_start" => handle_survey_start(state, arguments).await,
        "survey_complete" => handle_survey_complete(state, arguments).await,
        "survey_restart" => handle_survey_restart(state, arguments).await,
        "question_present" => handle_question_present(state, arguments).await,
        "answer_submit" => handle_answer_submit(state, arguments).await,
        "consent_record" => handle_consent_record(state, arguments).await,
        "paradata_summary" => handle_paradata_summary(state, arguments).await,
        // Response ledger
        "responses_list" => handle_responses_list(state, arguments).await,
        "responses_reset" => handle_responses_reset(state, arguments).await,
        "responses_summarize" => handle_responses_summarize(state, arguments).await,
        "response_code" => handle_response_code(state, arguments).await,
        // Adaptive follow-ups
        "followup_request" => handle_followup_request(state, arguments).await,
        "followup_from_answer" => handle_followup_from_answer(state, arguments).await,
        "followup_consume" => handle_followup_consume(state, arguments).await,
        "followup_clear" => handle_followup_clear(state, arguments).await,
        // Drafts and the question bank
        "drafts_generate" => handle_drafts_generate(state, arguments).await,
        "drafts_cancel" => handle_drafts_cancel(state, arguments).await,
        "bank_load" => handle_bank_load(state, arguments).await,
        // Export and persistence
        "survey_export" => handle_survey_export(state, arguments).await,
        "survey_import" => handle_survey_import(state, arguments).await,
        "saved_surveys_list" => handle_saved_surveys_list(state, arguments).await,
        "saved_survey_get" => handle_saved_survey_get(state, arguments).await,
        "saved_survey_delete" => handle_saved_survey_delete(state, arguments).await,
        _ => Err(McpError::UnknownTool {
            tool_name: tool_name.to_string(),
        }),
    }
}

// ============================================================================
// Parameter and response types
// ============================================================================

/// Arguments of tools that only name a session.
#[derive(Debug, Deserialize)]
pub struct SessionParams {
    pub session_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsAddParams {
    pub session_id: String,
    pub questions: Vec<QuestionCandidate>,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsUpdateParams {
    pub session_id: String,
    pub question_id: String,
    pub patch: QuestionPatch,
}

#[derive(Debug, Deserialize)]
pub struct QuestionParams {
    pub session_id: String,
    pub question_id: String,
}

#[derive(Debug, Deserialize)]
pub struct QuestionsReorderParams {
    pub session_id: String,
    pub from: usize,
    pub to: usize,
}

#[derive(Debug, Deserialize)]
pub struct QuestionRenderParams {
    pub session_id: String,
    pub question_id: String,
    pub channel: Channel,
    #[serde(default)]
    pub locale: Locale,
}

#[derive(Debug, Deserialize)]
pub struct SurveyStartParams {
    pub session_id: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub survey_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AnswerSubmitParams {
    pub session_id: String,
    pub question_id: String,
    #[serde(default = "Answer::none")]
    pub answer: Answer,
}

#[derive(Debug, Deserialize)]
pub struct ConsentParams {
    pub session_id: String,
    pub payload: String,
}

#[derive(Debug, Deserialize)]
pub struct FollowUpRequestParams {
    pub session_id: String,
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ResponseCodeParams {
    pub text: String,
    #[serde(default)]
    pub use_ai: bool,
}

#[derive(Debug, Deserialize)]
pub struct DraftsGenerateParams {
    pub session_id: String,
    /// Brief to draft from. The pending suggestion is used when absent.
    #[serde(default)]
    pub prompt: Option<String>,
    /// Merge the drafts into the store instead of only returning them.
    #[serde(default = "default_true")]
    pub apply: bool,
}

#[derive(Debug, Deserialize)]
pub struct BankLoadParams {
    pub session_id: String,
    #[serde(default)]
    pub domain: Option<String>,
    #[serde(default)]
    pub survey_id: Option<String>,
    #[serde(default = "default_true")]
    pub apply: bool,
}

#[derive(Debug, Deserialize)]
pub struct SurveyExportParams {
    pub session_id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub save: bool,
}

#[derive(Debug, Deserialize)]
pub struct SurveyImportParams {
    pub session_id: String,
    /// Id of a saved export. Ignored when `export` is given.
    #[serde(default)]
    pub survey_id: Option<String>,
    #[serde(default)]
    pub export: Option<SurveyExport>,
}

#[derive(Debug, Deserialize)]
pub struct SavedSurveysListParams {
    #[serde(default = "default_list_limit")]
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct SavedSurveyParams {
    pub survey_id: String,
}

fn default_true() -> bool {
    true
}

fn default_list_limit() -> u32 {
    20
}

#[derive(Debug, Serialize)]
pub struct SessionCreateResponse {
    pub session_id: String,
}

#[derive(Debug, Serialize)]
pub struct SessionCloseResponse {
    pub closed: bool,
    pub cancelled_generation: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionsListResponse {
    pub questions: Vec<Question>,
    pub recently_added: Vec<String>,
    pub domain_counts: HashMap<String, usize>,
}

#[derive(Debug, Serialize)]
pub struct QuestionsUpdateResponse {
    pub outcome: UpdateOutcome,
}

#[derive(Debug, Serialize)]
pub struct QuestionsRemoveResponse {
    pub removed: bool,
}

#[derive(Debug, Serialize)]
pub struct QuestionsReorderResponse {
    pub moved: bool,
    pub order: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct ClearedResponse {
    pub cleared: usize,
}

#[derive(Debug, Serialize)]
pub struct LocalizeResponse {
    pub translated: usize,
}

#[derive(Debug, Serialize)]
pub struct PresentResponse {
    pub opened: bool,
}

#[derive(Debug, Serialize)]
pub struct ConsentResponse {
    pub consent_hash: String,
    pub consent_at: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct ResponsesListResponse {
    pub responses: Vec<RecordedResponse>,
    pub answered_titles: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    pub summary: ResponseSummary,
    pub history: Vec<ResponseSummary>,
}

#[derive(Debug, Serialize)]
pub struct SuggestionResponse {
    pub suggestion: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ResponseCodeResponse {
    pub coding: Option<CodedResponse>,
}

/// Result of a draft generation or a bank load.
#[derive(Debug, Serialize)]
pub struct DraftsResponse {
    pub status: String,
    pub origin: Option<DraftOrigin>,
    pub domain: Option<String>,
    pub removed_duplicates: usize,
    /// Candidates that were not merged into the store.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub candidates: Vec<QuestionCandidate>,
    pub added: Option<AddResult>,
}

#[derive(Debug, Serialize)]
pub struct DraftsCancelResponse {
    pub cancelled: bool,
}

#[derive(Debug, Serialize)]
pub struct SurveyExportResponse {
    pub export: SurveyExport,
    pub saved: bool,
}

#[derive(Debug, Serialize)]
pub struct SavedSurveysListResponse {
    pub surveys: Vec<SavedSurvey>,
}

#[derive(Debug, Serialize)]
pub struct DeletedResponse {
    pub deleted: bool,
}

// ============================================================================
// Sessions and the question store
// ============================================================================

async fn handle_session_create(state: &SharedState, _arguments: Option<Value>) -> McpResult<Value> {
    let handle = state.sessions.create();

    to_json(SessionCreateResponse {
        session_id: handle.id().to_string(),
    })
}

async fn handle_session_close(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("session_close", arguments)?;
    let cancelled_generation = state.sessions.remove(&params.session_id)?;

    to_json(SessionCloseResponse {
        closed: true,
        cancelled_generation,
    })
}

async fn handle_questions_add(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: QuestionsAddParams = parse_arguments("questions_add", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let result = {
        let mut session = handle.lock();
        add_and_count_domains(session.store_mut(), params.questions)
    };

    to_json(result)
}

async fn handle_questions_list(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("questions_list", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let session = handle.lock();
    let store = session.store();
    let mut recently_added: Vec<String> = store.recently_added().iter().cloned().collect();
    recently_added.sort();

    to_json(QuestionsListResponse {
        questions: store.questions().to_vec(),
        recently_added,
        domain_counts: store.domain_counts().clone(),
    })
}

async fn handle_questions_update(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: QuestionsUpdateParams = parse_arguments("questions_update", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let outcome = handle
        .lock()
        .store_mut()
        .update_question(&params.question_id, params.patch);

    to_json(QuestionsUpdateResponse { outcome })
}

async fn handle_questions_remove(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: QuestionParams = parse_arguments("questions_remove", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let removed = handle.lock().store_mut().remove_question(&params.question_id);
    to_json(QuestionsRemoveResponse { removed })
}

async fn handle_questions_reorder(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: QuestionsReorderParams = parse_arguments("questions_reorder", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let mut session = handle.lock();
    let moved = session.store_mut().reorder_questions(params.from, params.to);
    let order = session.store().questions().iter().map(|q| q.id.clone()).collect();

    to_json(QuestionsReorderResponse { moved, order })
}

async fn handle_questions_reset(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("questions_reset", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let mut session = handle.lock();
    let cleared = session.store().len();
    session.store_mut().reset();

    to_json(ClearedResponse { cleared })
}

/// Fill missing Hindi titles. The provider is awaited without the session lock held.
async fn handle_questions_localize(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("questions_localize", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let snapshot = handle.lock().store().questions().to_vec();
    let translations = translate_missing(state.localizer.as_ref(), &snapshot).await;
    let translated = apply_translations(handle.lock().store_mut(), &translations);

    debug!(session_id = %params.session_id, translated, "Questions localized");
    to_json(LocalizeResponse { translated })
}

async fn handle_question_render(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: QuestionRenderParams = parse_arguments("question_render", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let payload: ChannelPayload = {
        let session = handle.lock();
        let question = session
            .store()
            .get(&params.question_id)
            .ok_or_else(|| unknown_question(&params.question_id))?;
        transform_for_channel(question, params.channel, params.locale)
    };

    to_json(payload)
}

// ============================================================================
// Administration and paradata
// ============================================================================

async fn handle_survey_start(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SurveyStartParams = parse_arguments("survey_start", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let mut session = handle.lock();
    session.start(params.language, params.survey_id);
    to_json(session.paradata().summary())
}

async fn handle_survey_complete(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("survey_complete", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let mut session = handle.lock();
    session.paradata_mut().complete_survey();
    to_json(session.paradata().summary())
}

/// Clear paradata, responses and the pending suggestion for the next respondent.
async fn handle_survey_restart(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("survey_restart", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    handle.generations().cancel();
    let summary: ParadataSummary = {
        let mut session = handle.lock();
        session.restart();
        session.paradata().summary()
    };
    handle.summaries().clear();

    to_json(summary)
}

async fn handle_question_present(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: QuestionParams = parse_arguments("question_present", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let opened = handle.lock().present_question(&params.question_id);
    to_json(PresentResponse { opened })
}

async fn handle_answer_submit(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: AnswerSubmitParams = parse_arguments("answer_submit", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let outcome: SubmitOutcome = handle
        .lock()
        .submit_answer(&params.question_id, params.answer);

    to_json(outcome)
}

async fn handle_consent_record(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: ConsentParams = parse_arguments("consent_record", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let mut session = handle.lock();
    let consent_hash = session.paradata_mut().record_consent(&params.payload);
    let consent_at = session.paradata().summary().consent_at;

    to_json(ConsentResponse {
        consent_hash,
        consent_at,
    })
}

async fn handle_paradata_summary(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("paradata_summary", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let summary = handle.lock().paradata().summary();
    to_json(summary)
}

// ============================================================================
// Response ledger
// ============================================================================

async fn handle_responses_list(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("responses_list", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let session = handle.lock();
    let mut answered_titles: Vec<String> = session.ledger().answered_titles().into_iter().collect();
    answered_titles.sort();

    to_json(ResponsesListResponse {
        responses: session.ledger().ordered(),
        answered_titles,
    })
}

async fn handle_responses_reset(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("responses_reset", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let cleared = {
        let mut session = handle.lock();
        let cleared = session.ledger().len();
        session.ledger_mut().reset_responses();
        cleared
    };
    handle.summaries().clear();

    to_json(ClearedResponse { cleared })
}

/// Summarize recent free-text answers after the configured delay.
async fn handle_responses_summarize(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("responses_summarize", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let delay = handle.summaries().delay();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    let summary = {
        let session = handle.lock();
        summarize_responses(&session.ledger().ordered(), session.now_ms())
    };

    let mut summaries = handle.summaries();
    summaries.push(summary.clone());
    let history = summaries.summaries().to_vec();
    drop(summaries);

    to_json(SummarizeResponse { summary, history })
}

async fn handle_response_code(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: ResponseCodeParams = parse_arguments("response_code", arguments)?;

    let coding = if params.use_ai {
        classify_with_generator(state.generator.as_ref(), &params.text).await
    } else {
        classify_response(&params.text)
    };

    to_json(ResponseCodeResponse { coding })
}

// ============================================================================
// Adaptive follow-ups
// ============================================================================

async fn handle_followup_request(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: FollowUpRequestParams = parse_arguments("followup_request", arguments)?;
    if params.prompt.trim().is_empty() {
        return Err(ToolError::Validation {
            field: "prompt".to_string(),
            reason: "cannot be empty".to_string(),
        }
        .into());
    }
    let handle = state.sessions.get(&params.session_id)?;

    let mut session = handle.lock();
    session.suggestions_mut().request_follow_up(params.prompt);
    to_json(SuggestionResponse {
        suggestion: session.suggestions().pending().map(str::to_string),
    })
}

async fn handle_followup_from_answer(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    let params: QuestionParams = parse_arguments("followup_from_answer", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let suggestion = handle.lock().follow_up_for(&params.question_id);
    to_json(SuggestionResponse { suggestion })
}

async fn handle_followup_consume(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("followup_consume", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let suggestion = handle.lock().suggestions_mut().consume_suggestion();
    to_json(SuggestionResponse { suggestion })
}

async fn handle_followup_clear(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("followup_clear", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    handle.lock().suggestions_mut().clear_suggestion();
    to_json(SuggestionResponse { suggestion: None })
}

// ============================================================================
// Drafts and the question bank
// ============================================================================

/// Generate draft questions and, unless superseded or cancelled, apply them.
///
/// A newer `drafts_generate` or a `drafts_cancel` for the same session
/// cancels this one; its result is then discarded.
async fn handle_drafts_generate(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: DraftsGenerateParams = parse_arguments("drafts_generate", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let (prompt, answered) = {
        let mut session = handle.lock();
        let prompt = match params.prompt.filter(|p| !p.trim().is_empty()) {
            Some(prompt) => Some(prompt),
            None => session.suggestions_mut().consume_suggestion(),
        };
        (prompt, session.ledger().answered_titles())
    };
    let prompt = prompt.ok_or_else(|| ToolError::Validation {
        field: "prompt".to_string(),
        reason: "no prompt given and no follow-up suggestion pending".to_string(),
    })?;

    let ticket = handle.generations().begin();
    debug!(session_id = %params.session_id, seq = ticket.seq(), "Draft generation started");

    let result = tokio::select! {
        _ = ticket.token().cancelled() => None,
        result = state.ingestor.generate(state.generator.as_ref(), &prompt, &answered) => Some(result),
    };

    let outcome = match result {
        None => {
            info!(session_id = %params.session_id, "Draft generation cancelled");
            return to_json(discarded("Cancelled"));
        }
        Some(Err(e)) => {
            handle.generations().finish(&ticket);
            return Err(McpError::ExecutionFailed {
                message: e.to_string(),
            });
        }
        Some(Ok(outcome)) => outcome,
    };

    if !handle.generations().is_current(&ticket) {
        info!(session_id = %params.session_id, "Discarding superseded draft result");
        return to_json(discarded("Superseded"));
    }
    handle.generations().finish(&ticket);

    to_json(apply_outcome(&handle, outcome, params.apply))
}

async fn handle_drafts_cancel(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SessionParams = parse_arguments("drafts_cancel", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let cancelled = handle.generations().cancel();
    to_json(DraftsCancelResponse { cancelled })
}

/// Load official questions. A failing bank degrades to local samples.
async fn handle_bank_load(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: BankLoadParams = parse_arguments("bank_load", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let filter = BankFilter {
        domain: params.domain.clone(),
        survey_id: params.survey_id,
    };

    let outcome = match state.bank.load(&filter).await {
        Ok(entries) => IngestionOutcome {
            status: format!("Loaded {} official questions", entries.len()),
            candidates: entries.iter().map(|e| e.to_candidate()).collect(),
            removed_duplicates: 0,
            domain: params.domain,
            origin: DraftOrigin::Parsed,
        },
        Err(e) => {
            warn!(error = %e, "Question bank unavailable, using sample questions");
            IngestionOutcome {
                status: format!("Question bank unavailable ({}); showing sample questions", e),
                candidates: mock_candidates("", params.domain.as_deref()),
                removed_duplicates: 0,
                domain: params.domain,
                origin: DraftOrigin::Mock,
            }
        }
    };

    to_json(apply_outcome(&handle, outcome, params.apply))
}

fn discarded(status: &str) -> DraftsResponse {
    DraftsResponse {
        status: status.to_string(),
        origin: None,
        domain: None,
        removed_duplicates: 0,
        candidates: Vec::new(),
        added: None,
    }
}

fn apply_outcome(handle: &Arc<SessionHandle>, outcome: IngestionOutcome, apply: bool) -> DraftsResponse {
    let IngestionOutcome {
        candidates,
        removed_duplicates,
        domain,
        origin,
        status,
    } = outcome;

    if !apply {
        return DraftsResponse {
            status,
            origin: Some(origin),
            domain,
            removed_duplicates,
            candidates,
            added: None,
        };
    }

    let added = add_and_count_domains(handle.lock().store_mut(), candidates);
    DraftsResponse {
        status,
        origin: Some(origin),
        domain,
        removed_duplicates,
        candidates: Vec::new(),
        added: Some(added),
    }
}

/// Add candidates and bump the domain counter once per question actually added.
fn add_and_count_domains(store: &mut QuestionStore, candidates: Vec<QuestionCandidate>) -> AddResult {
    let result = store.add_questions(candidates);
    let domains: Vec<Option<String>> = result
        .ids_added
        .iter()
        .map(|id| store.get(id).and_then(|q| q.domain.clone()))
        .collect();
    for domain in domains {
        store.increment_domain(domain.as_deref());
    }
    result
}

// ============================================================================
// Export and persistence
// ============================================================================

async fn handle_survey_export(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SurveyExportParams = parse_arguments("survey_export", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let export = SurveyExport::from_session(
        &handle.lock(),
        params.title.as_deref(),
        params.description.as_deref(),
    );

    if params.save {
        state
            .storage
            .save_export(&export)
            .await
            .map_err(|e| McpError::ExecutionFailed {
                message: e.to_string(),
            })?;
        info!(survey_id = %export.id, "Survey export saved");
    }

    to_json(SurveyExportResponse {
        export,
        saved: params.save,
    })
}

/// Merge questions from an inline or saved export into the session.
async fn handle_survey_import(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SurveyImportParams = parse_arguments("survey_import", arguments)?;
    let handle = state.sessions.get(&params.session_id)?;

    let export = match (params.export, params.survey_id) {
        (Some(export), _) => export,
        (None, Some(survey_id)) => load_saved(state, &survey_id).await?,
        (None, None) => {
            return Err(ToolError::Validation {
                field: "export".to_string(),
                reason: "either export or survey_id is required".to_string(),
            }
            .into())
        }
    };

    let result = add_and_count_domains(handle.lock().store_mut(), export.into_candidates());
    to_json(result)
}

async fn handle_saved_surveys_list(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "saved_surveys_list",
        Some(arguments.unwrap_or_else(|| Value::Object(Default::default()))),
        |params: SavedSurveysListParams| async move {
            state
                .storage
                .list_exports(params.limit)
                .await
                .map(|surveys| SavedSurveysListResponse { surveys })
        },
    )
    .await
}

async fn handle_saved_survey_get(state: &SharedState, arguments: Option<Value>) -> McpResult<Value> {
    let params: SavedSurveyParams = parse_arguments("saved_survey_get", arguments)?;
    let export = load_saved(state, &params.survey_id).await?;
    to_json(export)
}

async fn handle_saved_survey_delete(
    state: &SharedState,
    arguments: Option<Value>,
) -> McpResult<Value> {
    execute_handler(
        "saved_survey_delete",
        arguments,
        |params: SavedSurveyParams| async move {
            state
                .storage
                .delete_export(&params.survey_id)
                .await
                .map(|()| DeletedResponse { deleted: true })
        },
    )
    .await
}

async fn load_saved(state: &SharedState, survey_id: &str) -> McpResult<SurveyExport> {
    state
        .storage
        .get_export(survey_id)
        .await
        .and_then(|found| {
            found.ok_or_else(|| StorageError::SurveyNotFound {
                survey_id: survey_id.to_string(),
            })
        })
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })
}

// ============================================================================
// Helpers
// ============================================================================

fn unknown_question(question_id: &str) -> McpError {
    ToolError::Validation {
        field: "question_id".to_string(),
        reason: format!("no question with id {}", question_id),
    }
    .into()
}

fn to_json<R: Serialize>(result: R) -> McpResult<Value> {
    serde_json::to_value(result).map_err(McpError::Json)
}

fn parse_arguments<T: serde::de::DeserializeOwned>(
    tool_name: &str,
    arguments: Option<Value>,
) -> McpResult<T> {
    match arguments {
        Some(args) => serde_json::from_value(args).map_err(|e| McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: e.to_string(),
        }),
        None => Err(McpError::InvalidParameters {
            tool_name: tool_name.to_string(),
            message: "Missing arguments".to_string(),
        }),
    }
}

/// Generic handler that executes an async operation with consistent error handling.
///
/// Parses the arguments, runs the operation, converts its error into
/// `McpError::ExecutionFailed` and serializes the result.
async fn execute_handler<P, R, E, F, Fut>(
    tool_name: &str,
    arguments: Option<Value>,
    operation: F,
) -> McpResult<Value>
where
    P: serde::de::DeserializeOwned,
    R: Serialize,
    E: std::fmt::Display,
    F: FnOnce(P) -> Fut,
    Fut: std::future::Future<Output = Result<R, E>>,
{
    let params: P = parse_arguments(tool_name, arguments)?;

    let result = operation(params)
        .await
        .map_err(|e| McpError::ExecutionFailed {
            message: e.to_string(),
        })?;

    to_json(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{GeneratorError, GeneratorResult};
    use crate::generator::{Message, MockTextGenerator, TextGenerator};
    use crate::server::test_support::create_test_state;
    use async_trait::async_trait;
    use serde_json::json;
    use std::time::Duration;

    /// Answers after a delay, so a generation can be caught in flight.
    struct SlowGenerator {
        delay: Duration,
    }

    #[async_trait]
    impl TextGenerator for SlowGenerator {
        async fn generate(&self, _messages: Vec<Message>) -> GeneratorResult<String> {
            tokio::time::sleep(self.delay).await;
            Ok(r#"[{"type":"text","title":"How many meals a day?"}]"#.to_string())
        }
    }

    async fn state_with(generator: impl TextGenerator + 'static) -> (SharedState, tempfile::TempDir) {
        let dir = tempfile::tempdir().unwrap();
        let (state, _) = create_test_state(dir.path(), generator).await;
        (state, dir)
    }

    async fn new_session(state: &SharedState) -> String {
        let created = handle_tool_call(state, "session_create", None).await.unwrap();
        created["session_id"].as_str().unwrap().to_string()
    }

    async fn call(state: &SharedState, tool: &str, args: Value) -> Value {
        handle_tool_call(state, tool, Some(args)).await.unwrap()
    }

    // ============================================================================
    // Parameter parsing
    // ============================================================================

    #[test]
    fn test_parse_arguments_missing() {
        let result: McpResult<SessionParams> = parse_arguments("questions_list", None);
        let err = result.unwrap_err();
        assert!(err.to_string().contains("Missing arguments"));
    }

    #[test]
    fn test_parse_answer_defaults_to_null() {
        let params: AnswerSubmitParams =
            parse_arguments("answer_submit", Some(json!({"session_id": "s", "question_id": "q"})))
                .unwrap();
        assert!(params.answer.is_empty());
    }

    #[test]
    fn test_parse_drafts_generate_defaults() {
        let params: DraftsGenerateParams =
            parse_arguments("drafts_generate", Some(json!({"session_id": "s"}))).unwrap();
        assert!(params.prompt.is_none());
        assert!(params.apply);
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let err = handle_tool_call(&state, "nope", None).await.unwrap_err();
        assert!(matches!(err, McpError::UnknownTool { .. }));
    }

    #[tokio::test]
    async fn test_unknown_session() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let err = handle_tool_call(&state, "questions_list", Some(json!({"session_id": "x"})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Session not found"));
    }

    #[tokio::test]
    async fn test_closed_session_is_not_found() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let sid = new_session(&state).await;

        let closed = call(&state, "session_close", json!({"session_id": sid})).await;
        assert_eq!(closed["closed"], true);
        assert_eq!(closed["cancelled_generation"], false);
        assert!(state.sessions.is_empty());

        let err = handle_tool_call(&state, "questions_list", Some(json!({"session_id": sid})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Session not found"));

        let err = handle_tool_call(&state, "session_close", Some(json!({"session_id": sid})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Session not found"));
    }

    // ============================================================================
    // Store and administration
    // ============================================================================

    #[tokio::test]
    async fn test_add_list_and_count_domains() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let sid = new_session(&state).await;

        let added = call(
            &state,
            "questions_add",
            json!({
                "session_id": sid,
                "questions": [
                    {"type": "text", "title": "Age?", "domain": "health"},
                    {"type": "text", "title": " age? "},
                    {"type": "radio", "title": "Sector?", "options": ["A", "B"]}
                ]
            }),
        )
        .await;
        assert_eq!(added["added"], 2);
        assert_eq!(added["duplicates"], 1);

        let listed = call(&state, "questions_list", json!({"session_id": sid})).await;
        assert_eq!(listed["questions"].as_array().unwrap().len(), 2);
        assert_eq!(listed["domain_counts"]["health"], 1);
        assert_eq!(listed["recently_added"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_timed_answer_flow() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let sid = new_session(&state).await;

        call(
            &state,
            "questions_add",
            json!({"session_id": sid, "questions": [{"id": "q1", "title": "Name?"}]}),
        )
        .await;
        call(&state, "survey_start", json!({"session_id": sid, "language": "en"})).await;

        let opened = call(&state, "question_present", json!({"session_id": sid, "question_id": "q1"})).await;
        assert_eq!(opened["opened"], true);

        let submitted = call(
            &state,
            "answer_submit",
            json!({"session_id": sid, "question_id": "q1", "answer": "Asha"}),
        )
        .await;
        assert_eq!(submitted["recorded"], true);
        // The manual clock did not move: the answer is flagged as too fast.
        assert_eq!(submitted["record"]["flags"], json!(["too_fast"]));

        let again = call(
            &state,
            "answer_submit",
            json!({"session_id": sid, "question_id": "q1", "answer": "Asha"}),
        )
        .await;
        assert_eq!(again["recorded"], false);

        let responses = call(&state, "responses_list", json!({"session_id": sid})).await;
        assert_eq!(responses["answered_titles"], json!(["name?"]));
    }

    #[tokio::test]
    async fn test_question_render_unknown_question() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let sid = new_session(&state).await;

        let err = handle_tool_call(
            &state,
            "question_render",
            Some(json!({"session_id": sid, "question_id": "q9", "channel": "ivr"})),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("q9"));
    }

    // ============================================================================
    // Drafts
    // ============================================================================

    #[tokio::test]
    async fn test_drafts_generate_applies_parsed_questions() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_| {
            Ok(r#"[{"type":"radio","title":"Are you employed?","options":["Yes","No"]}]"#.to_string())
        });
        let (state, _dir) = state_with(generator).await;
        let sid = new_session(&state).await;

        let result = call(
            &state,
            "drafts_generate",
            json!({"session_id": sid, "prompt": "employment in cities"}),
        )
        .await;
        assert_eq!(result["origin"], "parsed");
        assert_eq!(result["added"]["added"], 1);

        let listed = call(&state, "questions_list", json!({"session_id": sid})).await;
        assert_eq!(listed["questions"][0]["source"], "AI");
        assert_eq!(listed["domain_counts"]["employment"], 1);
    }

    #[tokio::test]
    async fn test_drafts_generate_uses_pending_suggestion() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .withf(|messages| messages[1].content.contains("crop yields"))
            .returning(|_| Ok("[]".to_string()));
        let (state, _dir) = state_with(generator).await;
        let sid = new_session(&state).await;

        call(&state, "followup_request", json!({"session_id": sid, "prompt": "crop yields"})).await;
        call(&state, "drafts_generate", json!({"session_id": sid})).await;

        let consumed = call(&state, "followup_consume", json!({"session_id": sid})).await;
        assert!(consumed["suggestion"].is_null());
    }

    #[tokio::test]
    async fn test_drafts_generate_without_prompt_fails() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let sid = new_session(&state).await;

        let err = handle_tool_call(&state, "drafts_generate", Some(json!({"session_id": sid})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("prompt"));
    }

    #[tokio::test]
    async fn test_missing_credential_is_surfaced() {
        let mut generator = MockTextGenerator::new();
        generator
            .expect_generate()
            .returning(|_| Err(GeneratorError::MissingCredential));
        let (state, _dir) = state_with(generator).await;
        let sid = new_session(&state).await;

        let err = handle_tool_call(
            &state,
            "drafts_generate",
            Some(json!({"session_id": sid, "prompt": "prices"})),
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("No API key"));
    }

    #[tokio::test]
    async fn test_generator_failure_falls_back_to_samples() {
        let mut generator = MockTextGenerator::new();
        generator.expect_generate().returning(|_| {
            Err(GeneratorError::Api {
                status: 500,
                message: "boom".to_string(),
            })
        });
        let (state, _dir) = state_with(generator).await;
        let sid = new_session(&state).await;

        let result = call(
            &state,
            "drafts_generate",
            json!({"session_id": sid, "prompt": "health visits", "apply": false}),
        )
        .await;
        assert_eq!(result["origin"], "mock");
        assert!(result["added"].is_null());
        assert!(!result["candidates"].as_array().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_drafts_cancel_discards_result() {
        let (state, _dir) = state_with(SlowGenerator {
            delay: Duration::from_millis(500),
        })
        .await;
        let sid = new_session(&state).await;
        let handle = state.sessions.get(&sid).unwrap();

        let task = tokio::spawn({
            let state = state.clone();
            let args = json!({"session_id": sid, "prompt": "food security"});
            async move { handle_tool_call(&state, "drafts_generate", Some(args)).await }
        });
        while !handle.generations().in_flight() {
            tokio::task::yield_now().await;
        }

        let cancelled = call(&state, "drafts_cancel", json!({"session_id": sid})).await;
        assert_eq!(cancelled["cancelled"], true);

        let result = task.await.unwrap().unwrap();
        assert_eq!(result["status"], "Cancelled");
        assert!(handle.lock().store().is_empty());

        let again = call(&state, "drafts_cancel", json!({"session_id": sid})).await;
        assert_eq!(again["cancelled"], false);
    }

    #[tokio::test]
    async fn test_newer_generation_supersedes_older() {
        let (state, _dir) = state_with(SlowGenerator {
            delay: Duration::from_millis(200),
        })
        .await;
        let sid = new_session(&state).await;
        let handle = state.sessions.get(&sid).unwrap();

        let first = tokio::spawn({
            let state = state.clone();
            let args = json!({"session_id": sid, "prompt": "meals"});
            async move { handle_tool_call(&state, "drafts_generate", Some(args)).await }
        });
        while !handle.generations().in_flight() {
            tokio::task::yield_now().await;
        }

        let second = call(&state, "drafts_generate", json!({"session_id": sid, "prompt": "meals"})).await;
        assert_eq!(second["added"]["added"], 1);

        let first = first.await.unwrap().unwrap();
        assert!(first["added"].is_null());
        assert_eq!(handle.lock().store().len(), 1);
        assert!(!handle.generations().in_flight());
    }

    #[tokio::test]
    async fn test_bank_load_filters_by_domain() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let sid = new_session(&state).await;

        let result = call(&state, "bank_load", json!({"session_id": sid, "domain": "prices"})).await;
        let added = result["added"]["added"].as_u64().unwrap();
        assert!(added > 0);

        let listed = call(&state, "questions_list", json!({"session_id": sid})).await;
        for q in listed["questions"].as_array().unwrap() {
            assert_eq!(q["source"], "Official");
        }
    }

    // ============================================================================
    // Export and persistence
    // ============================================================================

    #[tokio::test]
    async fn test_export_save_and_reload() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let sid = new_session(&state).await;
        call(
            &state,
            "questions_add",
            json!({"session_id": sid, "questions": [{"title": "Household size?"}]}),
        )
        .await;

        let exported = call(&state, "survey_export", json!({"session_id": sid, "title": "HH"})).await;
        assert_eq!(exported["saved"], true);
        let survey_id = exported["export"]["id"].as_str().unwrap().to_string();

        let listed = call(&state, "saved_surveys_list", json!({})).await;
        assert_eq!(listed["surveys"][0]["id"], survey_id.as_str());

        let other = new_session(&state).await;
        let imported = call(
            &state,
            "survey_import",
            json!({"session_id": other, "survey_id": survey_id}),
        )
        .await;
        assert_eq!(imported["added"], 1);

        call(&state, "saved_survey_delete", json!({"survey_id": survey_id})).await;
        let err = handle_tool_call(&state, "saved_survey_get", Some(json!({"survey_id": survey_id})))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Survey not found"));
    }

    #[tokio::test]
    async fn test_response_code_rules() {
        let (state, _dir) = state_with(MockTextGenerator::new()).await;
        let coded = call(&state, "response_code", json!({"text": "I teach at a school"})).await;
        assert_eq!(coded["coding"]["code"], "SEC_EDU");

        let blank = call(&state, "response_code", json!({"text": "  "})).await;
        assert!(blank["coding"].is_null());
    }
}
