//! MCP protocol implementation for JSON-RPC 2.0 communication.
//!
//! This module provides the core MCP server implementation including:
//! - JSON-RPC 2.0 request/response handling
//! - Tool definitions and schemas
//! - Line-delimited stdio communication

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;
use tracing::{debug, error, info};

use super::{handle_tool_call, SharedState, LONG_RUNNING_TOOLS};

#[cfg(test)]
#[path = "mcp_tests.rs"]
mod mcp_tests;

/// JSON-RPC 2.0 request structure.
#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0").
    pub jsonrpc: String,
    /// Request identifier (None for notifications).
    pub id: Option<Value>,
    /// The method name to invoke.
    pub method: String,
    /// Optional parameters for the method.
    #[serde(default)]
    pub params: Option<Value>,
}

/// JSON-RPC 2.0 response structure.
#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (always "2.0").
    pub jsonrpc: String,
    /// Request identifier (null when the request could not be parsed).
    pub id: Value,
    /// The result on success (mutually exclusive with error).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// The error on failure (mutually exclusive with result).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

/// JSON-RPC 2.0 error object.
#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    /// Error code (negative for predefined errors).
    pub code: i32,
    /// Human-readable error message.
    pub message: String,
    /// Optional additional error data.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// MCP server information returned during initialization.
#[derive(Debug, Serialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}

/// MCP server capabilities advertised to clients.
#[derive(Debug, Serialize)]
pub struct Capabilities {
    pub tools: ToolCapabilities,
}

/// Tool-specific capabilities.
#[derive(Debug, Serialize)]
pub struct ToolCapabilities {
    /// Whether the tool list can change dynamically.
    #[serde(rename = "listChanged")]
    pub list_changed: bool,
}

/// Result of the MCP initialize handshake.
#[derive(Debug, Serialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: Capabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// MCP tool definition with JSON Schema.
#[derive(Debug, Clone, Serialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// Parameters for a tools/call request.
#[derive(Debug, Deserialize)]
pub struct ToolCallParams {
    pub name: String,
    #[serde(default)]
    pub arguments: Option<Value>,
}

/// Content item within a tool result.
#[derive(Debug, Serialize)]
pub struct ToolResultContent {
    /// The content type (always "text").
    #[serde(rename = "type")]
    pub content_type: String,
    pub text: String,
}

/// Result of a tool invocation.
#[derive(Debug, Serialize)]
pub struct ToolCallResult {
    pub content: Vec<ToolResultContent>,
    /// Whether the result represents an error.
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    pub is_error: Option<bool>,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: Some(result),
            error: None,
        }
    }

    /// Create an error response
    pub fn error(id: Option<Value>, code: i32, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id: id.unwrap_or(Value::Null),
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
                data: None,
            }),
        }
    }
}

/// MCP Server running over line-delimited JSON.
///
/// Requests are handled in arrival order. Tool calls listed in
/// [`LONG_RUNNING_TOOLS`] run on their own task so a later request (for
/// instance `drafts_cancel`) is not stuck behind them; all responses go
/// through one writer.
#[derive(Clone)]
pub struct McpServer {
    state: SharedState,
}

impl McpServer {
    /// Create a new MCP server
    pub fn new(state: SharedState) -> Self {
        Self { state }
    }

    /// Run the server using async stdio
    pub async fn run(&self) -> std::io::Result<()> {
        self.serve(BufReader::new(tokio::io::stdin()), tokio::io::stdout())
            .await
    }

    /// Serve requests from `reader` until EOF, writing responses to `writer`.
    ///
    /// Returns once every in-flight tool call has answered.
    pub async fn serve<R, W>(&self, mut reader: R, writer: W) -> std::io::Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin + Send + 'static,
    {
        info!("Survey paradata server starting...");

        let (tx, rx) = mpsc::unbounded_channel::<JsonRpcResponse>();
        let writer_task = tokio::spawn(write_responses(rx, writer));
        let mut line = String::new();

        loop {
            line.clear();
            let bytes_read = reader.read_line(&mut line).await?;

            // EOF reached
            if bytes_read == 0 {
                info!("EOF received, shutting down");
                break;
            }

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            debug!(request = %trimmed, "Received request");

            let request = match serde_json::from_str::<JsonRpcRequest>(trimmed) {
                Ok(request) => request,
                Err(e) => {
                    error!(error = %e, "Failed to parse request");
                    let _ = tx.send(JsonRpcResponse::error(
                        None,
                        -32700,
                        format!("Parse error: {}", e),
                    ));
                    continue;
                }
            };

            if is_long_running(&request) {
                let server = self.clone();
                let tx = tx.clone();
                tokio::spawn(async move {
                    if let Some(response) = server.handle_request(request).await {
                        let _ = tx.send(response);
                    }
                });
            } else if let Some(response) = self.handle_request(request).await {
                let _ = tx.send(response);
            }
        }

        drop(tx);
        match writer_task.await {
            Ok(result) => result,
            Err(e) => Err(std::io::Error::other(e)),
        }
    }

    /// Handle a single JSON-RPC request
    /// Returns None for notifications (requests without id)
    async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        let is_notification = request.id.is_none();

        match request.method.as_str() {
            "initialize" => Some(self.handle_initialize(request.id)),
            "initialized" | "notifications/initialized" => {
                debug!("Received initialized notification");
                None
            }
            "notifications/cancelled" => {
                debug!("Received cancelled notification");
                None
            }
            "tools/list" => Some(self.handle_tools_list(request.id)),
            "tools/call" => Some(self.handle_tool_call(request.id, request.params).await),
            "ping" => Some(JsonRpcResponse::success(
                request.id,
                Value::Object(Default::default()),
            )),
            method => {
                if is_notification {
                    debug!(method = %method, "Unknown notification, ignoring");
                    None
                } else {
                    error!(method = %method, "Unknown method");
                    Some(JsonRpcResponse::error(
                        request.id,
                        -32601,
                        format!("Method not found: {}", method),
                    ))
                }
            }
        }
    }

    /// Handle initialize request
    fn handle_initialize(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling initialize request");

        let result = InitializeResult {
            protocol_version: "2024-11-05".to_string(),
            capabilities: Capabilities {
                tools: ToolCapabilities {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: "survey-paradata".to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        match serde_json::to_value(result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize initialize result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }

    /// Handle tools/list request
    fn handle_tools_list(&self, id: Option<Value>) -> JsonRpcResponse {
        info!("Handling tools/list request");
        JsonRpcResponse::success(id, json!({ "tools": tool_definitions() }))
    }

    /// Handle tools/call request
    async fn handle_tool_call(&self, id: Option<Value>, params: Option<Value>) -> JsonRpcResponse {
        let params: ToolCallParams = match params {
            Some(p) => match serde_json::from_value(p) {
                Ok(p) => p,
                Err(e) => {
                    return JsonRpcResponse::error(id, -32602, format!("Invalid params: {}", e));
                }
            },
            None => {
                return JsonRpcResponse::error(id, -32602, "Missing params");
            }
        };

        info!(tool = %params.name, "Handling tool call");

        let (content, is_error) =
            match handle_tool_call(&self.state, &params.name, params.arguments).await {
                Ok(result) => {
                    let text = serde_json::to_string_pretty(&result).unwrap_or_else(|e| {
                        error!(error = %e, "Failed to serialize tool result");
                        format!("{{\"error\": \"Serialization failed: {}\"}}", e)
                    });
                    (
                        ToolResultContent {
                            content_type: "text".to_string(),
                            text,
                        },
                        None,
                    )
                }
                Err(e) => (
                    ToolResultContent {
                        content_type: "text".to_string(),
                        text: format!("Error: {}", e),
                    },
                    Some(true),
                ),
            };

        let tool_result = ToolCallResult {
            content: vec![content],
            is_error,
        };

        match serde_json::to_value(tool_result) {
            Ok(val) => JsonRpcResponse::success(id, val),
            Err(e) => {
                error!(error = %e, "Failed to serialize tool call result");
                JsonRpcResponse::error(id, -32603, format!("Internal error: {}", e))
            }
        }
    }
}

fn is_long_running(request: &JsonRpcRequest) -> bool {
    request.method == "tools/call"
        && request
            .params
            .as_ref()
            .and_then(|p| p.get("name"))
            .and_then(Value::as_str)
            .is_some_and(|name| LONG_RUNNING_TOOLS.contains(&name))
}

async fn write_responses<W>(
    mut rx: mpsc::UnboundedReceiver<JsonRpcResponse>,
    mut writer: W,
) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(response) = rx.recv().await {
        let response_json = serde_json::to_string(&response)?;
        debug!(response = %response_json, "Sending response");

        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }
    Ok(())
}

/// Every tool the server exposes, in listing order.
pub fn tool_definitions() -> Vec<Tool> {
    vec![
        get_session_create_tool(),
        get_session_close_tool(),
        // Question store
        get_questions_add_tool(),
        get_questions_list_tool(),
        get_questions_update_tool(),
        get_questions_remove_tool(),
        get_questions_reorder_tool(),
        get_questions_reset_tool(),
        get_questions_localize_tool(),
        get_question_render_tool(),
        // Administration and paradata
        get_survey_start_tool(),
        get_survey_complete_tool(),
        get_survey_restart_tool(),
        get_question_present_tool(),
        get_answer_submit_tool(),
        get_consent_record_tool(),
        get_paradata_summary_tool(),
        // Response ledger
        get_responses_list_tool(),
        get_responses_reset_tool(),
        get_responses_summarize_tool(),
        get_response_code_tool(),
        // Adaptive follow-ups
        get_followup_request_tool(),
        get_followup_from_answer_tool(),
        get_followup_consume_tool(),
        get_followup_clear_tool(),
        // Drafts and the question bank
        get_drafts_generate_tool(),
        get_drafts_cancel_tool(),
        get_bank_load_tool(),
        // Export and persistence
        get_survey_export_tool(),
        get_survey_import_tool(),
        get_saved_surveys_list_tool(),
        get_saved_survey_get_tool(),
        get_saved_survey_delete_tool(),
    ]
}

fn session_id_property() -> Value {
    json!({
        "type": "string",
        "description": "Session ID returned by session_create"
    })
}

fn question_id_property() -> Value {
    json!({
        "type": "string",
        "description": "Question ID within the session"
    })
}

/// Tool that takes only a session id.
fn session_only_tool(name: &str, description: &str) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property()
            },
            "required": ["session_id"],
            "additionalProperties": false
        }),
    }
}

/// Tool that takes a session id and a question id.
fn question_tool(name: &str, description: &str) -> Tool {
    Tool {
        name: name.to_string(),
        description: description.to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "question_id": question_id_property()
            },
            "required": ["session_id", "question_id"],
            "additionalProperties": false
        }),
    }
}

fn question_candidate_schema() -> Value {
    json!({
        "type": "object",
        "properties": {
            "id": {"type": "string", "description": "Preferred ID; replaced if already taken"},
            "type": {
                "type": "string",
                "enum": ["text", "radio", "checkbox", "multiple_choice"],
                "description": "Question type (unknown names become text)"
            },
            "title": {"type": "string"},
            "options": {"type": "array", "items": {"type": "string"}},
            "required": {"type": "boolean"},
            "domain": {"type": "string"},
            "source": {"type": "string", "enum": ["AI", "Official", "Template", "Mock"]}
        },
        "required": ["title"]
    })
}

fn get_session_create_tool() -> Tool {
    Tool {
        name: "session_create".to_string(),
        description: "Create a survey session with an empty question store, paradata recorder and response ledger.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {},
            "additionalProperties": false
        }),
    }
}

fn get_session_close_tool() -> Tool {
    session_only_tool(
        "session_close",
        "Close a session and release its state. Any draft generation in flight for it is cancelled.",
    )
}

fn get_questions_add_tool() -> Tool {
    Tool {
        name: "questions_add".to_string(),
        description: "Add questions to the session. Blank titles are skipped and titles already present (case-insensitive) are counted as duplicates.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "questions": {
                    "type": "array",
                    "items": question_candidate_schema()
                }
            },
            "required": ["session_id", "questions"],
            "additionalProperties": false
        }),
    }
}

fn get_questions_list_tool() -> Tool {
    session_only_tool(
        "questions_list",
        "List the session's questions in order, with the IDs from the latest add and per-domain counts.",
    )
}

fn get_questions_update_tool() -> Tool {
    Tool {
        name: "questions_update".to_string(),
        description: "Patch one question. A title that collides with another question is rejected.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "question_id": question_id_property(),
                "patch": {
                    "type": "object",
                    "properties": {
                        "title": {"type": "string"},
                        "type": {"type": "string", "enum": ["text", "radio", "checkbox", "multiple_choice"]},
                        "options": {"type": "array", "items": {"type": "string"}},
                        "required": {"type": "boolean"},
                        "domain": {"type": "string"},
                        "hiTitle": {"type": "string"}
                    },
                    "additionalProperties": false
                }
            },
            "required": ["session_id", "question_id", "patch"],
            "additionalProperties": false
        }),
    }
}

fn get_questions_remove_tool() -> Tool {
    question_tool("questions_remove", "Remove a question from the session.")
}

fn get_questions_reorder_tool() -> Tool {
    Tool {
        name: "questions_reorder".to_string(),
        description: "Move the question at position `from` to position `to` (clamped to the end).".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "from": {"type": "integer", "minimum": 0},
                "to": {"type": "integer", "minimum": 0}
            },
            "required": ["session_id", "from", "to"],
            "additionalProperties": false
        }),
    }
}

fn get_questions_reset_tool() -> Tool {
    session_only_tool(
        "questions_reset",
        "Remove every question and clear the domain counts.",
    )
}

fn get_questions_localize_tool() -> Tool {
    session_only_tool(
        "questions_localize",
        "Fill in Hindi titles for questions that do not have one yet.",
    )
}

fn get_question_render_tool() -> Tool {
    Tool {
        name: "question_render".to_string(),
        description: "Render a question for a delivery channel: WhatsApp messages, an IVR prompt or a web form field.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "question_id": question_id_property(),
                "channel": {"type": "string", "enum": ["whatsapp", "ivr", "web"]},
                "locale": {"type": "string", "enum": ["en", "hi"], "default": "en"}
            },
            "required": ["session_id", "question_id", "channel"],
            "additionalProperties": false
        }),
    }
}

fn get_survey_start_tool() -> Tool {
    Tool {
        name: "survey_start".to_string(),
        description: "Start administering the survey. Clears timing records; consent is kept.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "language": {"type": "string", "description": "Interview language code"},
                "survey_id": {"type": "string"}
            },
            "required": ["session_id"],
            "additionalProperties": false
        }),
    }
}

fn get_survey_complete_tool() -> Tool {
    session_only_tool(
        "survey_complete",
        "Mark the survey as completed and return the paradata summary.",
    )
}

fn get_survey_restart_tool() -> Tool {
    session_only_tool(
        "survey_restart",
        "Start over for a new respondent: clears paradata, responses, summaries and the pending follow-up. Questions are kept.",
    )
}

fn get_question_present_tool() -> Tool {
    question_tool(
        "question_present",
        "The question is now on screen: open its timer. Ignored while a timer for it is already open.",
    )
}

fn get_answer_submit_tool() -> Tool {
    Tool {
        name: "answer_submit".to_string(),
        description: "Close the question's timer, flag too-fast or empty answers, and record non-empty answers in the ledger.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "question_id": question_id_property(),
                "answer": {
                    "description": "Text, list of selected options, or null for no answer"
                }
            },
            "required": ["session_id", "question_id"],
            "additionalProperties": false
        }),
    }
}

fn get_consent_record_tool() -> Tool {
    Tool {
        name: "consent_record".to_string(),
        description: "Record consent with its time and a fingerprint of the consent text. The fingerprint is not a cryptographic hash.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "payload": {"type": "string", "description": "Consent text shown to the respondent"}
            },
            "required": ["session_id", "payload"],
            "additionalProperties": false
        }),
    }
}

fn get_paradata_summary_tool() -> Tool {
    session_only_tool(
        "paradata_summary",
        "Survey-level paradata: timing records ordered by start time, quality counters, device and consent.",
    )
}

fn get_responses_list_tool() -> Tool {
    session_only_tool(
        "responses_list",
        "Recorded answers oldest first, with the normalized titles of answered questions.",
    )
}

fn get_responses_reset_tool() -> Tool {
    session_only_tool(
        "responses_reset",
        "Clear the response ledger and its summaries.",
    )
}

fn get_responses_summarize_tool() -> Tool {
    session_only_tool(
        "responses_summarize",
        "Summarize the most recent free-text answers and return the summary history, newest first.",
    )
}

fn get_response_code_tool() -> Tool {
    Tool {
        name: "response_code".to_string(),
        description: "Assign a sector code to a free-text answer using keyword rules or, with use_ai, the question generator.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "text": {"type": "string"},
                "use_ai": {"type": "boolean", "default": false}
            },
            "required": ["text"],
            "additionalProperties": false
        }),
    }
}

fn get_followup_request_tool() -> Tool {
    Tool {
        name: "followup_request".to_string(),
        description: "Post a follow-up brief for the draft generator, replacing any pending one.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "prompt": {"type": "string"}
            },
            "required": ["session_id", "prompt"],
            "additionalProperties": false
        }),
    }
}

fn get_followup_from_answer_tool() -> Tool {
    question_tool(
        "followup_from_answer",
        "Build a follow-up brief from the recorded answer to a question and post it.",
    )
}

fn get_followup_consume_tool() -> Tool {
    session_only_tool(
        "followup_consume",
        "Take the pending follow-up brief, leaving none pending.",
    )
}

fn get_followup_clear_tool() -> Tool {
    session_only_tool("followup_clear", "Drop the pending follow-up brief.")
}

fn get_drafts_generate_tool() -> Tool {
    Tool {
        name: "drafts_generate".to_string(),
        description: "Draft questions with the generator. Uses the pending follow-up when no prompt is given, skips questions already answered, and falls back to sample questions when generation fails. Supersedes any generation in flight for the session.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "prompt": {"type": "string", "description": "Survey brief"},
                "apply": {
                    "type": "boolean",
                    "default": true,
                    "description": "Add the drafts to the session instead of only returning them"
                }
            },
            "required": ["session_id"],
            "additionalProperties": false
        }),
    }
}

fn get_drafts_cancel_tool() -> Tool {
    session_only_tool(
        "drafts_cancel",
        "Cancel the draft generation in flight; its result will be discarded.",
    )
}

fn get_bank_load_tool() -> Tool {
    Tool {
        name: "bank_load".to_string(),
        description: "Load official questions from the question bank, optionally filtered by domain or survey.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "domain": {"type": "string"},
                "survey_id": {"type": "string", "description": "Official survey code, e.g. PLFS"},
                "apply": {"type": "boolean", "default": true}
            },
            "required": ["session_id"],
            "additionalProperties": false
        }),
    }
}

fn get_survey_export_tool() -> Tool {
    Tool {
        name: "survey_export".to_string(),
        description: "Export the session's questions and paradata as a versioned JSON document, saving it unless save is false.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "title": {"type": "string"},
                "description": {"type": "string"},
                "save": {"type": "boolean", "default": true}
            },
            "required": ["session_id"],
            "additionalProperties": false
        }),
    }
}

fn get_survey_import_tool() -> Tool {
    Tool {
        name: "survey_import".to_string(),
        description: "Add the questions of an export document, or of a saved survey, to the session.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "session_id": session_id_property(),
                "survey_id": {"type": "string", "description": "ID of a saved survey"},
                "export": {"type": "object", "description": "Export document"}
            },
            "required": ["session_id"],
            "additionalProperties": false
        }),
    }
}

fn get_saved_surveys_list_tool() -> Tool {
    Tool {
        name: "saved_surveys_list".to_string(),
        description: "List saved surveys, most recent first.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "limit": {"type": "integer", "minimum": 1, "default": 20}
            },
            "additionalProperties": false
        }),
    }
}

fn get_saved_survey_get_tool() -> Tool {
    Tool {
        name: "saved_survey_get".to_string(),
        description: "Fetch a saved survey export by ID.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "survey_id": {"type": "string"}
            },
            "required": ["survey_id"],
            "additionalProperties": false
        }),
    }
}

fn get_saved_survey_delete_tool() -> Tool {
    Tool {
        name: "saved_survey_delete".to_string(),
        description: "Delete a saved survey export.".to_string(),
        input_schema: json!({
            "type": "object",
            "properties": {
                "survey_id": {"type": "string"}
            },
            "required": ["survey_id"],
            "additionalProperties": false
        }),
    }
}
