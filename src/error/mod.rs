use thiserror::Error;

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Generator error: {0}")]
    Generator(#[from] GeneratorError),

    #[error("Question bank error: {0}")]
    Bank(#[from] BankError),

    #[error("MCP protocol error: {0}")]
    Mcp(#[from] McpError),
}

/// Storage layer errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Database connection failed: {message}")]
    Connection { message: String },

    #[error("Query failed: {message}")]
    Query { message: String },

    #[error("Survey not found: {survey_id}")]
    SurveyNotFound { survey_id: String },

    #[error("Migration failed: {message}")]
    Migration { message: String },

    #[error("SQLx error: {0}")]
    Sqlx(#[from] sqlx::Error),
}

/// Generative-text provider errors
#[derive(Debug, Error)]
pub enum GeneratorError {
    /// No API key configured. This is the one generation failure that is
    /// surfaced to the operator instead of being masked by mock candidates.
    #[error("No API key configured for the question generator")]
    MissingCredential,

    #[error("Generator unavailable: {message} (retries: {retries})")]
    Unavailable { message: String, retries: u32 },

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Request timeout after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Official question bank errors
#[derive(Debug, Error)]
pub enum BankError {
    #[error("Failed to read question bank {path}: {message}")]
    Read { path: String, message: String },

    #[error("Malformed question bank: {0}")]
    Malformed(#[from] serde_json::Error),
}

/// MCP protocol errors
#[derive(Debug, Error)]
pub enum McpError {
    #[error("Unknown tool: {tool_name}")]
    UnknownTool { tool_name: String },

    #[error("Invalid parameters for {tool_name}: {message}")]
    InvalidParameters { tool_name: String, message: String },

    #[error("Tool execution failed: {message}")]
    ExecutionFailed { message: String },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Tool-specific errors with structured details
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Validation failed: {field} - {reason}")]
    Validation { field: String, reason: String },

    #[error("Session not found: {session_id}")]
    SessionNotFound { session_id: String },
}

impl From<AppError> for McpError {
    fn from(err: AppError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

impl From<ToolError> for McpError {
    fn from(err: ToolError) -> Self {
        McpError::ExecutionFailed {
            message: err.to_string(),
        }
    }
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

/// Result type alias for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Result type alias for generator operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Result type alias for question bank operations
pub type BankResult<T> = Result<T, BankError>;

/// Result type alias for MCP operations
pub type McpResult<T> = Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config {
            message: "MAX_DRAFT_CANDIDATES must be positive".to_string(),
        };
        assert_eq!(err.to_string(), "Configuration error: MAX_DRAFT_CANDIDATES must be positive");

        let err: AppError = StorageError::SurveyNotFound {
            survey_id: "survey_123".to_string(),
        }
        .into();
        assert_eq!(err.to_string(), "Storage error: Survey not found: survey_123");
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::SurveyNotFound {
            survey_id: "survey_123".to_string(),
        };
        assert_eq!(err.to_string(), "Survey not found: survey_123");

        let err = StorageError::Migration {
            message: "checksum mismatch for 20240601000000".to_string(),
        };
        assert_eq!(err.to_string(), "Migration failed: checksum mismatch for 20240601000000");
    }

    #[test]
    fn test_generator_error_display() {
        assert_eq!(
            GeneratorError::MissingCredential.to_string(),
            "No API key configured for the question generator"
        );

        let err = GeneratorError::Unavailable {
            message: "connection refused".to_string(),
            retries: 2,
        };
        assert_eq!(err.to_string(), "Generator unavailable: connection refused (retries: 2)");

        let err = GeneratorError::Api {
            status: 401,
            message: "unauthorized".to_string(),
        };
        assert_eq!(err.to_string(), "API error: 401 - unauthorized");

        let err = GeneratorError::Timeout { timeout_ms: 8000 };
        assert_eq!(err.to_string(), "Request timeout after 8000ms");
    }

    #[test]
    fn test_bank_error_display() {
        let err = BankError::Read {
            path: "bank.json".to_string(),
            message: "not found".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Failed to read question bank bank.json: not found"
        );
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::Validation {
            field: "prompt".to_string(),
            reason: "cannot be empty".to_string(),
        };
        assert_eq!(err.to_string(), "Validation failed: prompt - cannot be empty");

        let err = ToolError::SessionNotFound {
            session_id: "s-1".to_string(),
        };
        assert_eq!(err.to_string(), "Session not found: s-1");
    }

    #[test]
    fn test_app_error_conversion_to_mcp_error() {
        let app_err = AppError::Config {
            message: "LOG_FORMAT".to_string(),
        };
        let mcp_err: McpError = app_err.into();
        assert!(matches!(mcp_err, McpError::ExecutionFailed { .. }));
        assert!(mcp_err.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_generator_error_conversion_to_app_error() {
        let err: AppError = GeneratorError::Timeout { timeout_ms: 1000 }.into();
        assert!(matches!(err, AppError::Generator(_)));
    }

    #[test]
    fn test_storage_error_conversion_to_app_error() {
        let err: AppError = StorageError::SurveyNotFound {
            survey_id: "x".to_string(),
        }
        .into();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
