use std::env;
use std::path::PathBuf;

use crate::error::AppError;

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub generator: GeneratorConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub request: RequestConfig,
    pub paradata: ParadataConfig,
    pub ingestion: IngestionConfig,
    pub bank: BankConfig,
    pub summary: SummaryConfig,
}

/// Generative-text provider configuration
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    /// Missing keys are only reported when a generation is attempted.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub streaming: bool,
    pub stream_timeout_ms: u64,
}

/// Database configuration
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_connections: u32,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

/// Log output format
#[derive(Debug, Clone, PartialEq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// HTTP request configuration
#[derive(Debug, Clone)]
pub struct RequestConfig {
    pub timeout_ms: u64,
    pub max_retries: u32,
    pub retry_delay_ms: u64,
}

/// Paradata recording configuration
#[derive(Debug, Clone)]
pub struct ParadataConfig {
    /// Answers closed faster than this are flagged `too_fast`.
    pub too_fast_ms: i64,
    /// Number of characters kept in a record's answer preview.
    pub preview_chars: usize,
    pub device_platform: String,
    pub device_os_version: Option<String>,
}

/// Bounds applied to generated draft questions
#[derive(Debug, Clone)]
pub struct IngestionConfig {
    pub max_candidates: usize,
    pub max_options: usize,
    pub max_option_chars: usize,
    pub max_note_chars: usize,
}

/// Official question bank configuration
#[derive(Debug, Clone, Default)]
pub struct BankConfig {
    /// JSON file with bank entries; the built-in bank is used when unset.
    pub path: Option<PathBuf>,
}

/// Response summarizer configuration
#[derive(Debug, Clone)]
pub struct SummaryConfig {
    pub delay_ms: u64,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, AppError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let generator = GeneratorConfig {
            api_key: env::var("GENERATOR_API_KEY")
                .ok()
                .filter(|k| !k.trim().is_empty()),
            base_url: env::var("GENERATOR_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com".to_string()),
            model: env::var("GENERATOR_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            streaming: env::var("GENERATOR_STREAMING")
                .map(|v| !matches!(v.to_lowercase().as_str(), "false" | "0" | "no"))
                .unwrap_or(true),
            stream_timeout_ms: parse_env("GENERATOR_STREAM_TIMEOUT_MS", 8000),
        };

        let database = DatabaseConfig {
            path: PathBuf::from(
                env::var("DATABASE_PATH").unwrap_or_else(|_| "./data/surveys.db".to_string()),
            ),
            max_connections: parse_env("DATABASE_MAX_CONNECTIONS", 5),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT")
                .unwrap_or_else(|_| "pretty".to_string())
                .to_lowercase()
                .as_str()
            {
                "json" => LogFormat::Json,
                _ => LogFormat::Pretty,
            },
        };

        let request = RequestConfig {
            timeout_ms: parse_env("REQUEST_TIMEOUT_MS", 30000),
            max_retries: parse_env("MAX_RETRIES", 2),
            retry_delay_ms: parse_env("RETRY_DELAY_MS", 500),
        };

        let paradata = ParadataConfig {
            too_fast_ms: parse_env("TOO_FAST_THRESHOLD_MS", 1500),
            preview_chars: parse_env("RESPONSE_PREVIEW_CHARS", 40),
            device_platform: env::var("DEVICE_PLATFORM")
                .unwrap_or_else(|_| env::consts::OS.to_string()),
            device_os_version: env::var("DEVICE_OS_VERSION").ok(),
        };

        let ingestion = IngestionConfig {
            max_candidates: parse_env("MAX_DRAFT_CANDIDATES", 60),
            max_options: parse_env("MAX_DRAFT_OPTIONS", 12),
            max_option_chars: parse_env("MAX_OPTION_CHARS", 80),
            max_note_chars: parse_env("MAX_DRAFT_NOTE_CHARS", 4000),
        };

        let bank = BankConfig {
            path: env::var("QUESTION_BANK_PATH").ok().map(PathBuf::from),
        };

        let summary = SummaryConfig {
            delay_ms: parse_env("SUMMARY_DELAY_MS", 250),
        };

        let config = Config {
            generator,
            database,
            logging,
            request,
            paradata,
            ingestion,
            bank,
            summary,
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would disable a bound entirely.
    pub fn validate(&self) -> Result<(), AppError> {
        let zero = |name: &str| AppError::Config {
            message: format!("{} must be greater than zero", name),
        };

        if self.generator.stream_timeout_ms == 0 {
            return Err(zero("GENERATOR_STREAM_TIMEOUT_MS"));
        }
        if self.ingestion.max_candidates == 0 {
            return Err(zero("MAX_DRAFT_CANDIDATES"));
        }
        if self.ingestion.max_options == 0 {
            return Err(zero("MAX_DRAFT_OPTIONS"));
        }
        if self.ingestion.max_option_chars == 0 {
            return Err(zero("MAX_OPTION_CHARS"));
        }
        if self.ingestion.max_note_chars == 0 {
            return Err(zero("MAX_DRAFT_NOTE_CHARS"));
        }
        Ok(())
    }
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key)
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(default)
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            streaming: true,
            stream_timeout_ms: 8000,
        }
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 30000,
            max_retries: 2,
            retry_delay_ms: 500,
        }
    }
}

impl Default for ParadataConfig {
    fn default() -> Self {
        Self {
            too_fast_ms: 1500,
            preview_chars: 40,
            device_platform: env::consts::OS.to_string(),
            device_os_version: None,
        }
    }
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            max_candidates: 60,
            max_options: 12,
            max_option_chars: 80,
            max_note_chars: 4000,
        }
    }
}

impl Default for SummaryConfig {
    fn default() -> Self {
        Self { delay_ms: 250 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_config() -> Config {
        Config {
            generator: GeneratorConfig::default(),
            database: DatabaseConfig {
                path: PathBuf::from(":memory:"),
                max_connections: 1,
            },
            logging: LoggingConfig {
                level: "info".to_string(),
                format: LogFormat::Pretty,
            },
            request: RequestConfig::default(),
            paradata: ParadataConfig::default(),
            ingestion: IngestionConfig::default(),
            bank: BankConfig::default(),
            summary: SummaryConfig::default(),
        }
    }

    #[test]
    fn test_defaults_match_documented_bounds() {
        let config = sample_config();
        assert_eq!(config.generator.stream_timeout_ms, 8000);
        assert_eq!(config.paradata.too_fast_ms, 1500);
        assert_eq!(config.paradata.preview_chars, 40);
        assert_eq!(config.ingestion.max_candidates, 60);
        assert_eq!(config.ingestion.max_options, 12);
        assert_eq!(config.ingestion.max_note_chars, 4000);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_caps() {
        let mut config = sample_config();
        config.ingestion.max_candidates = 0;
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("MAX_DRAFT_CANDIDATES"));

        let mut config = sample_config();
        config.generator.stream_timeout_ms = 0;
        assert!(config.validate().is_err());
    }
}
