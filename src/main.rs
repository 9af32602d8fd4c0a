use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use survey_paradata::{
    config::{Config, LogFormat},
    generator::HttpGenerator,
    ingestion::{QuestionBank, StaticQuestionBank},
    server::{AppState, McpServer},
    storage::{SqliteStorage, Storage},
};

/// Survey authoring and paradata server.
#[derive(Debug, Parser)]
#[command(name = "survey-paradata", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Serve MCP requests on stdin/stdout (default)
    Serve,
    /// Inspect saved survey exports
    Surveys {
        #[command(subcommand)]
        command: SurveysCommand,
    },
}

#[derive(Debug, Subcommand)]
enum SurveysCommand {
    /// List saved surveys, most recent first
    List {
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Print a saved export as JSON
    Show { id: String },
    /// Delete a saved export
    Delete { id: String },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match Config::from_env() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            std::process::exit(1);
        }
    };

    // Initialize logging
    init_logging(&config);

    // Initialize storage
    let storage = match SqliteStorage::new(&config.database).await {
        Ok(s) => {
            info!(path = %config.database.path.display(), "Database initialized");
            s
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize database");
            return Err(e.into());
        }
    };

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, storage).await,
        Command::Surveys { command } => surveys(&storage, command).await,
    }
}

async fn serve(config: Config, storage: SqliteStorage) -> anyhow::Result<()> {
    info!(
        version = env!("CARGO_PKG_VERSION"),
        "Survey paradata server starting..."
    );

    let generator = match HttpGenerator::new(&config.generator, config.request.clone()) {
        Ok(c) => {
            info!(base_url = %config.generator.base_url, model = %config.generator.model, "Generator client initialized");
            c
        }
        Err(e) => {
            error!(error = %e, "Failed to initialize generator client");
            return Err(e.into());
        }
    };
    if config.generator.api_key.is_none() {
        warn!("GENERATOR_API_KEY is not set; draft generation will be refused");
    }

    let bank: Arc<dyn QuestionBank> = match &config.bank.path {
        Some(path) => match StaticQuestionBank::from_path(path).await {
            Ok(bank) => Arc::new(bank),
            Err(e) => {
                error!(error = %e, "Failed to load question bank");
                return Err(e.into());
            }
        },
        None => Arc::new(StaticQuestionBank::builtin()),
    };

    let state = Arc::new(AppState::new(
        config,
        Arc::new(storage),
        Arc::new(generator),
        bank,
    ));

    let server = McpServer::new(state);

    info!("Server ready, waiting for requests on stdin...");

    if let Err(e) = server.run().await {
        error!(error = %e, "Server error");
        return Err(e.into());
    }

    info!("Server shutdown complete");
    Ok(())
}

async fn surveys(storage: &SqliteStorage, command: SurveysCommand) -> anyhow::Result<()> {
    match command {
        SurveysCommand::List { limit } => {
            for survey in storage.list_exports(limit).await? {
                println!(
                    "{}\t{}\t{} questions\t{}",
                    survey.id, survey.created_at, survey.question_count, survey.title
                );
            }
        }
        SurveysCommand::Show { id } => match storage.get_export(&id).await? {
            Some(export) => println!("{}", export.to_json_pretty()?),
            None => anyhow::bail!("Survey not found: {}", id),
        },
        SurveysCommand::Delete { id } => {
            storage.delete_export(&id).await?;
            println!("Deleted {}", id);
        }
    }
    Ok(())
}

/// Initialize tracing/logging
fn init_logging(config: &Config) {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.logging.level));

    match config.logging.format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Pretty => {
            tracing_subscriber::registry()
                .with(env_filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}
