//! Console driver for the architecture advisor.
//!
//! Reads one user turn per line from stdin and prints the assistant's
//! replies. Sessions are saved after every turn, so a consultation can be
//! picked up later with `--session <id>`.

use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use secrecy::ExposeSecret;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer};
use uuid::Uuid;

use architect_advisor::adapters::reasoning::{
    AnthropicConfig, AnthropicReasoningProvider, MockReasoningProvider,
};
use architect_advisor::adapters::storage::FileSessionStore;
use architect_advisor::application::{
    ConsultationTurnResult, ResumeConsultationCommand, ResumeConsultationHandler,
    StartConsultationCommand, StartConsultationHandler, WorkflowEngine,
};
use architect_advisor::config::{AppConfig, LogFormat, LoggingConfig, ReasoningConfig};
use architect_advisor::domain::foundation::SessionId;
use architect_advisor::ports::{ReasoningProvider, SessionStore};

#[derive(Parser)]
#[command(
    name = "architect-advisor",
    version,
    about = "Multi-turn architecture consultation in the terminal"
)]
struct Cli {
    /// Continue a saved session instead of starting a new one.
    #[arg(long)]
    session: Option<Uuid>,

    /// Directory for session snapshots. Overrides `storage.sessions_dir`.
    #[arg(long)]
    sessions_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    let mut config = AppConfig::load().context("load configuration")?;
    if let Some(dir) = cli.sessions_dir {
        config.storage.sessions_dir = dir;
    }
    config.validate().context("validate configuration")?;
    init_logging(&config.logging)?;

    let provider = reasoning_provider(&config.reasoning)?;
    let engine = Arc::new(WorkflowEngine::new(provider, config.workflow.clone()));
    let store: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(&config.storage.sessions_dir));

    let start = StartConsultationHandler::new(engine.clone(), store.clone());
    let resume = ResumeConsultationHandler::new(engine, store.clone());

    let mut session_id = match cli.session.map(SessionId::from_uuid) {
        Some(id) => {
            store
                .load(&id)
                .await
                .with_context(|| format!("load session {id}"))?;
            println!("Resuming session {id}.");
            Some(id)
        }
        None => {
            println!("Describe the system you want to build.");
            None
        }
    };

    let stdin = io::stdin();
    prompt()?;
    for line in stdin.lock().lines() {
        let line = line.context("read input")?;
        let message = line.trim();
        if message.is_empty() {
            prompt()?;
            continue;
        }
        if matches!(message, "/quit" | "/exit") {
            break;
        }

        let result = match session_id {
            Some(id) => {
                resume
                    .handle(ResumeConsultationCommand {
                        session_id: id,
                        message: message.to_string(),
                    })
                    .await
            }
            None => {
                start
                    .handle(StartConsultationCommand {
                        session_id: None,
                        message: message.to_string(),
                    })
                    .await
            }
        };

        match result {
            Ok(turn) => {
                session_id = Some(turn.state.session_id);
                print_turn(&turn);
            }
            Err(err) => {
                warn!(error = %err, "Turn failed");
                eprintln!("Something went wrong: {err}");
            }
        }
        prompt()?;
    }

    if let Some(id) = session_id {
        println!("\nSession saved as {id}.");
    }
    Ok(())
}

fn reasoning_provider(config: &ReasoningConfig) -> Result<Arc<dyn ReasoningProvider>> {
    let Some(api_key) = config.api_key.as_ref().map(|k| k.expose_secret().clone()) else {
        warn!("No reasoning API key configured, every node will use its deterministic fallback");
        return Ok(Arc::new(MockReasoningProvider::unavailable()));
    };

    let anthropic = AnthropicConfig::new(api_key)
        .with_model(config.model.clone())
        .with_base_url(config.base_url.clone())
        .with_timeout(config.timeout())
        .with_max_retries(config.max_retries)
        .with_max_backoff(config.max_backoff())
        .with_max_tokens(config.max_tokens);
    let provider = AnthropicReasoningProvider::new(anthropic).context("create reasoning provider")?;
    info!(model = %config.model, "Using Anthropic reasoning provider");
    Ok(Arc::new(provider))
}

fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .context("parse log level")?;

    let layer = match config.log_format {
        LogFormat::Json => tracing_subscriber::fmt::layer()
            .json()
            .with_writer(io::stderr)
            .boxed(),
        LogFormat::Pretty => tracing_subscriber::fmt::layer()
            .with_target(false)
            .with_writer(io::stderr)
            .boxed(),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}

fn print_turn(turn: &ConsultationTurnResult) {
    for reply in &turn.replies {
        println!("\n{reply}");
    }
    if turn.completed {
        println!("\nThe recommendation is complete. Send a follow-up to refine it, or /quit.");
    }
}

fn prompt() -> Result<()> {
    print!("\n> ");
    io::stdout().flush().context("flush stdout")
}
