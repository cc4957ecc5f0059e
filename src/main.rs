use std::sync::Arc;

use ai_llm_service::{
    LlmServiceProfiles,
    config::default_config::{config_embedding, config_generation},
    telemetry,
};
use anyhow::Context;
use clap::{Parser, Subcommand};
use contextor::{ContextorConfig, IndicatifProgress, Progress, TravelAssistant};
use tracing::{Level, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod chat;

const HEALTH_TIMEOUT_SECS: u64 = 10;

#[derive(Parser)]
#[command(name = "travel-assistant", version, about = "Ask questions about your journey")]
struct Cli {
    /// Log level for the workspace crates.
    #[arg(long, default_value = "info", global = true)]
    log_level: Level,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Interactive question loop (default).
    Chat,
    /// HTTP server on `API_ADDRESS`.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if let Err(e) = dotenvy::dotenv() {
        if !e.not_found() {
            return Err(e).context("failed to read .env");
        }
    }

    let cli = Cli::parse();
    tracing_subscriber::registry()
        .with(telemetry::env_filter_with_level("warn", cli.log_level))
        .with(telemetry::layer())
        .init();

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => {
            let progress: Arc<dyn Progress> = Arc::new(IndicatifProgress::bar(0));
            let (assistant, _) = build_assistant(Some(progress)).await?;
            chat::run_stdio(&assistant).await?;
        }
        Command::Serve => {
            let (assistant, llm) = build_assistant(None).await?;
            let state = api::AppState::new(Arc::new(assistant), Some(llm));
            api::start(state, &api::ApiConfig::from_env()).await?;
        }
    }
    Ok(())
}

/// Provisions the index and wires the LLM profiles; any failure here is fatal.
async fn build_assistant(
    progress: Option<Arc<dyn Progress>>,
) -> anyhow::Result<(TravelAssistant, Arc<LlmServiceProfiles>)> {
    let generation = config_generation().context("generation profile")?;
    let embedding = config_embedding().context("embedding profile")?;
    info!(
        generation = %generation.model,
        embedding = %embedding.model,
        "LLM profiles loaded"
    );
    let llm = Arc::new(LlmServiceProfiles::new(
        generation,
        embedding,
        Some(HEALTH_TIMEOUT_SECS),
    )?);

    let cfg = ContextorConfig::from_env()?;
    let assistant = TravelAssistant::from_service(cfg, llm.clone(), progress)
        .await
        .context("index provisioning failed")?;
    Ok((assistant, llm))
}
