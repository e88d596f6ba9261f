mod analysis;
mod cli;
mod config;
mod errors;
mod extraction;
mod llm_client;
mod routes;
mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::analysis::pipeline::{AnalysisRequest, Orchestrator};
use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::extraction::job_page::HttpJobFetcher;
use crate::extraction::resume::{PdfResumeReader, ResumeSource};
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    info!("Starting Interview Prep API v{}", env!("CARGO_PKG_VERSION"));

    let orchestrator = Arc::new(build_orchestrator(&config)?);

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve(config, orchestrator).await,
        Command::Analyze {
            job_url,
            resume,
            output,
        } => {
            let report = orchestrator
                .run(AnalysisRequest {
                    job_url,
                    resume: ResumeSource::from_reference(&resume),
                })
                .await?;
            let json = serde_json::to_string_pretty(&report)?;
            match output {
                Some(path) => {
                    tokio::fs::write(&path, json)
                        .await
                        .with_context(|| format!("Failed to write report to {}", path.display()))?;
                    info!("Report written to {}", path.display());
                }
                None => println!("{json}"),
            }
            Ok(())
        }
    }
}

fn build_orchestrator(config: &Config) -> Result<Orchestrator> {
    let fetcher = HttpJobFetcher::new().context("Failed to build job page HTTP client")?;
    let resumes = PdfResumeReader::new();

    let llm = LlmClient::new(config.anthropic_api_key.clone(), config.model_config());
    info!("LLM client initialized (model: {})", llm.model());

    let orchestrator = Orchestrator::new(
        Arc::new(fetcher),
        Arc::new(resumes),
        Arc::new(llm),
        config.pipeline(),
    );
    let pipeline = orchestrator.config();
    info!(
        "Pipeline: {} questions, {:?} stage deadline, {} attempt(s), {:?} backoff",
        pipeline.question_count, pipeline.stage_timeout, pipeline.max_attempts, pipeline.retry_backoff
    );
    Ok(orchestrator)
}

async fn serve(config: Config, orchestrator: Arc<Orchestrator>) -> Result<()> {
    let state = AppState {
        orchestrator,
        upload_limit_bytes: config.max_upload_bytes,
        api_disabled: config.disable_api,
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict allowed origins once the frontend host is fixed

    if config.disable_api {
        warn!("DISABLE_API is set: every request will be answered with 503");
    }

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
