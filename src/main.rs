//! bioanswer - Biomedical Literature Question-Answering Pipeline
//!
//! Accepts a research question, derives PubMed Central search keywords with a
//! generative model, fetches matching full-text articles and their figures,
//! and returns one cited narrative answer plus a figure gallery.
//!
//! ## Usage
//!
//! ### CLI Mode
//! ```bash
//! bioanswer ask "What are the effects of gene editing on cancer treatment?"
//! ```
//!
//! ### HTTP Server Mode
//! ```bash
//! bioanswer serve --port 3000
//! ```

use anyhow::{Context, Result};
use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use bioanswer::llm::{LlmClient, LlmConfig};
use bioanswer::pipeline::{Pipeline, PipelineConfig, PipelineOutcome};
use bioanswer::pmc::{PmcClient, SortMode};
use clap::{Args, Parser, Subcommand};
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, Level};
use tracing_subscriber::{fmt, EnvFilter};

// ============================================================================
// CLI Definition
// ============================================================================

/// Biomedical Literature Question-Answering Pipeline - Rust Microservice
#[derive(Parser)]
#[command(name = "bioanswer")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Answer a research question once and print the result as JSON
    Ask {
        /// The research question
        question: String,

        #[command(flatten)]
        upstream: UpstreamArgs,
    },

    /// Run as HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to
        #[arg(long, default_value = "127.0.0.1")]
        host: String,

        #[command(flatten)]
        upstream: UpstreamArgs,
    },
}

/// Upstream service configuration shared by both modes
#[derive(Args, Clone)]
struct UpstreamArgs {
    /// Contact email sent to NCBI E-utilities (polite pool)
    #[arg(long, env = "BIOANSWER_EMAIL", default_value = "bioanswer@example.com")]
    email: String,

    /// NCBI API key (raises the E-utilities rate limit)
    #[arg(long, env = "BIOANSWER_NCBI_KEY")]
    ncbi_key: Option<String>,

    /// LLM API base URL (OpenAI-compatible)
    #[arg(
        long,
        env = "BIOANSWER_LLM_BASE_URL",
        default_value = "https://api.openai.com/v1"
    )]
    llm_base_url: String,

    /// LLM API key
    #[arg(long, env = "BIOANSWER_LLM_KEY")]
    llm_key: String,

    /// LLM model name
    #[arg(long, env = "BIOANSWER_LLM_MODEL", default_value = "gpt-4o-mini")]
    llm_model: String,

    /// Search result ordering
    #[arg(long, default_value = "relevance", value_parser = ["relevance", "date"])]
    sort: String,

    /// Maximum article ids to retrieve per search
    #[arg(long, default_value = "20")]
    retmax: u32,

    /// Maximum figures to extract per article
    #[arg(long, default_value = "1")]
    figure_cap: usize,
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.debug { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    match cli.command {
        Commands::Ask { question, upstream } => run_ask(question, upstream).await,
        Commands::Serve {
            port,
            host,
            upstream,
        } => run_server(host, port, upstream).await,
    }
}

/// Wire the upstream clients into a pipeline
fn build_pipeline(args: &UpstreamArgs) -> Result<Pipeline> {
    let sort = SortMode::parse(&args.sort).context("Invalid --sort value")?;

    let model = LlmClient::new(LlmConfig {
        base_url: args.llm_base_url.clone(),
        api_key: args.llm_key.clone(),
        model: args.llm_model.clone(),
    })
    .context("Failed to build LLM client")?;

    let literature = PmcClient::new(args.email.clone(), args.ncbi_key.clone())
        .context("Failed to build PMC client")?;

    Ok(Pipeline::new(
        Arc::new(model),
        Arc::new(literature),
        PipelineConfig {
            sort,
            retmax: args.retmax,
            figure_cap: args.figure_cap,
        },
    ))
}

// ============================================================================
// One-Shot CLI Mode
// ============================================================================

async fn run_ask(question: String, args: UpstreamArgs) -> Result<()> {
    let pipeline = build_pipeline(&args)?;

    match pipeline.run(question.trim()).await? {
        PipelineOutcome::Complete(envelope) => {
            println!("{}", serde_json::to_string_pretty(&envelope)?);
        }
        PipelineOutcome::NoResults => {
            println!("No articles found.");
        }
    }

    Ok(())
}

// ============================================================================
// HTTP Server
// ============================================================================

struct AppState {
    pipeline: Pipeline,
}

async fn run_server(host: String, port: u16, args: UpstreamArgs) -> Result<()> {
    info!(host = %host, port = port, "Starting HTTP server");

    let app_state = Arc::new(AppState {
        pipeline: build_pipeline(&args)?,
    });

    let app = Router::new()
        .route("/health", get(health_handler))
        .route("/search", get(search_handler))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = format!("{}:{}", host, port)
        .parse()
        .context("Invalid host:port")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    println!("Listening on http://{}", addr);

    axum::serve(listener, app)
        .await
        .context("Server error")?;

    Ok(())
}

/// Health check endpoint
async fn health_handler() -> &'static str {
    "OK"
}

/// Search query parameters
#[derive(Debug, Deserialize)]
struct SearchParams {
    q: Option<String>,
}

/// Search endpoint handler
async fn search_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(question) = params.q.filter(|q| !q.trim().is_empty()) else {
        return (StatusCode::BAD_REQUEST, "Query parameter is required").into_response();
    };

    info!(query = %question, "Search request");

    match state.pipeline.run(question.trim()).await {
        Ok(PipelineOutcome::Complete(envelope)) => Json(envelope).into_response(),
        Ok(PipelineOutcome::NoResults) => {
            (StatusCode::NOT_FOUND, "No articles found.").into_response()
        }
        Err(e) => {
            error!(error = %e, "Pipeline failed");
            (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
    }
}
