// Medical Code Extractor - Web Server
// REST API with Axum

use anyhow::{Context, Result};
use clap::Parser;
use medcode_extractor::config::{self, DEFAULT_SERVER_ADDR};
use medcode_extractor::server::{router, AppState};
use medcode_extractor::{init_tracing, ExtractorConfig};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "medcode-server", version, about = "HTTP API for medical code extraction")]
struct ServerArgs {
    /// Address to bind
    #[arg(long, env = "MEDCODE_ADDR", default_value = DEFAULT_SERVER_ADDR)]
    addr: String,

    /// Extra `code,description` CSV layered over the built-in descriptions
    #[arg(long, env = "MEDCODE_DESCRIPTIONS")]
    descriptions: Option<PathBuf>,

    /// Only accept letter/digit codes that form a whole token
    #[arg(long)]
    strict_boundaries: bool,
}

// ============================================================================
// Main Server
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let args = ServerArgs::parse();

    let config = ExtractorConfig::default()
        .with_strict_boundaries(args.strict_boundaries)
        .with_descriptions(args.descriptions);
    let table = config.load_descriptions()?;

    tracing::info!(descriptions = table.len(), "{} v{} starting", config::APP_NAME, config::APP_VERSION);

    let app = router(AppState::new(table, config));

    let listener = tokio::net::TcpListener::bind(&args.addr)
        .await
        .with_context(|| format!("Failed to bind to {}", args.addr))?;

    tracing::info!("Server running on http://{}", args.addr);
    tracing::info!("API: http://{}/api/health", args.addr);

    axum::serve(listener, app)
        .await
        .context("Failed to start server")?;

    Ok(())
}
