use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use textgate::{api, config, documents, logging, provider::GeminiClient, query};
use tokio::net::TcpListener;

#[derive(Parser)]
#[command(
    name = "textgate",
    about = "Serve redact, analysis, and extract queries over three Gemini-hosted documents"
)]
struct Cli {
    /// Directory holding a.txt, b.txt, and c.txt (overrides DOCUMENTS_DIR).
    #[arg(long)]
    documents_dir: Option<PathBuf>,
    /// Port to listen on (overrides SERVER_PORT).
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    config::load_dotenv();
    logging::init_tracing();
    let config = config::init_config().context("failed to load configuration")?;

    let documents_dir = cli
        .documents_dir
        .unwrap_or_else(|| config.documents_dir.clone());
    let port = cli.port.unwrap_or(config.server_port);

    let provider = Arc::new(
        GeminiClient::from_config(config)
            .context("failed to build Gemini client")?
            .with_system_instruction(query::SYSTEM_INSTRUCTION),
    );
    let registry = documents::load_registry(provider.as_ref(), &documents_dir, config.upload_poll)
        .await
        .context("document registration failed; refusing to serve")?;
    tracing::info!(dir = %documents_dir.display(), "All documents active");

    let service = Arc::new(query::QueryService::new(provider, registry));
    let app = api::create_router(service);

    let listener = TcpListener::bind((config.server_host.as_str(), port))
        .await
        .with_context(|| format!("failed to bind {}:{port}", config.server_host))?;
    tracing::info!("Listening on http://{}:{}", config.server_host, port);
    axum::serve(listener, app)
        .await
        .context("server terminated unexpectedly")?;
    Ok(())
}
