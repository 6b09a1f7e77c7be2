//! sevDesk MCP Server
//!
//! Entry point for the MCP server binary.
//! Implements MCP protocol over stdio using JSON-RPC 2.0.

use anyhow::Context;
use sevdesk_mcp::config::Config;
use sevdesk_mcp::mcp::{serve, SevDeskMcpServer};
use sevdesk_mcp::sevdesk::SevDeskClient;
use std::io;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    // Initialize logging to stderr (MCP uses stdout for protocol)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    if let Err(err) = run().await {
        tracing::error!("Fatal: {:#}", err);
        eprintln!("sevdesk-mcp: {:#}", err);
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    tracing::info!("Starting sevDesk MCP Server...");

    // Credential check happens here, before stdio is touched
    let config = Config::load_default().context("Failed to load configuration")?;
    let runtime_config = config.to_runtime()?;

    tracing::info!("Configured for {}", runtime_config.base_url);

    let client = Arc::new(SevDeskClient::new(&runtime_config)?);
    let server = SevDeskMcpServer::new(client);

    tracing::info!("MCP Server ready, listening on stdio...");

    serve(&server, tokio::io::stdin(), tokio::io::stdout()).await?;
    Ok(())
}
