//! MCP server entrypoint (stdio transport).
//!
//! Launches an MCP server that exposes Rusty Digest's tools and resources over stdio for
//! editor and agent integrations. It shares all runtime configuration with the CLI.
use anyhow::{Context, Result};
use rmcp::{service::ServiceExt, transport::stdio};
use rustydigest::{config, logging, mcp::RustyDigestMcpServer, processing::DigestService};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    config::init_config().context("invalid configuration")?;
    logging::init_tracing();

    let server = RustyDigestMcpServer::new(Arc::new(DigestService::new()));

    let service = server
        .serve(stdio())
        .await
        .context("failed to start MCP server over stdio")?;

    service
        .waiting()
        .await
        .context("MCP server terminated unexpectedly")?;

    Ok(())
}
