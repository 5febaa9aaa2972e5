use crate::McpServer;
use rmcp::{ServiceExt, transport::stdio};
use std::path::PathBuf;

/// Serves the GML tools over stdin/stdout until the client disconnects.
/// `default_root` is used when a tool call does not name a project.
pub async fn run_stdio_server(
    default_root: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("Starting MCP server on stdio");
    let service = McpServer::new(default_root).serve(stdio()).await?;
    service.waiting().await?;
    Ok(())
}
