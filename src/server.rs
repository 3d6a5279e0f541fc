use rmcp::ServiceExt;
use rmcp::transport::{sse_server::SseServer, stdio};
use std::sync::Arc;
use tracing_subscriber::{self, layer::SubscriberExt, util::SubscriberInitExt};

use gcode_hover::mcp::{DefaultLookup, HoverTool};

/// Logs go to stderr so the stdio transport keeps stdout to itself.
pub fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".to_string().into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

// start sse server
pub async fn start_sse_server(addr: &str, lookup: Arc<DefaultLookup>) -> anyhow::Result<()> {
    tracing::info!("Starting SSE server on {}", addr);
    let ct = SseServer::serve(addr.parse()?)
        .await?
        .with_service(move || HoverTool::new(lookup.clone()));

    tokio::signal::ctrl_c().await?;
    ct.cancel();
    Ok(())
}

// start stdio server
pub async fn start_stdio_server(lookup: Arc<DefaultLookup>) -> anyhow::Result<()> {
    tracing::info!("Starting MCP server on stdio");

    let service = HoverTool::new(lookup).serve(stdio()).await.inspect_err(|e| {
        tracing::error!("serving error: {:?}", e);
    })?;

    service.waiting().await?;
    Ok(())
}
