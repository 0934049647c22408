mod classify;
mod config;
mod error;
mod loader;
mod model;
mod navigation;
mod ordered;
mod present;
mod repository;
mod server;

use std::sync::Arc;

use rmcp::transport::streamable_http_server::{
    StreamableHttpService, session::local::LocalSessionManager,
};
use rmcp::{ServiceExt, transport::stdio};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use grants_common::fetch::FetchClient;

use config::{Config, Transport};
use loader::DatasetLoader;
use navigation::SelectionPolicy;
use server::GrantViewerServer;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout is reserved for MCP JSON-RPC
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    info!("starting grant-viewer MCP server");

    let config = Config::from_env()?;
    info!(
        data_source = %config.data_source,
        default_grant = %config.default_grant,
        fetch_timeout_secs = config.fetch_timeout.map(|t| t.as_secs()),
        "configuration loaded"
    );

    let client = FetchClient::new(config.fetch_config())?;
    let loader = Arc::new(DatasetLoader::new(client, config.data_source()));
    let server = GrantViewerServer::new(loader, SelectionPolicy::preferring(&config.default_grant));

    // A failed load is reported through the tools; reload_grants retries it.
    if let Err(e) = server.reload().await {
        warn!(error = %e, "serving without grants data until reloaded");
    }

    match config.transport {
        Transport::Tcp(addr) => {
            let listener = TcpListener::bind(&addr).await?;
            info!(listen_addr = %addr, "MCP server ready, serving on TCP");
            loop {
                let (stream, peer) = listener.accept().await?;
                let server = server.clone();
                tokio::spawn(async move {
                    info!(peer = %peer, "MCP client connected");
                    let service = server.serve(stream).await.inspect_err(|e| {
                        tracing::error!(error = %e, "MCP server error");
                    })?;
                    service.waiting().await?;
                    info!(peer = %peer, "MCP client disconnected");
                    Ok::<(), anyhow::Error>(())
                });
            }
        }
        Transport::Http(addr) => {
            let service = StreamableHttpService::new(
                move || Ok(server.clone()),
                LocalSessionManager::default().into(),
                Default::default(),
            );
            let router = axum::Router::new().nest_service("/mcp", service);
            let listener = TcpListener::bind(&addr).await?;
            info!(listen_addr = %addr, "MCP server ready, serving streamable HTTP on /mcp");
            axum::serve(listener, router).await?;
        }
        Transport::Stdio => {
            info!("MCP server ready, serving on stdio");
            let service = server.serve(stdio()).await.inspect_err(|e| {
                tracing::error!(error = %e, "MCP server error");
            })?;
            service.waiting().await?;
            info!("MCP server shut down");
        }
    }
    Ok(())
}
