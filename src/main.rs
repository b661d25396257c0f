use std::net::SocketAddr;
use std::sync::Arc;

use clap::Parser;

mod cli;

use keyvault_webapp::{api, config, telemetry, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = cli::Cli::parse();
    // Loads .env first so RUST_LOG and LOG_FORMAT from it apply to logging.
    let cfg = config::load()?;
    telemetry::init()?;

    let port = match args.command {
        Some(cli::Commands::Serve { port }) => port.unwrap_or(cfg.port),
        None => cfg.port,
    };

    let result = run_server(cfg, port).await;

    if let Err(ref e) = result {
        tracing::error!("Error: {:?}", e);
    }
    telemetry::shutdown();
    result
}

async fn run_server(cfg: config::Config, port: u16) -> anyhow::Result<()> {
    if cfg.secret_uri.is_none() {
        tracing::warn!("KEYVAULT_SECRET_URI is not set; the page will report a configuration error");
    }
    if cfg.composition().is_none() {
        tracing::info!("Connection string template not configured; composition step disabled");
    }

    let state = Arc::new(AppState::from_config(cfg)?);
    let app = api::app_router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Key Vault web app listening on {}", addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
