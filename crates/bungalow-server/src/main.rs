//! Bungalow Server: application entry point.

use std::net::SocketAddr;
use std::sync::Arc;

use bungalow_db::DbManager;
use bungalow_server::{AppState, ServerConfig, build_router};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("bungalow=info,tower_http=info")),
        )
        .json()
        .init();

    let config = ServerConfig::from_env()?;
    tracing::info!(environment = %config.environment, "Starting Bungalow server...");

    let db = DbManager::connect(&config.db).await?;
    let state = Arc::new(AppState::new(db.client().clone(), &config)?);
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, "Listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    tracing::info!("Bungalow server stopped.");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %e, "could not listen for shutdown signal");
    }
}
