// Main entry point - Dependency injection and server setup
mod domain;
mod application;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::application::raster_service::RasterService;
use crate::infrastructure::config::{load_app_config, read_credential_blob};
use crate::infrastructure::credentials::ServiceAccountCredentials;
use crate::infrastructure::earth_engine::EarthEngineClient;
use crate::presentation::app_state::AppState;
use crate::presentation::router::create_router;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Earth Engine credentials; the service does not start without them
    let key_json = read_credential_blob()?;
    let credentials = ServiceAccountCredentials::from_json(&key_json)
        .context("Failed to load Earth Engine service-account key")?;
    tracing::info!("Authenticating as {}", credentials.client_email());

    // Create imagery client (infrastructure layer)
    let client = Arc::new(EarthEngineClient::new(&config.earth_engine, credentials)?);
    tracing::info!("Earth Engine project: {}", client.project());

    // Create services (application layer)
    let raster_service = RasterService::new(
        client,
        config.dates.end_bound,
        config.timeseries.concurrency,
    );

    // Create application state
    let state = Arc::new(AppState { raster_service });

    // Build router (presentation layer)
    let router = create_router(state);

    // Start server
    let addr: SocketAddr = config
        .server
        .bind
        .parse()
        .with_context(|| format!("Invalid bind address {}", config.server.bind))?;
    tracing::info!("Starting lst-ndvi service on {}", addr);

    axum::serve(tokio::net::TcpListener::bind(addr).await?, router).await?;

    Ok(())
}
