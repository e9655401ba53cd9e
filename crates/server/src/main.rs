//! CampusSwap marketplace API server.

use std::sync::Arc;

use auth::{DisabledProvider, HttpIdentityProvider, IdentityProvider, TokenSigner};
use database::Database;
use media::{DisabledImageStore, HttpImageStore, ImageStore};
use tracing::info;

use server::routes;
use server::{AppState, Config};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    // Load configuration
    let config = Config::from_env()?;
    info!(addr = %config.addr, "Starting CampusSwap API server");

    // Connect to database
    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    // Build the injected collaborators
    let tokens = TokenSigner::new(config.jwt_secret.as_bytes());

    let identity: Arc<dyn IdentityProvider> = match &config.identity_verify_url {
        Some(url) => Arc::new(HttpIdentityProvider::new(url.clone())?),
        None => {
            info!("IDENTITY_VERIFY_URL unset; external login disabled");
            Arc::new(DisabledProvider)
        }
    };

    let images: Arc<dyn ImageStore> = match &config.image_upload_url {
        Some(url) => Arc::new(HttpImageStore::new(url.clone())?),
        None => {
            info!("IMAGE_UPLOAD_URL unset; listing creation disabled");
            Arc::new(DisabledImageStore)
        }
    };

    // Build application state and router
    let state = AppState::new(db.clone(), tokens, identity, images);
    let app = routes::router().with_state(state);

    // Start server
    info!(addr = %config.addr, "CampusSwap API listening");
    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    db.close().await;
    info!("Database pool closed, shutting down");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {err}");
    }
}
