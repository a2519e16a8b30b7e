//! Application startup and server initialization.
//!
//! Resolves the secret based config, builds the controller and session
//! registry, and serves the router on the configured address.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tracing::info;

use crate::auth::build_client;
use crate::config::{load_config, Settings};
use crate::controller::Controller;
use crate::routes;
use crate::session::SessionRegistry;
use crate::state::AppState;
use crate::store::{GcsStorage, ObjectStorage, SecretManagerClient, SecretStore, TokenSource};

/// Builds the shared state from process settings and the given providers.
///
/// # Errors
///
/// Fails when `secret_path` is unset or the application config cannot be
/// fully resolved. Nothing is served with a partial config.
pub async fn build_state(
    settings: &Settings,
    secrets: &dyn SecretStore,
    storage: &dyn ObjectStorage,
) -> Result<AppState, Box<dyn Error>> {
    let secret_path = settings
        .secret_path
        .as_deref()
        .ok_or("SECRET_PATH is not set")?;
    let config = Arc::new(load_config(secret_path, secrets, storage).await?);
    let client = build_client(Duration::from_millis(settings.auth.timeout_in_ms))?;

    Ok(AppState {
        controller: Arc::new(Controller::new(
            config,
            client,
            settings.dataset.preview_rows,
        )),
        sessions: Arc::new(SessionRegistry::new(
            settings.session.idle_timeout_in_s,
        )),
    })
}

/// Initializes and runs the application server against Google Cloud.
///
/// # Errors
///
/// Returns an error if startup config cannot be resolved, the server fails
/// to bind to the configured address, or serving fails.
pub async fn run(settings: Settings) -> Result<(), Box<dyn Error>> {
    let client = reqwest::Client::new();
    let tokens = Arc::new(TokenSource::new(
        client.clone(),
        settings.gcp.access_token.clone(),
        &settings.gcp.metadata_url,
    ));
    let secrets = SecretManagerClient::new(
        client.clone(),
        &settings.gcp.secret_manager_url,
        tokens.clone(),
    );
    let storage = GcsStorage::new(client, &settings.gcp.storage_url, tokens);

    let state = build_state(&settings, &secrets, &storage).await?;
    let app = routes::create_router(state);

    info!("Starting server on {}", settings.bind_address);
    let listener = TcpListener::bind(&settings.bind_address).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
