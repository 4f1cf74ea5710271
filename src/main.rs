mod adapters;
mod application;
mod domain;
mod services;

use std::{net::SocketAddr, sync::Arc};

use adapters::{router::build_router, state::AppState};
use application::services::StorageService;
use domain::config::relay::RelayConfig;
use services::LocalStorageService;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("file_relay=info,tower_http=info")),
        )
        .init();

    let config = RelayConfig::from_env().expect("ERROR: Invalid relay configuration");

    tracing::info!(
        "Starting file-relay (max upload {} bytes, {} allowed types, {} allowed extensions)",
        config.max_upload_bytes,
        config.policy.allowed_types().len(),
        config.policy.allowed_extensions().len()
    );

    // The upload directory must exist before the first request is served
    let storage_service = LocalStorageService::new(&config.upload_dir, &config.staging_dir)
        .await
        .expect("ERROR: Failed to prepare the upload directory");

    let address = SocketAddr::new(config.bind_address, config.port);

    let app_state = AppState {
        config: Arc::new(config),
        storage_service: Arc::new(storage_service) as Arc<dyn StorageService>,
    };

    let router = build_router(app_state);

    let listener = tokio::net::TcpListener::bind(address)
        .await
        .expect("Failed to bind to port");

    tracing::info!("Server listening on {}", address);

    axum::serve(listener, router)
        .await
        .expect("Failed to start server");
}
