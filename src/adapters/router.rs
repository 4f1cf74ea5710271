use axum::{
    extract::DefaultBodyLimit,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::{services::ServeDir, timeout::TimeoutLayer, trace::TraceLayer};
use tracing::info;

use crate::adapters::{
    controllers::{
        file_controller::FileController, health_controller::HealthController,
        page_controller::PageController,
    },
    middleware::reject_oversized_upload,
    state::AppState,
};

pub fn build_router(app_state: AppState) -> Router {
    // Upload size is enforced while streaming, not by the framework's buffer limit
    let upload_routes = Router::new()
        .route("/upload", post(FileController::upload_file))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            reject_oversized_upload,
        ))
        .layer(DefaultBodyLimit::disable());

    let mut router = Router::new()
        .route("/", get(PageController::home))
        .route("/files", get(FileController::list_files))
        .route("/download/{filename}", get(FileController::download_file))
        .route("/api/v1/health", get(HealthController::health_check))
        .merge(upload_routes)
        .fallback_service(ServeDir::new(&app_state.config.public_dir))
        .layer(TraceLayer::new_for_http());

    if let Some(timeout) = app_state.config.request_timeout {
        info!("Request timeout set to {:?}", timeout);
        router = router.layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            timeout,
        ));
    } else {
        info!("Request timeouts disabled");
    }

    router.with_state(app_state)
}
