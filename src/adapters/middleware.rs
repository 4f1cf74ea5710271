use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;
use tracing::warn;

use crate::{application::error::ApplicationError, domain::config::relay::RelayConfig};

/// Room for multipart boundaries and part headers on top of the file itself.
pub const MULTIPART_OVERHEAD_BYTES: u64 = 64 * 1024;

/// Rejects uploads whose declared Content-Length already exceeds the limit,
/// before any of the body is read.
pub async fn reject_oversized_upload(
    State(config): State<Arc<RelayConfig>>,
    headers: HeaderMap,
    request: Request<Body>,
    next: Next,
) -> Response {
    let declared = headers
        .get(header::CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.parse::<u64>().ok());

    match declared {
        Some(length) if length > config.max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES) => {
            warn!(
                "Declared body of {} bytes exceeds upload limit of {} bytes",
                length, config.max_upload_bytes
            );
            ApplicationError::BadRequest(format!(
                "File too large (maximum is {} bytes)",
                config.max_upload_bytes
            ))
            .into_response()
        }
        _ => next.run(request).await,
    }
}
