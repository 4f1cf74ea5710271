use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use tracing::{error, warn};

use crate::{adapters::views::MessageTemplate, application::error::ApplicationError};

impl IntoResponse for ApplicationError {
    fn into_response(self) -> Response {
        let (status, heading, message) = match self {
            ApplicationError::NotFound => {
                warn!("Resource not found");
                (
                    StatusCode::NOT_FOUND,
                    "Not found",
                    "The requested file does not exist".to_string(),
                )
            }
            ApplicationError::BadRequest(msg) => {
                warn!("Bad request: {}", msg);
                (StatusCode::BAD_REQUEST, "Request rejected", msg)
            }
            ApplicationError::InternalError(ref msg) => {
                error!("Internal server error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Server error",
                    "The server could not complete the request".to_string(),
                )
            }
        };

        let page = MessageTemplate {
            heading,
            message: &message,
        }
        .render();

        match page {
            Ok(html) => (status, Html(html)).into_response(),
            Err(e) => {
                error!("Failed to render error page: {}", e);
                (status, message).into_response()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_status_codes() {
        assert_eq!(
            ApplicationError::NotFound.into_response().status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApplicationError::BadRequest("nope".into())
                .into_response()
                .status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ApplicationError::InternalError("disk".into())
                .into_response()
                .status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
