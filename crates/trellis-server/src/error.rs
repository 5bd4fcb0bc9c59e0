//! Server error type.
//!
//! Request-level failures map to JSON error responses. Access denials are
//! not errors: they become gated responses in the handlers.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Error returned by request handlers.
#[derive(Debug, thiserror::Error)]
pub(crate) enum ServerError {
    /// No page or artifact matched the request.
    #[error("not found: {0}")]
    NotFound(String),
    /// A view template the deployment should ship is missing.
    #[error("missing template: {0}")]
    TemplateMissing(String),
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::TemplateMissing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }

        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}
