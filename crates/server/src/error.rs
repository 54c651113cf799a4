//! Conversion of signing errors into JSON HTTP responses.

use axum::response::{IntoResponse, Response};
use axum::Json;
use error_stack::Report;
use serde::{Deserialize, Serialize};

use signed_request_common::error::{IntoHttpResponse, SigningError};

/// `{"errors": [{"id": ..., "message": ...}]}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub errors: Vec<ErrorEntry>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorEntry {
    pub id: String,
    pub message: String,
}

/// Handler error wrapping the full report for logging.
#[derive(Debug)]
pub struct ErrorResponse(pub Report<SigningError>);

impl From<Report<SigningError>> for ErrorResponse {
    fn from(report: Report<SigningError>) -> Self {
        Self(report)
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let context = self.0.current_context();
        let status = context.status_code();

        if status.is_server_error() {
            log::error!("Request failed: {:?}", self.0);
        } else {
            log::warn!("Rejected request: {}", context);
        }

        let body = ErrorBody {
            errors: vec![ErrorEntry {
                id: context.error_id().to_string(),
                message: context.user_message(),
            }],
        };

        (status, Json(body)).into_response()
    }
}
