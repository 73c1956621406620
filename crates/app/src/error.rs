use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

/// JSON error reply in the shape `{ "error": ..., "details"?: ... }`.
///
/// `details` is only attached for persistence failures where the underlying
/// store message aids diagnostics; validation and configuration errors carry
/// the message string alone.
pub struct ErrorResponse {
    status: StatusCode,
    body: ErrorBody,
}

impl ErrorResponse {
    pub fn new<S: Into<String>>(status: StatusCode, error: S) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details: None,
            },
        }
    }

    pub fn with_details<S: Into<String>, D: Into<String>>(
        status: StatusCode,
        error: S,
        details: D,
    ) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: error.into(),
                details: Some(details.into()),
            },
        }
    }
}

impl IntoResponse for ErrorResponse {
    fn into_response(self) -> Response {
        let mut response = Json(self.body).into_response();
        *response.status_mut() = self.status;
        response
    }
}
