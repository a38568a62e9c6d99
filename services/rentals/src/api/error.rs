//! API error types and helpers.
//!
//! # Purpose and responsibility
//! Centralizes HTTP error response construction so every non-auth failure has
//! the `{ success, error, message }` shape.
//!
//! # Key invariants and assumptions
//! - `body.error` always equals the numeric `status`.
//! - Messages are fixed per status; request details and store errors are never
//!   echoed to clients.
//!
//! # Security considerations
//! - Store failures are logged server-side and surfaced only as a status.
use crate::api::types::ErrorResponse;
use crate::store::StoreError;
use axum::Json;
use axum::http::StatusCode;
use axum::response::IntoResponse;

/// Structured API error returned by handlers.
///
/// # Example
/// ```rust
/// use axum::http::StatusCode;
/// use rentals::api::error::api_not_found;
///
/// let err = api_not_found();
/// assert_eq!(err.status, StatusCode::NOT_FOUND);
/// assert_eq!(err.body.message, "resource not found");
/// ```
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorResponse,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, Json(self.body)).into_response()
    }
}

fn message_for(status: StatusCode) -> &'static str {
    match status {
        StatusCode::BAD_REQUEST => "bad request",
        StatusCode::NOT_FOUND => "resource not found",
        StatusCode::METHOD_NOT_ALLOWED => "method not allowed",
        StatusCode::UNPROCESSABLE_ENTITY => "unprocessable",
        _ => "unexpected error",
    }
}

/// Build an error with the fixed message for `status`.
pub fn api_error(status: StatusCode) -> ApiError {
    ApiError {
        status,
        body: ErrorResponse {
            success: false,
            error: status.as_u16(),
            message: message_for(status).to_string(),
        },
    }
}

/// Malformed or incomplete request input.
pub fn api_bad_request() -> ApiError {
    api_error(StatusCode::BAD_REQUEST)
}

/// Resource absent, or an empty listing.
pub fn api_not_found() -> ApiError {
    api_error(StatusCode::NOT_FOUND)
}

pub fn api_method_not_allowed() -> ApiError {
    api_error(StatusCode::METHOD_NOT_ALLOWED)
}

/// Well-formed request whose operation could not be carried out.
pub fn api_unprocessable() -> ApiError {
    api_error(StatusCode::UNPROCESSABLE_ENTITY)
}

/// Log a store failure and map it to `status`.
///
/// Expected outcomes (missing rows, constraint conflicts) are logged at debug;
/// anything else is an error worth an operator's attention.
pub fn api_store_error(status: StatusCode, context: &str, err: &StoreError) -> ApiError {
    match err {
        StoreError::NotFound(_) | StoreError::Conflict(_) => {
            tracing::debug!(error = %err, context, "rental store rejected request");
        }
        StoreError::Unexpected(_) => {
            tracing::error!(error = ?err, context, "rental storage error");
        }
    }
    api_error(status)
}
