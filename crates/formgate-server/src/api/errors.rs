//! Error handling for the Formgate Server API
//!
//! Callers never see internal error detail. The API exposes exactly the
//! fixed response shapes below; the underlying cause is logged server-side
//! where the failure is observed.

use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::json;

use crate::error::ServerError;

/// Client-visible API errors
#[derive(Debug, PartialEq, Eq)]
pub enum ApiError {
    /// Requested form is not in the catalog (404)
    FormNotFound,
    /// A required submission identifier is missing from the query (400)
    MissingIdentifiers,
    /// Merge or notification failed (500, cause logged)
    SubmissionFailed,
    /// Catalog reload failed (500, cause logged)
    ReloadFailed,
}

impl From<ServerError> for ApiError {
    fn from(err: ServerError) -> Self {
        match err {
            ServerError::NotFound(_) => ApiError::FormNotFound,
            ServerError::MissingIdentifiers => ApiError::MissingIdentifiers,
            _ => ApiError::SubmissionFailed,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        match self {
            ApiError::FormNotFound => (
                StatusCode::NOT_FOUND,
                Json(json!({ "error": "Form not found" })),
            )
                .into_response(),
            ApiError::MissingIdentifiers => (
                StatusCode::BAD_REQUEST,
                Json(json!({
                    "error": true,
                    "message": "session_id or flow_id or transaction_id not found in submission url",
                })),
            )
                .into_response(),
            ApiError::SubmissionFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to process form submission" })),
            )
                .into_response(),
            ApiError::ReloadFailed => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "Failed to reload catalog" })),
            )
                .into_response(),
        }
    }
}
