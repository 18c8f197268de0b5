//! The uniform JSON envelope used by every response.
//!
//! ```json
//! { "status": "success", "data": { ... } }
//! { "status": "error", "message": "...", "errors": { "field": ["..."] } }
//! ```

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::validation::FieldErrors;

/// The outcome of a request as reported in the response envelope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResponseStatus {
    /// The request succeeded.
    Success,
    /// The request was rejected because of invalid data or unmet pre-conditions.
    Fail,
    /// An error occurred while processing the request.
    Error,
}

/// The body of every JSON response.
#[derive(Debug, PartialEq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    /// Whether the request succeeded.
    pub status: ResponseStatus,
    /// The payload for successful requests.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    /// A description of what went wrong.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Per-field validation errors.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<FieldErrors>,
}

impl<T> ApiResponse<T> {
    /// Build a response indicating a successful operation.
    pub fn success(data: T) -> Self {
        Self {
            status: ResponseStatus::Success,
            data: Some(data),
            message: None,
            errors: None,
        }
    }

    /// Build a response indicating a failed operation due to invalid data or unmet pre-conditions.
    #[allow(dead_code)]
    pub fn fail(data: T) -> Self {
        Self {
            status: ResponseStatus::Fail,
            data: Some(data),
            message: None,
            errors: None,
        }
    }
}

impl ApiResponse<()> {
    /// Build a response indicating an error occurred during request processing.
    pub fn error(message: String, errors: Option<FieldErrors>) -> Self {
        Self {
            status: ResponseStatus::Error,
            data: None,
            message: Some(message),
            errors,
        }
    }
}

/// A successful response: `data` wrapped in the success envelope, sent with `status`.
#[derive(Debug)]
pub struct Success<T>(pub StatusCode, pub T);

impl<T> Success<T> {
    /// Respond with 200 OK.
    pub fn ok(data: T) -> Self {
        Self(StatusCode::OK, data)
    }

    /// Respond with 201 Created.
    pub fn created(data: T) -> Self {
        Self(StatusCode::CREATED, data)
    }
}

impl<T: Serialize> IntoResponse for Success<T> {
    fn into_response(self) -> Response {
        let Success(status, data) = self;

        (status, Json(ApiResponse::success(data))).into_response()
    }
}
