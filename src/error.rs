//! Defines the app level error type and its conversion into JSON error responses.

use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::{response::ApiResponse, validation::FieldErrors};

/// The message shown to clients when the cause of an error should stay on the server.
pub const INTERNAL_ERROR_MESSAGE: &str = "There was a problem, please try again later.";

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// One or more fields in the request failed validation.
    ///
    /// `message` describes the first problem found, `errors` lists every
    /// problem keyed by field name.
    #[error("{message}")]
    Validation {
        /// The first validation error.
        message: String,
        /// All validation errors, keyed by field name.
        errors: FieldErrors,
    },

    /// The request could not be understood, e.g. the body is not valid JSON.
    #[error("{0}")]
    BadRequest(String),

    /// The expense ID in the request path is not a valid ID.
    #[error("Invalid expense ID")]
    InvalidExpenseId,

    /// Saving the expense would put the user's spending for that month over
    /// their budget limit.
    #[error("This expense would exceed your monthly budget limit of {0}")]
    BudgetExceeded(f64),

    /// A user with the same email address has already registered.
    #[error("User already exists")]
    DuplicateEmail,

    /// The email and password do not match a registered user.
    #[error("Invalid email or password")]
    InvalidCredentials,

    /// The request did not include an access token.
    #[error("Authentication required")]
    Unauthenticated,

    /// The access token is malformed, expired or was not signed by this server.
    #[error("Invalid token")]
    InvalidToken,

    /// The refresh token is invalid, expired, or no longer belongs to the user.
    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// A JSON web token could not be created.
    #[error("could not create token: {0}")]
    TokenCreation(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
                },
                Some(ref desc),
            ) if desc.contains("user.email") => Error::DuplicateEmail,
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("Record"),
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<QueryRejection> for Error {
    fn from(rejection: QueryRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl From<PathRejection> for Error {
    fn from(rejection: PathRejection) -> Self {
        Error::BadRequest(rejection.body_text())
    }
}

impl Error {
    /// The HTTP status code that a client should receive for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation { .. }
            | Error::BadRequest(_)
            | Error::InvalidExpenseId
            | Error::BudgetExceeded(_)
            | Error::DuplicateEmail => StatusCode::BAD_REQUEST,
            Error::InvalidCredentials
            | Error::Unauthenticated
            | Error::InvalidToken
            | Error::InvalidRefreshToken => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::HashingError(_)
            | Error::TokenCreation(_)
            | Error::DatabaseLockError
            | Error::SqlError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let body = match self {
            Error::Validation { message, errors } => ApiResponse::error(message, Some(errors)),
            // Any errors that are not handled above are not intended to be shown to the client.
            error if status.is_server_error() => {
                tracing::error!("An unexpected error occurred: {}", error);
                ApiResponse::error(INTERNAL_ERROR_MESSAGE.to_owned(), None)
            }
            error => ApiResponse::error(error.to_string(), None),
        };

        (status, axum::Json(body)).into_response()
    }
}
