//! Extractors that report rejected request bodies and query strings with the
//! crate's [Error] so that clients always receive the JSON envelope.

use axum::extract::{FromRequest, FromRequestParts};

use crate::Error;

/// A JSON request body.
///
/// Works like [axum::Json], except a malformed body is rejected with
/// [Error::BadRequest].
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(Error))]
pub struct JsonBody<T>(pub T);

/// Query string parameters.
///
/// Works like [axum::extract::Query], except a malformed query string is
/// rejected with [Error::BadRequest].
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(Error))]
pub struct QueryParams<T>(pub T);
