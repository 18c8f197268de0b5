//! The endpoint for logging out the current user.

use axum::{extract::State, http::StatusCode};

use crate::{
    Error,
    auth::{AuthState, CurrentUser, set_refresh_token},
};

/// A route handler that forgets the user's refresh token so it can no longer
/// be exchanged for access tokens.
///
/// Access tokens that were already issued stay valid until they expire.
pub async fn log_out(
    State(state): State<AuthState>,
    CurrentUser(user): CurrentUser,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    set_refresh_token(user.id, None, &connection)?;

    tracing::debug!("user {} logged out", user.id);

    Ok(StatusCode::NO_CONTENT)
}
