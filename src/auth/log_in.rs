//! The endpoints for logging in and for exchanging a refresh token for a new
//! access token.

use std::sync::Mutex;

use axum::extract::State;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::{
        AuthState, PasswordHash, UserID, get_refresh_token, get_user_credentials,
        set_refresh_token,
    },
    json::JsonBody,
    response::Success,
    validation::Validator,
};

/// The credentials a user logs in with.
#[derive(Debug, Default, Deserialize)]
pub struct LogInForm {
    /// The email address the user registered with.
    pub email: Option<String>,
    /// The user's plain text password.
    pub password: Option<String>,
}

/// The tokens issued when a user logs in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogInTokens {
    /// The access token to send in the `Authorization` header.
    pub token: String,
    /// The token to exchange for a new access token once `token` expires.
    pub refresh_token: String,
}

/// A route handler for logging in a user.
///
/// # Errors
/// Returns a:
/// - [Error::Validation] if the email or password is missing,
/// - [Error::InvalidCredentials] if the email is not registered or the password is wrong,
/// - or an internal error if the tokens could not be issued or saved.
pub async fn log_in(
    State(state): State<AuthState>,
    JsonBody(form): JsonBody<LogInForm>,
) -> Result<Success<LogInTokens>, Error> {
    let mut validator = Validator::new();
    let email = validator.required("email", form.email, |_, value| Ok(value));
    let password = validator.required("password", form.password, |_, value| Ok(value));
    validator.finish()?;
    let (Some(email), Some(password)) = (email, password) else {
        return Err(Error::InvalidCredentials);
    };

    let (user_id, password_hash) = find_credentials(&email, &state.db_connection)?;

    let is_password_valid = password_hash.verify(&password).map_err(|error| {
        tracing::error!("Error verifying password: {error}");
        Error::HashingError(error.to_string())
    })?;

    if !is_password_valid {
        return Err(Error::InvalidCredentials);
    }

    let token = state.auth_config.issue_access_token(user_id)?;
    let refresh_token = state.auth_config.issue_refresh_token(user_id)?;
    set_refresh_token(
        user_id,
        Some(&refresh_token),
        &*state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?,
    )?;

    tracing::debug!("user {user_id} logged in");

    Ok(Success::ok(LogInTokens {
        token,
        refresh_token,
    }))
}

/// Look up the user ID and password hash registered with `email`.
///
/// The database lock is released before returning so that password
/// verification does not block other requests.
fn find_credentials(
    email: &str,
    db_connection: &Mutex<Connection>,
) -> Result<(UserID, PasswordHash), Error> {
    let connection = db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match get_user_credentials(email, &connection) {
        Ok(credentials) => Ok(credentials),
        Err(Error::NotFound(_)) => Err(Error::InvalidCredentials),
        Err(error) => Err(error),
    }
}

/// The request body for refreshing an access token.
#[derive(Debug, Default, Deserialize)]
pub struct RefreshTokenForm {
    /// The refresh token issued at log in.
    pub token: Option<String>,
}

/// A new access token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccessToken {
    /// The access token to send in the `Authorization` header.
    pub token: String,
}

/// A route handler that exchanges a refresh token for a new access token.
///
/// The refresh token must be the one most recently issued to the user.
///
/// # Errors
/// Returns a:
/// - [Error::Validation] if the token is missing,
/// - [Error::InvalidRefreshToken] if the token is invalid, expired, or no longer belongs to the user,
/// - or an internal error if the new token could not be issued.
pub async fn refresh_token(
    State(state): State<AuthState>,
    JsonBody(form): JsonBody<RefreshTokenForm>,
) -> Result<Success<AccessToken>, Error> {
    let mut validator = Validator::new();
    let token = validator.required("token", form.token, |_, value| Ok(value));
    validator.finish()?;
    let Some(token) = token else {
        return Err(Error::InvalidRefreshToken);
    };

    let claims = state.auth_config.verify_refresh_token(&token)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let stored_token = match get_refresh_token(claims.id, &connection) {
        Ok(stored_token) => stored_token,
        Err(Error::NotFound(_)) => return Err(Error::InvalidRefreshToken),
        Err(error) => return Err(error),
    };

    if stored_token.as_deref() != Some(token.as_str()) {
        return Err(Error::InvalidRefreshToken);
    }

    let token = state.auth_config.issue_access_token(claims.id)?;

    Ok(Success::ok(AccessToken { token }))
}
