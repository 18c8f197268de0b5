//! The extractor that authenticates requests with a bearer token.

use std::sync::{Arc, Mutex};

use axum::{
    RequestPartsExt,
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Bearer},
};
use rusqlite::Connection;

use crate::{
    AppState, Error,
    auth::{AuthConfig, User, get_user_by_id},
};

/// The state needed to authenticate a request.
#[derive(Clone)]
pub struct AuthState {
    /// The keys for verifying access tokens.
    pub auth_config: AuthConfig,
    /// The database connection for looking up the user.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for AuthState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            auth_config: state.auth_config.clone(),
            db_connection: state.db_connection.clone(),
        }
    }
}

/// The user that sent the request.
///
/// Add this extractor to a handler to make the route require a valid
/// `Authorization: Bearer <token>` header. The request is rejected with:
/// - [Error::Unauthenticated] if the header is missing or the user no longer exists,
/// - or [Error::InvalidToken] if the token is malformed, expired or signed with another key.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

impl<S> FromRequestParts<S> for CurrentUser
where
    AuthState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) = parts
            .extract::<TypedHeader<Authorization<Bearer>>>()
            .await
            .map_err(|_| Error::Unauthenticated)?;

        let state = AuthState::from_ref(state);
        let claims = state.auth_config.verify_access_token(bearer.token())?;

        let connection = state
            .db_connection
            .lock()
            .map_err(|_| Error::DatabaseLockError)?;

        match get_user_by_id(claims.id, &connection) {
            Ok(user) => Ok(CurrentUser(user)),
            Err(Error::NotFound(_)) => {
                tracing::debug!("token for user {} who no longer exists", claims.id);
                Err(Error::Unauthenticated)
            }
            Err(error) => Err(error),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::{Router, http::StatusCode, routing::get};
    use axum_test::TestServer;
    use rusqlite::Connection;
    use time::OffsetDateTime;

    use crate::{
        auth::{AuthConfig, AuthState, CurrentUser, NewUser, PasswordHash, UserID, create_user},
        db::initialize,
        response::Success,
        test_utils::assert_error_message,
    };

    async fn whoami(CurrentUser(user): CurrentUser) -> Success<String> {
        Success::ok(user.email)
    }

    fn get_test_server() -> (TestServer, AuthConfig, UserID) {
        let connection = Connection::open_in_memory().unwrap();
        initialize(&connection).unwrap();
        let user = create_user(
            NewUser {
                first_name: "Jane".to_owned(),
                last_name: "Doe".to_owned(),
                email: "jane@example.com".to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                budget_limit: 100.0,
            },
            OffsetDateTime::now_utc(),
            &connection,
        )
        .unwrap();
        let auth_config = AuthConfig::new("foo", "bar");
        let state = AuthState {
            auth_config: auth_config.clone(),
            db_connection: Arc::new(Mutex::new(connection)),
        };
        let app = Router::new().route("/me", get(whoami)).with_state(state);

        (TestServer::try_new(app).unwrap(), auth_config, user.id)
    }

    #[tokio::test]
    async fn accepts_valid_token() {
        let (server, auth_config, user_id) = get_test_server();
        let token = auth_config.issue_access_token(user_id).unwrap();

        let response = server.get("/me").authorization_bearer(token).await;

        response.assert_status_ok();
        response.assert_json(&serde_json::json!({
            "status": "success",
            "data": "jane@example.com",
        }));
    }

    #[tokio::test]
    async fn rejects_missing_header() {
        let (server, _, _) = get_test_server();

        let response = server.get("/me").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_error_message(&response, "Authentication required");
    }

    #[tokio::test]
    async fn rejects_garbage_token() {
        let (server, _, _) = get_test_server();

        let response = server.get("/me").authorization_bearer("foobar").await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_error_message(&response, "Invalid token");
    }

    #[tokio::test]
    async fn rejects_refresh_token() {
        let (server, auth_config, user_id) = get_test_server();
        let token = auth_config.issue_refresh_token(user_id).unwrap();

        let response = server.get("/me").authorization_bearer(token).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_error_message(&response, "Invalid token");
    }

    #[tokio::test]
    async fn rejects_token_for_missing_user() {
        let (server, auth_config, _) = get_test_server();
        let token = auth_config.issue_access_token(UserID::new(999)).unwrap();

        let response = server.get("/me").authorization_bearer(token).await;

        response.assert_status(StatusCode::UNAUTHORIZED);
        assert_error_message(&response, "Authentication required");
    }
}
