//! The endpoint for registering a new user.

use axum::extract::State;
use serde::Deserialize;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::{AuthState, NewUser, PasswordHash, User, ValidatedPassword, create_user},
    json::JsonBody,
    response::Success,
    validation::{self, Validator},
};

/// The longest first or last name a user may register with.
pub const MAX_NAME_LENGTH: usize = 50;

/// The request body for registering a user.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterForm {
    /// The user's given name.
    pub first_name: Option<String>,
    /// The user's family name.
    pub last_name: Option<String>,
    /// The email address the user will log in with.
    pub email: Option<String>,
    /// The plain text password.
    pub password: Option<String>,
    /// The most the user wants to spend in one calendar month.
    pub budget_limit: Option<f64>,
}

impl RegisterForm {
    /// Check every field and return the user data with the password still in plain text.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every invalid field.
    fn validate(self) -> Result<(ValidatedPassword, PendingUser), Error> {
        let mut validator = Validator::new();

        let first_name = validator.required("firstName", self.first_name, |field, value| {
            validation::name(field, value, MAX_NAME_LENGTH)
        });
        let last_name = validator.required("lastName", self.last_name, |field, value| {
            validation::name(field, value, MAX_NAME_LENGTH)
        });
        let email = validator.required("email", self.email, validation::email);
        let password = validator.required("password", self.password, |_, value| {
            ValidatedPassword::new(&value)
        });
        let budget_limit = validator.required("budgetLimit", self.budget_limit, validation::positive);

        validator.finish()?;

        match (first_name, last_name, email, password, budget_limit) {
            (Some(first_name), Some(last_name), Some(email), Some(password), Some(budget_limit)) => {
                Ok((
                    password,
                    PendingUser {
                        first_name,
                        last_name,
                        email,
                        budget_limit,
                    },
                ))
            }
            _ => Err(Error::BadRequest("Invalid registration details".to_owned())),
        }
    }
}

struct PendingUser {
    first_name: String,
    last_name: String,
    email: String,
    budget_limit: f64,
}

/// A route handler for registering a new user.
///
/// Responds with 201 Created and the new user.
///
/// # Errors
/// Returns a:
/// - [Error::Validation] if any field is missing or invalid,
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - or an internal error if the password could not be hashed or the user could not be saved.
pub async fn register_user(
    State(state): State<AuthState>,
    JsonBody(form): JsonBody<RegisterForm>,
) -> Result<Success<User>, Error> {
    let (password, pending) = form.validate()?;
    let password_hash = PasswordHash::new(password, state.auth_config.password_cost)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let user = create_user(
        NewUser {
            first_name: pending.first_name,
            last_name: pending.last_name,
            email: pending.email,
            password_hash,
            budget_limit: pending.budget_limit,
        },
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    tracing::info!("registered user {}", user.id);

    Ok(Success::created(user))
}

#[cfg(test)]
mod register_user_tests {
    use axum::http::StatusCode;
    use serde_json::json;

    use crate::{
        auth::{User, get_user_credentials},
        endpoints,
        response::ApiResponse,
        test_utils::{assert_error_message, get_test_server_and_state},
    };

    fn valid_body() -> serde_json::Value {
        json!({
            "firstName": "Jane",
            "lastName": "Doe-Smith",
            "email": "jane@example.com",
            "password": "averysafepassword",
            "budgetLimit": 1000,
        })
    }

    #[tokio::test]
    async fn register_user_succeeds() {
        let (server, state) = get_test_server_and_state();

        let response = server.post(endpoints::REGISTER).json(&valid_body()).await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<User> = response.json();
        let user = body.data.expect("response should contain the user");
        assert_eq!(user.first_name, "Jane");
        assert_eq!(user.last_name, "Doe-Smith");
        assert_eq!(user.budget_limit, 1000.0);

        let connection = state.db_connection.lock().unwrap();
        let (id, password_hash) = get_user_credentials("jane@example.com", &connection).unwrap();
        assert_eq!(id, user.id);
        assert!(password_hash.verify("averysafepassword").unwrap());
    }

    #[tokio::test]
    async fn response_has_no_password() {
        let (server, _) = get_test_server_and_state();

        let response = server.post(endpoints::REGISTER).json(&valid_body()).await;

        let body: serde_json::Value = response.json();
        assert!(body["data"].get("password").is_none());
        assert!(body["data"].get("refreshToken").is_none());
    }

    #[tokio::test]
    async fn register_fails_with_duplicate_email() {
        let (server, _) = get_test_server_and_state();
        server
            .post(endpoints::REGISTER)
            .json(&valid_body())
            .await
            .assert_status(StatusCode::CREATED);

        let mut body = valid_body();
        body["email"] = json!("JANE@example.com");
        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_error_message(&response, "User already exists");
    }

    #[tokio::test]
    async fn register_fails_with_short_password() {
        let (server, _) = get_test_server_and_state();
        let mut body = valid_body();
        body["password"] = json!("hunter2");

        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_error_message(&response, "\"password\" must be at least 8 characters long");
    }

    #[tokio::test]
    async fn register_fails_with_invalid_name() {
        let (server, _) = get_test_server_and_state();
        let mut body = valid_body();
        body["firstName"] = json!("Jane99");

        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert!(body["errors"]["firstName"].is_array());
    }

    #[tokio::test]
    async fn register_fails_with_non_positive_budget() {
        let (server, _) = get_test_server_and_state();
        let mut body = valid_body();
        body["budgetLimit"] = json!(0);

        let response = server.post(endpoints::REGISTER).json(&body).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_error_message(&response, "\"budgetLimit\" must be a positive number");
    }

    #[tokio::test]
    async fn register_reports_every_missing_field() {
        let (server, _) = get_test_server_and_state();

        let response = server.post(endpoints::REGISTER).json(&json!({})).await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "\"firstName\" is required");
        for field in ["firstName", "lastName", "email", "password", "budgetLimit"] {
            assert_eq!(
                body["errors"][field],
                json!([format!("\"{field}\" is required")]),
                "want required error for {field}"
            );
        }
    }
}
