#![allow(missing_docs)]

use axum::http::StatusCode;
use axum_test::{TestResponse, TestServer};
use rusqlite::Connection;
use serde_json::json;

use crate::{
    AppState,
    auth::{AuthConfig, LogInTokens, User},
    build_router,
    endpoints,
    expense::Expense,
    pagination::PaginationConfig,
    response::ApiResponse,
};

pub(crate) const TEST_EMAIL: &str = "jane@example.com";
pub(crate) const TEST_PASSWORD: &str = "averysafepassword";

const SECOND_TEST_EMAIL: &str = "john@example.com";

pub(crate) fn get_test_state() -> AppState {
    let connection =
        Connection::open_in_memory().expect("Could not open database in memory.");
    let mut state = AppState::new(connection, "foo", "bar", PaginationConfig::default())
        .expect("Could not create app state.");
    state.auth_config = AuthConfig::new("foo", "bar").with_password_cost(4);

    state
}

pub(crate) fn get_test_server_and_state() -> (TestServer, AppState) {
    let state = get_test_state();
    let server =
        TestServer::try_new(build_router(state.clone())).expect("Could not create test server.");

    (server, state)
}

async fn register(server: &TestServer, first_name: &str, email: &str) -> User {
    let response = server
        .post(endpoints::REGISTER)
        .json(&json!({
            "firstName": first_name,
            "lastName": "Doe",
            "email": email,
            "password": TEST_PASSWORD,
            "budgetLimit": 1000,
        }))
        .await;

    response.assert_status(StatusCode::CREATED);
    response
        .json::<ApiResponse<User>>()
        .data
        .expect("response should contain the new user")
}

async fn log_in(server: &TestServer, email: &str) -> String {
    let response = server
        .post(endpoints::LOG_IN)
        .json(&json!({"email": email, "password": TEST_PASSWORD}))
        .await;

    response.assert_status_ok();
    response
        .json::<ApiResponse<LogInTokens>>()
        .data
        .expect("response should contain tokens")
        .token
}

/// Register the test user with a monthly budget limit of 1000.
pub(crate) async fn register_test_user(server: &TestServer) -> User {
    register(server, "Jane", TEST_EMAIL).await
}

/// Register and log in the test user, returning the user and their access token.
pub(crate) async fn log_in_test_user(server: &TestServer) -> (User, String) {
    let user = register_test_user(server).await;
    let token = log_in(server, TEST_EMAIL).await;

    (user, token)
}

pub(crate) async fn log_in_second_test_user(server: &TestServer) -> (User, String) {
    let user = register(server, "John", SECOND_TEST_EMAIL).await;
    let token = log_in(server, SECOND_TEST_EMAIL).await;

    (user, token)
}

pub(crate) async fn create_test_expense(
    server: &TestServer,
    token: &str,
    title: &str,
    price: f64,
    date: &str,
) -> Expense {
    let response = server
        .post(endpoints::EXPENSES)
        .authorization_bearer(token)
        .json(&json!({"title": title, "price": price, "date": date}))
        .await;

    response.assert_status(StatusCode::CREATED);
    response
        .json::<ApiResponse<Expense>>()
        .data
        .expect("response should contain the new expense")
}

#[track_caller]
pub(crate) fn assert_error_message(response: &TestResponse, message: &str) {
    let body: serde_json::Value = response.json();

    assert_eq!(body["status"], "error", "want error response, got {body}");
    assert_eq!(body["message"], message, "got {body}");
}

#[track_caller]
pub(crate) fn assert_error_status(response: &TestResponse, status_code: StatusCode) {
    response.assert_status(status_code);

    let body: serde_json::Value = response.json();
    assert_eq!(body["status"], "error", "want error response, got {body}");
    assert!(body["message"].is_string(), "want error message, got {body}");
}
