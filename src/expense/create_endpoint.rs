use axum::{
    extract::State,
    http::header::{HeaderName, LOCATION},
};
use time::OffsetDateTime;

use crate::{
    Error,
    auth::CurrentUser,
    endpoints::{self, format_endpoint},
    expense::{
        Expense, ExpenseState, budget::create_expense_within_budget, form::ExpenseForm,
    },
    json::JsonBody,
    response::Success,
};

/// A route handler for creating a new expense, responds with 201 Created, the
/// expense and a `Location` header pointing at it.
///
/// # Errors
/// Returns a:
/// - [Error::Validation] if a field is missing or invalid,
/// - [Error::BudgetExceeded] if the expense would put the month over the user's budget,
/// - or an internal error if the expense could not be saved.
pub async fn create_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    JsonBody(form): JsonBody<ExpenseForm>,
) -> Result<([(HeaderName, String); 1], Success<Expense>), Error> {
    let new_expense = form.into_new_expense()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense =
        create_expense_within_budget(user.id, new_expense, OffsetDateTime::now_utc(), &connection)?;

    tracing::debug!("user {} created expense {}", user.id, expense.id);

    let location = format_endpoint(endpoints::EXPENSE, expense.id);

    Ok(([(LOCATION, location)], Success::created(expense)))
}

#[cfg(test)]
mod create_expense_tests {
    use axum::http::{StatusCode, header::LOCATION};
    use serde_json::json;

    use crate::{
        endpoints::{self, format_endpoint},
        expense::Expense,
        response::ApiResponse,
        test_utils::{assert_error_message, get_test_server_and_state, log_in_test_user},
    };

    #[tokio::test]
    async fn create_expense_succeeds() {
        let (server, _) = get_test_server_and_state();
        let (user, token) = log_in_test_user(&server).await;

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({"title": "Groceries", "price": 45.99, "date": "2025-03-14"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Expense> = response.json();
        let expense = body.data.expect("response should contain the expense");
        assert_eq!(expense.title, "Groceries");
        assert_eq!(expense.price, 45.99);
        assert_eq!(expense.user, user.id);
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["date"], "2025-03-14");
    }

    #[tokio::test]
    async fn create_expense_sets_location() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .json(&json!({"title": "Groceries", "price": 45.99, "date": "2025-03-14"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Expense> = response.json();
        let expense = body.data.expect("response should contain the expense");
        let location = response
            .headers()
            .get(LOCATION)
            .expect("response should have a location header")
            .to_str()
            .unwrap()
            .to_owned();
        assert_eq!(location, format_endpoint(endpoints::EXPENSE, expense.id));
        server
            .get(&location)
            .authorization_bearer(token)
            .await
            .assert_status_ok();
    }

    #[tokio::test]
    async fn create_expense_accepts_date_time() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({"title": "Taxi", "price": 20, "date": "2025-03-14T23:30:00.000Z"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: serde_json::Value = response.json();
        assert_eq!(body["data"]["date"], "2025-03-14");
    }

    #[tokio::test]
    async fn create_expense_rejects_going_over_budget() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;
        server
            .post(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .json(&json!({"title": "Rent", "price": 900, "date": "2025-03-01"}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(&token)
            .json(&json!({"title": "Television", "price": 100.01, "date": "2025-03-31"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_error_message(
            &response,
            "This expense would exceed your monthly budget limit of 1000",
        );
    }

    #[tokio::test]
    async fn create_expense_accepts_numeric_string_price() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({"title": "Groceries", "price": "12", "date": "2025-03-14"}))
            .await;

        response.assert_status(StatusCode::CREATED);
        let body: ApiResponse<Expense> = response.json();
        let expense = body.data.expect("response should contain the expense");
        assert_eq!(expense.price, 12.0);
    }

    #[tokio::test]
    async fn create_expense_rejects_non_numeric_price() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({"title": "Groceries", "price": "twelve", "date": "2025-03-14"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        assert_error_message(&response, "\"price\" must be a number");
        let body: serde_json::Value = response.json();
        assert!(body["errors"]["price"].is_array());
    }

    #[tokio::test]
    async fn create_expense_validates_fields() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;

        let response = server
            .post(endpoints::EXPENSES)
            .authorization_bearer(token)
            .json(&json!({"title": "", "price": 0, "date": "14/03/2025"}))
            .await;

        response.assert_status(StatusCode::BAD_REQUEST);
        let body: serde_json::Value = response.json();
        assert_eq!(body["message"], "\"title\" is not allowed to be empty");
        for field in ["title", "price", "date"] {
            assert!(body["errors"][field].is_array(), "want error for {field}");
        }
    }

    #[tokio::test]
    async fn create_expense_requires_authentication() {
        let (server, _) = get_test_server_and_state();

        let response = server
            .post(endpoints::EXPENSES)
            .json(&json!({"title": "Groceries", "price": 45.99, "date": "2025-03-14"}))
            .await;

        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
