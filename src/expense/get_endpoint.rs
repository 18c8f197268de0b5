use axum::extract::State;

use crate::{
    Error,
    auth::CurrentUser,
    expense::{Expense, ExpenseState, core::get_expense, form::ExpenseIdPath},
    response::Success,
};

/// A route handler that returns one of the current user's expenses.
///
/// # Errors
/// Returns [Error::InvalidExpenseId] for a malformed ID, or
/// [Error::NotFound] if the user has no expense with that ID.
pub async fn get_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    ExpenseIdPath(expense_id): ExpenseIdPath,
) -> Result<Success<Expense>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_expense(user.id, expense_id, &connection).map(Success::ok)
}

#[cfg(test)]
mod get_expense_tests {
    use axum::http::StatusCode;

    use crate::{
        endpoints::{self, format_endpoint},
        expense::Expense,
        response::ApiResponse,
        test_utils::{
            assert_error_message, create_test_expense, get_test_server_and_state,
            log_in_second_test_user, log_in_test_user,
        },
    };

    #[tokio::test]
    async fn get_expense_succeeds() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;
        let want = create_test_expense(&server, &token, "Groceries", 12.0, "2025-03-14").await;

        let response = server
            .get(&format_endpoint(endpoints::EXPENSE, want.id))
            .authorization_bearer(token)
            .await;

        response.assert_status_ok();
        let body: ApiResponse<Expense> = response.json();
        assert_eq!(body.data, Some(want));
    }

    #[tokio::test]
    async fn get_missing_expense_is_not_found() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;

        let response = server
            .get(&format_endpoint(endpoints::EXPENSE, 42))
            .authorization_bearer(token)
            .await;

        response.assert_status_not_found();
        assert_error_message(&response, "Expense not found");
    }

    #[tokio::test]
    async fn get_other_users_expense_is_not_found() {
        let (server, _) = get_test_server_and_state();
        let (_, owner_token) = log_in_test_user(&server).await;
        let expense =
            create_test_expense(&server, &owner_token, "Groceries", 12.0, "2025-03-14").await;
        let (_, other_token) = log_in_second_test_user(&server).await;

        let response = server
            .get(&format_endpoint(endpoints::EXPENSE, expense.id))
            .authorization_bearer(other_token)
            .await;

        response.assert_status_not_found();
        assert_error_message(&response, "Expense not found");
    }

    #[tokio::test]
    async fn get_expense_rejects_invalid_id() {
        let (server, _) = get_test_server_and_state();
        let (_, token) = log_in_test_user(&server).await;

        for id in ["abc", "0", "-1", "1.5"] {
            let response = server
                .get(&format!("{}/{id}", endpoints::EXPENSES))
                .authorization_bearer(&token)
                .await;

            response.assert_status(StatusCode::BAD_REQUEST);
            assert_error_message(&response, "Invalid expense ID");
        }
    }
}
