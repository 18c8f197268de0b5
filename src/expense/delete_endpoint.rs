use axum::{extract::State, http::StatusCode};

use crate::{
    Error,
    auth::CurrentUser,
    expense::{ExpenseState, core::delete_expense, form::ExpenseIdPath},
};

/// A route handler for deleting an expense, responds with 204 No Content.
///
/// # Errors
/// Returns [Error::InvalidExpenseId] for a malformed ID, or
/// [Error::NotFound] if the user has no expense with that ID.
pub async fn delete_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    ExpenseIdPath(expense_id): ExpenseIdPath,
) -> Result<StatusCode, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    match delete_expense(user.id, expense_id, &connection)? {
        0 => Err(Error::NotFound("Expense")),
        _ => {
            tracing::debug!("user {} deleted expense {expense_id}", user.id);
            Ok(StatusCode::NO_CONTENT)
        }
    }
}
