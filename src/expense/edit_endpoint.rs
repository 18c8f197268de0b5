use axum::extract::State;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::{CurrentUser, UserID},
    database_id::ExpenseId,
    expense::{
        Expense, ExpenseState,
        budget::update_expense_within_budget,
        core::ExpenseChanges,
        form::{ExpenseForm, ExpenseIdPath},
    },
    json::JsonBody,
    response::Success,
};

/// A route handler that replaces every field of an expense.
///
/// # Errors
/// Returns a:
/// - [Error::InvalidExpenseId] for a malformed ID,
/// - [Error::Validation] if any field is missing or invalid,
/// - [Error::NotFound] if the user has no expense with that ID,
/// - or [Error::BudgetExceeded] if the change would put the month over budget.
pub async fn replace_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    ExpenseIdPath(expense_id): ExpenseIdPath,
    JsonBody(form): JsonBody<ExpenseForm>,
) -> Result<Success<Expense>, Error> {
    let changes = ExpenseChanges::from(form.into_new_expense()?);

    apply_changes(state, user.id, expense_id, changes)
}

/// A route handler that changes some fields of an expense.
///
/// # Errors
/// Same as [replace_expense_endpoint], except fields may be left out as long
/// as at least one is given.
pub async fn patch_expense_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    ExpenseIdPath(expense_id): ExpenseIdPath,
    JsonBody(form): JsonBody<ExpenseForm>,
) -> Result<Success<Expense>, Error> {
    let changes = form.into_changes()?;

    apply_changes(state, user.id, expense_id, changes)
}

fn apply_changes(
    state: ExpenseState,
    user_id: UserID,
    expense_id: ExpenseId,
    changes: ExpenseChanges,
) -> Result<Success<Expense>, Error> {
    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let expense = update_expense_within_budget(
        user_id,
        expense_id,
        changes,
        OffsetDateTime::now_utc(),
        &connection,
    )?;

    tracing::debug!("user {user_id} updated expense {expense_id}");

    Ok(Success::ok(expense))
}
