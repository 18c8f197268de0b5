use axum::extract::State;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    auth::CurrentUser,
    expense::{
        Expense, ExpenseState,
        query::{ExpenseQueryParams, query_expenses},
    },
    json::QueryParams,
    pagination::Pagination,
    response::Success,
};

/// One page of expenses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpensePage {
    /// The expenses on this page.
    pub expenses: Vec<Expense>,
    /// Where this page sits within all matching expenses.
    pub pagination: Pagination,
}

/// A route handler that lists the current user's expenses.
///
/// Supports filtering by title and date range, sorting by price or date,
/// and pagination through the query string.
///
/// # Errors
/// Returns [Error::Validation] if a query parameter is invalid.
pub async fn list_expenses_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
    QueryParams(params): QueryParams<ExpenseQueryParams>,
) -> Result<Success<ExpensePage>, Error> {
    let query = params.validate(&state.pagination_config)?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    let (expenses, total) = query_expenses(user.id, &query, &connection)?;

    Ok(Success::ok(ExpensePage {
        expenses,
        pagination: Pagination::new(total, query.page, query.limit),
    }))
}
