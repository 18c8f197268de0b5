use axum::extract::State;
use time::OffsetDateTime;

use crate::{
    Error,
    auth::CurrentUser,
    expense::{
        ExpenseState,
        budget::{BudgetStatus, get_budget_status},
    },
    response::Success,
};

/// A route handler that summarises the current user's spending for the current UTC month.
pub async fn budget_status_endpoint(
    State(state): State<ExpenseState>,
    CurrentUser(user): CurrentUser,
) -> Result<Success<BudgetStatus>, Error> {
    let today = OffsetDateTime::now_utc().date();

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    get_budget_status(user.id, today, &connection).map(Success::ok)
}
