//! Monthly budget enforcement.
//!
//! A user's expenses within one calendar month may add up to at most their
//! budget limit. Writes that would go over the limit are rejected, and the
//! check and the write run in one SQL transaction.

use rusqlite::{Connection, Transaction as SqlTransaction, TransactionBehavior};
use serde::{Deserialize, Serialize};
use time::{Date, Duration, OffsetDateTime};

use crate::{
    Error,
    auth::UserID,
    database_id::ExpenseId,
    expense::core::{
        Expense, ExpenseChanges, NewExpense, create_expense, get_expense, update_expense,
    },
};

/// Round `amount` to the nearest cent.
pub fn round_to_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

/// The first and last day, inclusive, of the calendar month containing `date`.
pub fn month_range(date: Date) -> (Date, Date) {
    let first = date - Duration::days(i64::from(date.day()) - 1);
    // 31 days after the first always lands early in the next month.
    let last = first
        .checked_add(Duration::days(31))
        .map(|next_month| next_month - Duration::days(i64::from(next_month.day())))
        .unwrap_or(Date::MAX);

    (first, last)
}

/// Get the monthly budget limit of the user.
///
/// # Errors
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn get_budget_limit(user_id: UserID, connection: &Connection) -> Result<f64, Error> {
    connection
        .query_row(
            "SELECT budget_limit FROM user WHERE id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("User"),
            error => error.into(),
        })
}

/// Sum the prices of the user's expenses dated within the month containing
/// `date`, leaving out the expense with ID `exclude` if given.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn monthly_total(
    user_id: UserID,
    date: Date,
    exclude: Option<ExpenseId>,
    connection: &Connection,
) -> Result<f64, Error> {
    let (start, end) = month_range(date);

    connection
        .query_row(
            "SELECT COALESCE(SUM(price), 0.0) FROM expense \
            WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3 AND (?4 IS NULL OR id != ?4)",
            rusqlite::params![user_id, start, end, exclude],
            |row| row.get(0),
        )
        .map_err(|error| error.into())
}

/// Check that adding `price` to the user's spending for the month of `date`
/// stays within their budget limit.
///
/// Reaching the limit exactly is allowed.
///
/// # Errors
/// Returns a:
/// - [Error::BudgetExceeded] if the new total would go over the limit,
/// - [Error::NotFound] if `user_id` does not belong to a registered user,
/// - or [Error::SqlError] if there is an SQL error.
pub fn check_budget(
    user_id: UserID,
    date: Date,
    price: f64,
    exclude: Option<ExpenseId>,
    connection: &Connection,
) -> Result<(), Error> {
    let budget_limit = get_budget_limit(user_id, connection)?;
    let total = monthly_total(user_id, date, exclude, connection)?;

    if round_to_cents(total + price) > budget_limit {
        tracing::debug!(
            "rejecting expense of {price} for user {user_id}: {total} already spent of {budget_limit}"
        );
        return Err(Error::BudgetExceeded(budget_limit));
    }

    Ok(())
}

/// Insert a new expense for the user if it fits within their budget for the
/// month of the expense.
///
/// # Errors
/// Returns [Error::BudgetExceeded] if the expense would go over the budget,
/// otherwise see [create_expense].
pub fn create_expense_within_budget(
    user_id: UserID,
    expense: NewExpense,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Expense, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    check_budget(user_id, expense.date, expense.price, None, &transaction)?;
    let expense = create_expense(user_id, expense, now, &transaction)?;

    transaction.commit()?;

    Ok(expense)
}

/// Apply `changes` to the user's expense if the result fits within their
/// budget.
///
/// The budget is only checked when the price goes up or the expense moves to
/// another month. The expense's old price is not counted towards the total.
///
/// # Errors
/// Returns [Error::BudgetExceeded] if the change would go over the budget,
/// otherwise see [update_expense].
pub fn update_expense_within_budget(
    user_id: UserID,
    id: ExpenseId,
    changes: ExpenseChanges,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Expense, Error> {
    let transaction = SqlTransaction::new_unchecked(connection, TransactionBehavior::Immediate)?;

    let existing = get_expense(user_id, id, &transaction)?;
    let price = changes.price.unwrap_or(existing.price);
    let date = changes.date.unwrap_or(existing.date);

    if price > existing.price || month_range(date) != month_range(existing.date) {
        check_budget(user_id, date, price, Some(id), &transaction)?;
    }

    let expense = update_expense(user_id, id, changes, now, &transaction)?;

    transaction.commit()?;

    Ok(expense)
}

/// How much of their budget a user has spent this month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetStatus {
    /// The most the user wants to spend in one month.
    pub budget_limit: f64,
    /// The total of this month's expenses, rounded to cents.
    pub current_month_spent: f64,
    /// How much is left to spend, negative once over budget.
    pub remaining: f64,
    /// Whether this month's expenses add up to more than the limit.
    pub is_over_budget: bool,
    /// The number of expenses this month.
    pub total_expenses: u64,
}

/// Summarise the user's spending for the month containing `today`.
///
/// # Errors
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn get_budget_status(
    user_id: UserID,
    today: Date,
    connection: &Connection,
) -> Result<BudgetStatus, Error> {
    let budget_limit = get_budget_limit(user_id, connection)?;
    let (start, end) = month_range(today);

    let (spent, count): (f64, i64) = connection.query_row(
        "SELECT COALESCE(SUM(price), 0.0), COUNT(id) FROM expense \
        WHERE user_id = ?1 AND date BETWEEN ?2 AND ?3",
        rusqlite::params![user_id, start, end],
        |row| Ok((row.get(0)?, row.get(1)?)),
    )?;

    let current_month_spent = round_to_cents(spent);

    Ok(BudgetStatus {
        budget_limit,
        current_month_spent,
        remaining: round_to_cents(budget_limit - current_month_spent),
        is_over_budget: current_month_spent > budget_limit,
        total_expenses: u64::try_from(count).unwrap_or_default(),
    })
}
