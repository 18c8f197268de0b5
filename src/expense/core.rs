//! The expense model and the database functions for storing expenses.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{Error, auth::UserID, database_id::ExpenseId};

/// The number of rows changed by a statement.
pub type RowsAffected = usize;

/// Something a user spent money on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Expense {
    /// The ID of the expense.
    pub id: ExpenseId,
    /// A short description of what was bought.
    pub title: String,
    /// How much was spent.
    pub price: f64,
    /// When the money was spent.
    #[serde(with = "crate::date_format")]
    pub date: Date,
    /// The user who owns the expense.
    pub user: UserID,
    /// When the expense was recorded.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the expense was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The validated data for a new expense.
#[derive(Debug, Clone, PartialEq)]
pub struct NewExpense {
    /// A short description of what was bought.
    pub title: String,
    /// How much was spent.
    pub price: f64,
    /// When the money was spent.
    pub date: Date,
}

/// The validated changes to an existing expense. Fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseChanges {
    /// The new description.
    pub title: Option<String>,
    /// The new price.
    pub price: Option<f64>,
    /// The new date.
    pub date: Option<Date>,
}

impl ExpenseChanges {
    /// Whether the changes would not change anything.
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.price.is_none() && self.date.is_none()
    }
}

impl From<NewExpense> for ExpenseChanges {
    fn from(expense: NewExpense) -> Self {
        Self {
            title: Some(expense.title),
            price: Some(expense.price),
            date: Some(expense.date),
        }
    }
}

const EXPENSE_COLUMNS: &str = "id, title, price, date, user_id, created_at, updated_at";

/// Create the expense table.
///
/// # Errors
/// This function will return an error if there is an SQL error.
pub fn create_expense_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS expense (
                id INTEGER PRIMARY KEY,
                title TEXT NOT NULL,
                price REAL NOT NULL,
                date TEXT NOT NULL,
                user_id INTEGER NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL,
                FOREIGN KEY(user_id) REFERENCES user(id) ON UPDATE CASCADE ON DELETE CASCADE
                )",
        (),
    )?;

    // Budget checks sum a user's expenses over one month.
    connection.execute(
        "CREATE INDEX IF NOT EXISTS idx_expense_user_date ON expense(user_id, date);",
        (),
    )?;

    Ok(())
}

/// Map a row selected with [EXPENSE_COLUMNS] to an [Expense].
pub fn map_expense_row(row: &Row) -> Result<Expense, rusqlite::Error> {
    Ok(Expense {
        id: row.get(0)?,
        title: row.get(1)?,
        price: row.get(2)?,
        date: row.get(3)?,
        user: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
    })
}

/// Insert a new expense for `user_id` without checking the user's budget.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn create_expense(
    user_id: UserID,
    expense: NewExpense,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO expense (title, price, date, user_id, created_at, updated_at) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?5) \
            RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![expense.title, expense.price, expense.date, user_id, now],
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::SqliteFailure(
                rusqlite::ffi::Error {
                    code: _,
                    extended_code: rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY,
                },
                _,
            ) => Error::NotFound("User"),
            error => error.into(),
        })
}

/// Get the expense with `id` if it belongs to `user_id`.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if there is no such expense or it belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn get_expense(user_id: UserID, id: ExpenseId, connection: &Connection) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "SELECT {EXPENSE_COLUMNS} FROM expense WHERE id = :id AND user_id = :user_id"
        ))?
        .query_row(
            rusqlite::named_params! {":id": id, ":user_id": user_id},
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("Expense"),
            error => error.into(),
        })
}

/// Apply `changes` to the expense with `id` owned by `user_id` without
/// checking the user's budget.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if there is no such expense or it belongs to another user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_expense(
    user_id: UserID,
    id: ExpenseId,
    changes: ExpenseChanges,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<Expense, Error> {
    connection
        .prepare(&format!(
            "UPDATE expense SET \
                title = COALESCE(?1, title), \
                price = COALESCE(?2, price), \
                date = COALESCE(?3, date), \
                updated_at = ?4 \
            WHERE id = ?5 AND user_id = ?6 \
            RETURNING {EXPENSE_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![changes.title, changes.price, changes.date, now, id, user_id],
            map_expense_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("Expense"),
            error => error.into(),
        })
}

/// Delete the expense with `id` if it belongs to `user_id`.
///
/// Returns the number of deleted rows, zero if there was no such expense.
///
/// # Errors
/// This function will return an [Error::SqlError] if there is an SQL error.
pub fn delete_expense(
    user_id: UserID,
    id: ExpenseId,
    connection: &Connection,
) -> Result<RowsAffected, Error> {
    connection
        .execute(
            "DELETE FROM expense WHERE id = ?1 AND user_id = ?2",
            rusqlite::params![id, user_id],
        )
        .map_err(|error| error.into())
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;
    use time::{Duration, OffsetDateTime, macros::date};

    use crate::{
        Error,
        auth::{NewUser, PasswordHash, UserID, create_user},
        db::initialize,
        expense::core::{
            ExpenseChanges, NewExpense, create_expense, delete_expense, get_expense,
            update_expense,
        },
    };

    fn get_test_connection() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        initialize(&conn).unwrap();
        conn
    }

    fn must_create_user(email: &str, conn: &Connection) -> UserID {
        create_user(
            NewUser {
                first_name: "Jane".to_owned(),
                last_name: "Doe".to_owned(),
                email: email.to_owned(),
                password_hash: PasswordHash::new_unchecked("hunter2"),
                budget_limit: 1000.0,
            },
            OffsetDateTime::now_utc(),
            conn,
        )
        .unwrap()
        .id
    }

    fn groceries() -> NewExpense {
        NewExpense {
            title: "Groceries".to_owned(),
            price: 42.5,
            date: date!(2025 - 03 - 14),
        }
    }

    #[test]
    fn create_succeeds() {
        let conn = get_test_connection();
        let user_id = must_create_user("jane@example.com", &conn);

        let expense = create_expense(user_id, groceries(), OffsetDateTime::now_utc(), &conn).unwrap();

        assert!(expense.id > 0);
        assert_eq!(expense.title, "Groceries");
        assert_eq!(expense.price, 42.5);
        assert_eq!(expense.date, date!(2025 - 03 - 14));
        assert_eq!(expense.user, user_id);
        assert_eq!(expense.created_at, expense.updated_at);
    }

    #[test]
    fn create_fails_for_missing_user() {
        let conn = get_test_connection();

        let result = create_expense(
            UserID::new(42),
            groceries(),
            OffsetDateTime::now_utc(),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound("User")));
    }

    #[test]
    fn get_returns_created_expense() {
        let conn = get_test_connection();
        let user_id = must_create_user("jane@example.com", &conn);
        let want = create_expense(user_id, groceries(), OffsetDateTime::now_utc(), &conn).unwrap();

        let got = get_expense(user_id, want.id, &conn).unwrap();

        assert_eq!(got, want);
    }

    #[test]
    fn get_hides_other_users_expenses() {
        let conn = get_test_connection();
        let owner = must_create_user("jane@example.com", &conn);
        let other = must_create_user("john@example.com", &conn);
        let expense = create_expense(owner, groceries(), OffsetDateTime::now_utc(), &conn).unwrap();

        assert_eq!(
            get_expense(other, expense.id, &conn),
            Err(Error::NotFound("Expense"))
        );
    }

    #[test]
    fn update_changes_only_given_fields() {
        let conn = get_test_connection();
        let user_id = must_create_user("jane@example.com", &conn);
        let created = create_expense(user_id, groceries(), OffsetDateTime::now_utc(), &conn).unwrap();
        let later = created.updated_at + Duration::minutes(1);

        let updated = update_expense(
            user_id,
            created.id,
            ExpenseChanges {
                price: Some(12.0),
                ..Default::default()
            },
            later,
            &conn,
        )
        .unwrap();

        assert_eq!(updated.title, created.title);
        assert_eq!(updated.date, created.date);
        assert_eq!(updated.price, 12.0);
        assert_eq!(updated.created_at, created.created_at);
        assert_eq!(updated.updated_at, later);
    }

    #[test]
    fn update_fails_for_other_users_expense() {
        let conn = get_test_connection();
        let owner = must_create_user("jane@example.com", &conn);
        let other = must_create_user("john@example.com", &conn);
        let expense = create_expense(owner, groceries(), OffsetDateTime::now_utc(), &conn).unwrap();

        let result = update_expense(
            other,
            expense.id,
            ExpenseChanges::from(groceries()),
            OffsetDateTime::now_utc(),
            &conn,
        );

        assert_eq!(result, Err(Error::NotFound("Expense")));
    }

    #[test]
    fn delete_removes_only_own_expense() {
        let conn = get_test_connection();
        let owner = must_create_user("jane@example.com", &conn);
        let other = must_create_user("john@example.com", &conn);
        let expense = create_expense(owner, groceries(), OffsetDateTime::now_utc(), &conn).unwrap();

        assert_eq!(delete_expense(other, expense.id, &conn), Ok(0));
        assert_eq!(delete_expense(owner, expense.id, &conn), Ok(1));
        assert_eq!(
            get_expense(owner, expense.id, &conn),
            Err(Error::NotFound("Expense"))
        );
    }

    #[test]
    fn empty_changes_are_detected() {
        assert!(ExpenseChanges::default().is_empty());
        assert!(!ExpenseChanges::from(groceries()).is_empty());
    }
}
