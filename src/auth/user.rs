//! Code for creating the user table and fetching users from the database.

use std::fmt::Display;

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{Error, auth::PasswordHash, profile::Profile};

/// A newtype wrapper for integer user IDs.
///
/// This helps disambiguate user IDs from other types of IDs, leading to better compile time
/// errors, and more flexible generics that can have distinct implementations for multiple ID types.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, Hash)]
pub struct UserID(i64);

impl UserID {
    /// Create a new user ID.
    pub fn new(id: i64) -> Self {
        Self(id)
    }

    /// Cast the user ID to a 64 bit integer.
    pub fn as_i64(&self) -> i64 {
        self.0
    }
}

impl Display for UserID {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl ToSql for UserID {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        self.0.to_sql()
    }
}

impl FromSql for UserID {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        i64::column_result(value).map(UserID)
    }
}

/// What a user is allowed to do.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// A regular user who manages their own expenses.
    #[default]
    User,
    /// An administrator.
    Admin,
}

impl Role {
    fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Admin => "admin",
        }
    }
}

impl ToSql for Role {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Role {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        match value.as_str()? {
            "user" => Ok(Role::User),
            "admin" => Ok(Role::Admin),
            other => Err(FromSqlError::Other(
                format!("invalid role {other:?}").into(),
            )),
        }
    }
}

/// A user of the application.
///
/// The password hash and refresh token are kept in the database only, so a
/// `User` is always safe to send to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// The user's ID in the application database.
    pub id: UserID,
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The email address the user logs in with.
    pub email: String,
    /// The most the user wants to spend in one calendar month.
    pub budget_limit: f64,
    /// What the user is allowed to do.
    pub role: Role,
    /// Optional personal details.
    #[serde(flatten)]
    pub profile: Profile,
    /// When the user registered.
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    /// When the user was last changed.
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

/// The data needed to register a user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewUser {
    /// The user's given name.
    pub first_name: String,
    /// The user's family name.
    pub last_name: String,
    /// The email address the user logs in with.
    pub email: String,
    /// The user's hashed password.
    pub password_hash: PasswordHash,
    /// The most the user wants to spend in one calendar month.
    pub budget_limit: f64,
}

/// The columns selected by [map_user_row], in order.
pub(crate) const USER_COLUMNS: &str = "id, first_name, last_name, email, budget_limit, role, \
    phone_number, father_name, gender, zip_code, address, date_of_birth, photo, about_me, \
    created_at, updated_at";

/// Create the user table.
///
/// # Errors
///
/// This function will return an error if the SQL query failed.
pub fn create_user_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS user (
                id INTEGER PRIMARY KEY,
                first_name TEXT NOT NULL,
                last_name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE COLLATE NOCASE,
                password TEXT NOT NULL,
                budget_limit REAL NOT NULL,
                role TEXT NOT NULL DEFAULT 'user',
                phone_number TEXT,
                father_name TEXT,
                gender TEXT,
                zip_code TEXT,
                address TEXT,
                date_of_birth TEXT,
                photo TEXT,
                about_me TEXT,
                refresh_token TEXT,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
                )",
        (),
    )?;

    Ok(())
}

/// Map a row selected with [USER_COLUMNS] to a [User].
pub(crate) fn map_user_row(row: &Row) -> Result<User, rusqlite::Error> {
    Ok(User {
        id: row.get(0)?,
        first_name: row.get(1)?,
        last_name: row.get(2)?,
        email: row.get(3)?,
        budget_limit: row.get(4)?,
        role: row.get(5)?,
        profile: Profile {
            phone_number: row.get(6)?,
            father_name: row.get(7)?,
            gender: row.get(8)?,
            zip_code: row.get(9)?,
            address: row.get(10)?,
            date_of_birth: row.get(11)?,
            photo: row.get(12)?,
            about_me: row.get(13)?,
        },
        created_at: row.get(14)?,
        updated_at: row.get(15)?,
    })
}

/// Create and insert a new user into the database.
///
/// # Errors
///
/// Returns a:
/// - [Error::DuplicateEmail] if the email address is already registered,
/// - or [Error::SqlError] if some other SQL related error occurred.
pub fn create_user(
    new_user: NewUser,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    connection
        .prepare(&format!(
            "INSERT INTO user (first_name, last_name, email, password, budget_limit, created_at, updated_at) \
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6) \
            RETURNING {USER_COLUMNS}"
        ))?
        .query_row(
            rusqlite::params![
                new_user.first_name,
                new_user.last_name,
                new_user.email,
                new_user.password_hash.as_ref(),
                new_user.budget_limit,
                now,
            ],
            map_user_row,
        )
        .map_err(|error| error.into())
}

/// Get the user from the database with an ID equal to `user_id`.
///
/// # Errors
///
/// This function will return an error if:
/// - `user_id` does not belong to a registered user ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_by_id(user_id: UserID, connection: &Connection) -> Result<User, Error> {
    connection
        .prepare(&format!("SELECT {USER_COLUMNS} FROM user WHERE id = :id"))?
        .query_row(&[(":id", &user_id)], map_user_row)
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("User"),
            error => error.into(),
        })
}

/// Get the ID and password hash of the user registered with `email`.
///
/// Emails are compared case-insensitively.
///
/// # Errors
///
/// This function will return an error if:
/// - no user has registered with `email` ([Error::NotFound]).
/// - there was an error trying to access the store.
pub fn get_user_credentials(
    email: &str,
    connection: &Connection,
) -> Result<(UserID, PasswordHash), Error> {
    connection
        .prepare("SELECT id, password FROM user WHERE email = :email")?
        .query_row(&[(":email", email)], |row| {
            let id = row.get(0)?;
            let raw_password_hash: String = row.get(1)?;

            Ok((id, PasswordHash::new_unchecked(&raw_password_hash)))
        })
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("User"),
            error => error.into(),
        })
}

/// Store `refresh_token` against the user, replacing any previous token.
///
/// Pass `None` to clear the stored token.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn set_refresh_token(
    user_id: UserID,
    refresh_token: Option<&str>,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET refresh_token = ?1 WHERE id = ?2",
        rusqlite::params![refresh_token, user_id],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound("User"));
    }

    Ok(())
}

/// Get the refresh token stored against the user, if any.
///
/// # Errors
///
/// Returns [Error::NotFound] if `user_id` does not belong to a registered user.
pub fn get_refresh_token(user_id: UserID, connection: &Connection) -> Result<Option<String>, Error> {
    connection
        .query_row(
            "SELECT refresh_token FROM user WHERE id = ?1",
            [user_id],
            |row| row.get(0),
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("User"),
            error => error.into(),
        })
}

/// Replace the password of the user registered with `email`.
///
/// The stored refresh token is cleared so that existing sessions cannot be
/// extended with the old credentials.
///
/// # Errors
///
/// Returns [Error::NotFound] if no user has registered with `email`.
pub fn update_password(
    email: &str,
    password_hash: &PasswordHash,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE user SET password = ?1, refresh_token = NULL, updated_at = ?2 WHERE email = ?3",
        rusqlite::params![password_hash.as_ref(), now, email],
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound("User"));
    }

    Ok(())
}
