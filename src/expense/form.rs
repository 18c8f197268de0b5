//! Parsing and validating expense request bodies and path parameters.

use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};
use serde::Deserialize;
use serde_json::Value;

use crate::{
    Error,
    database_id::ExpenseId,
    expense::core::{ExpenseChanges, NewExpense},
    validation::{self, EMPTY_UPDATE_MESSAGE, Validator},
};

/// The longest title an expense may have.
pub const MAX_TITLE_LENGTH: usize = 30;

/// The request body for creating or changing an expense.
#[derive(Debug, Default, Deserialize)]
pub struct ExpenseForm {
    /// A short description of what was bought.
    pub title: Option<String>,
    /// How much was spent, as a number or a numeric string.
    pub price: Option<Value>,
    /// When the money was spent, as an ISO 8601 date or date-time.
    pub date: Option<String>,
}

impl ExpenseForm {
    /// Validate a form where every field is required.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every missing or invalid field.
    pub fn into_new_expense(self) -> Result<NewExpense, Error> {
        let mut validator = Validator::new();

        let title = validator.required("title", self.title, |field, value| {
            validation::name(field, value, MAX_TITLE_LENGTH)
        });
        let price = validator.required("price", self.price, validation::positive_number);
        let date = validator.required("date", self.date, validation::iso_date);

        validator.finish()?;

        match (title, price, date) {
            (Some(title), Some(price), Some(date)) => Ok(NewExpense { title, price, date }),
            _ => Err(Error::BadRequest("Invalid expense".to_owned())),
        }
    }

    /// Validate a form where every field is optional, but at least one must be given.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every invalid field, or
    /// [Error::BadRequest] if no fields were given.
    pub fn into_changes(self) -> Result<ExpenseChanges, Error> {
        let mut validator = Validator::new();

        let title = validator.optional("title", self.title, |field, value| {
            validation::name(field, value, MAX_TITLE_LENGTH)
        });
        let price = validator.optional("price", self.price, validation::positive_number);
        let date = validator.optional("date", self.date, validation::iso_date);

        validator.finish()?;

        let changes = ExpenseChanges {
            title: title.flatten(),
            price: price.flatten(),
            date: date.flatten(),
        };

        if changes.is_empty() {
            return Err(Error::BadRequest(EMPTY_UPDATE_MESSAGE.to_owned()));
        }

        Ok(changes)
    }
}

/// The expense ID in the request path.
///
/// Rejects IDs that are not positive integers with [Error::InvalidExpenseId].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExpenseIdPath(pub ExpenseId);

impl<S> FromRequestParts<S> for ExpenseIdPath
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(raw_id): Path<String> = Path::from_request_parts(parts, state)
            .await
            .map_err(|_| Error::InvalidExpenseId)?;

        match raw_id.parse::<ExpenseId>() {
            Ok(id) if id > 0 => Ok(Self(id)),
            _ => Err(Error::InvalidExpenseId),
        }
    }
}
