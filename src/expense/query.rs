//! Filtering, sorting and paging a user's expenses.

use rusqlite::{Connection, types::Value};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    expense::core::{Expense, map_expense_row},
    pagination::{PaginationConfig, page_offset},
    validation::{self, Validator},
};

/// The field to sort expenses by.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortBy {
    /// Sort by price.
    Price,
    /// Sort by the date of the expense.
    #[default]
    Date,
}

/// The order to sort expenses in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Sort in order of increasing value.
    Ascending,
    /// Sort in order of decreasing value.
    #[default]
    Descending,
}

impl SortOrder {
    fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

/// The raw query string of a request to list expenses.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExpenseQueryParams {
    page: Option<String>,
    limit: Option<String>,
    search: Option<String>,
    start_date: Option<String>,
    end_date: Option<String>,
    sort_by: Option<String>,
    sort_order: Option<String>,
}

/// A validated request to list expenses.
#[derive(Debug, Clone, PartialEq)]
pub struct ExpenseQuery {
    /// The page to return, starting from one.
    pub page: u64,
    /// The number of expenses per page.
    pub limit: u64,
    /// Only include expenses whose title contains one of these terms, ignoring case.
    pub search: Vec<String>,
    /// Only include expenses on or after this date.
    pub start_date: Option<Date>,
    /// Only include expenses on or before this date.
    pub end_date: Option<Date>,
    /// The field to sort by.
    pub sort_by: SortBy,
    /// The direction to sort in.
    pub sort_order: SortOrder,
}

impl ExpenseQuery {
    /// A query for the first page with the default page size and no filters.
    pub fn new(config: &PaginationConfig) -> Self {
        Self {
            page: config.default_page,
            limit: config.default_page_size,
            search: Vec::new(),
            start_date: None,
            end_date: None,
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
        }
    }
}

fn parse_bounded(field: &str, value: String, min: u64, max: u64) -> Result<u64, String> {
    let number: u64 = value
        .trim()
        .parse()
        .map_err(|_| format!("\"{field}\" must be a number"))?;

    if number < min {
        return Err(format!(
            "\"{field}\" must be greater than or equal to {min}"
        ));
    }

    if number > max {
        return Err(format!("\"{field}\" must be less than or equal to {max}"));
    }

    Ok(number)
}

impl ExpenseQueryParams {
    /// Check the query string, filling in defaults for missing parameters.
    ///
    /// # Errors
    /// Returns [Error::Validation] listing every invalid parameter.
    pub fn validate(self, config: &PaginationConfig) -> Result<ExpenseQuery, Error> {
        let mut validator = Validator::new();
        let defaults = ExpenseQuery::new(config);

        let page = validator.optional("page", self.page, |field, value| {
            parse_bounded(field, value, 1, u64::MAX)
        });
        let limit = validator.optional("limit", self.limit, |field, value| {
            parse_bounded(field, value, 1, config.max_page_size)
        });
        let start_date = validator.optional("startDate", self.start_date, validation::iso_date);
        let end_date = validator.optional("endDate", self.end_date, validation::iso_date);
        let sort_by = validator.optional("sortBy", self.sort_by, |field, value| {
            match value.as_str() {
                "price" => Ok(SortBy::Price),
                "date" => Ok(SortBy::Date),
                _ => Err(format!("\"{field}\" must be one of [price, date]")),
            }
        });
        let sort_order = validator.optional("sortOrder", self.sort_order, |field, value| {
            match value.as_str() {
                "asc" => Ok(SortOrder::Ascending),
                "desc" => Ok(SortOrder::Descending),
                _ => Err(format!("\"{field}\" must be one of [asc, desc]")),
            }
        });

        validator.finish()?;

        let search = self
            .search
            .map(|search| search.split_whitespace().map(str::to_owned).collect())
            .unwrap_or_default();

        Ok(ExpenseQuery {
            page: page.flatten().unwrap_or(defaults.page),
            limit: limit.flatten().unwrap_or(defaults.limit),
            search,
            start_date: start_date.flatten(),
            end_date: end_date.flatten(),
            sort_by: sort_by.flatten().unwrap_or(defaults.sort_by),
            sort_order: sort_order.flatten().unwrap_or(defaults.sort_order),
        })
    }
}

/// Escape the wildcard characters of a LIKE pattern with a backslash.
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());

    for c in term.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

/// Get one page of the user's expenses that match `query`, along with the
/// number of matching expenses across all pages.
///
/// Ties in the sort field are broken by ID in the same direction so that
/// pages are stable.
///
/// # Errors
/// Returns [Error::SqlError] if there is an SQL error.
pub fn query_expenses(
    user_id: UserID,
    query: &ExpenseQuery,
    connection: &Connection,
) -> Result<(Vec<Expense>, u64), Error> {
    let mut where_clauses = vec!["user_id = ?".to_owned()];
    let mut params = vec![Value::Integer(user_id.as_i64())];

    if !query.search.is_empty() {
        let term_clauses = vec!["title LIKE ? ESCAPE '\\'"; query.search.len()];
        where_clauses.push(format!("({})", term_clauses.join(" OR ")));
        params.extend(
            query
                .search
                .iter()
                .map(|term| Value::Text(format!("%{}%", escape_like(term)))),
        );
    }

    if let Some(start_date) = query.start_date {
        where_clauses.push("date >= ?".to_owned());
        params.push(Value::Text(start_date.to_string()));
    }

    if let Some(end_date) = query.end_date {
        where_clauses.push("date <= ?".to_owned());
        params.push(Value::Text(end_date.to_string()));
    }

    let where_clause = where_clauses.join(" AND ");

    let total: i64 = connection.query_row(
        &format!("SELECT COUNT(id) FROM expense WHERE {where_clause}"),
        rusqlite::params_from_iter(params.iter()),
        |row| row.get(0),
    )?;

    let sort_column = match query.sort_by {
        SortBy::Price => "price",
        SortBy::Date => "date",
    };
    let direction = query.sort_order.as_sql();
    let limit = i64::try_from(query.limit).unwrap_or(i64::MAX);
    let offset = i64::try_from(page_offset(query.page, query.limit)).unwrap_or(i64::MAX);
    params.push(Value::Integer(limit));
    params.push(Value::Integer(offset));

    let expenses = connection
        .prepare(&format!(
            "SELECT id, title, price, date, user_id, created_at, updated_at FROM expense \
            WHERE {where_clause} \
            ORDER BY {sort_column} {direction}, id {direction} \
            LIMIT ? OFFSET ?"
        ))?
        .query_map(rusqlite::params_from_iter(params.iter()), map_expense_row)?
        .map(|expense_result| expense_result.map_err(Error::SqlError))
        .collect::<Result<Vec<_>, _>>()?;

    Ok((expenses, u64::try_from(total).unwrap_or_default()))
}
