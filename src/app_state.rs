//! Implements a struct that holds the state of the REST server.

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::{Error, auth::AuthConfig, db::initialize, pagination::PaginationConfig};

/// The state of the REST server.
#[derive(Debug, Clone)]
pub struct AppState {
    /// The keys and lifetimes used for issuing and checking JSON web tokens.
    pub auth_config: AuthConfig,

    /// The config that controls how to split lists of expenses into pages.
    pub pagination_config: PaginationConfig,

    /// The database connection
    pub db_connection: Arc<Mutex<Connection>>,
}

impl AppState {
    /// Create a new [AppState] with a SQLite database connection.
    ///
    /// This function will initialize the database by adding the tables for the domain models.
    /// `jwt_secret` signs access tokens and `jwt_refresh_secret` signs refresh tokens.
    ///
    /// # Errors
    /// Returns an error if the database cannot be initialized.
    pub fn new(
        db_connection: Connection,
        jwt_secret: &str,
        jwt_refresh_secret: &str,
        pagination_config: PaginationConfig,
    ) -> Result<Self, Error> {
        initialize(&db_connection)?;

        let connection = Arc::new(Mutex::new(db_connection));

        Ok(Self {
            auth_config: AuthConfig::new(jwt_secret, jwt_refresh_secret),
            pagination_config,
            db_connection: connection,
        })
    }
}

#[cfg(test)]
mod tests {
    use rusqlite::Connection;

    use crate::{AppState, pagination::PaginationConfig};

    #[test]
    fn new_creates_tables() {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "foo",
            "bar",
            PaginationConfig::default(),
        )
        .unwrap();

        let connection = state.db_connection.lock().unwrap();
        let table_count: i64 = connection
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master \
                WHERE type = 'table' AND name IN ('user', 'expense')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(table_count, 2);
    }
}
