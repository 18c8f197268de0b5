//! An expense tracking REST API.
//!
//! Users register, log in with JSON web tokens, and keep a ledger of dated
//! expenses. The expenses in any calendar month may not add up to more than
//! the user's monthly budget limit.
//!
//! Every response body is a JSON envelope with a `status` of `success` or
//! `error`, and either the `data` or an error `message`.

#![warn(missing_docs)]

use std::{net::SocketAddr, time::Duration};

use axum_server::Handle;
use tokio::signal;

mod app_state;
mod auth;
mod database_id;
mod date_format;
mod db;
mod endpoints;
mod error;
mod expense;
mod json;
mod logging;
mod pagination;
mod profile;
mod response;
mod routing;
mod validation;

#[cfg(test)]
mod test_utils;

pub use app_state::AppState;
pub use auth::{
    NewUser, PasswordHash, User, UserID, ValidatedPassword, create_user, get_user_by_id,
    update_password,
};
pub use db::initialize as initialize_db;
pub use error::Error;
pub use expense::{
    BudgetStatus, Expense, NewExpense, create_expense_within_budget, get_budget_status,
};
pub use logging::LOG_BODY_LENGTH_LIMIT;
pub use pagination::PaginationConfig;
pub use routing::build_router;

/// An async task that waits for either the ctrl+c or terminate signal, whichever comes first, and
/// then signals the server to shut down gracefully.
///
/// `handle` is a handle to an Axum `Server`.
pub async fn graceful_shutdown(handle: Handle<SocketAddr>) {
    let ctrl_c = async {
        if let Err(error) = signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {error}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                tracing::error!("Failed to install terminate signal handler: {error}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            tracing::debug!("Received ctrl+c signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
        _ = terminate => {
            tracing::debug!("Received terminate signal.");
            handle.graceful_shutdown(Some(Duration::from_secs(1)));
        },
    }
}
