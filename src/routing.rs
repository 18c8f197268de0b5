//! Application router configuration.

use axum::{
    Router, middleware,
    routing::{get, post},
};
use tower_http::{compression::CompressionLayer, cors::CorsLayer};

use crate::{
    AppState, Error,
    auth::{log_in, log_out, refresh_token, register_user},
    endpoints,
    expense::{
        budget_status_endpoint, create_expense_endpoint, delete_expense_endpoint,
        get_expense_endpoint, list_expenses_endpoint, patch_expense_endpoint,
        replace_expense_endpoint,
    },
    logging::logging_middleware,
    profile::{get_profile, update_profile_endpoint},
    response::Success,
};

/// Return a router with all the app's routes.
///
/// Requests and responses are logged before compression so that the logged
/// bodies are readable and secrets can be redacted.
///
/// Routes under `/profile` and `/expenses` need a valid access token, which
/// their handlers check through the [crate::auth::CurrentUser] extractor.
pub fn build_router(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route(endpoints::REGISTER, post(register_user))
        .route(endpoints::LOG_IN, post(log_in))
        .route(endpoints::REFRESH_TOKEN, post(refresh_token))
        .route(endpoints::LOG_OUT, post(log_out));

    let profile_routes = Router::new().route(
        endpoints::PROFILE,
        get(get_profile).patch(update_profile_endpoint),
    );

    let expense_routes = Router::new()
        .route(
            endpoints::EXPENSES,
            get(list_expenses_endpoint).post(create_expense_endpoint),
        )
        .route(endpoints::BUDGET_STATUS, get(budget_status_endpoint))
        .route(
            endpoints::EXPENSE,
            get(get_expense_endpoint)
                .put(replace_expense_endpoint)
                .patch(patch_expense_endpoint)
                .delete(delete_expense_endpoint),
        );

    Router::new()
        .route(endpoints::ROOT, get(get_greeting))
        .merge(auth_routes)
        .merge(profile_routes)
        .merge(expense_routes)
        .fallback(get_404_not_found)
        .method_not_allowed_fallback(get_404_not_found)
        .layer(middleware::from_fn(logging_middleware))
        .layer(CompressionLayer::new())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn get_greeting() -> Success<&'static str> {
    Success::ok("Welcome to the expense tracker API")
}

async fn get_404_not_found() -> Error {
    Error::NotFound("Route")
}
