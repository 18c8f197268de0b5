//! The API endpoints URIs.
//!
//! For endpoints that take a parameter, e.g., '/expenses/{expense_id}', use [format_endpoint].

/// The root route which greets the client.
pub const ROOT: &str = "/";
/// The route for registering a new user.
pub const REGISTER: &str = "/auth/register";
/// The route for logging in a user.
pub const LOG_IN: &str = "/auth/login";
/// The route for exchanging a refresh token for a new access token.
pub const REFRESH_TOKEN: &str = "/auth/refresh-token";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/auth/logout";
/// The route to view and update the current user's profile.
pub const PROFILE: &str = "/profile";
/// The route to list and create expenses.
pub const EXPENSES: &str = "/expenses";
/// The route to access a single expense.
pub const EXPENSE: &str = "/expenses/{expense_id}";
/// The route for the spending summary of the current month.
pub const BUDGET_STATUS: &str = "/expenses/budget-status";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/expenses/{expense_id}', '{expense_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let mut param_start = None;
    let mut param_end = None;

    for (i, c) in endpoint_path.chars().enumerate() {
        if c == '{' {
            param_start = Some(i);
        } else if param_start.is_some() && c == '}' {
            param_end = Some(i + 1);
            break;
        }
    }

    let param_start = match param_start {
        Some(start) => start,
        None => return endpoint_path.to_string(),
    };

    let param_end = param_end.unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
