//! User accounts, password hashing, token issuing and the endpoints for
//! registering, logging in and logging out.

mod log_in;
mod log_out;
mod middleware;
mod password;
mod register_user;
mod token;
mod user;

#[cfg(test)]
pub(crate) use log_in::LogInTokens;
pub use log_in::{log_in, refresh_token};
pub use log_out::log_out;
pub use middleware::{AuthState, CurrentUser};
pub use password::{PasswordHash, ValidatedPassword};
pub use register_user::register_user;
pub use token::AuthConfig;
pub use user::{
    NewUser, User, UserID, create_user, create_user_table, get_refresh_token,
    get_user_by_id, get_user_credentials, set_refresh_token, update_password,
};
pub(crate) use user::map_user_row;
