//! The current user's optional personal details and budget limit.

mod core;
mod endpoints;

pub use core::{Gender, Profile};
pub use endpoints::{get_profile, update_profile_endpoint};
