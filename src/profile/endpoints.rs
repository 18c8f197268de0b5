//! The endpoints for viewing and updating the current user's profile.

use std::sync::{Arc, Mutex};

use axum::extract::{FromRef, State};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::Value;
use time::OffsetDateTime;

use crate::{
    AppState, Error,
    auth::{CurrentUser, User},
    json::JsonBody,
    profile::{
        Gender, Profile,
        core::{ProfileUpdate, update_profile},
    },
    response::Success,
    validation::{self, EMPTY_UPDATE_MESSAGE, Validator},
};

/// The state needed for the profile endpoints.
#[derive(Debug, Clone)]
pub struct ProfileState {
    /// The database connection for managing users.
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for ProfileState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            db_connection: state.db_connection.clone(),
        }
    }
}

/// A route handler that returns the current user, as loaded by [CurrentUser].
pub async fn get_profile(CurrentUser(user): CurrentUser) -> Success<User> {
    Success::ok(user)
}

/// The request body for updating a profile. Every field is optional, but at
/// least one must be given.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileForm {
    phone_number: Option<String>,
    father_name: Option<String>,
    gender: Option<String>,
    zip_code: Option<String>,
    address: Option<String>,
    /// In the format `DD/MM/YYYY`.
    date_of_birth: Option<String>,
    photo: Option<String>,
    about_me: Option<String>,
    budget_limit: Option<Value>,
}

impl ProfileForm {
    fn validate(self) -> Result<ProfileUpdate, Error> {
        let mut validator = Validator::new();

        let phone_number = validator.optional("phoneNumber", self.phone_number, |field, value| {
            validation::text(field, value, 15)
        });
        let father_name = validator.optional("fatherName", self.father_name, |field, value| {
            validation::text(field, value, 50)
        });
        let gender = validator.optional("gender", self.gender, |field, value| {
            Gender::from_name(&value)
                .ok_or_else(|| format!("\"{field}\" must be one of [male, female, other]"))
        });
        let zip_code = validator.optional("zipCode", self.zip_code, |field, value| {
            validation::text(field, value, 10)
        });
        let address = validator.optional("address", self.address, |field, value| {
            validation::text(field, value, 200)
        });
        let date_of_birth =
            validator.optional("dateOfBirth", self.date_of_birth, validation::day_month_year);
        let photo = validator.optional("photo", self.photo, |field, value| {
            validation::text(field, value, usize::MAX)
        });
        let about_me = validator.optional("aboutMe", self.about_me, |field, value| {
            validation::text(field, value, 500)
        });
        let budget_limit =
            validator.optional("budgetLimit", self.budget_limit, validation::positive_number);

        validator.finish()?;

        let update = ProfileUpdate {
            profile: Profile {
                phone_number: phone_number.flatten(),
                father_name: father_name.flatten(),
                gender: gender.flatten(),
                zip_code: zip_code.flatten(),
                address: address.flatten(),
                date_of_birth: date_of_birth.flatten(),
                photo: photo.flatten(),
                about_me: about_me.flatten(),
            },
            budget_limit: budget_limit.flatten(),
        };

        if update.is_empty() {
            return Err(Error::BadRequest(EMPTY_UPDATE_MESSAGE.to_owned()));
        }

        Ok(update)
    }
}

/// A route handler that sets the given profile fields and returns the updated user.
///
/// # Errors
/// Returns [Error::Validation] if a field is invalid, or [Error::BadRequest]
/// if no fields were given.
pub async fn update_profile_endpoint(
    State(state): State<ProfileState>,
    CurrentUser(user): CurrentUser,
    JsonBody(form): JsonBody<ProfileForm>,
) -> Result<Success<User>, Error> {
    let update = form.validate()?;

    let connection = state
        .db_connection
        .lock()
        .map_err(|_| Error::DatabaseLockError)?;

    update_profile(user.id, update, OffsetDateTime::now_utc(), &connection).map(Success::ok)
}
