//! The optional personal details stored on a user, and how they are updated.

use rusqlite::{
    Connection, ToSql,
    types::{FromSql, FromSqlError, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    auth::{User, UserID, map_user_row},
};

/// The gender a user may list on their profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    /// Male
    Male,
    /// Female
    Female,
    /// Any other gender.
    Other,
}

impl Gender {
    /// The name used in JSON and in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Other => "other",
        }
    }

    /// Parse a gender from its name.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "male" => Some(Gender::Male),
            "female" => Some(Gender::Female),
            "other" => Some(Gender::Other),
            _ => None,
        }
    }
}

impl ToSql for Gender {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(self.as_str().into())
    }
}

impl FromSql for Gender {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        let name = value.as_str()?;

        Gender::from_name(name).ok_or_else(|| FromSqlError::Other(format!("invalid gender {name:?}").into()))
    }
}

/// Personal details a user may add to their account after registering.
///
/// Fields that have not been set are left out of the JSON representation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    /// A contact phone number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    /// The user's father's name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub father_name: Option<String>,
    /// The user's gender.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    /// The user's postal code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zip_code: Option<String>,
    /// The user's postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    /// When the user was born.
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "crate::date_format::option"
    )]
    pub date_of_birth: Option<Date>,
    /// A link to a profile picture.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    /// A short description the user has written about themselves.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub about_me: Option<String>,
}

/// The changes to make to a user's profile.
///
/// Fields set to `None` are left unchanged.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProfileUpdate {
    /// The new profile details.
    pub profile: Profile,
    /// The new monthly budget limit.
    pub budget_limit: Option<f64>,
}

impl ProfileUpdate {
    /// Whether the update would not change anything.
    pub fn is_empty(&self) -> bool {
        self.profile == Profile::default() && self.budget_limit.is_none()
    }
}

/// Apply `update` to the user with `user_id` and return the updated user.
///
/// # Errors
/// This function will return a:
/// - [Error::NotFound] if `user_id` does not refer to a registered user,
/// - or [Error::SqlError] if there is some other SQL error.
pub fn update_profile(
    user_id: UserID,
    update: ProfileUpdate,
    now: OffsetDateTime,
    connection: &Connection,
) -> Result<User, Error> {
    let ProfileUpdate {
        profile,
        budget_limit,
    } = update;

    connection
        .prepare(
            "UPDATE user SET \
                phone_number = COALESCE(?1, phone_number), \
                father_name = COALESCE(?2, father_name), \
                gender = COALESCE(?3, gender), \
                zip_code = COALESCE(?4, zip_code), \
                address = COALESCE(?5, address), \
                date_of_birth = COALESCE(?6, date_of_birth), \
                photo = COALESCE(?7, photo), \
                about_me = COALESCE(?8, about_me), \
                budget_limit = COALESCE(?9, budget_limit), \
                updated_at = ?10 \
            WHERE id = ?11 \
            RETURNING id, first_name, last_name, email, budget_limit, role, phone_number, \
                father_name, gender, zip_code, address, date_of_birth, photo, about_me, \
                created_at, updated_at",
        )?
        .query_row(
            rusqlite::params![
                profile.phone_number,
                profile.father_name,
                profile.gender,
                profile.zip_code,
                profile.address,
                profile.date_of_birth,
                profile.photo,
                profile.about_me,
                budget_limit,
                now,
                user_id,
            ],
            map_user_row,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound("User"),
            error => error.into(),
        })
}
