//! Specifies how to serialize a [time::Date] as an ISO 8601 calendar date,
//! e.g. "2025-01-31".
//!
//! Use with `#[serde(with = "crate::date_format")]`, or
//! `#[serde(with = "crate::date_format::option")]` for optional dates.

use serde::{Deserialize, Deserializer, Serializer};
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

/// Date format for the JSON representation of dates, e.g. "2025-01-31".
pub const DATE_FORMAT: &[BorrowedFormatItem] = format_description!("[year]-[month]-[day]");

/// Serialize `date` as a string, e.g. "2025-01-31".
pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    let formatted = date.format(DATE_FORMAT).map_err(serde::ser::Error::custom)?;
    serializer.serialize_str(&formatted)
}

/// Deserialize a date from a string, e.g. "2025-01-31".
pub fn deserialize<'de, D>(deserializer: D) -> Result<Date, D::Error>
where
    D: Deserializer<'de>,
{
    let s = String::deserialize(deserializer)?;
    Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom)
}

pub mod option {
    //! The same format as the parent module for `Option<Date>`.

    use serde::{Deserialize, Deserializer, Serializer};
    use time::Date;

    use super::DATE_FORMAT;

    /// Serialize `date` as a string, or null if there is no date.
    pub fn serialize<S>(date: &Option<Date>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match date {
            Some(date) => super::serialize(date, serializer),
            None => serializer.serialize_none(),
        }
    }

    /// Deserialize an optional date from a string or null.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Date>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer)?
            .map(|s| Date::parse(&s, DATE_FORMAT).map_err(serde::de::Error::custom))
            .transpose()
    }
}
