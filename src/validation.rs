//! Field validation rules shared by the request payloads.
//!
//! Each rule returns the parsed value or a human readable message. A
//! [Validator] collects the messages for every field so that the client sees
//! all problems at once.

use std::collections::BTreeMap;

use email_address::EmailAddress;
use serde_json::Value;
use time::{
    Date, OffsetDateTime, PrimitiveDateTime, UtcOffset, format_description::well_known::Rfc3339,
    macros::format_description,
};

use crate::Error;

/// Validation messages keyed by field name.
pub type FieldErrors = BTreeMap<String, Vec<String>>;

/// The message for a partial update that does not set any fields.
pub const EMPTY_UPDATE_MESSAGE: &str = "At least one field must be provided";

/// Collects validation errors across the fields of a request.
#[derive(Debug, Default)]
pub struct Validator {
    first_message: Option<String>,
    errors: FieldErrors,
}

impl Validator {
    /// Create a validator with no errors.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an error `message` against `field`.
    pub fn add(&mut self, field: &str, message: String) {
        if self.first_message.is_none() {
            self.first_message = Some(message.clone());
        }

        self.errors
            .entry(field.to_owned())
            .or_default()
            .push(message);
    }

    /// Keep the value of a successful check, or record its error and return `None`.
    pub fn check<T>(&mut self, field: &str, result: Result<T, String>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(message) => {
                self.add(field, message);
                None
            }
        }
    }

    /// Run `rule` on `value` if it is present, otherwise record that `field` is required.
    pub fn required<T, U>(
        &mut self,
        field: &str,
        value: Option<T>,
        rule: impl FnOnce(&str, T) -> Result<U, String>,
    ) -> Option<U> {
        match value {
            Some(value) => self.check(field, rule(field, value)),
            None => {
                self.add(field, format!("\"{field}\" is required"));
                None
            }
        }
    }

    /// Run `rule` on `value` if it is present.
    ///
    /// The outer option of the return value is `None` if the value was
    /// present but invalid.
    pub fn optional<T, U>(
        &mut self,
        field: &str,
        value: Option<T>,
        rule: impl FnOnce(&str, T) -> Result<U, String>,
    ) -> Option<Option<U>> {
        match value {
            Some(value) => self.check(field, rule(field, value)).map(Some),
            None => Some(None),
        }
    }

    /// Convert the collected errors into [Error::Validation], if there are any.
    pub fn finish(self) -> Result<(), Error> {
        match self.first_message {
            None => Ok(()),
            Some(message) => Err(Error::Validation {
                message,
                errors: self.errors,
            }),
        }
    }
}

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphabetic() || c.is_whitespace() || c == '-'
}

/// A non-empty string of at most `max_length` characters containing only
/// letters, whitespace and hyphens.
pub fn name(field: &str, value: String, max_length: usize) -> Result<String, String> {
    if value.is_empty() {
        return Err(format!("\"{field}\" is not allowed to be empty"));
    }

    if value.chars().count() > max_length {
        return Err(format!(
            "\"{field}\" must be at most {max_length} characters long"
        ));
    }

    if !value.chars().all(is_name_char) {
        return Err(format!(
            "\"{field}\" may only contain letters, spaces and hyphens"
        ));
    }

    Ok(value)
}

/// A non-empty string of at most `max_length` characters.
pub fn text(field: &str, value: String, max_length: usize) -> Result<String, String> {
    if value.is_empty() {
        return Err(format!("\"{field}\" is not allowed to be empty"));
    }

    if value.chars().count() > max_length {
        return Err(format!(
            "\"{field}\" must be at most {max_length} characters long"
        ));
    }

    Ok(value)
}

/// A syntactically valid email address.
pub fn email(field: &str, value: String) -> Result<String, String> {
    if EmailAddress::is_valid(&value) {
        Ok(value)
    } else {
        Err(format!("\"{field}\" must be a valid email"))
    }
}

/// A finite number greater than zero.
pub fn positive(field: &str, value: f64) -> Result<f64, String> {
    if !value.is_finite() {
        return Err(format!("\"{field}\" must be a number"));
    }

    if value <= 0.0 {
        return Err(format!("\"{field}\" must be a positive number"));
    }

    Ok(value)
}

/// Read a number given either as a JSON number or as a numeric string.
pub fn number(field: &str, value: Value) -> Result<f64, String> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(text) => text.trim().parse::<f64>().ok(),
        _ => None,
    };

    number
        .filter(|number| number.is_finite())
        .ok_or_else(|| format!("\"{field}\" must be a number"))
}

/// [number] followed by [positive].
pub fn positive_number(field: &str, value: Value) -> Result<f64, String> {
    positive(field, number(field, value)?)
}

/// Parse a date from an ISO 8601 string.
///
/// Accepts a calendar date such as `2025-01-31`, a date-time with an offset
/// such as `2025-01-31T23:30:00+13:00`, or a date-time without an offset which
/// is taken to be UTC. Date-times are converted to UTC before the date is
/// taken.
pub fn parse_iso_date(value: &str) -> Option<Date> {
    let date_format = format_description!("[year]-[month]-[day]");
    let naive_format = format_description!("[year]-[month]-[day]T[hour]:[minute]:[second]");
    let naive_subsecond_format =
        format_description!("[year]-[month]-[day]T[hour]:[minute]:[second].[subsecond]");

    if let Ok(date) = Date::parse(value, date_format) {
        return Some(date);
    }

    if let Ok(date_time) = OffsetDateTime::parse(value, &Rfc3339) {
        return Some(date_time.to_offset(UtcOffset::UTC).date());
    }

    PrimitiveDateTime::parse(value, naive_format)
        .or_else(|_| PrimitiveDateTime::parse(value, naive_subsecond_format))
        .ok()
        .map(|date_time| date_time.date())
}

/// An ISO 8601 date, see [parse_iso_date].
pub fn iso_date(field: &str, value: String) -> Result<Date, String> {
    parse_iso_date(&value).ok_or_else(|| {
        format!("\"{field}\" must be in ISO format (YYYY-MM-DD or YYYY-MM-DDTHH:mm:ss.sssZ)")
    })
}

/// A date in the format `DD/MM/YYYY`.
pub fn day_month_year(field: &str, value: String) -> Result<Date, String> {
    let format = format_description!("[day]/[month]/[year]");

    Date::parse(&value, format).map_err(|_| format!("\"{field}\" must be in the format DD/MM/YYYY"))
}

#[cfg(test)]
mod tests {
    use serde_json::json;
    use time::macros::date;

    use crate::{
        Error,
        validation::{
            Validator, day_month_year, email, iso_date, name, number, parse_iso_date, positive,
            positive_number, text,
        },
    };

    #[test]
    fn name_accepts_letters_spaces_and_hyphens() {
        assert_eq!(
            name("title", "Weekly groceries - market".to_owned(), 30),
            Ok("Weekly groceries - market".to_owned())
        );
    }

    #[test]
    fn name_rejects_digits() {
        assert!(name("title", "Rent 2025".to_owned(), 30).is_err());
    }

    #[test]
    fn name_rejects_empty() {
        assert_eq!(
            name("title", String::new(), 30),
            Err("\"title\" is not allowed to be empty".to_owned())
        );
    }

    #[test]
    fn name_rejects_too_long() {
        let too_long = "a".repeat(31);

        assert_eq!(
            name("title", too_long, 30),
            Err("\"title\" must be at most 30 characters long".to_owned())
        );
    }

    #[test]
    fn text_counts_characters_not_bytes() {
        assert!(text("aboutMe", "é".repeat(5), 5).is_ok());
    }

    #[test]
    fn email_validation() {
        assert!(email("email", "foo@bar.baz".to_owned()).is_ok());
        assert!(email("email", "foobar.baz".to_owned()).is_err());
        assert!(email("email", String::new()).is_err());
    }

    #[test]
    fn positive_rejects_zero_negative_and_nan() {
        assert!(positive("price", 0.01).is_ok());
        assert!(positive("price", 0.0).is_err());
        assert!(positive("price", -1.0).is_err());
        assert!(positive("price", f64::NAN).is_err());
        assert!(positive("price", f64::INFINITY).is_err());
    }

    #[test]
    fn number_accepts_numbers_and_numeric_strings() {
        assert_eq!(number("price", json!(12)), Ok(12.0));
        assert_eq!(number("price", json!(12.5)), Ok(12.5));
        assert_eq!(number("price", json!("12")), Ok(12.0));
        assert_eq!(number("price", json!(" 0.99 ")), Ok(0.99));
    }

    #[test]
    fn number_rejects_everything_else() {
        let want = Err("\"price\" must be a number".to_owned());

        for value in [
            json!("twelve"),
            json!(""),
            json!("NaN"),
            json!("inf"),
            json!(true),
            json!([12]),
            json!({"amount": 12}),
        ] {
            assert_eq!(number("price", value.clone()), want, "value {value}");
        }
    }

    #[test]
    fn positive_number_checks_sign_after_parsing() {
        assert_eq!(positive_number("price", json!("3")), Ok(3.0));
        assert_eq!(
            positive_number("price", json!("-3")),
            Err("\"price\" must be a positive number".to_owned())
        );
    }

    #[test]
    fn parses_plain_date() {
        assert_eq!(parse_iso_date("2025-01-31"), Some(date!(2025 - 01 - 31)));
    }

    #[test]
    fn parses_date_time_in_utc() {
        assert_eq!(
            parse_iso_date("2025-01-31T10:15:00.000Z"),
            Some(date!(2025 - 01 - 31))
        );
    }

    #[test]
    fn converts_date_time_with_offset_to_utc_date() {
        assert_eq!(
            parse_iso_date("2025-02-01T05:00:00+13:00"),
            Some(date!(2025 - 01 - 31))
        );
    }

    #[test]
    fn parses_date_time_without_offset() {
        assert_eq!(
            parse_iso_date("2025-01-31T10:15:00"),
            Some(date!(2025 - 01 - 31))
        );
        assert_eq!(
            parse_iso_date("2025-01-31T10:15:00.123"),
            Some(date!(2025 - 01 - 31))
        );
    }

    #[test]
    fn rejects_non_iso_dates() {
        assert_eq!(parse_iso_date("31/01/2025"), None);
        assert_eq!(parse_iso_date("2025-13-01"), None);
        assert_eq!(parse_iso_date("yesterday"), None);
        assert!(iso_date("date", "soon".to_owned()).is_err());
    }

    #[test]
    fn parses_day_month_year() {
        assert_eq!(
            day_month_year("dateOfBirth", "25/12/1990".to_owned()),
            Ok(date!(1990 - 12 - 25))
        );
        assert!(day_month_year("dateOfBirth", "1990-12-25".to_owned()).is_err());
    }

    #[test]
    fn validator_reports_first_error_and_all_fields() {
        let mut validator = Validator::new();

        let title: Option<String> =
            validator.required("title", None::<String>, |field, value| name(field, value, 30));
        let price = validator.required("price", Some(-2.0), positive);

        assert_eq!(title, None);
        assert_eq!(price, None);

        match validator.finish() {
            Err(Error::Validation { message, errors }) => {
                assert_eq!(message, "\"title\" is required");
                assert_eq!(errors.len(), 2);
                assert_eq!(errors["price"], vec!["\"price\" must be a positive number"]);
            }
            other => panic!("want validation error, got {other:?}"),
        }
    }

    #[test]
    fn optional_skips_missing_values() {
        let mut validator = Validator::new();

        let value = validator.optional("price", None::<f64>, positive);

        assert_eq!(value, Some(None));
        assert_eq!(validator.finish(), Ok(()));
    }
}
