//! Caller-side input checks for entry forms and imports.
//!
//! The store only insists on required fields; these helpers cover the rest
//! (date syntax, future dates) for hosts that collect raw text.

use crate::calc::parse_iso_date;
use crate::model::experiment::ValidationError;
use chrono::NaiveDate;

/// Parses a `YYYY-MM-DD` field value.
///
/// Blank input is reported as a missing field.
pub fn parse_date_field(field: &'static str, value: &str) -> Result<NaiveDate, ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    parse_iso_date(value).ok_or_else(|| ValidationError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

/// Parses an optional `YYYY-MM-DD` field; blank input means "not set".
pub fn parse_optional_date_field(
    field: &'static str,
    value: &str,
) -> Result<Option<NaiveDate>, ValidationError> {
    if value.trim().is_empty() {
        return Ok(None);
    }
    parse_date_field(field, value).map(Some)
}

/// Parses and checks a date against `today`.
pub fn validate_date(
    field: &'static str,
    value: &str,
    today: NaiveDate,
    allow_future: bool,
) -> Result<NaiveDate, ValidationError> {
    let date = parse_date_field(field, value)?;
    if !allow_future && date > today {
        return Err(ValidationError::FutureDate { field, date });
    }
    Ok(date)
}
