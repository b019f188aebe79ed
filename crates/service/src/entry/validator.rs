//! Pre-persistence checks on raw request values.
//!
//! These run before the schema rules in `models::entry` and stop at the first
//! problem; the schema rules then collect every remaining violation.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, Utc};
use sea_orm::entity::prelude::DateTimeWithTimeZone;

use super::domain::RawField;
use crate::errors::ServiceError;

fn capitalize(field: &str) -> String {
    let mut chars = field.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Fails on the first field that is missing, not a string, or blank after trimming.
pub fn validate_required(fields: &[(&str, Option<&RawField>)]) -> Result<(), ServiceError> {
    for (name, value) in fields {
        let ok = value
            .and_then(RawField::as_text)
            .is_some_and(|s| !s.trim().is_empty());
        if !ok {
            return Err(ServiceError::Validation(format!(
                "{} is required and must be a non-empty string.",
                capitalize(name)
            )));
        }
    }
    Ok(())
}

/// Absent, null and blank values are fine; anything else must parse as a date.
pub fn validate_date(label: &str, value: Option<&RawField>) -> Result<Option<DateTimeWithTimeZone>, ServiceError> {
    match value {
        None => Ok(None),
        Some(RawField::Text(s)) => parse_date_text(label, s),
        Some(RawField::Other(_)) => Err(invalid_date(label)),
    }
}

/// Accepts RFC 3339, `YYYY-MM-DDTHH:MM:SS[.fff]` (UTC) and `YYYY-MM-DD` (UTC midnight).
pub fn parse_date_text(label: &str, value: &str) -> Result<Option<DateTimeWithTimeZone>, ServiceError> {
    let value = value.trim();
    if value.is_empty() {
        return Ok(None);
    }
    if let Ok(dt) = DateTime::<FixedOffset>::parse_from_rfc3339(value) {
        return Ok(Some(dt));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Some(DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc).into()));
    }
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).ok_or_else(|| invalid_date(label))?;
        return Ok(Some(DateTime::<Utc>::from_naive_utc_and_offset(midnight, Utc).into()));
    }
    Err(invalid_date(label))
}

fn invalid_date(label: &str) -> ServiceError {
    ServiceError::Validation(format!("Invalid {label} format"))
}
