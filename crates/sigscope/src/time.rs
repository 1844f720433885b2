//! Compact UTC timestamp handling.
//!
//! Requests declare their signing time as a long date (`YYYYMMDDTHHMMSSZ`)
//! and scope their credentials to a short date (`YYYYMMDD`), both UTC with no
//! separators.

use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::AuthError;

/// Long date format: `YYYYMMDDTHHMMSSZ`.
pub const LONG_DATE_FORMAT: &str = "%Y%m%dT%H%M%SZ";

/// Short date format: `YYYYMMDD`.
pub const SHORT_DATE_FORMAT: &str = "%Y%m%d";

/// Format a timestamp as a long date string.
#[must_use]
pub fn format_long_date(date: &DateTime<Utc>) -> String {
    date.format(LONG_DATE_FORMAT).to_string()
}

/// Format a timestamp as a short date string.
#[must_use]
pub fn format_short_date(date: &DateTime<Utc>) -> String {
    date.format(SHORT_DATE_FORMAT).to_string()
}

/// Check whether a value has the exact `\d{8}T\d{6}Z` shape.
#[must_use]
pub fn is_long_date(value: &str) -> bool {
    let bytes = value.as_bytes();
    bytes.len() == 16
        && bytes[8] == b'T'
        && bytes[15] == b'Z'
        && bytes[..8].iter().all(u8::is_ascii_digit)
        && bytes[9..15].iter().all(u8::is_ascii_digit)
}

/// Parse a declared long date into a UTC timestamp.
///
/// # Errors
///
/// Returns [`AuthError::InvalidRequestDate`] when the value does not have the
/// long-date shape or does not denote a real calendar instant.
pub fn parse_long_date(value: &str) -> Result<DateTime<Utc>, AuthError> {
    if !is_long_date(value) {
        return Err(AuthError::InvalidRequestDate);
    }
    NaiveDateTime::parse_from_str(value, LONG_DATE_FORMAT)
        .map(|naive| naive.and_utc())
        .map_err(|_| AuthError::InvalidRequestDate)
}

/// The short date embedded in a long date string.
///
/// Takes the first eight characters by truncation rather than reformatting,
/// so an inconsistent date string is carried through unchanged and rejected
/// by the date-match check instead of being silently repaired.
#[must_use]
pub fn short_date_of(long_date: &str) -> &str {
    long_date.get(..8).unwrap_or(long_date)
}
