use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};

use crate::services::error::ResolveError;

const NAIVE_DATE_TIME: &str = "%Y-%m-%dT%H:%M:%S%.f";
const PLAIN_DATE: &str = "%Y-%m-%d";

/// Parses a client-supplied date into a UTC instant.
///
/// Accepts RFC 3339 (`2024-01-15T10:00:00Z`), a naive date-time read as UTC
/// (`2024-01-15T10:00:00`) or a plain calendar date at UTC midnight
/// (`2024-01-15`).
pub fn parse_calendar_date(field: &str, raw: &str) -> Result<DateTime<Utc>, ResolveError> {
    let raw = raw.trim();

    if let Ok(parsed) = DateTime::parse_from_rfc3339(raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(raw, NAIVE_DATE_TIME) {
        return Ok(naive.and_utc());
    }
    if let Some(midnight) = NaiveDate::parse_from_str(raw, PLAIN_DATE)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
    {
        return Ok(midnight.and_utc());
    }

    Err(ResolveError::validation(format!(
        "{} must be an ISO-8601 date, got '{}'",
        field, raw
    )))
}
