use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use chrono_tz::Tz;

pub const WIRE_DATE_FORMAT: &str = "%Y-%m-%d";
pub const DISPLAY_DATE_FORMAT: &str = "%d-%m-%Y";

/// Offset-less timestamps the backend may send, read as wall-clock time.
const NAIVE_DATETIME_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Calendar date of `dt` as read on a wall clock in its own timezone.
///
/// A date picker hands over local midnight; converting that instant to UTC
/// first would move it to the previous day for any zone ahead of UTC.
#[must_use]
pub fn calendar_date<Z: TimeZone>(dt: &DateTime<Z>) -> NaiveDate {
    dt.date_naive()
}

#[must_use]
pub fn format_wire_date(date: NaiveDate) -> String {
    date.format(WIRE_DATE_FORMAT).to_string()
}

#[must_use]
pub fn format_display_date(date: NaiveDate) -> String {
    date.format(DISPLAY_DATE_FORMAT).to_string()
}

/// Parses a date sent by the backend.
///
/// `YYYY-MM-DD` is taken as-is. An RFC 3339 instant is the calendar date it
/// falls on in `tz`. A timestamp without an offset is already wall-clock
/// time, so its date part is used.
pub fn parse_wire_date(raw: &str, tz: Tz) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, WIRE_DATE_FORMAT) {
        return Some(date);
    }
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(calendar_date(&instant.with_timezone(&tz)));
    }
    NAIVE_DATETIME_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
        .map(|local| local.date())
}

/// Strict form-input parse: only `YYYY-MM-DD` is accepted.
pub fn parse_form_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), WIRE_DATE_FORMAT).ok()
}

pub fn parse_timezone(raw: &str, source: &str) -> Option<Tz> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        tracing::warn!(source, "empty timezone value");
        return None;
    }

    match trimmed.parse::<Tz>() {
        Ok(tz) => Some(tz),
        Err(err) => {
            tracing::warn!(source, value = trimmed, error = %err, "invalid timezone value");
            None
        }
    }
}
