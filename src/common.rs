use chrono::{Duration, NaiveDate, NaiveDateTime};
use std::error::Error as StdError;

const SEPARATOR: &str = ", ";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

const MILLIS_PER_DAY: f64 = 86_400_000.0;

/// Beyond this many days chrono cannot represent the date anyway.
const MAX_OLE_DAYS: f64 = 100_000_000.0;

/// Joins the values of a multi-valued property, such as KB article IDs or categories.
///
/// Each value is followed by a separator and the trailing separator is trimmed afterwards,
/// so an empty input yields an empty string.
pub fn join_values<I, S>(values: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for value in values {
        joined.push_str(value.as_ref());
        joined.push_str(SEPARATOR);
    }

    let len = joined.trim_end_matches(|c| c == ',' || c == ' ').len();
    joined.truncate(len);
    joined
}

/// Converts an OLE automation date into a calendar timestamp.
///
/// The integral part counts days from 1899-12-30, and the fractional part is the time of
/// day regardless of sign, so `-1.5` is noon on 1899-12-29.
pub fn from_ole_date(date: f64) -> Option<NaiveDateTime> {
    if !date.is_finite() || date.abs() > MAX_OLE_DAYS {
        return None;
    }

    let days = date.trunc();
    let millis = ((date - days).abs() * MILLIS_PER_DAY).round() as i64;

    NaiveDate::from_ymd_opt(1899, 12, 30)?
        .and_hms_opt(0, 0, 0)?
        .checked_add_signed(Duration::days(days as i64))?
        .checked_add_signed(Duration::milliseconds(millis))
}

pub fn format_timestamp(timestamp: Option<NaiveDateTime>) -> String {
    timestamp.map(|time| time.format(TIMESTAMP_FORMAT).to_string()).unwrap_or_default()
}

/// Flattens an error and its sources into a single line.
pub fn error_chain(error: &dyn StdError) -> String {
    let mut message = error.to_string();
    let mut cause = error.source();
    while let Some(why) = cause {
        message.push_str(": ");
        message.push_str(&why.to_string());
        cause = why.source();
    }

    message
}
