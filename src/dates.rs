//! Calendar-date helpers for the register workflow.
//!
//! "Today" is always the **local** civil date. Near local midnight a
//! UTC-based conversion lands on the wrong day, which is exactly when a
//! register tends to get closed, so nothing in here goes through UTC.
//!
//! Dates travel as zero-padded `YYYY-MM-DD` strings end to end (that is
//! what the backend speaks), which also makes plain lexicographic
//! comparison a correct date comparison.

use chrono::{Local, NaiveDate};

/// Wire format for calendar dates.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in the client's local time zone, as `YYYY-MM-DD`.
pub fn today_local() -> String {
    Local::now().format(DATE_FORMAT).to_string()
}

/// True iff `date` is today's local date.
pub fn is_today(date: &str) -> bool {
    date == today_local()
}

/// True iff `date` is strictly after today. Lexicographic comparison is
/// safe because both sides are zero-padded `YYYY-MM-DD`.
pub fn is_future(date: &str) -> bool {
    date > today_local().as_str()
}

/// Parse and validate a `YYYY-MM-DD` string. `None` on anything that is
/// not a real calendar date in the wire format.
pub fn parse_date(date: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(date, DATE_FORMAT).ok()
}

/// Render a wire date as `DD/MM/YYYY` for display labels.
pub fn display_date(date: &str) -> String {
    let mut parts: Vec<&str> = date.split('-').collect();
    parts.reverse();
    parts.join("/")
}

/// The date under operation: the explicitly selected one, or today.
pub fn or_today(date: Option<&str>) -> String {
    match date {
        Some(d) if !d.trim().is_empty() => d.trim().to_string(),
        _ => today_local(),
    }
}
