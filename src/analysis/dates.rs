//! Event date parsing.
//!
//! Spreadsheet exports carry dates in whatever shape the sheet owner typed
//! them. Values that match none of the accepted layouts yield `None` and the
//! row is dropped by the date filter.

use chrono::{DateTime, NaiveDate, NaiveDateTime};

const ISO_DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d"];
const DAY_FIRST_FORMATS: &[&str] = &["%d/%m/%Y", "%d-%m-%Y", "%m/%d/%Y"];
const MONTH_FIRST_FORMATS: &[&str] = &["%m/%d/%Y", "%d/%m/%Y", "%d-%m-%Y"];
const TIME_SUFFIXES: &[&str] = &[
    " %H:%M:%S",
    " %H:%M:%S%.f",
    " %H:%M",
    "T%H:%M:%S",
    "T%H:%M:%S%.f",
    "T%H:%M",
];

/// Parse a cell into a calendar date.
///
/// Accepts ISO dates, slash/dash dates (ambiguous ones resolved by
/// `day_first`), any of those followed by a time of day, and RFC 3339
/// timestamps. The time of day is discarded.
pub fn parse_event_date(raw: &str, day_first: bool) -> Option<NaiveDate> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.date_naive());
    }

    let regional = if day_first {
        DAY_FIRST_FORMATS
    } else {
        MONTH_FIRST_FORMATS
    };

    for fmt in ISO_DATE_FORMATS.iter().chain(regional) {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
        for suffix in TIME_SUFFIXES {
            let with_time = format!("{}{}", fmt, suffix);
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, &with_time) {
                return Some(dt.date());
            }
        }
    }

    None
}
