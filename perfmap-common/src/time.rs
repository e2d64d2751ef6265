//! Timestamp and calendar date utilities

use chrono::{DateTime, NaiveDate, Utc};

/// Get current UTC timestamp
pub fn now() -> DateTime<Utc> {
    Utc::now()
}

/// Milliseconds since the Unix epoch, used for generated upload names
pub fn epoch_millis() -> i64 {
    Utc::now().timestamp_millis()
}

/// Parse a calendar date as submitted by a form.
///
/// Accepts `YYYY-MM-DD` and full RFC 3339 timestamps (the date part is kept).
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok().or_else(|| {
        DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(|dt| dt.date_naive())
    })
}

/// Format a timestamp as `YYYY-MM-DD`
pub fn format_day(ts: &DateTime<Utc>) -> String {
    ts.format("%Y-%m-%d").to_string()
}
