//! Timestamp wire format.
//!
//! Datetimes are stored as ISO-8601 text with millisecond precision and an
//! explicit UTC offset, e.g. `2016-06-02T10:28:06.708+01:00`. An offset of
//! exactly zero is written as `Z`.

use chrono::{DateTime, FixedOffset, Local, NaiveDate, SubsecRound};

const LOCAL_PART_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3f";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Current local time, truncated to milliseconds.
pub fn now() -> DateTime<FixedOffset> {
    DateTime::<FixedOffset>::from(Local::now()).trunc_subsecs(3)
}

/// Formats a datetime in the storage format.
pub fn to_iso_ms(dt: &DateTime<FixedOffset>) -> String {
    let local = dt.format(LOCAL_PART_FORMAT);
    let offset_s = dt.offset().local_minus_utc();
    if offset_s == 0 {
        return format!("{}Z", local);
    }
    let sign = if offset_s < 0 { '-' } else { '+' };
    let abs = offset_s.abs();
    format!("{}{}{:02}:{:02}", local, sign, abs / 3600, (abs % 3600) / 60)
}

/// Parses a stored datetime. Empty or malformed text yields `None`.
pub fn from_iso(text: &str) -> Option<DateTime<FixedOffset>> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    DateTime::parse_from_rfc3339(text)
        .or_else(|_| DateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f%:z"))
        .ok()
}

/// Formats a date in the storage format.
pub fn to_iso_date(date: &NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Parses a stored date, accepting a full datetime as well.
pub fn from_iso_date(text: &str) -> Option<NaiveDate> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    NaiveDate::parse_from_str(text, DATE_FORMAT)
        .ok()
        .or_else(|| from_iso(text).map(|dt| dt.date_naive()))
}
