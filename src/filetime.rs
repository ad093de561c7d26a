//! Conversion of AD timestamps (`pwdLastSet`, `accountExpires`, ...).
//!
//! AD stores these as FILETIME: 100-nanosecond intervals since 1601-01-01 UTC.

use chrono::{DateTime, Utc};

/// Seconds between 1601-01-01 and 1970-01-01.
const EPOCH_OFFSET: i64 = 11_644_473_600;
const TICKS_PER_SECOND: i64 = 10_000_000;

/// Convert a FILETIME value into a UTC date.
///
/// `0` and `i64::MAX` mean "never" in AD and yield `None`.
pub fn filetime_to_datetime(ticks: i64) -> Option<DateTime<Utc>> {
    if ticks <= 0 || ticks == i64::MAX {
        return None;
    }

    let secs = ticks / TICKS_PER_SECOND - EPOCH_OFFSET;
    let nanos = (ticks % TICKS_PER_SECOND) * 100;
    DateTime::from_timestamp(secs, nanos as u32)
}

/// Convert a UTC date into a FILETIME value.
///
/// Returns `None` when the date is outside the range FILETIME can hold.
pub fn datetime_to_filetime(date: DateTime<Utc>) -> Option<i64> {
    date.timestamp()
        .checked_add(EPOCH_OFFSET)?
        .checked_mul(TICKS_PER_SECOND)?
        .checked_add(i64::from(date.timestamp_subsec_nanos() / 100))
}

/// Parse an attribute value such as `pwdLastSet`.
pub fn parse_filetime(value: &str) -> Option<DateTime<Utc>> {
    filetime_to_datetime(value.trim().parse().ok()?)
}
