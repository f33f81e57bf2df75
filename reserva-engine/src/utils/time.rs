//! Time utilities - business-timezone conversions
//!
//! All date/time → timestamp conversions happen at the service boundary;
//! occupancy records and events carry `i64` Unix millis internally.

use chrono::{DateTime, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;

use super::{EngineError, EngineResult};

/// Parse a strict ISO date string (`YYYY-MM-DD`).
///
/// Stricter than chrono's `%Y-%m-%d`, which also accepts `2024-1-5`:
/// loosely structured callers get a typed rejection instead of a silent
/// reinterpretation.
pub fn parse_iso_date(date: &str) -> EngineResult<NaiveDate> {
    if !is_iso_date_shaped(date) {
        return Err(EngineError::InvalidDateExpression(date.to_string()));
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| EngineError::InvalidDateExpression(date.to_string()))
}

/// `true` when the string is exactly `DDDD-DD-DD` shaped.
pub fn is_iso_date_shaped(s: &str) -> bool {
    let b = s.as_bytes();
    b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b.iter()
            .enumerate()
            .all(|(i, c)| matches!(i, 4 | 7) || c.is_ascii_digit())
}

/// Parse a wall-clock time in `H:MM` or `HH:MM` form, 24-hour range.
///
/// Seconds, 12-hour suffixes and out-of-range values are all rejected with
/// `InvalidTimeFormat`.
pub fn parse_time_hm(time: &str) -> EngineResult<NaiveTime> {
    let invalid = || EngineError::InvalidTimeFormat(time.to_string());

    let (h, m) = time.split_once(':').ok_or_else(invalid)?;
    if !(1..=2).contains(&h.len()) || m.len() != 2 {
        return Err(invalid());
    }
    if !h.bytes().all(|c| c.is_ascii_digit()) || !m.bytes().all(|c| c.is_ascii_digit()) {
        return Err(invalid());
    }

    let hour: u32 = h.parse().map_err(|_| invalid())?;
    let minute: u32 = m.parse().map_err(|_| invalid())?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(invalid)
}

/// Current instant in the given business timezone.
pub fn now_in_tz(tz: Tz) -> DateTime<Tz> {
    chrono::Utc::now().with_timezone(&tz)
}

/// Current calendar date in the given business timezone.
pub fn today_in_tz(tz: Tz) -> NaiveDate {
    now_in_tz(tz).date_naive()
}

/// Minutes since midnight for interval arithmetic.
pub fn minutes_since_midnight(t: NaiveTime) -> i64 {
    (t.hour() * 60 + t.minute()) as i64
}

/// Format a Unix-millis timestamp as wall-clock `HH:MM` in the business
/// timezone. Used for staff-facing conflict details.
pub fn millis_to_hhmm(millis: i64, tz: Tz) -> String {
    DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.with_timezone(&tz).format("%H:%M").to_string())
        .unwrap_or_else(|| "??:??".to_string())
}
