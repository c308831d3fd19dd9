//! Date and time parsing for the raw exports.
//!
//! Exports carry day-first dates ("31-01-2024"), separate time-of-day strings
//! in 24h or 12h form, and a combined 12h registration timestamp.

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Day-first export date format.
pub const DMY_FORMAT: &str = "%d-%m-%Y";

/// Patient registration timestamp format ("31-01-2024 09:15:00 AM").
pub const REGISTRATION_TIMESTAMP_FORMAT: &str = "%d-%m-%Y %I:%M:%S %p";

const TIME_FORMATS: [&str; 4] = ["%H:%M:%S", "%H:%M", "%I:%M:%S %p", "%I:%M %p"];

const UNIX_EPOCH_DAYS_FROM_CE: i32 = 719_163;

pub fn parse_dmy(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DMY_FORMAT).ok()
}

/// Parses a time of day in any of the formats seen in the exports.
pub fn parse_time_of_day(raw: &str) -> Option<NaiveTime> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    TIME_FORMATS
        .iter()
        .find_map(|format| NaiveTime::parse_from_str(trimmed, format).ok())
}

pub fn parse_registration_timestamp(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(raw.trim(), REGISTRATION_TIMESTAMP_FORMAT).ok()
}

/// Accepts ISO dates (optionally with a time part) and day-first dates.
pub fn parse_flexible_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S") {
        return Some(dt.date());
    }
    parse_dmy(trimmed)
}

/// Label for the hour starting at `hour`: "09 - 10", "23 - 00".
pub fn hour_bucket(hour: u32) -> String {
    format!("{:02} - {:02}", hour % 24, (hour + 1) % 24)
}

pub fn hour_bucket_of(time: NaiveTime) -> String {
    hour_bucket(time.hour())
}

/// Days since 1970-01-01, the physical representation of a polars `Date`.
pub fn date_to_days(date: NaiveDate) -> i32 {
    date.num_days_from_ce() - UNIX_EPOCH_DAYS_FROM_CE
}

pub fn days_to_date(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_num_days_from_ce_opt(days.checked_add(UNIX_EPOCH_DAYS_FROM_CE)?)
}

/// Numeric `YYYYMMDD` key of a date.
pub fn date_id(date: NaiveDate) -> i64 {
    i64::from(date.year()) * 10_000 + i64::from(date.month()) * 100 + i64::from(date.day())
}
