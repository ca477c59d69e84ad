// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{DateTime, NaiveDate, NaiveTime, SecondsFormat, Utc, Weekday};

/// Weekdays in week-view order.
pub const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// Format a UTC timestamp as RFC3339 using a `Z` suffix.
pub fn format_utc_rfc3339(date: DateTime<Utc>) -> String {
    date.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Display name of a weekday.
pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Truncate `HH:MM[:SS]` to `HH:MM`.
///
/// Inputs without a seconds component are returned unchanged.
pub fn strip_seconds(time: &str) -> String {
    time.split(':').take(2).collect::<Vec<_>>().join(":")
}

/// Parse a strict `HH:MM` clock time.
pub fn parse_hh_mm(time: &str) -> Option<NaiveTime> {
    if time.len() != 5 {
        return None;
    }
    NaiveTime::parse_from_str(time, "%H:%M").ok()
}

/// Parse a strict ISO `YYYY-MM-DD` calendar date (zero-padded fields).
pub fn parse_iso_date(date: &str) -> Option<NaiveDate> {
    let bytes = date.as_bytes();
    let shaped = bytes.len() == 10
        && bytes.iter().enumerate().all(|(i, b)| match i {
            4 | 7 => *b == b'-',
            _ => b.is_ascii_digit(),
        });
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}

/// Calendar date of an ISO date-time, as written.
///
/// Accepts RFC3339 (the date in the given offset), naive date-times, and
/// anything starting with a `YYYY-MM-DD` prefix.
pub fn truncate_to_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    value.get(..10).and_then(parse_iso_date)
}
