// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Shared helpers for date/time formatting.

use chrono::{Local, NaiveDate, NaiveDateTime};

/// Calendar date format used by every stored date field.
pub const DATE_FORMAT: &str = "%Y-%m-%d";
/// Time-of-day format stamped on completed dose activities.
pub const TIME_FORMAT: &str = "%H:%M:%S";

/// Current wall-clock time in the server's local time zone.
///
/// Completion stamps use the local calendar date so a record finished late
/// in the evening is not dated tomorrow.
pub fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// Parse a `YYYY-MM-DD` date, ignoring surrounding whitespace.
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), DATE_FORMAT).ok()
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn format_time(now: NaiveDateTime) -> String {
    now.format(TIME_FORMAT).to_string()
}
