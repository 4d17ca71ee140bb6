//! Weekly rotation pickers.
//!
//! On-call guard and dependency duty rotate deterministically on the ISO
//! week number, so every run within a week agrees on the same person
//! without any stored state.

use chrono::{Datelike, NaiveDate};

/// Pick this week's person from a roster.
///
/// Stable for every day of one ISO week; advances by one roster position
/// the next week.
pub fn weekly_pick<'a>(date: NaiveDate, roster: &[&'a str]) -> &'a str {
    let week = date.iso_week().week() as usize;
    roster[(week + 1) % roster.len()]
}

/// Pick a person on odd ISO weeks only.
///
/// Even weeks are off-duty (`None`); odd weeks walk the roster one
/// position per duty-week, so a two-person roster alternates on weeks
/// 1, 3, 5, ...
pub fn odd_week_pick<'a>(date: NaiveDate, roster: &[&'a str]) -> Option<&'a str> {
    let week = date.iso_week().week() as usize;
    if week % 2 == 0 {
        return None;
    }

    Some(roster[((week - 1) / 2) % roster.len()])
}
