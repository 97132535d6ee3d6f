//! Gregorian calendar classification.
//!
//! Grounded on `examples/original_source/functions/greedy_solver.py`'s
//! `_get_gun_tipi` and `ortools_solver.py`'s `GUN_TIPLERI`/`kapasite_hesapla`:
//! every day of the scheduled month is classified into exactly one of five
//! day-types, with holidays overriding the weekday-derived default.

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// One of the five duty-roster day categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayType {
    /// Monday–Wednesday (plain weekday)
    Hici,
    /// Thursday
    Prs,
    /// Friday
    Cum,
    /// Saturday
    Cmt,
    /// Sunday
    Pzr,
}

impl DayType {
    pub const ALL: [DayType; 5] = [
        DayType::Hici,
        DayType::Prs,
        DayType::Cum,
        DayType::Cmt,
        DayType::Pzr,
    ];

    /// Default hour weight for a day-type (§4.2 defaults).
    pub fn default_hours(self) -> u32 {
        match self {
            DayType::Hici => 8,
            DayType::Prs => 8,
            DayType::Cum => 16,
            DayType::Cmt => 24,
            DayType::Pzr => 16,
        }
    }

    /// Greedy day-ordering weight (§4.5).
    pub fn ordering_weight(self) -> i64 {
        match self {
            DayType::Cmt => 500,
            DayType::Pzr => 400,
            DayType::Cum => 400,
            DayType::Prs => 200,
            DayType::Hici => 200,
        }
    }

    /// True for Friday/Saturday/Sunday, used by the weekend-balance term.
    pub fn is_weekend(self) -> bool {
        matches!(self, DayType::Cum | DayType::Cmt | DayType::Pzr)
    }
}

impl fmt::Display for DayType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DayType::Hici => "hici",
            DayType::Prs => "prs",
            DayType::Cum => "cum",
            DayType::Cmt => "cmt",
            DayType::Pzr => "pzr",
        };
        write!(f, "{s}")
    }
}

/// A declared holiday for a given day-of-month, overriding the weekday
/// default with one of the four non-weekday types.
#[derive(Debug, Clone, Copy)]
pub struct Holiday {
    pub day: u32,
    pub day_type: DayType,
}

/// Returns the number of days in `year`-`month` (Gregorian, 1-based month).
pub fn day_count(year: i32, month: u32) -> u32 {
    let (next_year, next_month) = if month == 12 {
        (year + 1, 1)
    } else {
        (year, month + 1)
    };
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .expect("valid next-month boundary");
    let first_of_this =
        NaiveDate::from_ymd_opt(year, month, 1).expect("valid year/month");
    (first_of_next - first_of_this).num_days() as u32
}

/// Classifies `day` (1-based, within `year`-`month`) into its day-type.
/// A holiday entry for that day wins over the weekday-derived default.
pub fn day_type(year: i32, month: u32, day: u32, holidays: &[Holiday]) -> DayType {
    if let Some(h) = holidays.iter().find(|h| h.day == day) {
        return h.day_type;
    }
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("day within month range");
    match date.weekday() {
        Weekday::Mon | Weekday::Tue | Weekday::Wed => DayType::Hici,
        Weekday::Thu => DayType::Prs,
        Weekday::Fri => DayType::Cum,
        Weekday::Sat => DayType::Cmt,
        Weekday::Sun => DayType::Pzr,
    }
}

/// Builds the full day→type map for a month, as used throughout the solver.
pub fn build_day_types(year: i32, month: u32, holidays: &[Holiday]) -> HashMap<u32, DayType> {
    let days = day_count(year, month);
    (1..=days)
        .map(|d| (d, day_type(year, month, d, holidays)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn day_count_handles_december_rollover() {
        assert_eq!(day_count(2026, 12), 31);
        assert_eq!(day_count(2024, 2), 29); // leap year
        assert_eq!(day_count(2025, 2), 28);
    }

    #[test]
    fn weekday_classification_matches_known_calendar() {
        // 2026-07-27 is a Monday.
        assert_eq!(day_type(2026, 7, 27, &[]), DayType::Hici);
        assert_eq!(day_type(2026, 7, 30, &[]), DayType::Prs); // Thursday
        assert_eq!(day_type(2026, 7, 31, &[]), DayType::Cum); // Friday
        assert_eq!(day_type(2026, 8, 1, &[]), DayType::Cmt); // Saturday
        assert_eq!(day_type(2026, 8, 2, &[]), DayType::Pzr); // Sunday
    }

    #[test]
    fn holiday_overrides_weekday() {
        let holidays = [Holiday {
            day: 27,
            day_type: DayType::Pzr,
        }];
        assert_eq!(day_type(2026, 7, 27, &holidays), DayType::Pzr);
    }

    #[test]
    fn build_day_types_covers_whole_month() {
        let map = build_day_types(2026, 7, &[]);
        assert_eq!(map.len(), 31);
        assert!((1..=31).all(|d| map.contains_key(&d)));
    }
}
