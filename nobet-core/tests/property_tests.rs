//! Property-based tests for the pure, request-independent building blocks:
//! identifier normalization and calendar classification.

use nobet_core::calendar::{build_day_types, day_count, day_type, DayType};
use nobet_core::identity::{normalize_id, RawId};
use proptest::prelude::*;

proptest! {
    /// `normalize_id` is total: every finite input produces some `i64`
    /// without panicking, and calling it twice on the same input agrees.
    #[test]
    fn normalize_id_is_deterministic_for_integers(n in any::<i64>()) {
        let a = normalize_id(RawId::Int(n));
        let b = normalize_id(RawId::Int(n));
        prop_assert_eq!(a, b);
        prop_assert_eq!(a, n);
    }

    #[test]
    fn normalize_id_is_deterministic_for_strings(s in "[a-zA-Z0-9 ]{0,32}") {
        let a = normalize_id(RawId::Str(&s));
        let b = normalize_id(RawId::Str(&s));
        prop_assert_eq!(a, b);
    }

    /// A numeric string always collapses onto its integer twin, regardless
    /// of magnitude or sign.
    #[test]
    fn numeric_strings_match_their_integer_twin(n in any::<i64>()) {
        let s = n.to_string();
        prop_assert_eq!(normalize_id(RawId::Str(&s)), normalize_id(RawId::Int(n)));
    }

    /// Integer-valued floats normalize identically to the equal integer.
    #[test]
    fn integer_valued_floats_match_integers(n in -1_000_000i64..1_000_000) {
        let f = n as f64;
        prop_assert_eq!(normalize_id(RawId::Float(f)), normalize_id(RawId::Int(n)));
    }

    /// Every day of a generated month is classified into exactly one of
    /// the five day-types, and holidays always win over the weekday
    /// default.
    #[test]
    fn every_day_gets_exactly_one_type(year in 2000i32..2100, month in 1u32..=12) {
        let map = build_day_types(year, month, &[]);
        let expected = day_count(year, month);
        prop_assert_eq!(map.len() as u32, expected);
        for d in 1..=expected {
            prop_assert!(map.contains_key(&d));
        }
    }

    #[test]
    fn holiday_override_always_wins(year in 2000i32..2100, month in 1u32..=12, offset in 0u32..28) {
        let days = day_count(year, month);
        let day = (offset % days) + 1;
        let holiday = nobet_core::calendar::Holiday { day, day_type: DayType::Pzr };
        prop_assert_eq!(day_type(year, month, day, &[holiday]), DayType::Pzr);
    }
}
