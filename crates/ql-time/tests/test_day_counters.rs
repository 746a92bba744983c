//! Day-count tests in the spirit of QuantLib `test-suite/daycounters.cpp`.

use approx::assert_abs_diff_eq;
use proptest::prelude::*;
use ql_time::{Actual360, Actual365Fixed, Date, DateExt, DayCounter, Tenor, Thirty360};

fn date(y: i32, m: u32, d: u32) -> Date {
    Date::try_ymd(y, m, d).unwrap()
}

#[test]
fn test_actual365_fixed_over_leap_year() {
    let dc = Actual365Fixed;
    let cases = [
        (date(2024, 1, 1), date(2025, 1, 1), 366.0 / 365.0),
        (date(2023, 3, 1), date(2024, 3, 1), 1.0 + 1.0 / 365.0),
        (date(2025, 1, 2), date(2025, 4, 2), 90.0 / 365.0),
    ];
    for (d1, d2, expected) in cases {
        assert_abs_diff_eq!(dc.year_fraction(d1, d2), expected, epsilon = 1e-12);
    }
}

#[test]
fn test_actual360_three_month_deposit() {
    let start = date(2025, 1, 2);
    let end = start.advance(Tenor::Months(3)).unwrap();
    assert_eq!(end, date(2025, 4, 2));
    assert_abs_diff_eq!(Actual360.year_fraction(start, end), 0.25, epsilon = 1e-12);
}

#[test]
fn test_thirty360_month_ends() {
    let dc = Thirty360;
    assert_abs_diff_eq!(dc.year_fraction(date(2025, 1, 31), date(2025, 7, 31)), 0.5, epsilon = 1e-12);
    assert_abs_diff_eq!(dc.year_fraction(date(2025, 1, 15), date(2026, 1, 15)), 1.0, epsilon = 1e-12);
}

proptest! {
    #[test]
    fn prop_actual_counters_are_antisymmetric(a in 0i64..20_000, b in 0i64..20_000) {
        let base = date(2000, 1, 1);
        let d1 = base + chrono::Days::new(a as u64);
        let d2 = base + chrono::Days::new(b as u64);
        prop_assert_eq!(Actual365Fixed.day_count(d1, d2), -Actual365Fixed.day_count(d2, d1));
        prop_assert!((Actual360.year_fraction(d1, d2) + Actual360.year_fraction(d2, d1)).abs() < 1e-12);
    }
}
