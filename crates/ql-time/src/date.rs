//! `Date` type and tenor arithmetic.
//!
//! The library works on plain calendar dates, so `Date` is
//! [`chrono::NaiveDate`].  Holidays and business-day rolling are out of
//! scope; tenors roll on calendar days only, with month-end clamping as
//! chrono performs it.

use chrono::{Days, Months, NaiveDate};
use ql_core::errors::{Error, Result};

/// A calendar date.
pub type Date = NaiveDate;

/// A length of time expressed in a single unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tenor {
    /// A number of calendar days.
    Days(u32),
    /// A number of weeks.
    Weeks(u32),
    /// A number of months.
    Months(u32),
    /// A number of years.
    Years(u32),
}

/// Date arithmetic used when building instruments.
pub trait DateExt: Sized {
    /// Build a date from year, month and day, failing on invalid input.
    fn try_ymd(year: i32, month: u32, day: u32) -> Result<Self>;

    /// Advance by a tenor.
    fn advance(self, tenor: Tenor) -> Result<Self>;

    /// Number of calendar days from `self` to `other`.
    fn days_until(self, other: Self) -> i64;
}

impl DateExt for NaiveDate {
    fn try_ymd(year: i32, month: u32, day: u32) -> Result<Self> {
        NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| Error::InvalidArgument(format!("invalid date {year}-{month}-{day}")))
    }

    fn advance(self, tenor: Tenor) -> Result<Self> {
        let advanced = match tenor {
            Tenor::Days(n) => self.checked_add_days(Days::new(u64::from(n))),
            Tenor::Weeks(n) => self.checked_add_days(Days::new(7 * u64::from(n))),
            Tenor::Months(n) => self.checked_add_months(Months::new(n)),
            Tenor::Years(n) => n
                .checked_mul(12)
                .and_then(|m| self.checked_add_months(Months::new(m))),
        };
        advanced.ok_or_else(|| Error::InvalidArgument(format!("cannot advance {self} by {tenor:?}")))
    }

    fn days_until(self, other: Self) -> i64 {
        other.signed_duration_since(self).num_days()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_ymd_rejects_invalid_dates() {
        assert!(Date::try_ymd(2025, 2, 29).is_err());
        assert!(Date::try_ymd(2024, 2, 29).is_ok());
    }

    #[test]
    fn advance_clamps_to_month_end() {
        let d = Date::try_ymd(2025, 1, 31).unwrap();
        assert_eq!(d.advance(Tenor::Months(1)).unwrap(), Date::try_ymd(2025, 2, 28).unwrap());
        assert_eq!(d.advance(Tenor::Years(1)).unwrap(), Date::try_ymd(2026, 1, 31).unwrap());
        assert_eq!(d.advance(Tenor::Weeks(2)).unwrap(), Date::try_ymd(2025, 2, 14).unwrap());
    }

    #[test]
    fn days_until_is_signed() {
        let a = Date::try_ymd(2025, 1, 1).unwrap();
        let b = Date::try_ymd(2025, 3, 1).unwrap();
        assert_eq!(a.days_until(b), 59);
        assert_eq!(b.days_until(a), -59);
    }
}
