//! `Schedule`: a sequence of dates (a small subset of
//! `ql/time/schedule.hpp`).
//!
//! Only unadjusted forward generation is supported: dates are rolled from
//! the start date by a fixed tenor, the last period being shortened so the
//! schedule ends exactly on the termination date.

use crate::date::{Date, DateExt, Tenor};
use ql_core::errors::Result;

/// An ordered sequence of coupon/payment dates.
///
/// Corresponds to `QuantLib::Schedule`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schedule {
    dates: Vec<Date>,
}

impl Schedule {
    /// Build a schedule from explicit, strictly increasing dates.
    pub fn from_dates(dates: Vec<Date>) -> Result<Self> {
        ql_core::ensure!(dates.len() >= 2, "a schedule needs at least two dates");
        ql_core::ensure!(
            dates.windows(2).all(|w| w[0] < w[1]),
            "schedule dates must be strictly increasing"
        );
        Ok(Self { dates })
    }

    /// Generate dates forward from `start` every `tenor` until `end`.
    pub fn forward(start: Date, end: Date, tenor: Tenor) -> Result<Self> {
        ql_core::ensure!(start < end, "start date {start} must precede end date {end}");
        let mut dates = vec![start];
        let mut periods = 1u32;
        loop {
            let next = start.advance(scale(tenor, periods))?;
            if next >= end {
                break;
            }
            dates.push(next);
            periods += 1;
        }
        dates.push(end);
        Ok(Self { dates })
    }

    /// Return all dates in the schedule.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// First date.
    pub fn start_date(&self) -> Date {
        self.dates[0]
    }

    /// Last date.
    pub fn end_date(&self) -> Date {
        self.dates[self.dates.len() - 1]
    }

    /// Number of dates.
    pub fn size(&self) -> usize {
        self.dates.len()
    }
}

// Rolling from the start date avoids accumulating month-end clamping.
fn scale(tenor: Tenor, n: u32) -> Tenor {
    match tenor {
        Tenor::Days(d) => Tenor::Days(d * n),
        Tenor::Weeks(w) => Tenor::Weeks(w * n),
        Tenor::Months(m) => Tenor::Months(m * n),
        Tenor::Years(y) => Tenor::Years(y * n),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> Date {
        Date::try_ymd(y, m, d).unwrap()
    }

    #[test]
    fn forward_annual_schedule() {
        let s = Schedule::forward(date(2025, 1, 2), date(2030, 1, 2), Tenor::Years(1)).unwrap();
        assert_eq!(s.size(), 6);
        assert_eq!(s.dates()[3], date(2028, 1, 2));
        assert_eq!(s.end_date(), date(2030, 1, 2));
    }

    #[test]
    fn forward_schedule_with_short_stub() {
        let s = Schedule::forward(date(2025, 1, 31), date(2025, 8, 15), Tenor::Months(3)).unwrap();
        assert_eq!(
            s.dates(),
            &[date(2025, 1, 31), date(2025, 4, 30), date(2025, 7, 31), date(2025, 8, 15)]
        );
    }

    #[test]
    fn explicit_dates_must_increase() {
        assert!(Schedule::from_dates(vec![date(2025, 1, 2), date(2025, 1, 2)]).is_err());
        assert!(Schedule::from_dates(vec![date(2025, 1, 2)]).is_err());
    }
}
