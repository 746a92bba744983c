//! # ql-time
//!
//! Dates, day counters and simple coupon schedules.
//!
//! Dates are [`chrono::NaiveDate`] values; this crate adds the day-count
//! conventions and the small amount of date arithmetic the curve builders
//! need.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `Date` type and tenor arithmetic.
pub mod date;

/// `DayCounter` trait and built-in day-count conventions.
pub mod day_counter;

/// `Schedule`: an ordered sequence of dates.
pub mod schedule;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use date::{Date, DateExt, Tenor};
pub use day_counter::{Actual360, Actual365Fixed, DayCounter, Thirty360};
pub use schedule::Schedule;
