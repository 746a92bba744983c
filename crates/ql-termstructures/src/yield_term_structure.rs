//! `YieldTermStructure`: yield / interest-rate term structures
//! (translates `ql/termstructures/yieldtermstructure.hpp`).
//!
//! This module defines the `YieldTermStructure` trait together with the three
//! fundamental quantities any yield curve must provide:
//!
//! * **discount factor**: `P(0,t)`
//! * **zero rate**: the continuously-compounded zero rate for maturity *t*
//! * **forward rate**: the continuously-compounded forward rate between two
//!   times

use crate::term_structure::TermStructure;
use ql_core::{DiscountFactor, Rate, Time};
use ql_time::{Date, DayCounter};
use std::sync::Arc;

/// Small time step used for instantaneous rates.
const DT: Time = 1.0e-4;

/// A yield (interest-rate) term structure.
///
/// Implementors provide [`discount_impl`](YieldTermStructure::discount_impl);
/// rates are derived from it.
///
/// Corresponds to `QuantLib::YieldTermStructure`.
pub trait YieldTermStructure: TermStructure {
    /// Return the discount factor for a given time `t`.
    fn discount_impl(&self, t: Time) -> DiscountFactor;

    /// Discount factor for a date.
    fn discount_date(&self, date: Date) -> DiscountFactor {
        self.discount_impl(self.time_from_reference(date))
    }

    /// Discount factor for a time.
    fn discount(&self, t: Time) -> DiscountFactor {
        self.discount_impl(t)
    }

    /// Continuously-compounded zero rate for time `t`.
    ///
    /// At `t = 0` the instantaneous short rate is returned.
    fn zero_rate(&self, t: Time) -> Rate {
        let t = if t == 0.0 { DT } else { t };
        -self.discount_impl(t).ln() / t
    }

    /// Continuously-compounded zero rate up to `date`.
    fn zero_rate_date(&self, date: Date) -> Rate {
        self.zero_rate(self.time_from_reference(date))
    }

    /// Continuously-compounded forward rate between `t1` and `t2`; the
    /// instantaneous forward when `t1 == t2`.
    fn forward_rate(&self, t1: Time, t2: Time) -> Rate {
        let (t1, t2) = if t2 == t1 {
            ((t1 - 0.5 * DT).max(0.0), t1 + 0.5 * DT)
        } else {
            (t1, t2)
        };
        (self.discount_impl(t1) / self.discount_impl(t2)).ln() / (t2 - t1)
    }
}

// ── Helpers for concrete term structures ──────────────────────────────────────

/// Common data shared by most yield-curve implementations.
#[derive(Debug, Clone)]
pub struct YieldTermStructureData {
    /// Reference date.
    pub reference_date: Date,
    /// Day counter for time calculations.
    pub day_counter: Arc<dyn DayCounter>,
}

impl YieldTermStructureData {
    /// Create a new data bundle.
    pub fn new(reference_date: Date, day_counter: impl DayCounter + 'static) -> Self {
        Self {
            reference_date,
            day_counter: Arc::new(day_counter),
        }
    }
}
