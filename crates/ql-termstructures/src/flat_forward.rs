//! `FlatForward`: a yield term structure with a constant forward rate
//! (translates `ql/termstructures/yield/flatforward.hpp`).
//!
//! Used as the risk-free discounting curve under credit bootstraps.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::{YieldTermStructure, YieldTermStructureData};
use ql_core::{DiscountFactor, Rate, Time};
use ql_time::{Date, DayCounter};

/// A flat (constant) continuously-compounded yield curve.
///
/// `P(t) = exp(-r * t)`.
///
/// Corresponds to `QuantLib::FlatForward`.
#[derive(Debug, Clone)]
pub struct FlatForward {
    data: YieldTermStructureData,
    rate: Rate,
}

impl FlatForward {
    /// Create a flat-forward curve from a continuously-compounded rate.
    pub fn new(reference_date: Date, rate: Rate, day_counter: impl DayCounter + 'static) -> Self {
        Self {
            data: YieldTermStructureData::new(reference_date, day_counter),
            rate,
        }
    }

    /// The continuously-compounded flat rate.
    pub fn rate(&self) -> Rate {
        self.rate
    }
}

impl TermStructure for FlatForward {
    fn reference_date(&self) -> Date {
        self.data.reference_date
    }

    fn day_counter(&self) -> &dyn DayCounter {
        &*self.data.day_counter
    }

    fn max_date(&self) -> Date {
        Date::MAX
    }
}

impl YieldTermStructure for FlatForward {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        (-self.rate * t).exp()
    }

    fn zero_rate(&self, _t: Time) -> Rate {
        self.rate
    }

    fn forward_rate(&self, _t1: Time, _t2: Time) -> Rate {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_time::{Actual365Fixed, DateExt};

    #[test]
    fn flat_forward_discount() {
        let ref_date = Date::try_ymd(2025, 1, 2).unwrap();
        let curve = FlatForward::new(ref_date, 0.05, Actual365Fixed);

        assert_abs_diff_eq!(curve.discount(0.0), 1.0, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.discount(1.0), (-0.05_f64).exp(), epsilon = 1e-12);
        assert_abs_diff_eq!(curve.discount(10.0), (-0.5_f64).exp(), epsilon = 1e-12);
    }

    #[test]
    fn flat_forward_rates() {
        let ref_date = Date::try_ymd(2025, 1, 2).unwrap();
        let curve = FlatForward::new(ref_date, 0.03, Actual365Fixed);

        assert_abs_diff_eq!(curve.zero_rate(0.5), 0.03, epsilon = 1e-13);
        assert_eq!(curve.zero_rate(0.0), 0.03);
        let one_year = Date::try_ymd(2026, 1, 2).unwrap();
        assert_eq!(curve.zero_rate_date(one_year), 0.03);
        assert_abs_diff_eq!(curve.forward_rate(1.0, 3.0), 0.03, epsilon = 1e-13);
        assert_eq!(curve.forward_rate(2.0, 2.0), 0.03);
    }

    #[test]
    fn flat_forward_discount_date() {
        let ref_date = Date::try_ymd(2025, 1, 2).unwrap();
        let curve = FlatForward::new(ref_date, 0.05, Actual365Fixed);

        assert_abs_diff_eq!(curve.discount_date(ref_date), 1.0, epsilon = 1e-15);
        let d1 = Date::try_ymd(2026, 1, 2).unwrap();
        let t = curve.time_from_reference(d1);
        assert_abs_diff_eq!(curve.discount_date(d1), (-0.05 * t).exp(), epsilon = 1e-12);
    }
}
