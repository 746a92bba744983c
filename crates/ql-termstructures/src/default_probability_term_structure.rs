//! `DefaultProbabilityTermStructure`: credit / default-probability term
//! structures (translates `ql/termstructures/defaulttermstructure.hpp`).
//!
//! Provides the `DefaultProbabilityTermStructure` trait plus
//! `FlatHazardRate`, a constant hazard-rate curve.

use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructureData;
use ql_core::{Probability, Rate, Real, Time};
use ql_time::{Date, DayCounter};

/// A default-probability term structure.
///
/// Implementors provide
/// [`survival_probability_impl`](DefaultProbabilityTermStructure::survival_probability_impl);
/// the other quantities are derived from it.
///
/// Corresponds to `QuantLib::DefaultProbabilityTermStructure`.
pub trait DefaultProbabilityTermStructure: TermStructure {
    /// Survival probability `S(t) = P(τ > t)`.
    fn survival_probability_impl(&self, t: Time) -> Probability;

    /// Hazard rate `h(t) = -d ln S(t) / dt`, by central difference.
    fn hazard_rate_impl(&self, t: Time) -> Rate {
        let dt = 1.0e-4_f64;
        let t1 = (t - dt / 2.0).max(0.0);
        let t2 = t1 + dt;
        let s1 = self.survival_probability_impl(t1);
        let s2 = self.survival_probability_impl(t2);
        if s2 <= 0.0 {
            return 0.0;
        }
        (s1.ln() - s2.ln()) / (t2 - t1)
    }

    // ── Public interface ─────────────────────────────────────────────────

    /// Survival probability for a date.
    fn survival_probability(&self, date: Date) -> Probability {
        self.survival_probability_impl(self.time_from_reference(date))
    }

    /// Survival probability for a time.
    fn survival_probability_time(&self, t: Time) -> Probability {
        self.survival_probability_impl(t)
    }

    /// Default probability `1 − S(t)` for a date.
    fn default_probability(&self, date: Date) -> Probability {
        1.0 - self.survival_probability(date)
    }

    /// Hazard rate for a date.
    fn hazard_rate(&self, date: Date) -> Rate {
        self.hazard_rate_impl(self.time_from_reference(date))
    }

    /// Default density `f(t) = h(t) · S(t)`.
    fn default_density(&self, t: Time) -> Real {
        self.hazard_rate_impl(t) * self.survival_probability_impl(t)
    }
}

// ── FlatHazardRate ────────────────────────────────────────────────────────────

/// A constant hazard-rate default-probability term structure.
///
/// `S(t) = exp(-h·t)`.
///
/// Corresponds to `QuantLib::FlatHazardRate`.
#[derive(Debug, Clone)]
pub struct FlatHazardRate {
    data: YieldTermStructureData,
    hazard_rate: Rate,
}

impl FlatHazardRate {
    /// Create a flat hazard-rate curve.
    pub fn new(
        reference_date: Date,
        hazard_rate: Rate,
        day_counter: impl DayCounter + 'static,
    ) -> Self {
        Self {
            data: YieldTermStructureData::new(reference_date, day_counter),
            hazard_rate,
        }
    }
}

impl TermStructure for FlatHazardRate {
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

impl DefaultProbabilityTermStructure for FlatHazardRate {
    fn survival_probability_impl(&self, t: Time) -> Probability {
        (-self.hazard_rate * t.max(0.0)).exp()
    }

    fn hazard_rate_impl(&self, _t: Time) -> Rate {
        self.hazard_rate
    }
}
