//! Credit-default-swap helpers for default-curve bootstrapping
//! (translates `ql/termstructures/credit/defaultprobabilityhelpers.hpp`).

use std::sync::Arc;

use ql_core::{errors::Result, Real};
use ql_quotes::Quote;
use ql_time::{Date, DateExt, DayCounter, Schedule, Tenor};

use crate::bootstrap::{BootstrapCurve, BootstrapHelper};
use crate::yield_term_structure::YieldTermStructure;

/// A CDS quoted by its running spread.
///
/// The implied quote is the fair spread `protection / risky annuity`:
///
/// * protection leg `(1 - R) Σ P(tᵢ) (S(tᵢ₋₁) - S(tᵢ))`;
/// * risky annuity `Σ τᵢ P(tᵢ) (S(tᵢ) + ½ (S(tᵢ₋₁) - S(tᵢ)))`, the second
///   term paying half a period of accrual on default.
///
/// Discounting is at period ends, read from an external yield curve.
///
/// Corresponds to `QuantLib::SpreadCdsHelper` priced by a mid-point engine.
#[derive(Debug)]
pub struct SpreadCdsHelper {
    quote: Arc<dyn Quote>,
    schedule: Schedule,
    day_counter: Box<dyn DayCounter>,
    recovery_rate: Real,
    discount_curve: Arc<dyn YieldTermStructure>,
}

impl SpreadCdsHelper {
    /// CDS protecting from `start` for `tenor`, paying premium every
    /// `frequency`.
    ///
    /// # Errors
    /// A recovery rate outside `[0, 1)` or an empty schedule.
    pub fn new(
        quote: Arc<dyn Quote>,
        start: Date,
        tenor: Tenor,
        frequency: Tenor,
        day_counter: impl DayCounter + 'static,
        recovery_rate: Real,
        discount_curve: Arc<dyn YieldTermStructure>,
    ) -> Result<Self> {
        ql_core::ensure!(
            (0.0..1.0).contains(&recovery_rate),
            "recovery rate ({recovery_rate}) must be in [0, 1)"
        );
        let maturity = start.advance(tenor)?;
        let schedule = Schedule::forward(start, maturity, frequency)?;
        Ok(Self {
            quote,
            schedule,
            day_counter: Box::new(day_counter),
            recovery_rate,
            discount_curve,
        })
    }

    /// Premium payment schedule.
    pub fn schedule(&self) -> &Schedule {
        &self.schedule
    }

    /// Assumed recovery rate.
    pub fn recovery_rate(&self) -> Real {
        self.recovery_rate
    }

    /// Protection and risky-annuity legs per unit notional.
    fn legs(&self, curve: &BootstrapCurve<'_>) -> (Real, Real) {
        let mut protection = 0.0;
        let mut annuity = 0.0;
        for w in self.schedule.dates().windows(2) {
            let s0 = curve.survival_probability_date(w[0]);
            let s1 = curve.survival_probability_date(w[1]);
            let df = self.discount_curve.discount_date(w[1]);
            let tau = self.day_counter.year_fraction(w[0], w[1]);
            protection += df * (s0 - s1);
            annuity += tau * df * (s1 + 0.5 * (s0 - s1));
        }
        ((1.0 - self.recovery_rate) * protection, annuity)
    }
}

impl BootstrapHelper for SpreadCdsHelper {
    fn pillar_date(&self) -> Date {
        self.schedule.end_date()
    }

    fn latest_relevant_date(&self) -> Date {
        self.schedule.end_date()
    }

    fn quote(&self) -> Option<Real> {
        self.quote.value()
    }

    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Real {
        let (protection, annuity) = self.legs(curve);
        protection / annuity
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{CurveState, HazardRate};
    use crate::flat_forward::FlatForward;
    use approx::assert_abs_diff_eq;
    use ql_math::Linear;
    use ql_quotes::SimpleQuote;
    use ql_time::{Actual360, Actual365Fixed};

    #[test]
    fn fair_spread_is_close_to_loss_times_hazard() {
        let today = Date::try_ymd(2025, 1, 2).unwrap();
        let mut state = CurveState::new(today, Arc::new(Actual365Fixed), Arc::new(Linear));
        state.set_nodes(vec![today, today.advance(Tenor::Years(10)).unwrap()]);
        state.reset_data(0.02);
        state.extend_interpolation(1).unwrap();
        let curve = BootstrapCurve::new(&state, &HazardRate);

        let discount = Arc::new(FlatForward::new(today, 0.03, Actual365Fixed));
        let helper = SpreadCdsHelper::new(
            SimpleQuote::shared(0.012),
            today,
            Tenor::Years(5),
            Tenor::Months(3),
            Actual360,
            0.4,
            discount,
        )
        .unwrap();

        assert_eq!(helper.schedule().size(), 21);
        assert_eq!(helper.pillar_date(), Date::try_ymd(2030, 1, 2).unwrap());
        // Credit triangle, up to day-count and discretisation effects.
        assert_abs_diff_eq!(helper.implied_quote(&curve), 0.6 * 0.02, epsilon = 5e-4);
    }

    #[test]
    fn recovery_must_leave_a_loss() {
        let today = Date::try_ymd(2025, 1, 2).unwrap();
        let discount = Arc::new(FlatForward::new(today, 0.03, Actual365Fixed));
        let res = SpreadCdsHelper::new(
            SimpleQuote::shared(0.01),
            today,
            Tenor::Years(5),
            Tenor::Months(3),
            Actual360,
            1.0,
            discount,
        );
        assert!(res.is_err());
    }
}
