//! `PiecewiseDefaultCurve`: a default-probability curve bootstrapped from
//! credit instruments (translates
//! `ql/termstructures/credit/piecewisedefaultcurve.hpp`).

use std::sync::Arc;

use crate::bootstrap::{
    Bootstrap, BootstrapHelper, BootstrapReport, BootstrapResult, BootstrapTraits, Calibration,
    CurveState, IterativeBootstrap,
};
use crate::default_probability_term_structure::DefaultProbabilityTermStructure;
use crate::term_structure::TermStructure;
use ql_core::{Probability, Real, Time};
use ql_math::InterpolationBuilder;
use ql_time::{Date, DayCounter};

/// A default-probability curve whose nodes (survival probabilities or
/// hazard rates, per the [`BootstrapTraits`] strategy) are solved so that
/// every instrument reprices its quote.
///
/// Corresponds to `QuantLib::PiecewiseDefaultCurve<Traits, Interpolator, Bootstrap>`.
#[derive(Debug)]
pub struct PiecewiseDefaultCurve {
    calibration: Calibration,
}

impl PiecewiseDefaultCurve {
    /// Bootstrap with the iterative engine at default settings.
    ///
    /// # Errors
    /// Any [`BootstrapError`](crate::bootstrap::BootstrapError) raised by the
    /// calibration.
    pub fn new(
        reference_date: Date,
        helpers: Vec<Arc<dyn BootstrapHelper>>,
        day_counter: impl DayCounter + 'static,
        traits: impl BootstrapTraits + 'static,
        interpolator: impl InterpolationBuilder + 'static,
    ) -> BootstrapResult<Self> {
        Self::with_bootstrap(
            reference_date,
            helpers,
            day_counter,
            traits,
            interpolator,
            IterativeBootstrap::default(),
        )
    }

    /// Bootstrap with an explicit engine.
    ///
    /// # Errors
    /// Any [`BootstrapError`](crate::bootstrap::BootstrapError) raised by the
    /// calibration.
    pub fn with_bootstrap(
        reference_date: Date,
        helpers: Vec<Arc<dyn BootstrapHelper>>,
        day_counter: impl DayCounter + 'static,
        traits: impl BootstrapTraits + 'static,
        interpolator: impl InterpolationBuilder + 'static,
        bootstrap: impl Bootstrap + 'static,
    ) -> BootstrapResult<Self> {
        let state = CurveState::new(reference_date, Arc::new(day_counter), Arc::new(interpolator));
        let calibration =
            Calibration::new(state, Box::new(traits), helpers, Box::new(bootstrap))?;
        Ok(Self { calibration })
    }

    /// Node dates; the first one is the reference date.
    pub fn dates(&self) -> &[Date] {
        self.calibration.state().dates()
    }

    /// Node values.
    pub fn data(&self) -> &[Real] {
        self.calibration.state().data()
    }

    /// Calibrating instruments, in the order the engine sorted them.
    pub fn helpers(&self) -> &[Arc<dyn BootstrapHelper>] {
        self.calibration.helpers()
    }

    /// Market minus model for every instrument.
    pub fn quote_errors(&self) -> Vec<Real> {
        self.calibration.quote_errors()
    }

    /// Diagnostics of the last calibration.
    pub fn report(&self) -> &BootstrapReport {
        self.calibration.report()
    }

    /// Calibrate again after quotes changed.
    ///
    /// # Errors
    /// Any [`BootstrapError`](crate::bootstrap::BootstrapError).
    pub fn recalculate(&mut self) -> BootstrapResult<&BootstrapReport> {
        self.calibration.recalculate()
    }

    /// Move the reference date and calibrate again.
    ///
    /// # Errors
    /// Any [`BootstrapError`](crate::bootstrap::BootstrapError).
    pub fn set_reference_date(&mut self, date: Date) -> BootstrapResult<&BootstrapReport> {
        self.calibration.set_reference_date(date)
    }
}

impl TermStructure for PiecewiseDefaultCurve {
    fn reference_date(&self) -> Date {
        self.calibration.state().reference_date()
    }

    fn day_counter(&self) -> &dyn DayCounter {
        self.calibration.state().day_counter()
    }

    fn max_date(&self) -> Date {
        self.calibration.state().max_date()
    }
}

impl DefaultProbabilityTermStructure for PiecewiseDefaultCurve {
    fn survival_probability_impl(&self, t: Time) -> Probability {
        self.calibration.factor(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{HazardRate, SurvivalProbability};
    use crate::default_helpers::SpreadCdsHelper;
    use crate::flat_forward::FlatForward;
    use ql_math::{Linear, LogLinear};
    use ql_quotes::SimpleQuote;
    use ql_time::{Actual360, Actual365Fixed, DateExt, Tenor};

    fn cds_helpers(today: Date) -> Vec<Arc<dyn BootstrapHelper>> {
        let discount = Arc::new(FlatForward::new(today, 0.03, Actual365Fixed));
        [(1, 0.008), (3, 0.01), (5, 0.012)]
            .iter()
            .map(|&(years, spread)| {
                Arc::new(
                    SpreadCdsHelper::new(
                        SimpleQuote::shared(spread),
                        today,
                        Tenor::Years(years),
                        Tenor::Months(3),
                        Actual360,
                        0.4,
                        discount.clone(),
                    )
                    .unwrap(),
                ) as Arc<dyn BootstrapHelper>
            })
            .collect()
    }

    #[test]
    fn hazard_rate_curve_reprices_cds_spreads() {
        let today = Date::try_ymd(2025, 1, 2).unwrap();
        let curve =
            PiecewiseDefaultCurve::new(today, cds_helpers(today), Actual365Fixed, HazardRate, Linear)
                .unwrap();
        assert!(curve.quote_errors().iter().all(|e| e.abs() < 1e-10));
        assert_eq!(curve.data()[0], 0.01);
        let five = today.advance(Tenor::Years(5)).unwrap();
        let s = curve.survival_probability(five);
        assert!(s > 0.85 && s < 0.95, "{s}");
        assert!(curve.default_probability(five) > curve.default_probability(today));
    }

    #[test]
    fn survival_probability_curve_is_non_increasing() {
        let today = Date::try_ymd(2025, 1, 2).unwrap();
        let curve = PiecewiseDefaultCurve::new(
            today,
            cds_helpers(today),
            Actual365Fixed,
            SurvivalProbability,
            LogLinear,
        )
        .unwrap();
        assert!(curve.quote_errors().iter().all(|e| e.abs() < 1e-10));
        assert_eq!(curve.data()[0], 1.0);
        assert!(curve.data().windows(2).all(|w| w[1] < w[0]));
    }
}
