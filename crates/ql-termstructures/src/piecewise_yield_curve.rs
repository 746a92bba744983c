//! `PiecewiseYieldCurve`: a yield curve bootstrapped from market instruments
//! (translates `ql/termstructures/yield/piecewiseyieldcurve.hpp`).
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use ql_math::LogLinear;
//! use ql_quotes::SimpleQuote;
//! use ql_termstructures::bootstrap::{BootstrapHelper, Discount};
//! use ql_termstructures::rate_helpers::DepositRateHelper;
//! use ql_termstructures::{PiecewiseYieldCurve, YieldTermStructure};
//! use ql_time::{Actual360, Date, DateExt};
//!
//! let today = Date::try_ymd(2025, 1, 2).unwrap();
//! let helpers: Vec<Arc<dyn BootstrapHelper>> = vec![
//!     Arc::new(DepositRateHelper::new(
//!         SimpleQuote::shared(0.04),
//!         today,
//!         Date::try_ymd(2025, 4, 2).unwrap(),
//!         Actual360,
//!     )),
//!     Arc::new(DepositRateHelper::new(
//!         SimpleQuote::shared(0.045),
//!         today,
//!         Date::try_ymd(2025, 7, 2).unwrap(),
//!         Actual360,
//!     )),
//! ];
//! let curve = PiecewiseYieldCurve::new(today, helpers, Actual360, Discount, LogLinear).unwrap();
//! assert!(curve.discount(0.5) < 1.0);
//! ```

use std::sync::Arc;

use crate::bootstrap::{
    Bootstrap, BootstrapHelper, BootstrapReport, BootstrapResult, BootstrapTraits, Calibration,
    CurveState, IterativeBootstrap,
};
use crate::term_structure::TermStructure;
use crate::yield_term_structure::YieldTermStructure;
use ql_core::{DiscountFactor, Real, Time};
use ql_math::InterpolationBuilder;
use ql_time::{Date, DayCounter};

/// A yield curve whose nodes are solved so that every instrument reprices
/// its quote.
///
/// The node quantity (discount factor or zero rate) comes from the
/// [`BootstrapTraits`] strategy, the interpolation between nodes from the
/// [`InterpolationBuilder`] and the solving procedure from the [`Bootstrap`]
/// engine ([`IterativeBootstrap`] unless given).
///
/// Corresponds to `QuantLib::PiecewiseYieldCurve<Traits, Interpolator, Bootstrap>`.
#[derive(Debug)]
pub struct PiecewiseYieldCurve {
    calibration: Calibration,
}

impl PiecewiseYieldCurve {
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

    /// Node times.
    pub fn times(&self) -> &[Time] {
        self.calibration.state().times()
    }

    /// Node values.
    pub fn data(&self) -> &[Real] {
        self.calibration.state().data()
    }

    /// `(date, value)` pairs of the nodes.
    pub fn nodes(&self) -> Vec<(Date, Real)> {
        self.dates().iter().copied().zip(self.data().iter().copied()).collect()
    }

    /// Calibrating instruments, in the order the engine sorted them.
    pub fn helpers(&self) -> &[Arc<dyn BootstrapHelper>] {
        self.calibration.helpers()
    }

    /// Diagnostics of the last calibration.
    pub fn report(&self) -> &BootstrapReport {
        self.calibration.report()
    }

    /// Market minus model for every instrument, in calibration order.
    /// Expired instruments are included.
    pub fn quote_errors(&self) -> Vec<Real> {
        self.calibration.quote_errors()
    }

    /// Underlying curve state.
    pub fn state(&self) -> &CurveState {
        self.calibration.state()
    }

    /// Calibrate again after quotes changed, starting from the current
    /// nodes.
    ///
    /// # Errors
    /// Any [`BootstrapError`](crate::bootstrap::BootstrapError); the curve
    /// must not be queried until a later calibration succeeds.
    pub fn recalculate(&mut self) -> BootstrapResult<&BootstrapReport> {
        self.calibration.recalculate()
    }

    /// Move the reference date and calibrate again.  Instruments whose
    /// pillar is no longer after the new date are dropped from the
    /// calibration.
    ///
    /// # Errors
    /// As [`recalculate`](Self::recalculate).
    pub fn set_reference_date(&mut self, date: Date) -> BootstrapResult<&BootstrapReport> {
        self.calibration.set_reference_date(date)
    }
}

impl TermStructure for PiecewiseYieldCurve {
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

impl YieldTermStructure for PiecewiseYieldCurve {
    fn discount_impl(&self, t: Time) -> DiscountFactor {
        self.calibration.factor(t)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{BootstrapErrorKind, ZeroYield};
    use crate::rate_helpers::{DepositRateHelper, SwapRateHelper};
    use approx::assert_abs_diff_eq;
    use ql_math::Linear;
    use ql_quotes::SimpleQuote;
    use ql_time::{Actual360, Actual365Fixed, DateExt, Tenor, Thirty360};

    fn today() -> Date {
        Date::try_ymd(2025, 1, 2).unwrap()
    }

    #[test]
    fn zero_yield_curve_reprices_deposits_and_swaps() {
        let deposit = Arc::new(DepositRateHelper::from_tenor(
            SimpleQuote::shared(0.035),
            today(),
            0,
            Tenor::Months(6),
            Actual360,
        )
        .unwrap());
        let swap = Arc::new(SwapRateHelper::from_tenor(
            SimpleQuote::shared(0.04),
            today(),
            Tenor::Years(3),
            Tenor::Years(1),
            Thirty360,
        )
        .unwrap());
        let helpers: Vec<Arc<dyn BootstrapHelper>> = vec![swap.clone(), deposit.clone()];
        let curve =
            PiecewiseYieldCurve::new(today(), helpers, Actual365Fixed, ZeroYield, Linear).unwrap();

        assert_eq!(curve.data()[0], 0.05);
        assert_eq!(curve.dates().len(), 3);
        let view = curve.state();
        assert!(view.is_valid());
        assert_eq!(curve.max_date(), swap.latest_relevant_date());
        let implied = curve.zero_rate(1.0);
        assert!(implied > 0.03 && implied < 0.045, "{implied}");
        assert_abs_diff_eq!(curve.discount(0.0), 1.0, epsilon = 1e-15);
    }

    #[test]
    fn empty_instrument_set_is_rejected() {
        let err = PiecewiseYieldCurve::new(today(), Vec::new(), Actual365Fixed, ZeroYield, Linear)
            .unwrap_err();
        assert_eq!(err.kind(), BootstrapErrorKind::Validation);
    }
}
