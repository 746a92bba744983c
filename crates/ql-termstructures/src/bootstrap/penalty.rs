//! Window penalty for the local bootstrap (the `PenaltyFunction` of
//! `ql/termstructures/bootstraperror.hpp`).

use std::sync::Arc;

use ql_core::Real;
use ql_math::{Array, CostFunction};

use super::curve_state::{BootstrapCurve, CurveState};
use super::helper::BootstrapHelper;
use super::traits::BootstrapTraits;

/// Repricing errors of a window of instruments as a function of a block of
/// consecutive nodes starting at `first_node`.
#[derive(Debug)]
pub struct PenaltyFunction<'a> {
    curve: &'a mut CurveState,
    traits: &'a dyn BootstrapTraits,
    helpers: &'a [Arc<dyn BootstrapHelper>],
    first_node: usize,
}

impl<'a> PenaltyFunction<'a> {
    /// Bind `helpers` to the nodes `first_node..first_node + x.len()`.
    pub fn new(
        curve: &'a mut CurveState,
        traits: &'a dyn BootstrapTraits,
        helpers: &'a [Arc<dyn BootstrapHelper>],
        first_node: usize,
    ) -> Self {
        Self {
            curve,
            traits,
            helpers,
            first_node,
        }
    }

    fn write(&mut self, x: &Array) -> bool {
        for (k, &v) in x.iter().enumerate() {
            self.traits
                .update_guess(self.curve.data_mut(), v, self.first_node + k);
        }
        self.curve.refresh().is_ok()
    }

    fn errors(&self) -> impl Iterator<Item = Real> + '_ {
        let view = BootstrapCurve::new(&*self.curve, self.traits);
        self.helpers.iter().map(move |h| h.quote_error(&view))
    }
}

impl CostFunction for PenaltyFunction<'_> {
    fn values(&mut self, x: &Array) -> Array {
        if !self.write(x) {
            return Array::from_vec(vec![Real::NAN; self.helpers.len()]);
        }
        Array::from_vec(self.errors().collect())
    }

    /// Sum of absolute repricing errors.
    fn value(&mut self, x: &Array) -> Real {
        if !self.write(x) {
            return Real::INFINITY;
        }
        self.errors().map(Real::abs).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::traits::Discount;
    use approx::assert_abs_diff_eq;
    use ql_math::Linear;
    use ql_time::{Actual365Fixed, Date, DateExt, Tenor};

    #[derive(Debug)]
    struct ZeroBond {
        maturity: Date,
        price: Real,
    }

    impl BootstrapHelper for ZeroBond {
        fn pillar_date(&self) -> Date {
            self.maturity
        }
        fn latest_relevant_date(&self) -> Date {
            self.maturity
        }
        fn quote(&self) -> Option<Real> {
            Some(self.price)
        }
        fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Real {
            curve.discount_date(self.maturity)
        }
    }

    #[test]
    fn penalty_sums_absolute_errors_over_the_window() {
        let today = Date::try_ymd(2025, 1, 2).unwrap();
        let m1 = today.advance(Tenor::Years(1)).unwrap();
        let m2 = today.advance(Tenor::Years(2)).unwrap();
        let mut state = CurveState::new(today, Arc::new(Actual365Fixed), Arc::new(Linear));
        state.set_nodes(vec![today, m1, m2]);
        state.reset_data(1.0);
        state.extend_interpolation(2).unwrap();

        let helpers: Vec<Arc<dyn BootstrapHelper>> = vec![
            Arc::new(ZeroBond { maturity: m1, price: 0.97 }),
            Arc::new(ZeroBond { maturity: m2, price: 0.94 }),
        ];
        let mut penalty = PenaltyFunction::new(&mut state, &Discount, &helpers, 1);

        let x = Array::from_slice(&[0.96, 0.95]);
        let r = penalty.values(&x);
        assert_abs_diff_eq!(r[0], 0.01, epsilon = 1e-14);
        assert_abs_diff_eq!(r[1], -0.01, epsilon = 1e-14);
        assert_abs_diff_eq!(penalty.value(&x), 0.02, epsilon = 1e-14);
        assert_abs_diff_eq!(penalty.value(&Array::from_slice(&[0.97, 0.94])), 0.0, epsilon = 1e-15);
        assert_eq!(state.data(), &[1.0, 0.97, 0.94]);
    }
}
