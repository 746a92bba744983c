//! One-node repricing error (the `BootstrapError` functor of
//! `ql/termstructures/bootstraperror.hpp`).

use ql_core::Real;

use super::curve_state::{BootstrapCurve, CurveState};
use super::helper::BootstrapHelper;
use super::traits::BootstrapTraits;

/// Repricing error of one instrument as a function of one node value.
///
/// Every evaluation writes the trial value into the curve, so calls must be
/// sequential and the curve holds the last evaluated value afterwards.
#[derive(Debug)]
pub struct NodeError<'a> {
    curve: &'a mut CurveState,
    traits: &'a dyn BootstrapTraits,
    helper: &'a dyn BootstrapHelper,
    node: usize,
}

impl<'a> NodeError<'a> {
    /// Bind `helper` to node `node` of `curve`.
    pub fn new(
        curve: &'a mut CurveState,
        traits: &'a dyn BootstrapTraits,
        helper: &'a dyn BootstrapHelper,
        node: usize,
    ) -> Self {
        Self {
            curve,
            traits,
            helper,
            node,
        }
    }

    /// Node being solved.
    pub fn node(&self) -> usize {
        self.node
    }

    /// Write `x`, rebuild the interpolation and return market minus model.
    /// `NaN` when the interpolation rejects `x`.
    pub fn value(&mut self, x: Real) -> Real {
        self.traits.update_guess(self.curve.data_mut(), x, self.node);
        if self.curve.refresh().is_err() {
            return Real::NAN;
        }
        self.helper
            .quote_error(&BootstrapCurve::new(&*self.curve, self.traits))
    }
}
