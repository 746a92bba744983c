//! Node arrays and interpolation of a curve under calibration.

use std::sync::Arc;

use ql_core::{errors::Result, DiscountFactor, Probability, Real, Time};
use ql_math::{Interpolation1D, InterpolationBuilder, Linear};
use ql_time::{Date, DayCounter};

use super::traits::BootstrapTraits;

/// Default curve accuracy.
pub const DEFAULT_ACCURACY: Real = 1.0e-12;

/// The mutable state an engine solves for.
///
/// Nodes are `(time, value)` pairs; node 0 sits at the reference date.  The
/// interpolation covers the prefix `[0, extent]` of the nodes, built either
/// with the target scheme or, while a global scheme cannot be built yet,
/// with a temporary linear one.
#[derive(Debug)]
pub struct CurveState {
    reference_date: Date,
    day_counter: Arc<dyn DayCounter>,
    interpolator: Arc<dyn InterpolationBuilder>,
    dates: Vec<Date>,
    times: Vec<Time>,
    data: Vec<Real>,
    interpolation: Option<Box<dyn Interpolation1D>>,
    extent: usize,
    linear_fallback: bool,
    max_date: Date,
    accuracy: Real,
    valid: bool,
}

impl CurveState {
    /// An empty, invalid state.
    pub fn new(
        reference_date: Date,
        day_counter: Arc<dyn DayCounter>,
        interpolator: Arc<dyn InterpolationBuilder>,
    ) -> Self {
        Self {
            reference_date,
            day_counter,
            interpolator,
            dates: vec![reference_date],
            times: vec![0.0],
            data: Vec::new(),
            interpolation: None,
            extent: 0,
            linear_fallback: false,
            max_date: reference_date,
            accuracy: DEFAULT_ACCURACY,
            valid: false,
        }
    }

    /// Override the curve accuracy.
    pub fn with_accuracy(mut self, accuracy: Real) -> Self {
        self.accuracy = accuracy;
        self
    }

    /// Date of node 0.
    pub fn reference_date(&self) -> Date {
        self.reference_date
    }

    /// Day counter converting node dates to times.
    pub fn day_counter(&self) -> &dyn DayCounter {
        &*self.day_counter
    }

    /// Target interpolation scheme.
    pub fn interpolator(&self) -> &dyn InterpolationBuilder {
        &*self.interpolator
    }

    /// Node dates; the first one is the reference date.
    pub fn dates(&self) -> &[Date] {
        &self.dates
    }

    /// Node times, strictly increasing from 0.
    pub fn times(&self) -> &[Time] {
        &self.times
    }

    /// Node values.
    pub fn data(&self) -> &[Real] {
        &self.data
    }

    /// Latest relevant date over the calibrating instruments.
    pub fn max_date(&self) -> Date {
        self.max_date
    }

    /// Accuracy used when no engine override is given.
    pub fn accuracy(&self) -> Real {
        self.accuracy
    }

    /// `true` once a calibration has completed on the current data.
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Last node covered by the interpolation.
    pub fn extent(&self) -> usize {
        self.extent
    }

    /// `true` while a temporary linear interpolation stands in for the
    /// target scheme.
    pub fn uses_linear_fallback(&self) -> bool {
        self.linear_fallback
    }

    /// Year fraction from the reference date.
    pub fn time_from_reference(&self, date: Date) -> Time {
        self.day_counter.year_fraction(self.reference_date, date)
    }

    /// Interpolated node value at `t`.  Before any interpolation exists the
    /// curve is flat at node 0.
    pub fn value(&self, t: Time) -> Real {
        match &self.interpolation {
            Some(interp) => interp.operator(t),
            None => self.data.first().copied().unwrap_or(0.0),
        }
    }

    /// Integral of the interpolated node values from 0 to `t`.
    pub fn primitive(&self, t: Time) -> Real {
        match &self.interpolation {
            Some(interp) => interp.primitive(t),
            None => self.data.first().copied().unwrap_or(0.0) * t,
        }
    }

    pub(crate) fn data_mut(&mut self) -> &mut [Real] {
        &mut self.data
    }

    pub(crate) fn set_valid(&mut self, valid: bool) {
        self.valid = valid;
    }

    pub(crate) fn set_max_date(&mut self, date: Date) {
        self.max_date = date;
    }

    /// Move the reference date.  Node data is kept as a warm start; node
    /// dates are rebuilt by the next calculation.
    pub(crate) fn set_reference_date(&mut self, date: Date) {
        self.reference_date = date;
    }

    /// Replace the node dates; times follow from the day counter.
    pub(crate) fn set_nodes(&mut self, dates: Vec<Date>) {
        self.times = dates.iter().map(|&d| self.time_from_reference(d)).collect();
        self.dates = dates;
    }

    /// Fill every node with `value` and drop the interpolation.
    pub(crate) fn reset_data(&mut self, value: Real) {
        self.data = vec![value; self.dates.len()];
        self.interpolation = None;
        self.extent = 0;
        self.linear_fallback = false;
        self.valid = false;
    }

    fn build(&self, upto: usize, linear: bool) -> Result<Box<dyn Interpolation1D>> {
        ql_core::ensure!(
            upto < self.data.len() && upto < self.times.len(),
            "node {upto} out of range ({} nodes)",
            self.data.len()
        );
        let (xs, ys) = (&self.times[..=upto], &self.data[..=upto]);
        if linear {
            Linear.build(xs, ys)
        } else {
            self.interpolator.build(xs, ys)
        }
    }

    /// Cover nodes `[0, upto]`.  A global scheme that cannot be built on
    /// this prefix yet is replaced by linear interpolation; a local scheme
    /// that cannot be built is an error.
    pub(crate) fn extend_interpolation(&mut self, upto: usize) -> Result<()> {
        let interp = match self.build(upto, false) {
            Ok(interp) => {
                self.linear_fallback = false;
                interp
            }
            Err(e) if !self.interpolator.is_global() => return Err(e),
            Err(_) => {
                let interp = self.build(upto, true)?;
                self.linear_fallback = true;
                interp
            }
        };
        self.extent = upto;
        self.interpolation = Some(interp);
        Ok(())
    }

    /// Cover every node with the target scheme.
    pub(crate) fn interpolate_all(&mut self) -> Result<()> {
        let upto = self.data.len().saturating_sub(1);
        let interp = self.build(upto, false)?;
        self.extent = upto;
        self.linear_fallback = false;
        self.interpolation = Some(interp);
        Ok(())
    }

    /// Rebuild the interpolation over its current extent after node values
    /// changed.
    pub(crate) fn refresh(&mut self) -> Result<()> {
        let interp = self.build(self.extent, self.linear_fallback)?;
        self.interpolation = Some(interp);
        Ok(())
    }
}

/// Read-only view handed to instruments while they are repriced.
#[derive(Debug, Clone, Copy)]
pub struct BootstrapCurve<'a> {
    state: &'a CurveState,
    traits: &'a dyn BootstrapTraits,
}

impl<'a> BootstrapCurve<'a> {
    /// View `state` through the node mapping of `traits`.
    pub fn new(state: &'a CurveState, traits: &'a dyn BootstrapTraits) -> Self {
        Self { state, traits }
    }

    /// The underlying state.
    pub fn state(&self) -> &'a CurveState {
        self.state
    }

    /// Curve reference date.
    pub fn reference_date(&self) -> Date {
        self.state.reference_date()
    }

    /// Year fraction from the reference date.
    pub fn time_from_reference(&self, date: Date) -> Time {
        self.state.time_from_reference(date)
    }

    /// Discount factor at `t` (yield curves).
    pub fn discount(&self, t: Time) -> DiscountFactor {
        self.traits.factor(self.state, t)
    }

    /// Discount factor at `date` (yield curves).
    pub fn discount_date(&self, date: Date) -> DiscountFactor {
        self.discount(self.time_from_reference(date))
    }

    /// Survival probability at `t` (default-probability curves).
    pub fn survival_probability(&self, t: Time) -> Probability {
        self.traits.factor(self.state, t)
    }

    /// Survival probability at `date` (default-probability curves).
    pub fn survival_probability_date(&self, date: Date) -> Probability {
        self.survival_probability(self.time_from_reference(date))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_math::{CubicNatural, LogLinear};
    use ql_time::{Actual365Fixed, DateExt, Tenor};

    fn state(interpolator: Arc<dyn InterpolationBuilder>) -> CurveState {
        let today = Date::try_ymd(2025, 1, 2).unwrap();
        let mut s = CurveState::new(today, Arc::new(Actual365Fixed), interpolator);
        let dates = vec![
            today,
            today.advance(Tenor::Years(1)).unwrap(),
            today.advance(Tenor::Years(2)).unwrap(),
            today.advance(Tenor::Years(3)).unwrap(),
        ];
        s.set_nodes(dates);
        s.reset_data(1.0);
        s
    }

    #[test]
    fn nodes_carry_times_from_reference() {
        let s = state(Arc::new(LogLinear));
        assert_eq!(s.times()[0], 0.0);
        assert_abs_diff_eq!(s.times()[1], 1.0, epsilon = 1e-12);
        assert!(s.times().windows(2).all(|w| w[0] < w[1]));
        assert_eq!(s.data(), &[1.0; 4]);
    }

    #[test]
    fn global_scheme_falls_back_to_linear_on_short_prefix() {
        let mut s = state(Arc::new(CubicNatural));
        s.extend_interpolation(1).unwrap();
        assert!(s.uses_linear_fallback());
        s.extend_interpolation(2).unwrap();
        assert!(!s.uses_linear_fallback());
        assert_eq!(s.extent(), 2);
    }

    #[test]
    fn local_scheme_build_failure_is_reported() {
        let mut s = state(Arc::new(LogLinear));
        s.data_mut()[1] = -0.5;
        assert!(s.extend_interpolation(1).is_err());
    }

    #[test]
    fn refresh_tracks_node_changes() {
        let mut s = state(Arc::new(LogLinear));
        s.extend_interpolation(1).unwrap();
        s.data_mut()[1] = 0.9;
        s.refresh().unwrap();
        assert_abs_diff_eq!(s.value(s.times()[1]), 0.9, epsilon = 1e-14);
    }
}
