//! Per-curve-kind bootstrap strategies (translates
//! `ql/termstructures/yield/bootstraptraits.hpp` and
//! `ql/termstructures/credit/probabilitytraits.hpp`).
//!
//! A strategy decides what a node value *means* ([`CurveKind`]) and how the
//! engines seed, bracket and write it ([`BootstrapTraits`]).  Node 0 is
//! fixed at [`BootstrapTraits::initial_value`] and none of the write rules
//! ever touch it.

use ql_core::{Real, Time};

use super::curve_state::CurveState;

/// Average rate used to seed the first node.
pub const AVG_RATE: Real = 0.05;
/// Largest rate used to bracket a node.
pub const MAX_RATE: Real = 1.0;
/// Average hazard rate used to seed the first node.
pub const AVG_HAZARD_RATE: Real = 0.01;
/// Largest hazard rate used to bracket a node.
pub const MAX_HAZARD_RATE: Real = 1.0;

/// Maps interpolated node values to a discount factor (yield curves) or a
/// survival probability (default curves).
pub trait CurveKind: std::fmt::Debug + Send + Sync {
    /// Discount factor or survival probability at `t`.
    fn factor(&self, curve: &CurveState, t: Time) -> Real;
}

/// Guess, bracket and write rules for one curve kind.
///
/// The curve's initial date is its reference date.  `i` is the node being
/// solved (at least 1), `valid_data` tells whether the current node values
/// come from a completed calibration, and `first_alive` is the index of the
/// first non-expired instrument.
pub trait BootstrapTraits: CurveKind {
    /// Value of node 0.
    fn initial_value(&self, curve: &CurveState) -> Real;

    /// Starting point for node `i`.
    fn guess(&self, i: usize, curve: &CurveState, valid_data: bool, first_alive: usize) -> Real;

    /// Lower end of the bracket for node `i`.
    fn min_value_after(
        &self,
        i: usize,
        curve: &CurveState,
        valid_data: bool,
        first_alive: usize,
    ) -> Real;

    /// Upper end of the bracket for node `i`.
    fn max_value_after(
        &self,
        i: usize,
        curve: &CurveState,
        valid_data: bool,
        first_alive: usize,
    ) -> Real;

    /// Write a trial value into node `i`.
    fn update_guess(&self, data: &mut [Real], value: Real, i: usize) {
        data[i] = value;
    }

    /// Cap on the passes of the convergence loop.
    fn max_iterations(&self) -> usize {
        100
    }
}

fn min_data(curve: &CurveState) -> Real {
    curve.data().iter().copied().fold(Real::INFINITY, Real::min)
}

fn max_data(curve: &CurveState) -> Real {
    curve.data().iter().copied().fold(Real::NEG_INFINITY, Real::max)
}

/// Flat extrapolation of the continuously-compounded rate implied by node
/// `i - 1` out to node `i`.
fn flat_extrapolation(curve: &CurveState, i: usize) -> Real {
    let (data, times) = (curve.data(), curve.times());
    let r = -data[i - 1].ln() / times[i - 1];
    (-r * times[i]).exp()
}

// ── Yield curves ──────────────────────────────────────────────────────────────

/// Nodes are discount factors.
#[derive(Debug, Clone, Copy, Default)]
pub struct Discount;

impl CurveKind for Discount {
    fn factor(&self, curve: &CurveState, t: Time) -> Real {
        curve.value(t)
    }
}

impl BootstrapTraits for Discount {
    fn initial_value(&self, _curve: &CurveState) -> Real {
        1.0
    }

    fn guess(&self, i: usize, curve: &CurveState, valid_data: bool, _first_alive: usize) -> Real {
        if valid_data {
            return curve.data()[i];
        }
        if i == 1 {
            return 1.0 / (1.0 + AVG_RATE * curve.times()[1]);
        }
        flat_extrapolation(curve, i)
    }

    fn min_value_after(&self, i: usize, curve: &CurveState, valid_data: bool, _: usize) -> Real {
        if valid_data {
            return min_data(curve) / 2.0;
        }
        let dt = curve.times()[i] - curve.times()[i - 1];
        curve.data()[i - 1] * (-MAX_RATE * dt).exp()
    }

    fn max_value_after(&self, i: usize, curve: &CurveState, _valid_data: bool, _: usize) -> Real {
        // Negative rates allowed.
        let dt = curve.times()[i] - curve.times()[i - 1];
        curve.data()[i - 1] * (MAX_RATE * dt).exp()
    }
}

/// Nodes are continuously-compounded zero rates.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZeroYield;

impl CurveKind for ZeroYield {
    fn factor(&self, curve: &CurveState, t: Time) -> Real {
        if t <= 0.0 {
            return 1.0;
        }
        (-curve.value(t) * t).exp()
    }
}

impl BootstrapTraits for ZeroYield {
    fn initial_value(&self, _curve: &CurveState) -> Real {
        AVG_RATE
    }

    fn guess(&self, i: usize, curve: &CurveState, valid_data: bool, _first_alive: usize) -> Real {
        if valid_data {
            return curve.data()[i];
        }
        if i == 1 {
            return AVG_RATE;
        }
        curve.data()[i - 1]
    }

    fn min_value_after(&self, _i: usize, curve: &CurveState, valid_data: bool, _: usize) -> Real {
        if valid_data {
            let r = min_data(curve);
            return if r < 0.0 { r * 2.0 } else { r / 2.0 };
        }
        -MAX_RATE
    }

    fn max_value_after(&self, _i: usize, curve: &CurveState, valid_data: bool, _: usize) -> Real {
        if valid_data {
            let r = max_data(curve);
            return if r < 0.0 { r / 2.0 } else { r * 2.0 };
        }
        MAX_RATE
    }
}

// ── Default-probability curves ────────────────────────────────────────────────

/// Nodes are survival probabilities.
#[derive(Debug, Clone, Copy, Default)]
pub struct SurvivalProbability;

impl CurveKind for SurvivalProbability {
    fn factor(&self, curve: &CurveState, t: Time) -> Real {
        curve.value(t)
    }
}

impl BootstrapTraits for SurvivalProbability {
    fn initial_value(&self, _curve: &CurveState) -> Real {
        1.0
    }

    fn guess(&self, i: usize, curve: &CurveState, valid_data: bool, _first_alive: usize) -> Real {
        if valid_data {
            return curve.data()[i];
        }
        if i == 1 {
            return 1.0 / (1.0 + AVG_HAZARD_RATE * 0.25);
        }
        flat_extrapolation(curve, i)
    }

    fn min_value_after(&self, i: usize, curve: &CurveState, valid_data: bool, _: usize) -> Real {
        if valid_data {
            return min_data(curve) / 2.0;
        }
        let dt = curve.times()[i] - curve.times()[i - 1];
        curve.data()[i - 1] * (-MAX_HAZARD_RATE * dt).exp()
    }

    fn max_value_after(&self, i: usize, curve: &CurveState, _valid_data: bool, _: usize) -> Real {
        // Survival probabilities never increase.
        curve.data()[i - 1]
    }
}

/// Nodes are hazard rates; survival is `exp(-∫h)`.
#[derive(Debug, Clone, Copy, Default)]
pub struct HazardRate;

impl CurveKind for HazardRate {
    fn factor(&self, curve: &CurveState, t: Time) -> Real {
        if t <= 0.0 {
            return 1.0;
        }
        (-curve.primitive(t)).exp()
    }
}

impl BootstrapTraits for HazardRate {
    fn initial_value(&self, _curve: &CurveState) -> Real {
        AVG_HAZARD_RATE
    }

    fn guess(&self, i: usize, curve: &CurveState, valid_data: bool, _first_alive: usize) -> Real {
        if valid_data {
            return curve.data()[i];
        }
        if i == 1 {
            return AVG_HAZARD_RATE;
        }
        curve.data()[i - 1]
    }

    fn min_value_after(&self, _i: usize, curve: &CurveState, valid_data: bool, _: usize) -> Real {
        if valid_data {
            return min_data(curve) / 2.0;
        }
        Real::EPSILON
    }

    fn max_value_after(&self, _i: usize, curve: &CurveState, valid_data: bool, _: usize) -> Real {
        if valid_data {
            return max_data(curve) * 2.0;
        }
        MAX_HAZARD_RATE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ql_math::Linear;
    use ql_time::{Actual365Fixed, Date, DateExt, Tenor};
    use std::sync::Arc;

    fn curve(initial: Real) -> CurveState {
        let today = Date::try_ymd(2025, 1, 2).unwrap();
        let mut s = CurveState::new(today, Arc::new(Actual365Fixed), Arc::new(Linear));
        s.set_nodes(vec![
            today,
            today.advance(Tenor::Years(1)).unwrap(),
            today.advance(Tenor::Years(2)).unwrap(),
        ]);
        s.reset_data(initial);
        s
    }

    #[test]
    fn discount_first_guess_and_bracket() {
        let c = curve(1.0);
        let t1 = c.times()[1];
        assert_abs_diff_eq!(Discount.guess(1, &c, false, 0), 1.0 / (1.0 + 0.05 * t1), epsilon = 1e-15);
        let lo = Discount.min_value_after(1, &c, false, 0);
        let hi = Discount.max_value_after(1, &c, false, 0);
        assert!(lo < 1.0 && hi > 1.0);
        assert_abs_diff_eq!(lo, (-t1).exp(), epsilon = 1e-15);
    }

    #[test]
    fn discount_guess_extrapolates_flat_rate() {
        let mut c = curve(1.0);
        let t1 = c.times()[1];
        c.data_mut()[1] = (-0.03 * t1).exp();
        let t2 = c.times()[2];
        assert_abs_diff_eq!(Discount.guess(2, &c, false, 0), (-0.03 * t2).exp(), epsilon = 1e-14);
    }

    #[test]
    fn valid_data_brackets_use_the_whole_curve() {
        let mut c = curve(0.04);
        c.data_mut()[2] = -0.01;
        assert_abs_diff_eq!(ZeroYield.min_value_after(2, &c, true, 0), -0.02, epsilon = 1e-15);
        assert_abs_diff_eq!(ZeroYield.max_value_after(2, &c, true, 0), 0.08, epsilon = 1e-15);
        assert_eq!(ZeroYield.min_value_after(2, &c, false, 0), -MAX_RATE);
    }

    #[test]
    fn update_guess_never_writes_node_zero() {
        for traits in [&Discount as &dyn BootstrapTraits, &ZeroYield, &SurvivalProbability, &HazardRate] {
            let c = curve(0.5);
            let mut data = c.data().to_vec();
            traits.update_guess(&mut data, 0.123, 1);
            assert_eq!(data[0], 0.5);
            assert_eq!(data[1], 0.123);
        }
    }

    #[test]
    fn hazard_rate_factor_integrates_nodes() {
        let mut c = curve(0.02);
        c.extend_interpolation(2).unwrap();
        c.data_mut()[1] = 0.02;
        c.data_mut()[2] = 0.02;
        c.refresh().unwrap();
        assert_abs_diff_eq!(HazardRate.factor(&c, 1.5), (-0.03_f64).exp(), epsilon = 1e-14);
        assert_eq!(HazardRate.factor(&c, 0.0), 1.0);
    }

    #[test]
    fn survival_probability_bracket_is_non_increasing() {
        let mut c = curve(1.0);
        c.data_mut()[1] = 0.98;
        let hi = SurvivalProbability.max_value_after(2, &c, false, 0);
        let lo = SurvivalProbability.min_value_after(2, &c, false, 0);
        assert_eq!(hi, 0.98);
        assert!(lo < hi);
    }
}
