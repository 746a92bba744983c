//! Levenberg–Marquardt least squares (translates
//! `ql/math/optimization/levenbergmarquardt.hpp`).

use nalgebra::{DMatrix, DVector};

use super::{Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationMethod, OptimizationResult};
use crate::array::Array;
use ql_core::{errors::Result, Real};

const INITIAL_DAMPING: Real = 1e-3;
const MIN_DAMPING: Real = 1e-12;
const MAX_DAMPING: Real = 1e16;

/// Levenberg–Marquardt least-squares optimizer.
///
/// Minimises `0.5 * Σ rᵢ²(x)` over the residual vector returned by
/// [`CostFunction::values`].  The Jacobian is estimated by forward
/// differences with relative step `sqrt(epsfcn)`.
///
/// Termination maps onto [`EndCriteriaType`] as follows:
/// * residual below `function_epsilon`: `StationaryFunctionAccuracy`;
/// * scaled gradient below `gtol`, relative step below `xtol`, or the
///   objective stalled for too many iterations: `StationaryFunctionValue`;
/// * no damping produces a decrease: `StationaryPoint`;
/// * iteration cap: `MaxIterations`.
///
/// Corresponds to `QuantLib::LevenbergMarquardt`.
#[derive(Debug, Clone, Copy)]
pub struct LevenbergMarquardt {
    epsfcn: Real,
    xtol: Real,
    gtol: Real,
}

impl LevenbergMarquardt {
    /// Create a new L-M optimizer.
    pub fn new(epsfcn: Real, xtol: Real, gtol: Real) -> Self {
        Self { epsfcn, xtol, gtol }
    }

    /// Forward-difference Jacobian of the residuals at `x`; `r0` are the
    /// residuals already evaluated there.
    fn jacobian(&self, cost_fn: &mut dyn CostFunction, x: &Array, r0: &Array) -> DMatrix<Real> {
        let (m, n) = (r0.size(), x.size());
        let eps = self.epsfcn.max(Real::EPSILON).sqrt();
        let mut jac = DMatrix::zeros(m, n);
        for j in 0..n {
            let h = if x[j] == 0.0 { eps } else { eps * x[j].abs() };
            let mut xp = x.clone();
            xp[j] += h;
            let rp = cost_fn.values(&xp);
            for i in 0..m {
                jac[(i, j)] = (rp[i] - r0[i]) / h;
            }
        }
        jac
    }

    /// Largest cosine between a Jacobian column and the residual vector.
    fn scaled_gradient(jac: &DMatrix<Real>, g: &DVector<Real>, r_norm: Real) -> Real {
        if r_norm == 0.0 {
            return 0.0;
        }
        (0..jac.ncols())
            .map(|j| {
                let col = jac.column(j).norm();
                if col == 0.0 {
                    0.0
                } else {
                    g[j].abs() / (col * r_norm)
                }
            })
            .fold(0.0, Real::max)
    }
}

impl Default for LevenbergMarquardt {
    fn default() -> Self {
        Self::new(1e-8, 1e-8, 1e-8)
    }
}

impl OptimizationMethod for LevenbergMarquardt {
    fn minimize(
        &self,
        cost_fn: &mut dyn CostFunction,
        constraint: &dyn Constraint,
        initial_values: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult> {
        ql_core::ensure!(
            constraint.test(initial_values),
            "initial guess {initial_values} violates the constraint"
        );

        let n = initial_values.size();
        let mut x = initial_values.clone();
        let mut r = cost_fn.values(&x);
        ql_core::ensure!(
            r.all_finite(),
            "residuals are not finite at the initial guess {initial_values}"
        );
        let mut value = 0.5 * r.norm_squared();
        let mut lambda = INITIAL_DAMPING;
        let mut stationary = 0;
        let mut iterations = 0;

        let done = |x: Array,
                    value: Real,
                    iterations: usize,
                    end_type: EndCriteriaType|
         -> Result<OptimizationResult> {
            Ok(OptimizationResult {
                x,
                value,
                iterations,
                end_type,
            })
        };

        loop {
            if end_criteria.check_stationary_function_accuracy(value) {
                return done(x, value, iterations, EndCriteriaType::StationaryFunctionAccuracy);
            }
            if iterations >= end_criteria.max_iterations {
                return done(x, value, iterations, EndCriteriaType::MaxIterations);
            }
            iterations += 1;

            let jac = self.jacobian(cost_fn, &x, &r);
            let jt = jac.transpose();
            let g = &jt * r.inner();
            if Self::scaled_gradient(&jac, &g, r.norm()) <= self.gtol {
                return done(x, value, iterations, EndCriteriaType::StationaryFunctionValue);
            }

            let jtj = &jt * &jac;
            let diag_max = (0..n).map(|j| jtj[(j, j)]).fold(0.0, Real::max);
            let floor = Real::EPSILON * diag_max.max(1.0);
            let neg_g = -g;

            // Raise the damping until a step improves the objective.
            let (trial, r_trial, value_trial, step_norm) = loop {
                let mut system = jtj.clone();
                for j in 0..n {
                    system[(j, j)] += lambda * jtj[(j, j)].max(floor);
                }
                if let Some(delta) = system.lu().solve(&neg_g) {
                    if delta.iter().all(|d| d.is_finite()) {
                        let trial = Array::from(x.inner() + &delta);
                        if constraint.test(&trial) {
                            let r_trial = cost_fn.values(&trial);
                            let value_trial = 0.5 * r_trial.norm_squared();
                            if value_trial.is_finite() && value_trial < value {
                                break (trial, r_trial, value_trial, delta.norm());
                            }
                        }
                    }
                }
                lambda *= 10.0;
                if lambda > MAX_DAMPING {
                    return done(x, value, iterations, EndCriteriaType::StationaryPoint);
                }
            };

            lambda = (lambda / 10.0).max(MIN_DAMPING);
            let previous = value;
            x = trial;
            r = r_trial;
            value = value_trial;

            if end_criteria.check_stationary_function_accuracy(value) {
                return done(x, value, iterations, EndCriteriaType::StationaryFunctionAccuracy);
            }
            if step_norm <= self.xtol * (x.norm() + self.xtol)
                || end_criteria.check_stationary_function_value(previous, value, &mut stationary)
            {
                return done(x, value, iterations, EndCriteriaType::StationaryFunctionValue);
            }
        }
    }
}
