//! Nelder–Mead simplex (translates `ql/math/optimization/simplex.hpp`).

use super::{Constraint, CostFunction, EndCriteria, EndCriteriaType, OptimizationMethod, OptimizationResult};
use crate::array::Array;
use ql_core::{errors::Result, Real};

/// Nelder–Mead simplex optimizer.
///
/// Derivative free; the scalar [`CostFunction::value`] is minimised
/// directly.  Trial points violating the constraint are treated as
/// infinitely bad.
///
/// Corresponds to `QuantLib::Simplex`.
#[derive(Debug, Clone, Copy)]
pub struct Simplex {
    lambda: Real,
}

impl Simplex {
    /// Create a new simplex optimizer with initial edge length `lambda`.
    pub fn new(lambda: Real) -> Self {
        Self { lambda }
    }
}

/// Mean distance of the vertices from their centroid.
fn simplex_size(vertices: &[Array]) -> Real {
    let n = vertices.len();
    let mut centroid = Array::zeros(vertices[0].size());
    for v in vertices {
        centroid = centroid + v.clone();
    }
    centroid = centroid / n as Real;
    vertices.iter().map(|v| (v - &centroid).norm()).sum::<Real>() / n as Real
}

fn constrained_value(
    cost_fn: &mut dyn CostFunction,
    constraint: &dyn Constraint,
    x: &Array,
) -> Real {
    if !constraint.test(x) {
        return Real::MAX;
    }
    let v = cost_fn.value(x);
    if v.is_finite() {
        v
    } else {
        Real::MAX
    }
}

impl OptimizationMethod for Simplex {
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
        let initial_value = cost_fn.value(initial_values);
        ql_core::ensure!(
            initial_value.is_finite(),
            "cost function is not finite at the initial guess {initial_values}"
        );

        let n = initial_values.size();
        let np1 = n + 1;

        // Build initial simplex
        let mut vertices: Vec<Array> = Vec::with_capacity(np1);
        let mut values: Vec<Real> = Vec::with_capacity(np1);
        vertices.push(initial_values.clone());
        values.push(initial_value);
        for i in 0..n {
            let mut v = initial_values.clone();
            v[i] += self.lambda;
            if !constraint.test(&v) {
                v[i] = initial_values[i] - self.lambda;
            }
            values.push(constrained_value(cost_fn, constraint, &v));
            vertices.push(v);
        }

        let mut iterations = 0;
        let mut stationary = 0;
        let mut prev_best = Real::MAX;

        loop {
            // Find best, worst, second-worst
            let (mut ilo, mut ihi) = (0usize, 0usize);
            for i in 0..np1 {
                if values[i] < values[ilo] {
                    ilo = i;
                }
                if values[i] > values[ihi] {
                    ihi = i;
                }
            }
            let mut inhi = ilo;
            for i in 0..np1 {
                if i != ihi && values[i] > values[inhi] {
                    inhi = i;
                }
            }

            iterations += 1;
            let best = values[ilo];
            let finish = |end_type| OptimizationResult {
                x: vertices[ilo].clone(),
                value: best,
                iterations,
                end_type,
            };
            if end_criteria.check_stationary_function_accuracy(best) {
                return Ok(finish(EndCriteriaType::StationaryFunctionAccuracy));
            }
            if simplex_size(&vertices) < end_criteria.root_epsilon {
                return Ok(finish(EndCriteriaType::StationaryPoint));
            }
            if end_criteria.check_stationary_function_value(prev_best, best, &mut stationary) {
                return Ok(finish(EndCriteriaType::StationaryFunctionValue));
            }
            if iterations >= end_criteria.max_iterations {
                return Ok(finish(EndCriteriaType::MaxIterations));
            }
            prev_best = best;

            // Centroid (excluding worst)
            let mut centroid = Array::zeros(n);
            for (i, v) in vertices.iter().enumerate() {
                if i != ihi {
                    centroid = centroid + v.clone();
                }
            }
            centroid = centroid / n as Real;

            // Reflection
            let reflected = &centroid * 2.0 - vertices[ihi].clone();
            let fr = constrained_value(cost_fn, constraint, &reflected);

            if fr < values[ilo] {
                // Expansion
                let expanded = &reflected * 2.0 - centroid.clone();
                let fe = constrained_value(cost_fn, constraint, &expanded);
                if fe < fr {
                    vertices[ihi] = expanded;
                    values[ihi] = fe;
                } else {
                    vertices[ihi] = reflected;
                    values[ihi] = fr;
                }
            } else if fr < values[inhi] {
                vertices[ihi] = reflected;
                values[ihi] = fr;
            } else {
                // Contraction
                let contracted = if fr < values[ihi] {
                    (&centroid + &reflected) / 2.0
                } else {
                    (&centroid + &vertices[ihi]) / 2.0
                };
                let fc = constrained_value(cost_fn, constraint, &contracted);
                if fc < values[ihi].min(fr) {
                    vertices[ihi] = contracted;
                    values[ihi] = fc;
                } else {
                    // Shrink all towards best
                    for i in 0..np1 {
                        if i != ilo {
                            vertices[i] = (&vertices[ilo] + &vertices[i]) / 2.0;
                            values[i] = constrained_value(cost_fn, constraint, &vertices[i]);
                        }
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::{NoConstraint, PositiveConstraint};

    /// Rosenbrock cost function: f(x,y) = (1-x)² + 100*(y-x²)²
    struct Rosenbrock;
    impl CostFunction for Rosenbrock {
        fn values(&mut self, x: &Array) -> Array {
            let a = 1.0 - x[0];
            let b = 10.0 * (x[1] - x[0] * x[0]);
            Array::from_slice(&[a, b])
        }
    }

    /// Sum of absolute deviations from (3, -1).
    struct AbsoluteDeviation;
    impl CostFunction for AbsoluteDeviation {
        fn values(&mut self, x: &Array) -> Array {
            Array::from_slice(&[x[0] - 3.0, x[1] + 1.0])
        }
        fn value(&mut self, x: &Array) -> Real {
            self.values(x).iter().map(|r| r.abs()).sum()
        }
    }

    #[test]
    fn simplex_rosenbrock() {
        let opt = Simplex::new(0.5);
        let ec = EndCriteria::new(5000, 500, 1e-12, 1e-14, 1e-12);
        let result = opt
            .minimize(
                &mut Rosenbrock,
                &NoConstraint,
                &Array::from_slice(&[-1.0, 1.0]),
                &ec,
            )
            .unwrap();
        assert!((result.x[0] - 1.0).abs() < 1e-3, "x[0] = {}", result.x[0]);
        assert!((result.x[1] - 1.0).abs() < 1e-3, "x[1] = {}", result.x[1]);
    }

    #[test]
    fn simplex_reaches_function_accuracy_on_absolute_cost() {
        let opt = Simplex::new(0.5);
        let ec = EndCriteria::new(5000, 200, 1e-16, 1e-8, 0.0);
        let result = opt
            .minimize(&mut AbsoluteDeviation, &NoConstraint, &Array::from_slice(&[0.0, 0.0]), &ec)
            .unwrap();
        assert_eq!(result.end_type, EndCriteriaType::StationaryFunctionAccuracy);
        assert!(result.value <= 1e-8);
    }

    #[test]
    fn initial_point_must_satisfy_constraint() {
        let opt = Simplex::new(0.1);
        let res = opt.minimize(
            &mut Rosenbrock,
            &PositiveConstraint,
            &Array::from_slice(&[-1.0, 1.0]),
            &EndCriteria::default(),
        );
        assert!(res.is_err());
    }
}
