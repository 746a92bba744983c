//! Optimization framework (translates `ql/math/optimization/`).
//!
//! Provides cost functions, constraints, end criteria, and the
//! [`OptimizationMethod`] implementations used for windowed curve fitting:
//! Levenberg–Marquardt and Nelder–Mead simplex.

use crate::array::Array;
use ql_core::{errors::Result, Real};

/// Levenberg–Marquardt least squares.
pub mod levenberg_marquardt;

/// Nelder–Mead simplex.
pub mod simplex;

pub use levenberg_marquardt::LevenbergMarquardt;
pub use simplex::Simplex;

// ── Cost function trait ───────────────────────────────────────────────────────

/// A multi-dimensional cost (objective) function.
///
/// Evaluation takes `&mut self`: a cost function may write the trial point
/// into some external state before measuring it.
///
/// Corresponds to `QuantLib::CostFunction`.
pub trait CostFunction {
    /// Evaluate the cost function at `x` and return a vector of residuals.
    fn values(&mut self, x: &Array) -> Array;

    /// Return the scalar cost.  Defaults to `0.5 * Σ r²(x)`.
    fn value(&mut self, x: &Array) -> Real {
        let v = self.values(x);
        0.5 * v.norm_squared()
    }
}

// ── Constraints ───────────────────────────────────────────────────────────────

/// A constraint on the parameter space.
///
/// Corresponds to `QuantLib::Constraint`.
pub trait Constraint: std::fmt::Debug + Send + Sync {
    /// Return `true` if `x` satisfies the constraint.
    fn test(&self, x: &Array) -> bool;
}

/// No constraint: all parameter values are accepted.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoConstraint;

impl Constraint for NoConstraint {
    fn test(&self, _x: &Array) -> bool {
        true
    }
}

/// Positive constraint: all parameter values must be strictly positive.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositiveConstraint;

impl Constraint for PositiveConstraint {
    fn test(&self, x: &Array) -> bool {
        x.iter().all(|&v| v > 0.0)
    }
}

// ── End criteria ──────────────────────────────────────────────────────────────

/// Criteria to stop an optimization.
///
/// Corresponds to `QuantLib::EndCriteria`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EndCriteria {
    /// Maximum number of iterations.
    pub max_iterations: usize,
    /// Maximum number of stationary-state iterations.
    pub max_stationary_state_iterations: usize,
    /// Root epsilon: stop when the simplex (or step) shrinks below this.
    pub root_epsilon: Real,
    /// Function epsilon: stop when the function value, or its change,
    /// drops below this.
    pub function_epsilon: Real,
    /// Gradient norm epsilon: stop when the gradient norm drops below this.
    pub gradient_norm_epsilon: Real,
}

impl EndCriteria {
    /// Create new end criteria.
    pub fn new(
        max_iterations: usize,
        max_stationary_state_iterations: usize,
        root_epsilon: Real,
        function_epsilon: Real,
        gradient_norm_epsilon: Real,
    ) -> Self {
        Self {
            max_iterations,
            max_stationary_state_iterations,
            root_epsilon,
            function_epsilon,
            gradient_norm_epsilon,
        }
    }

    /// Override the iteration cap.
    pub fn with_max_iterations(mut self, n: usize) -> Self {
        self.max_iterations = n;
        self
    }

    /// Override the function epsilon.
    pub fn with_function_epsilon(mut self, eps: Real) -> Self {
        self.function_epsilon = eps;
        self
    }

    /// `f <= function_epsilon` for a non-negative objective.
    pub fn check_stationary_function_accuracy(&self, f: Real) -> bool {
        f <= self.function_epsilon
    }

    /// Count one stationary iteration if `|f_new - f_old| < function_epsilon`;
    /// `true` once more than `max_stationary_state_iterations` accumulate.
    pub fn check_stationary_function_value(
        &self,
        f_old: Real,
        f_new: Real,
        stationary_iterations: &mut usize,
    ) -> bool {
        if (f_new - f_old).abs() >= self.function_epsilon {
            *stationary_iterations = 0;
            return false;
        }
        *stationary_iterations += 1;
        *stationary_iterations > self.max_stationary_state_iterations
    }
}

impl Default for EndCriteria {
    fn default() -> Self {
        Self {
            max_iterations: 1000,
            max_stationary_state_iterations: 100,
            root_epsilon: 1e-8,
            function_epsilon: 1e-8,
            gradient_norm_epsilon: 1e-8,
        }
    }
}

/// The reason an optimization terminated.
///
/// Corresponds to `QuantLib::EndCriteria::Type`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum EndCriteriaType {
    /// No criterion met.
    None,
    /// Maximum iterations reached.
    MaxIterations,
    /// The parameters stopped moving.
    StationaryPoint,
    /// The function value stopped changing.
    StationaryFunctionValue,
    /// The function value fell below the function epsilon.
    StationaryFunctionAccuracy,
    /// The gradient norm fell below its epsilon.
    ZeroGradientNorm,
    /// No step could reduce the function further.
    FunctionEpsilonTooSmall,
    /// Anything else.
    Unknown,
}

impl std::fmt::Display for EndCriteriaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "None",
            Self::MaxIterations => "MaxIterations",
            Self::StationaryPoint => "StationaryPoint",
            Self::StationaryFunctionValue => "StationaryFunctionValue",
            Self::StationaryFunctionAccuracy => "StationaryFunctionAccuracy",
            Self::ZeroGradientNorm => "ZeroGradientNorm",
            Self::FunctionEpsilonTooSmall => "FunctionEpsilonTooSmall",
            Self::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// Result of an optimization.
#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Final parameter values.
    pub x: Array,
    /// Final function value.
    pub value: Real,
    /// Number of iterations performed.
    pub iterations: usize,
    /// Reason for termination.
    pub end_type: EndCriteriaType,
}

/// A constrained minimiser.
///
/// Corresponds to `QuantLib::OptimizationMethod`.
pub trait OptimizationMethod: std::fmt::Debug + Send + Sync {
    /// Minimize `cost_fn` subject to `constraint`, starting from
    /// `initial_values`.
    ///
    /// # Errors
    /// Fails when the starting point violates the constraint or the cost is
    /// not finite there.  Running out of iterations is not an error; it is
    /// reported through [`OptimizationResult::end_type`].
    fn minimize(
        &self,
        cost_fn: &mut dyn CostFunction,
        constraint: &dyn Constraint,
        initial_values: &Array,
        end_criteria: &EndCriteria,
    ) -> Result<OptimizationResult>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_constraint() {
        let c = PositiveConstraint;
        assert!(c.test(&Array::from_slice(&[1.0, 2.0])));
        assert!(!c.test(&Array::from_slice(&[-1.0, 2.0])));
        assert!(!c.test(&Array::from_slice(&[0.0, 2.0])));
    }

    #[test]
    fn stationary_value_counter() {
        let ec = EndCriteria::new(100, 2, 0.0, 1e-6, 0.0);
        let mut count = 0;
        assert!(!ec.check_stationary_function_value(1.0, 1.0, &mut count));
        assert!(!ec.check_stationary_function_value(1.0, 1.0, &mut count));
        assert!(!ec.check_stationary_function_value(1.0, 0.5, &mut count));
        assert_eq!(count, 0);
        for _ in 0..2 {
            assert!(!ec.check_stationary_function_value(0.5, 0.5, &mut count));
        }
        assert!(ec.check_stationary_function_value(0.5, 0.5, &mut count));
    }

    #[test]
    fn end_type_display() {
        assert_eq!(
            EndCriteriaType::StationaryFunctionAccuracy.to_string(),
            "StationaryFunctionAccuracy"
        );
    }
}
