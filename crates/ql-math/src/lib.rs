//! # ql-math
//!
//! Mathematical utilities for curve construction: 1D interpolation,
//! bracketing root finders, least-squares optimisation, and an `Array`
//! newtype over nalgebra.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `Array`: a dynamically-sized vector of reals.
pub mod array;

/// 1D interpolation schemes and interpolator factories.
pub mod interpolations;

/// Multi-dimensional optimisation (Levenberg–Marquardt, Nelder–Mead).
pub mod optimization;

/// 1D root-finding solvers.
pub mod solvers1d;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use array::Array;
pub use interpolations::{
    CubicNatural, CubicNaturalSpline, FritschButland, FritschButlandCubic, Interpolation1D,
    InterpolationBuilder, Linear, LinearInterpolation, LogLinear, LogLinearInterpolation,
};
pub use optimization::{
    Constraint, CostFunction, EndCriteria, EndCriteriaType, LevenbergMarquardt, NoConstraint,
    OptimizationMethod, OptimizationResult, PositiveConstraint, Simplex,
};
pub use solvers1d::{Brent, FiniteDifferenceNewtonSafe, Solver1D};
