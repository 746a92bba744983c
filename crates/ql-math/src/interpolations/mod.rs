//! 1D interpolation trait, implementations and builders (translates
//! `ql/math/interpolation.hpp` and `ql/math/interpolations/`).
//!
//! Curves never hold a concrete interpolation type.  They hold an
//! [`InterpolationBuilder`] and rebuild an `Interpolation1D` over whatever
//! prefix of their nodes is currently known.  Builders also say whether the
//! scheme is *global* (moving one node can reshape the whole curve) and how
//! many points it needs before it can be built at all.

use ql_core::{errors::Result, Real};

/// Cubic schemes (natural spline, Fritsch–Butland).
pub mod cubic;

pub use cubic::{CubicNaturalSpline, FritschButlandCubic};

/// A 1D interpolation function `f: R → R` defined by a set of known points.
///
/// Outside `[x_min, x_max]` implementations extrapolate with their first or
/// last segment.
///
/// Corresponds to `QuantLib::Interpolation`.
pub trait Interpolation1D: std::fmt::Debug + Send + Sync {
    /// Evaluate the interpolation at `x`.
    fn operator(&self, x: Real) -> Real;

    /// Integral of the interpolant from `x_min()` to `x`.
    fn primitive(&self, x: Real) -> Real;

    /// Return the lower bound of the interpolation domain.
    fn x_min(&self) -> Real;

    /// Return the upper bound of the interpolation domain.
    fn x_max(&self) -> Real;

    /// Return `true` if `x` is within the interpolation range.
    fn is_in_range(&self, x: Real) -> bool {
        x >= self.x_min() && x <= self.x_max()
    }
}

/// Binary search: index `i` of the segment `[xs[i], xs[i+1]]` used for `x`,
/// clamped to the first and last segments.
pub(crate) fn locate(xs: &[Real], x: Real) -> usize {
    let n = xs.len();
    if x <= xs[0] {
        return 0;
    }
    if x >= xs[n - 1] {
        return n - 2;
    }
    xs.partition_point(|&xi| xi <= x) - 1
}

/// Common checks on interpolation nodes.
pub(crate) fn check_nodes(xs: &[Real], ys: &[Real], required: usize) -> Result<()> {
    ql_core::ensure!(
        xs.len() >= required,
        "not enough points to interpolate: at least {required} required, {} provided",
        xs.len()
    );
    ql_core::ensure!(
        xs.len() == ys.len(),
        "xs and ys must have the same length ({} vs {})",
        xs.len(),
        ys.len()
    );
    ql_core::ensure!(
        xs.windows(2).all(|w| w[0] < w[1]),
        "interpolation abscissae must be strictly increasing"
    );
    ql_core::ensure!(
        ys.iter().all(|y| y.is_finite()),
        "interpolation ordinates must be finite"
    );
    Ok(())
}

// ── Linear ────────────────────────────────────────────────────────────────────

/// Linear interpolation.
///
/// `f(x) = y[i] + (y[i+1] - y[i]) * (x - x[i]) / (x[i+1] - x[i])`
#[derive(Debug, Clone)]
pub struct LinearInterpolation {
    xs: Vec<Real>,
    ys: Vec<Real>,
    slopes: Vec<Real>,
    primitives: Vec<Real>,
}

impl LinearInterpolation {
    /// Construct a linear interpolation from sorted `xs` and corresponding `ys`.
    ///
    /// # Errors
    /// Returns an error if the slices have different lengths, fewer than 2
    /// points, or abscissae that are not strictly increasing.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        check_nodes(xs, ys, 2)?;
        let n = xs.len();
        let mut slopes = Vec::with_capacity(n - 1);
        let mut primitives = Vec::with_capacity(n);
        primitives.push(0.0);
        for i in 0..n - 1 {
            let dx = xs[i + 1] - xs[i];
            slopes.push((ys[i + 1] - ys[i]) / dx);
            primitives.push(primitives[i] + 0.5 * dx * (ys[i] + ys[i + 1]));
        }
        Ok(Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            slopes,
            primitives,
        })
    }
}

impl Interpolation1D for LinearInterpolation {
    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }

    fn operator(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        self.ys[i] + (x - self.xs[i]) * self.slopes[i]
    }

    fn primitive(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = x - self.xs[i];
        self.primitives[i] + dx * (self.ys[i] + 0.5 * dx * self.slopes[i])
    }
}

// ── Log-linear ────────────────────────────────────────────────────────────────

/// Log-linear interpolation.
///
/// Interpolates `log(y)` linearly and exponentiates the result.
#[derive(Debug, Clone)]
pub struct LogLinearInterpolation {
    inner: LinearInterpolation,
    primitives: Vec<Real>,
}

impl LogLinearInterpolation {
    /// Construct a log-linear interpolation.
    ///
    /// All `ys` values must be strictly positive.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        ql_core::ensure!(
            ys.iter().all(|&y| y > 0.0),
            "all y values must be positive for log-linear interpolation"
        );
        let log_ys: Vec<Real> = ys.iter().map(|&y| y.ln()).collect();
        let inner = LinearInterpolation::new(xs, &log_ys)?;
        let mut primitives = Vec::with_capacity(xs.len());
        primitives.push(0.0);
        for i in 0..xs.len() - 1 {
            let segment = segment_integral(ys[i], inner.slopes[i], xs[i + 1] - xs[i]);
            primitives.push(primitives[i] + segment);
        }
        Ok(Self { inner, primitives })
    }
}

/// `∫₀^dx y0·exp(s·u) du`, stable for small `s·dx`.
fn segment_integral(y0: Real, s: Real, dx: Real) -> Real {
    let z = s * dx;
    if z.abs() < 1e-8 {
        y0 * dx * (1.0 + 0.5 * z)
    } else {
        y0 * z.exp_m1() / s
    }
}

impl Interpolation1D for LogLinearInterpolation {
    fn x_min(&self) -> Real {
        self.inner.x_min()
    }

    fn x_max(&self) -> Real {
        self.inner.x_max()
    }

    fn operator(&self, x: Real) -> Real {
        self.inner.operator(x).exp()
    }

    fn primitive(&self, x: Real) -> Real {
        let xs = &self.inner.xs;
        let i = locate(xs, x);
        let y0 = self.inner.ys[i].exp();
        self.primitives[i] + segment_integral(y0, self.inner.slopes[i], x - xs[i])
    }
}

// ── Builders ──────────────────────────────────────────────────────────────────

/// Factory creating an interpolation from `(xs, ys)` slices.
///
/// This lets curves choose the interpolation method without knowing the
/// concrete type, and rebuild it as more nodes become known.
///
/// Corresponds to QuantLib's interpolator traits (`Linear`, `LogLinear`,
/// `Cubic`, ...).
pub trait InterpolationBuilder: std::fmt::Debug + Send + Sync {
    /// Build an interpolation from the given x and y values.
    fn build(&self, xs: &[Real], ys: &[Real]) -> Result<Box<dyn Interpolation1D>>;

    /// `true` when moving one node can change the interpolant away from
    /// that node's neighbourhood.
    fn is_global(&self) -> bool {
        false
    }

    /// Minimum number of points `build` accepts.
    fn required_points(&self) -> usize {
        2
    }
}

/// Linear interpolation builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct Linear;

impl InterpolationBuilder for Linear {
    fn build(&self, xs: &[Real], ys: &[Real]) -> Result<Box<dyn Interpolation1D>> {
        Ok(Box::new(LinearInterpolation::new(xs, ys)?))
    }
}

/// Log-linear interpolation builder.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLinear;

impl InterpolationBuilder for LogLinear {
    fn build(&self, xs: &[Real], ys: &[Real]) -> Result<Box<dyn Interpolation1D>> {
        Ok(Box::new(LogLinearInterpolation::new(xs, ys)?))
    }
}

/// Natural cubic spline builder (global, at least 3 points).
#[derive(Debug, Clone, Copy, Default)]
pub struct CubicNatural;

impl InterpolationBuilder for CubicNatural {
    fn build(&self, xs: &[Real], ys: &[Real]) -> Result<Box<dyn Interpolation1D>> {
        Ok(Box::new(CubicNaturalSpline::new(xs, ys)?))
    }

    fn is_global(&self) -> bool {
        true
    }

    fn required_points(&self) -> usize {
        3
    }
}

/// Fritsch–Butland monotone cubic builder (local).
#[derive(Debug, Clone, Copy, Default)]
pub struct FritschButland;

impl InterpolationBuilder for FritschButland {
    fn build(&self, xs: &[Real], ys: &[Real]) -> Result<Box<dyn Interpolation1D>> {
        Ok(Box::new(FritschButlandCubic::new(xs, ys)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn linear_interpolation() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 4.0];
        let interp = LinearInterpolation::new(&xs, &ys).unwrap();
        assert_abs_diff_eq!(interp.operator(0.5), 0.5, epsilon = 1e-12);
        assert_abs_diff_eq!(interp.operator(1.5), 2.5, epsilon = 1e-12);
        // extrapolation continues the last segment
        assert_abs_diff_eq!(interp.operator(3.0), 7.0, epsilon = 1e-12);
    }

    #[test]
    fn linear_primitive() {
        let interp = LinearInterpolation::new(&[0.0, 1.0, 3.0], &[1.0, 3.0, 3.0]).unwrap();
        assert_abs_diff_eq!(interp.primitive(0.0), 0.0, epsilon = 1e-14);
        assert_abs_diff_eq!(interp.primitive(1.0), 2.0, epsilon = 1e-14);
        assert_abs_diff_eq!(interp.primitive(2.0), 5.0, epsilon = 1e-14);
    }

    #[test]
    fn log_linear_interpolation() {
        let xs = [0.0, 1.0];
        let ys = [1.0, std::f64::consts::E];
        let interp = LogLinearInterpolation::new(&xs, &ys).unwrap();
        // At x=0.5, log(y)=0.5 → y = e^0.5
        assert_abs_diff_eq!(interp.operator(0.5), 0.5_f64.exp(), epsilon = 1e-12);
        // ∫₀¹ eˣ dx = e − 1
        assert_abs_diff_eq!(interp.primitive(1.0), std::f64::consts::E - 1.0, epsilon = 1e-12);
    }

    #[test]
    fn log_linear_rejects_non_positive_values() {
        assert!(LogLinearInterpolation::new(&[0.0, 1.0], &[1.0, -0.1]).is_err());
    }

    #[test]
    fn unsorted_abscissae_are_rejected() {
        assert!(LinearInterpolation::new(&[0.0, 1.0, 1.0], &[1.0, 2.0, 3.0]).is_err());
    }

    #[test]
    fn builder_properties() {
        assert!(!Linear.is_global());
        assert_eq!(Linear.required_points(), 2);
        assert!(CubicNatural.is_global());
        assert_eq!(CubicNatural.required_points(), 3);
        assert!(CubicNatural.build(&[0.0, 1.0], &[1.0, 2.0]).is_err());
        assert!(FritschButland.build(&[0.0, 1.0], &[1.0, 2.0]).is_ok());
    }
}
