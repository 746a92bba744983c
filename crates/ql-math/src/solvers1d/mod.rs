//! 1D root-finding solvers (translates `ql/math/solvers1d/` and
//! `ql/math/solver1d.hpp`).
//!
//! Every solver starts from a caller-supplied guess inside a bracket
//! `[x_min, x_max]` over which the objective changes sign.  Objectives are
//! `FnMut` because the typical caller (a curve bootstrap) mutates state on
//! every evaluation.
//!
//! A root is accepted when `|f(x)| <= accuracy`, or when the bracket around
//! it has collapsed to machine precision.

use ql_core::{
    errors::{Error, Result},
    Real,
};

/// Default cap on function evaluations, as in `QuantLib::Solver1D`.
pub const MAX_EVALUATIONS: usize = 100;

/// A bracketing 1D root finder.
///
/// Corresponds to `QuantLib::Solver1D<Impl>`.
pub trait Solver1D: std::fmt::Debug + Send + Sync {
    /// Maximum number of function evaluations per call to `solve`.
    fn max_evaluations(&self) -> usize;

    /// Find `x` in `[x_min, x_max]` with `f(x) = 0`, starting from `guess`.
    ///
    /// # Errors
    /// * [`Error::NotBracketed`] when `f(x_min)` and `f(x_max)` share a sign.
    /// * [`Error::NonFinite`] when `f` returns NaN or an infinity.
    /// * [`Error::MaxEvaluations`] when the evaluation budget runs out.
    fn solve(
        &self,
        f: &mut dyn FnMut(Real) -> Real,
        accuracy: Real,
        guess: Real,
        x_min: Real,
        x_max: Real,
    ) -> Result<Real>;
}

/// Endpoint evaluation shared by all solvers.
struct Bracket {
    x_min: Real,
    x_max: Real,
    f_min: Real,
    f_max: Real,
    evaluations: usize,
}

enum Start {
    Root(Real),
    Bracket(Bracket),
}

fn evaluate(f: &mut dyn FnMut(Real) -> Real, x: Real) -> Result<Real> {
    let fx = f(x);
    if fx.is_finite() {
        Ok(fx)
    } else {
        Err(Error::NonFinite(x))
    }
}

fn bracket(
    f: &mut dyn FnMut(Real) -> Real,
    accuracy: Real,
    guess: Real,
    x_min: Real,
    x_max: Real,
) -> Result<Start> {
    ql_core::ensure!(
        accuracy > 0.0,
        "accuracy ({accuracy}) must be positive"
    );
    ql_core::ensure!(
        x_min < x_max,
        "invalid range: x_min ({x_min}) >= x_max ({x_max})"
    );
    ql_core::ensure!(
        guess >= x_min && guess <= x_max,
        "guess ({guess}) outside range [{x_min}, {x_max}]"
    );

    let f_min = evaluate(f, x_min)?;
    if f_min.abs() <= accuracy {
        return Ok(Start::Root(x_min));
    }
    let f_max = evaluate(f, x_max)?;
    if f_max.abs() <= accuracy {
        return Ok(Start::Root(x_max));
    }
    if f_min * f_max > 0.0 {
        return Err(Error::NotBracketed {
            x_min,
            x_max,
            f_min,
            f_max,
        });
    }
    Ok(Start::Bracket(Bracket {
        x_min,
        x_max,
        f_min,
        f_max,
        evaluations: 2,
    }))
}

// ── Brent ─────────────────────────────────────────────────────────────────────

/// Brent's method: bisection, secant and inverse quadratic interpolation.
///
/// Corresponds to `QuantLib::Brent`.
#[derive(Debug, Clone, Copy)]
pub struct Brent {
    max_evaluations: usize,
}

impl Brent {
    /// Create a Brent solver with the default evaluation cap.
    pub fn new() -> Self {
        Self {
            max_evaluations: MAX_EVALUATIONS,
        }
    }

    /// Override the evaluation cap.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = n;
        self
    }
}

impl Default for Brent {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver1D for Brent {
    fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    fn solve(
        &self,
        f: &mut dyn FnMut(Real) -> Real,
        accuracy: Real,
        guess: Real,
        x_min: Real,
        x_max: Real,
    ) -> Result<Real> {
        let Bracket {
            x_min: mut a,
            x_max: mut c,
            f_min: mut fa,
            f_max: mut fc,
            mut evaluations,
        } = match bracket(f, accuracy, guess, x_min, x_max)? {
            Start::Root(x) => return Ok(x),
            Start::Bracket(b) => b,
        };

        let mut b = guess;
        let mut fb = evaluate(f, b)?;
        evaluations += 1;

        // Keep the sign change between b and c.
        if fb * fa < 0.0 {
            c = a;
            fc = fa;
        } else {
            a = c;
            fa = fc;
        }
        let mut d = b - c;
        let mut e = d;

        while evaluations <= self.max_evaluations {
            if (fb > 0.0 && fc > 0.0) || (fb < 0.0 && fc < 0.0) {
                c = a;
                fc = fa;
                d = b - a;
                e = d;
            }
            if fc.abs() < fb.abs() {
                a = b;
                b = c;
                c = a;
                fa = fb;
                fb = fc;
                fc = fa;
            }
            let tol = 2.0 * f64::EPSILON * b.abs();
            let xm = 0.5 * (c - b);
            if fb.abs() <= accuracy || xm.abs() <= tol || fb == 0.0 {
                return Ok(b);
            }
            if e.abs() >= tol && fa.abs() > fb.abs() {
                let s = fb / fa;
                let (mut p, mut q) = if a == c {
                    (2.0 * xm * s, 1.0 - s)
                } else {
                    let q = fa / fc;
                    let r = fb / fc;
                    (
                        s * (2.0 * xm * q * (q - r) - (b - a) * (r - 1.0)),
                        (q - 1.0) * (r - 1.0) * (s - 1.0),
                    )
                };
                if p > 0.0 {
                    q = -q;
                }
                p = p.abs();
                let min1 = 3.0 * xm * q - (tol * q).abs();
                let min2 = (e * q).abs();
                if 2.0 * p < min1.min(min2) {
                    e = d;
                    d = p / q;
                } else {
                    d = xm;
                    e = d;
                }
            } else {
                d = xm;
                e = d;
            }
            a = b;
            fa = fb;
            b += if d.abs() > tol {
                d
            } else if xm > 0.0 {
                tol
            } else {
                -tol
            };
            fb = evaluate(f, b)?;
            evaluations += 1;
        }
        Err(Error::MaxEvaluations(self.max_evaluations))
    }
}

// ── Finite-Difference Newton-Safe ─────────────────────────────────────────────

/// Safe Newton iteration with a finite-difference derivative.
///
/// The derivative is the secant through the last two iterates, seeded from
/// the bracket end nearest the guess.  A bisection step replaces any Newton
/// step that would leave the current bracket or fails to halve the error.
///
/// Corresponds to `QuantLib::FiniteDifferenceNewtonSafe`.
#[derive(Debug, Clone, Copy)]
pub struct FiniteDifferenceNewtonSafe {
    max_evaluations: usize,
}

impl FiniteDifferenceNewtonSafe {
    /// Create a solver with the default evaluation cap.
    pub fn new() -> Self {
        Self {
            max_evaluations: MAX_EVALUATIONS,
        }
    }

    /// Override the evaluation cap.
    pub fn with_max_evaluations(mut self, n: usize) -> Self {
        self.max_evaluations = n;
        self
    }
}

impl Default for FiniteDifferenceNewtonSafe {
    fn default() -> Self {
        Self::new()
    }
}

impl Solver1D for FiniteDifferenceNewtonSafe {
    fn max_evaluations(&self) -> usize {
        self.max_evaluations
    }

    fn solve(
        &self,
        f: &mut dyn FnMut(Real) -> Real,
        accuracy: Real,
        guess: Real,
        x_min: Real,
        x_max: Real,
    ) -> Result<Real> {
        let Bracket {
            x_min,
            x_max,
            f_min,
            f_max,
            mut evaluations,
        } = match bracket(f, accuracy, guess, x_min, x_max)? {
            Start::Root(x) => return Ok(x),
            Start::Bracket(b) => b,
        };

        // Orient the search so that f(xl) < 0.
        let (mut xl, mut xh) = if f_min < 0.0 {
            (x_min, x_max)
        } else {
            (x_max, x_min)
        };

        let mut root = guess;
        let mut froot = evaluate(f, root)?;
        evaluations += 1;
        if froot.abs() <= accuracy {
            return Ok(root);
        }

        let mut dfroot = if x_max - root < root - x_min {
            (f_max - froot) / (x_max - root)
        } else {
            (f_min - froot) / (x_min - root)
        };
        let mut dx = x_max - x_min;

        while evaluations <= self.max_evaluations {
            let mut froot_old = froot;
            let mut root_old = root;
            let dx_old = dx;

            let out_of_range = ((root - xh) * dfroot - froot) * ((root - xl) * dfroot - froot) > 0.0;
            let too_slow = (2.0 * froot).abs() > (dx_old * dfroot).abs();
            if out_of_range || too_slow || !dfroot.is_finite() {
                dx = 0.5 * (xh - xl);
                root = xl + dx;
                // Too close to the previous iterate for a usable secant.
                if (root - root_old).abs() <= 2500.0 * f64::EPSILON * root.abs().max(1.0) {
                    root_old = xh;
                    froot_old = evaluate(f, xh)?;
                    evaluations += 1;
                }
            } else {
                dx = froot / dfroot;
                root -= dx;
            }

            froot = evaluate(f, root)?;
            evaluations += 1;
            if froot.abs() <= accuracy || dx.abs() <= 2.0 * f64::EPSILON * root.abs() {
                return Ok(root);
            }

            dfroot = (froot_old - froot) / (root_old - root);
            if froot < 0.0 {
                xl = root;
            } else {
                xh = root;
            }
        }
        Err(Error::MaxEvaluations(self.max_evaluations))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn solvers() -> Vec<Box<dyn Solver1D>> {
        vec![Box::new(Brent::new()), Box::new(FiniteDifferenceNewtonSafe::new())]
    }

    #[test]
    fn sqrt2_from_every_solver() {
        for solver in solvers() {
            let root = solver
                .solve(&mut |x| x * x - 2.0, 1e-14, 1.0, 0.0, 2.0)
                .unwrap();
            assert_abs_diff_eq!(root, 2.0_f64.sqrt(), epsilon = 1e-12);
        }
    }

    #[test]
    fn accuracy_is_measured_on_the_function() {
        // Steep objective: a tiny x error means a large f error.
        for solver in solvers() {
            let mut f = |x: Real| 1e6 * (x - 0.3);
            let root = solver.solve(&mut f, 1e-9, 0.5, 0.0, 1.0).unwrap();
            assert!(f(root).abs() <= 1e-9, "{solver:?}: f = {}", f(root));
        }
    }

    #[test]
    fn sin_near_pi() {
        for solver in solvers() {
            let root = solver.solve(&mut |x| x.sin(), 1e-14, 2.5, 2.0, 4.0).unwrap();
            assert_abs_diff_eq!(root, std::f64::consts::PI, epsilon = 1e-12);
        }
    }

    #[test]
    fn endpoint_root_is_returned() {
        let root = Brent::new()
            .solve(&mut |x| x - 1.0, 1e-12, 0.5, 0.0, 1.0)
            .unwrap();
        assert_eq!(root, 1.0);
    }

    #[test]
    fn not_bracketed() {
        for solver in solvers() {
            let err = solver
                .solve(&mut |x| x * x + 1.0, 1e-12, 0.5, 0.0, 1.0)
                .unwrap_err();
            assert!(matches!(err, Error::NotBracketed { .. }), "{err}");
        }
    }

    #[test]
    fn non_finite_objective_is_an_error() {
        let err = Brent::new()
            .solve(&mut |x| if x > 0.5 { f64::NAN } else { x - 0.75 }, 1e-12, 0.25, 0.0, 1.0)
            .unwrap_err();
        assert!(matches!(err, Error::NonFinite(_)));
    }

    #[test]
    fn evaluation_budget_is_enforced() {
        let solver = Brent::new().with_max_evaluations(3);
        let err = solver
            .solve(&mut |x| x.powi(3) - 0.1, 1e-15, 0.9, 0.0, 1.0)
            .unwrap_err();
        assert_eq!(err, Error::MaxEvaluations(3));
    }

    #[test]
    fn guess_must_lie_in_range() {
        assert!(Brent::new()
            .solve(&mut |x| x, 1e-12, 2.0, -1.0, 1.0)
            .is_err());
    }

    #[test]
    fn evaluations_are_sequential_and_counted() {
        let mut calls = 0usize;
        let root = FiniteDifferenceNewtonSafe::new()
            .solve(
                &mut |x| {
                    calls += 1;
                    x.exp() - 2.0
                },
                1e-13,
                0.1,
                0.0,
                1.0,
            )
            .unwrap();
        assert_abs_diff_eq!(root, 2.0_f64.ln(), epsilon = 1e-12);
        assert!(calls <= MAX_EVALUATIONS + 1);
    }
}
