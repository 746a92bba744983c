//! Cubic Hermite interpolations (translates
//! `ql/math/interpolations/cubicinterpolation.hpp`).
//!
//! Both schemes reduce to a slope per node; the shared helpers turn slopes
//! into per-segment polynomial coefficients.
//!
//! - **Natural spline**: slopes from the C² tridiagonal system with zero
//!   second derivative at both ends.  Global: every node moves every slope.
//! - **Fritsch–Butland**: weighted harmonic mean of adjacent secants.
//!   Local and monotonicity-preserving.

use ql_core::{errors::Result, Real};

use super::{check_nodes, locate, Interpolation1D};

// ── Shared helpers ────────────────────────────────────────────────────────────

/// Per-segment form `f(x) = y_i + dx*(a_i + dx*(b_i + dx*c_i))`, `dx = x - x_i`.
#[derive(Debug, Clone)]
struct CubicSegments {
    xs: Vec<Real>,
    ys: Vec<Real>,
    a: Vec<Real>,
    b: Vec<Real>,
    c: Vec<Real>,
    primitives: Vec<Real>,
}

impl CubicSegments {
    fn from_slopes(xs: &[Real], ys: &[Real], ts: &[Real]) -> Self {
        let n = xs.len();
        let mut a = Vec::with_capacity(n - 1);
        let mut b = Vec::with_capacity(n - 1);
        let mut c = Vec::with_capacity(n - 1);
        let mut primitives = Vec::with_capacity(n);
        primitives.push(0.0);

        for i in 0..n - 1 {
            let dx = xs[i + 1] - xs[i];
            let s = (ys[i + 1] - ys[i]) / dx;
            a.push(ts[i]);
            b.push((3.0 * s - ts[i + 1] - 2.0 * ts[i]) / dx);
            c.push((ts[i + 1] + ts[i] - 2.0 * s) / (dx * dx));
            let area = integral(ys[i], a[i], b[i], c[i], dx);
            primitives.push(primitives[i] + area);
        }

        Self {
            xs: xs.to_vec(),
            ys: ys.to_vec(),
            a,
            b,
            c,
            primitives,
        }
    }

    fn value(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = x - self.xs[i];
        self.ys[i] + dx * (self.a[i] + dx * (self.b[i] + dx * self.c[i]))
    }

    fn primitive(&self, x: Real) -> Real {
        let i = locate(&self.xs, x);
        let dx = x - self.xs[i];
        self.primitives[i] + integral(self.ys[i], self.a[i], self.b[i], self.c[i], dx)
    }

    fn x_min(&self) -> Real {
        self.xs[0]
    }

    fn x_max(&self) -> Real {
        self.xs[self.xs.len() - 1]
    }
}

fn integral(y: Real, a: Real, b: Real, c: Real, dx: Real) -> Real {
    dx * (y + dx * (a / 2.0 + dx * (b / 3.0 + dx * c / 4.0)))
}

fn secants(xs: &[Real], ys: &[Real]) -> (Vec<Real>, Vec<Real>) {
    let h: Vec<Real> = xs.windows(2).map(|w| w[1] - w[0]).collect();
    let s = ys
        .windows(2)
        .zip(&h)
        .map(|(w, dx)| (w[1] - w[0]) / dx)
        .collect();
    (h, s)
}

// ── Natural spline ────────────────────────────────────────────────────────────

/// Natural cubic spline (C², zero second derivative at both ends).
///
/// Corresponds to `QuantLib::CubicNaturalSpline`.
#[derive(Debug, Clone)]
pub struct CubicNaturalSpline {
    segments: CubicSegments,
}

impl CubicNaturalSpline {
    /// Build a natural spline; at least 3 points are required.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        check_nodes(xs, ys, 3)?;
        let n = xs.len();
        let (h, s) = secants(xs, ys);

        // Thomas algorithm for the interior second derivatives m[1..n-1].
        let mut m = vec![0.0; n];
        let mut diag = vec![0.0; n];
        let mut rhs = vec![0.0; n];
        for i in 1..n - 1 {
            diag[i] = 2.0 * (h[i - 1] + h[i]);
            rhs[i] = 6.0 * (s[i] - s[i - 1]);
        }
        for i in 2..n - 1 {
            let w = h[i - 1] / diag[i - 1];
            diag[i] -= w * h[i - 1];
            rhs[i] -= w * rhs[i - 1];
        }
        for i in (1..n - 1).rev() {
            m[i] = (rhs[i] - h[i] * m[i + 1]) / diag[i];
        }

        let mut ts = Vec::with_capacity(n);
        for i in 0..n - 1 {
            ts.push(s[i] - h[i] * (2.0 * m[i] + m[i + 1]) / 6.0);
        }
        ts.push(s[n - 2] + h[n - 2] * (m[n - 2] + 2.0 * m[n - 1]) / 6.0);

        Ok(Self {
            segments: CubicSegments::from_slopes(xs, ys, &ts),
        })
    }
}

impl Interpolation1D for CubicNaturalSpline {
    fn x_min(&self) -> Real {
        self.segments.x_min()
    }

    fn x_max(&self) -> Real {
        self.segments.x_max()
    }

    fn operator(&self, x: Real) -> Real {
        self.segments.value(x)
    }

    fn primitive(&self, x: Real) -> Real {
        self.segments.primitive(x)
    }
}

// ── FritschButland ────────────────────────────────────────────────────────────

/// Fritsch-Butland cubic interpolation (local, monotone-preserving).
///
/// Uses a weighted harmonic mean of adjacent secant slopes, producing a
/// C¹ interpolation that cannot introduce new extrema.  With two points it
/// degenerates to the straight line through them.
///
/// Corresponds to `QuantLib::FritschButlandCubic`.
#[derive(Debug, Clone)]
pub struct FritschButlandCubic {
    segments: CubicSegments,
}

impl FritschButlandCubic {
    /// Build a Fritsch-Butland cubic interpolation.
    pub fn new(xs: &[Real], ys: &[Real]) -> Result<Self> {
        check_nodes(xs, ys, 2)?;
        let n = xs.len();
        let (dx, s) = secants(xs, ys);

        if n == 2 {
            return Ok(Self {
                segments: CubicSegments::from_slopes(xs, ys, &[s[0], s[0]]),
            });
        }

        let mut ts = vec![0.0; n];
        for i in 1..n - 1 {
            let s_min = s[i - 1].min(s[i]);
            let s_max = s[i - 1].max(s[i]);
            let denom = s_max + 2.0 * s_min;
            ts[i] = if s_min * s_max <= 0.0 || denom == 0.0 {
                0.0
            } else {
                3.0 * s_min * s_max / denom
            };
        }

        // Parabolic end slopes, then clipped against the adjacent secant.
        ts[0] = ((2.0 * dx[0] + dx[1]) * s[0] - dx[0] * s[1]) / (dx[0] + dx[1]);
        ts[n - 1] = ((2.0 * dx[n - 2] + dx[n - 3]) * s[n - 2] - dx[n - 2] * s[n - 3])
            / (dx[n - 2] + dx[n - 3]);
        clip_end_slope(&mut ts[0], s[0]);
        clip_end_slope(&mut ts[n - 1], s[n - 2]);

        Ok(Self {
            segments: CubicSegments::from_slopes(xs, ys, &ts),
        })
    }
}

/// Hyman correction: same sign as the secant, at most three times its size.
fn clip_end_slope(t: &mut Real, secant: Real) {
    if *t * secant <= 0.0 {
        *t = 0.0;
    } else if t.abs() > 3.0 * secant.abs() {
        *t = t.signum() * 3.0 * secant.abs();
    }
}

impl Interpolation1D for FritschButlandCubic {
    fn x_min(&self) -> Real {
        self.segments.x_min()
    }

    fn x_max(&self) -> Real {
        self.segments.x_max()
    }

    fn operator(&self, x: Real) -> Real {
        self.segments.value(x)
    }

    fn primitive(&self, x: Real) -> Real {
        self.segments.primitive(x)
    }
}
