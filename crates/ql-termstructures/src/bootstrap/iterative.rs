//! Node-by-node bootstrap (translates `ql/termstructures/iterativebootstrap.hpp`).

use std::sync::Arc;

use ql_core::Real;
use ql_math::{Brent, FiniteDifferenceNewtonSafe, Solver1D};
use tracing::{debug, info, trace, warn};

use super::curve_state::CurveState;
use super::error::{BootstrapError, BootstrapResult};
use super::helper::BootstrapHelper;
use super::node_error::NodeError;
use super::traits::BootstrapTraits;
use super::{Bootstrap, BootstrapReport, NodeDiagnostics};

/// Settings of [`IterativeBootstrap`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct IterativeBootstrapConfig {
    /// Solver accuracy; the curve accuracy when `None`.
    pub accuracy: Option<Real>,
    /// Fixed lower end of every bracket, replacing the strategy's.
    pub min_value: Option<Real>,
    /// Fixed upper end of every bracket, replacing the strategy's.
    pub max_value: Option<Real>,
    /// Solver attempts per node, each with a wider bracket.
    pub max_attempts: usize,
    /// Widening factor of the upper end.
    pub max_factor: Real,
    /// Widening factor of the lower end.
    pub min_factor: Real,
    /// Settle a node by grid scan instead of failing.
    pub dont_throw: bool,
    /// Grid steps of the fallback scan.
    pub dont_throw_steps: usize,
}

impl Default for IterativeBootstrapConfig {
    fn default() -> Self {
        Self {
            accuracy: None,
            min_value: None,
            max_value: None,
            max_attempts: 1,
            max_factor: 2.0,
            min_factor: 2.0,
            dont_throw: false,
            dont_throw_steps: 10,
        }
    }
}

impl IterativeBootstrapConfig {
    /// Override the solver accuracy.
    pub fn with_accuracy(mut self, accuracy: Real) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Fix the bracket of every node.
    pub fn with_bounds(mut self, min_value: Real, max_value: Real) -> Self {
        self.min_value = Some(min_value);
        self.max_value = Some(max_value);
        self
    }

    /// Allow `n` attempts per node.
    pub fn with_max_attempts(mut self, n: usize) -> Self {
        self.max_attempts = n;
        self
    }

    /// Bracket widening factors.
    pub fn with_factors(mut self, min_factor: Real, max_factor: Real) -> Self {
        self.min_factor = min_factor;
        self.max_factor = max_factor;
        self
    }

    /// Fall back to a grid scan of `steps` steps when a node cannot be
    /// solved.
    pub fn with_dont_throw(mut self, steps: usize) -> Self {
        self.dont_throw = true;
        self.dont_throw_steps = steps;
        self
    }

    fn validate(&self) -> BootstrapResult<()> {
        if self.max_attempts < 1 {
            return Err(BootstrapError::validation("max_attempts must be at least 1"));
        }
        if !(self.min_factor >= 1.0 && self.max_factor >= 1.0) {
            return Err(BootstrapError::validation(format!(
                "bracket factors ({}, {}) must be at least 1",
                self.min_factor, self.max_factor
            )));
        }
        if self.dont_throw_steps < 1 {
            return Err(BootstrapError::validation("dont_throw_steps must be at least 1"));
        }
        if let (Some(lo), Some(hi)) = (self.min_value, self.max_value) {
            if lo >= hi {
                return Err(BootstrapError::validation(format!(
                    "min value ({lo}) must be below max value ({hi})"
                )));
            }
        }
        if let Some(acc) = self.accuracy {
            if !(acc > 0.0) {
                return Err(BootstrapError::validation(format!(
                    "accuracy ({acc}) must be positive"
                )));
            }
        }
        Ok(())
    }
}

/// Solves one node at a time, in pillar order, with a bracketing 1D solver.
///
/// The first pass on fresh data uses Brent; later passes and warm starts
/// use the finite-difference Newton-safe solver.
///
/// Corresponds to `QuantLib::IterativeBootstrap<Curve>`.
#[derive(Debug)]
pub struct IterativeBootstrap {
    config: IterativeBootstrapConfig,
    first_solver: Box<dyn Solver1D>,
    solver: Box<dyn Solver1D>,
    first_alive: usize,
    alive: usize,
    loop_required: bool,
    initialized: bool,
}

impl Default for IterativeBootstrap {
    fn default() -> Self {
        Self::new(IterativeBootstrapConfig::default())
    }
}

/// Outcome of one node solve.
enum NodeOutcome {
    Settled(NodeDiagnostics),
    Restart,
}

impl IterativeBootstrap {
    /// Engine with the default solver pair.
    pub fn new(config: IterativeBootstrapConfig) -> Self {
        Self::with_solvers(
            config,
            Box::new(Brent::new()),
            Box::new(FiniteDifferenceNewtonSafe::new()),
        )
    }

    /// Engine with explicit solvers for fresh data and for refinement.
    pub fn with_solvers(
        config: IterativeBootstrapConfig,
        first_solver: Box<dyn Solver1D>,
        solver: Box<dyn Solver1D>,
    ) -> Self {
        Self {
            config,
            first_solver,
            solver,
            first_alive: 0,
            alive: 0,
            loop_required: false,
            initialized: false,
        }
    }

    /// Current settings.
    pub fn config(&self) -> &IterativeBootstrapConfig {
        &self.config
    }

    fn initialize(
        &mut self,
        curve: &mut CurveState,
        traits: &dyn BootstrapTraits,
        helpers: &mut [Arc<dyn BootstrapHelper>],
    ) -> BootstrapResult<()> {
        helpers.sort_by_key(|h| h.pillar_date());

        let reference_date = curve.reference_date();
        let first_alive = helpers
            .iter()
            .position(|h| h.pillar_date() > reference_date)
            .ok_or_else(|| {
                BootstrapError::validation(format!(
                    "all instruments expired (reference date {reference_date})"
                ))
            })?;
        let alive = helpers.len() - first_alive;
        let required = curve.interpolator().required_points();
        if alive + 1 < required {
            return Err(BootstrapError::validation(format!(
                "not enough alive instruments: {alive} provided, {} required",
                required - 1
            )));
        }

        let mut loop_required = curve.interpolator().is_global();
        let mut dates = Vec::with_capacity(alive + 1);
        dates.push(reference_date);
        let mut max_date = reference_date;
        for (k, helper) in helpers[first_alive..].iter().enumerate() {
            let pillar = helper.pillar_date();
            let latest = helper.latest_relevant_date();
            if dates.last() == Some(&pillar) {
                return Err(BootstrapError::validation(format!(
                    "more than one instrument with pillar {pillar}"
                )));
            }
            if latest <= max_date {
                return Err(BootstrapError::validation(format!(
                    "instrument {} (pillar {pillar}) has latest relevant date {latest} \
                     not after the previous one ({max_date})",
                    k + 1
                )));
            }
            max_date = latest;
            loop_required |= pillar != latest;
            dates.push(pillar);
        }

        let warm = curve.is_valid() && curve.data().len() == dates.len();
        curve.set_nodes(dates);
        curve.set_max_date(max_date);
        if !(warm && curve.interpolate_all().is_ok()) {
            let initial = traits.initial_value(curve);
            curve.reset_data(initial);
        }

        debug!(
            alive,
            expired = first_alive,
            loop_required,
            warm,
            "bootstrap layout initialized"
        );
        self.first_alive = first_alive;
        self.alive = alive;
        self.loop_required = loop_required;
        self.initialized = true;
        Ok(())
    }

    /// One full calibration attempt.  `Ok(false)` asks for a restart from
    /// scratch.
    fn run(
        &self,
        curve: &mut CurveState,
        traits: &dyn BootstrapTraits,
        helpers: &[Arc<dyn BootstrapHelper>],
        report: &mut BootstrapReport,
        allow_restart: bool,
    ) -> BootstrapResult<bool> {
        let accuracy = self.config.accuracy.unwrap_or(curve.accuracy());
        let max_iterations = traits.max_iterations().saturating_sub(1);
        let mut valid_data = curve.is_valid();
        let alive_helpers = &helpers[self.first_alive..];

        let mut iteration = 0;
        loop {
            let previous = curve.data().to_vec();
            report.nodes.clear();
            for i in 1..=self.alive {
                let helper = &*alive_helpers[i - 1];
                match self.solve_node(
                    curve,
                    traits,
                    helper,
                    i,
                    iteration,
                    valid_data,
                    accuracy,
                    allow_restart,
                )? {
                    NodeOutcome::Settled(diagnostics) => report.nodes.push(diagnostics),
                    NodeOutcome::Restart => return Ok(false),
                }
            }
            report.iterations = iteration + 1;

            if !self.loop_required {
                break;
            }

            let change = curve
                .data()
                .iter()
                .zip(&previous)
                .skip(1)
                .map(|(x, y)| (x - y).abs())
                .fold(0.0, Real::max);
            debug!(iteration = iteration + 1, change, "bootstrap pass completed");
            if change <= accuracy {
                break;
            }
            if iteration >= max_iterations {
                return Err(BootstrapError::ConvergenceFailure {
                    iterations: iteration + 1,
                    change,
                    accuracy,
                });
            }
            valid_data = true;
            iteration += 1;
        }
        Ok(true)
    }

    #[allow(clippy::too_many_arguments)]
    fn solve_node(
        &self,
        curve: &mut CurveState,
        traits: &dyn BootstrapTraits,
        helper: &dyn BootstrapHelper,
        i: usize,
        iteration: usize,
        valid_data: bool,
        accuracy: Real,
        allow_restart: bool,
    ) -> BootstrapResult<NodeOutcome> {
        let pillar = helper.pillar_date();
        let warm = curve.is_valid();
        let reference_date = curve.reference_date();
        let mut diagnostics = NodeDiagnostics::new(i, pillar);

        let initial_guess = traits.guess(i, curve, valid_data, self.first_alive);
        let (mut min, mut max) = (0.0, 0.0);
        let mut attempt = 0;
        loop {
            attempt += 1;
            if attempt == 1 {
                min = self
                    .config
                    .min_value
                    .unwrap_or_else(|| traits.min_value_after(i, curve, valid_data, self.first_alive));
                max = self
                    .config
                    .max_value
                    .unwrap_or_else(|| traits.max_value_after(i, curve, valid_data, self.first_alive));
            } else {
                min = if min < 0.0 {
                    min * self.config.min_factor
                } else {
                    min / self.config.min_factor
                };
                max = if max > 0.0 {
                    max * self.config.max_factor
                } else {
                    max / self.config.max_factor
                };
                warn!(node = i, attempt, min, max, "widening bootstrap bracket");
            }
            diagnostics.brackets.push((min, max));
            diagnostics.attempts = attempt;

            let guess = if initial_guess >= max {
                max - (max - min) / 5.0
            } else if initial_guess <= min {
                min + (max - min) / 5.0
            } else {
                initial_guess
            };

            if !valid_data {
                traits.update_guess(curve.data_mut(), guess, i);
                curve.extend_interpolation(i).map_err(|source| BootstrapError::SolveFailure {
                    iteration: iteration + 1,
                    instrument: i,
                    node: i,
                    pillar,
                    latest_relevant_date: helper.latest_relevant_date(),
                    reference_date,
                    source,
                })?;
            }

            let solver = if valid_data {
                &*self.solver
            } else {
                &*self.first_solver
            };
            let mut error = NodeError::new(curve, traits, helper, i);
            let result = solver.solve(&mut |x| error.value(x), accuracy, guess, min, max);

            match result {
                Ok(root) => {
                    // Leave the curve at the root rather than at the last trial.
                    error.value(root);
                    diagnostics.value = root;
                    debug!(node = i, %pillar, value = root, attempts = attempt, "node solved");
                    return Ok(NodeOutcome::Settled(diagnostics));
                }
                Err(source) => {
                    if warm && allow_restart {
                        warn!(
                            node = i,
                            %pillar,
                            error = %source,
                            "warm-start solve failed; restarting from scratch"
                        );
                        return Ok(NodeOutcome::Restart);
                    }
                    if attempt < self.config.max_attempts {
                        continue;
                    }
                    if self.config.dont_throw {
                        self.fallback_scan(&mut error, min, max, &mut diagnostics);
                        return Ok(NodeOutcome::Settled(diagnostics));
                    }
                    return Err(BootstrapError::SolveFailure {
                        iteration: iteration + 1,
                        instrument: i,
                        node: i,
                        pillar,
                        latest_relevant_date: helper.latest_relevant_date(),
                        reference_date,
                        source,
                    });
                }
            }
        }
    }

    /// Settle a node at the grid point with the smallest absolute error.
    fn fallback_scan(
        &self,
        error: &mut NodeError<'_>,
        min: Real,
        max: Real,
        diagnostics: &mut NodeDiagnostics,
    ) {
        let steps = self.config.dont_throw_steps;
        let step = (max - min) / steps as Real;
        let (mut best_x, mut best_error) = (min, Real::INFINITY);
        for k in 0..=steps {
            let x = min + k as Real * step;
            let e = error.value(x);
            trace!(node = error.node(), x, error = e, "fallback scan sample");
            diagnostics.scan.push((x, e));
            let abs = if e.is_nan() { Real::INFINITY } else { e.abs() };
            if abs < best_error {
                best_x = x;
                best_error = abs;
            }
        }
        error.value(best_x);
        diagnostics.value = best_x;
        diagnostics.degraded = true;
        warn!(
            node = error.node(),
            value = best_x,
            error = best_error,
            "no root found; node settled by grid scan"
        );
    }
}

impl Bootstrap for IterativeBootstrap {
    fn setup(
        &mut self,
        curve: &CurveState,
        helpers: &[Arc<dyn BootstrapHelper>],
    ) -> BootstrapResult<()> {
        self.config.validate()?;
        let n = helpers.len();
        if n == 0 {
            return Err(BootstrapError::validation("no bootstrap helpers given"));
        }
        let required = curve.interpolator().required_points();
        if n + 1 < required {
            return Err(BootstrapError::validation(format!(
                "not enough bootstrap helpers: {n} provided, {} required",
                required - 1
            )));
        }
        self.loop_required = curve.interpolator().is_global();
        self.initialized = false;
        Ok(())
    }

    fn calculate(
        &mut self,
        curve: &mut CurveState,
        traits: &dyn BootstrapTraits,
        helpers: &mut [Arc<dyn BootstrapHelper>],
    ) -> BootstrapResult<BootstrapReport> {
        if !self.initialized {
            self.initialize(curve, traits, helpers)?;
        }
        for (k, helper) in helpers[self.first_alive..].iter().enumerate() {
            if !helper.quote_is_valid() {
                return Err(BootstrapError::validation(format!(
                    "instrument {} (maturity {}) has an invalid quote",
                    k + 1,
                    helper.pillar_date()
                )));
            }
        }

        let mut report = BootstrapReport::default();
        if !self.run(curve, traits, helpers, &mut report, true)? {
            curve.set_valid(false);
            self.initialized = false;
            self.initialize(curve, traits, helpers)?;
            report.restarted = true;
            // A cold run never asks for a restart.
            self.run(curve, traits, helpers, &mut report, false)?;
        }

        curve.set_valid(true);
        info!(
            iterations = report.iterations,
            alive = self.alive,
            restarted = report.restarted,
            degraded = report.degraded(),
            "curve bootstrapped"
        );
        Ok(report)
    }

    fn reset_layout(&mut self) {
        self.initialized = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::curve_state::BootstrapCurve;
    use crate::bootstrap::traits::Discount;
    use crate::bootstrap::BootstrapErrorKind;
    use approx::assert_abs_diff_eq;
    use ql_math::{CubicNatural, Linear, LogLinear};
    use ql_time::{Actual365Fixed, Date, DateExt, Tenor};

    #[derive(Debug)]
    struct ZeroBond {
        maturity: Date,
        price: Option<Real>,
    }

    impl BootstrapHelper for ZeroBond {
        fn pillar_date(&self) -> Date {
            self.maturity
        }
        fn latest_relevant_date(&self) -> Date {
            self.maturity
        }
        fn quote(&self) -> Option<Real> {
            self.price
        }
        fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Real {
            curve.discount_date(self.maturity)
        }
    }

    fn today() -> Date {
        Date::try_ymd(2025, 1, 2).unwrap()
    }

    fn bonds(prices: &[(u32, Real)]) -> Vec<Arc<dyn BootstrapHelper>> {
        prices
            .iter()
            .map(|&(years, p)| {
                Arc::new(ZeroBond {
                    maturity: today().advance(Tenor::Years(years)).unwrap(),
                    price: Some(p),
                }) as Arc<dyn BootstrapHelper>
            })
            .collect()
    }

    fn state(builder: Arc<dyn ql_math::InterpolationBuilder>) -> CurveState {
        CurveState::new(today(), Arc::new(Actual365Fixed), builder)
    }

    #[test]
    fn zero_bonds_are_repriced_node_by_node() {
        let mut helpers = bonds(&[(2, 0.93), (1, 0.97), (3, 0.9)]);
        let mut curve = state(Arc::new(LogLinear));
        let mut engine = IterativeBootstrap::default();
        engine.setup(&curve, &helpers).unwrap();
        let report = engine.calculate(&mut curve, &Discount, &mut helpers).unwrap();

        assert_eq!(report.iterations, 1);
        assert!(curve.is_valid());
        assert_eq!(curve.data()[0], 1.0);
        for (node, price) in [(1, 0.97), (2, 0.93), (3, 0.9)] {
            assert_abs_diff_eq!(curve.data()[node], price, epsilon = 1e-12);
        }
        for node in &report.nodes {
            let (lo, hi) = node.brackets[node.brackets.len() - 1];
            assert!(lo <= node.value && node.value <= hi);
        }
    }

    #[test]
    fn global_interpolation_needs_the_convergence_loop() {
        let mut helpers = bonds(&[(1, 0.97), (2, 0.93), (3, 0.9), (5, 0.83)]);
        let mut curve = state(Arc::new(CubicNatural));
        let mut engine = IterativeBootstrap::default();
        engine.setup(&curve, &helpers).unwrap();
        let report = engine.calculate(&mut curve, &Discount, &mut helpers).unwrap();
        assert!(report.iterations > 1);
        assert!(!curve.uses_linear_fallback());
        assert_abs_diff_eq!(curve.data()[4], 0.83, epsilon = 1e-10);
    }

    #[test]
    fn duplicate_pillars_are_rejected_before_solving() {
        let mut helpers = bonds(&[(1, 0.97), (1, 0.96)]);
        let mut curve = state(Arc::new(Linear));
        let mut engine = IterativeBootstrap::default();
        engine.setup(&curve, &helpers).unwrap();
        let err = engine.calculate(&mut curve, &Discount, &mut helpers).unwrap_err();
        assert_eq!(err.kind(), BootstrapErrorKind::Validation);
        assert!(curve.data().is_empty());
    }

    #[test]
    fn missing_quote_is_a_validation_error() {
        let mut helpers: Vec<Arc<dyn BootstrapHelper>> = vec![Arc::new(ZeroBond {
            maturity: today().advance(Tenor::Years(1)).unwrap(),
            price: None,
        })];
        let mut curve = state(Arc::new(Linear));
        let mut engine = IterativeBootstrap::default();
        engine.setup(&curve, &helpers).unwrap();
        let err = engine.calculate(&mut curve, &Discount, &mut helpers).unwrap_err();
        assert!(err.to_string().contains("invalid quote"), "{err}");
    }

    #[test]
    fn unreachable_quote_fails_with_context() {
        // Far above every bracket tried.
        let mut helpers = bonds(&[(1, 50.0)]);
        let mut curve = state(Arc::new(Linear));
        let mut engine = IterativeBootstrap::new(IterativeBootstrapConfig::default().with_max_attempts(2));
        engine.setup(&curve, &helpers).unwrap();
        let err = engine.calculate(&mut curve, &Discount, &mut helpers).unwrap_err();
        match err {
            BootstrapError::SolveFailure {
                iteration,
                instrument,
                node,
                reference_date,
                ..
            } => {
                assert_eq!((iteration, instrument, node), (1, 1, 1));
                assert_eq!(reference_date, today());
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn retries_widen_the_bracket() {
        // e^{-1} < 0.2 < e^{-1}/2: solvable only after one widening.
        let mut helpers = bonds(&[(1, 0.2)]);
        let mut curve = state(Arc::new(Linear));
        let mut engine = IterativeBootstrap::new(IterativeBootstrapConfig::default().with_max_attempts(3));
        engine.setup(&curve, &helpers).unwrap();
        let report = engine.calculate(&mut curve, &Discount, &mut helpers).unwrap();
        let node = &report.nodes[0];
        assert_eq!(node.attempts, 2);
        assert_abs_diff_eq!(node.brackets[1].0, node.brackets[0].0 / 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(node.brackets[1].1, node.brackets[0].1 * 2.0, epsilon = 1e-15);
        assert_abs_diff_eq!(curve.data()[1], 0.2, epsilon = 1e-12);
    }

    #[test]
    fn dont_throw_settles_on_the_best_grid_point() {
        let mut helpers = bonds(&[(1, 5.0)]);
        let mut curve = state(Arc::new(Linear));
        let mut engine = IterativeBootstrap::new(IterativeBootstrapConfig::default().with_dont_throw(10));
        engine.setup(&curve, &helpers).unwrap();
        let report = engine.calculate(&mut curve, &Discount, &mut helpers).unwrap();
        let node = &report.nodes[0];
        assert!(report.degraded() && node.degraded);
        assert_eq!(node.scan.len(), 11);
        let (_, chosen) = node.scan.iter().copied().find(|&(x, _)| x == node.value).unwrap();
        assert!(node.scan.iter().all(|&(_, e)| chosen.abs() <= e.abs()));
        // The upper end is the closest point to an unreachable high price.
        assert_abs_diff_eq!(node.value, node.brackets[0].1, epsilon = 1e-12);
        assert_eq!(curve.data()[1], node.value);
    }

    #[test]
    fn invalid_configuration_is_rejected() {
        let helpers = bonds(&[(1, 0.97)]);
        let curve = state(Arc::new(Linear));
        for config in [
            IterativeBootstrapConfig::default().with_max_attempts(0),
            IterativeBootstrapConfig::default().with_factors(0.5, 2.0),
            IterativeBootstrapConfig::default().with_bounds(1.0, 0.5),
            IterativeBootstrapConfig::default().with_accuracy(0.0),
        ] {
            let mut engine = IterativeBootstrap::new(config);
            let err = engine.setup(&curve, &helpers).unwrap_err();
            assert_eq!(err.kind(), BootstrapErrorKind::Validation);
        }
    }
}
