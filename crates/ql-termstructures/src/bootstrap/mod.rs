//! Curve bootstrapping (translates `ql/termstructures/iterativebootstrap.hpp`,
//! `ql/termstructures/localbootstrap.hpp` and `ql/termstructures/bootstraperror.hpp`).
//!
//! A bootstrap solves for the node values of a [`CurveState`] so that every
//! calibrating [`BootstrapHelper`] reprices its market quote.  Two engines are
//! provided:
//!
//! * [`IterativeBootstrap`]: one 1D root search per node, repeated in passes
//!   until the node values settle whenever the interpolation is non-local or
//!   an instrument's pillar differs from its latest relevant date;
//! * [`LocalBootstrap`]: a least-squares fit over a sliding window of
//!   instruments and nodes.
//!
//! What a node value means (discount factor, zero rate, survival probability
//! or hazard rate) is decided by a [`BootstrapTraits`] strategy.

use std::sync::Arc;

use ql_core::{Real, Time};
use ql_math::EndCriteriaType;
use ql_time::Date;

mod curve_state;
mod error;
mod helper;
mod iterative;
mod local;
mod node_error;
mod penalty;
mod traits;

pub use curve_state::{BootstrapCurve, CurveState, DEFAULT_ACCURACY};
pub use error::{BootstrapError, BootstrapErrorKind, BootstrapResult};
pub use helper::{BootstrapHelper, Pillar};
pub use iterative::{IterativeBootstrap, IterativeBootstrapConfig};
pub use local::{LocalBootstrap, LocalBootstrapConfig};
pub use node_error::NodeError;
pub use penalty::PenaltyFunction;
pub use traits::{
    BootstrapTraits, CurveKind, Discount, HazardRate, SurvivalProbability, ZeroYield, AVG_HAZARD_RATE,
    AVG_RATE, MAX_HAZARD_RATE, MAX_RATE,
};

/// A calibration engine.
///
/// Engines keep whatever layout they derived from the instruments between
/// calls, so that a recalculation after a quote change starts from the
/// previous solution.
pub trait Bootstrap: std::fmt::Debug + Send + Sync {
    /// Check the instrument set against the curve before the first
    /// calculation.
    ///
    /// # Errors
    /// [`BootstrapError::Validation`] when the set cannot determine the curve.
    fn setup(
        &mut self,
        curve: &CurveState,
        helpers: &[Arc<dyn BootstrapHelper>],
    ) -> BootstrapResult<()>;

    /// Solve for the node values of `curve`.  `helpers` may be reordered.
    ///
    /// # Errors
    /// Any [`BootstrapError`]; the curve is left invalid.
    fn calculate(
        &mut self,
        curve: &mut CurveState,
        traits: &dyn BootstrapTraits,
        helpers: &mut [Arc<dyn BootstrapHelper>],
    ) -> BootstrapResult<BootstrapReport>;

    /// Forget the derived layout; the next calculation rebuilds node dates.
    /// Called after the reference date moved.
    fn reset_layout(&mut self);
}

/// What a calculation did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BootstrapReport {
    /// Passes over the nodes (1 for the local engine).
    pub iterations: usize,
    /// `true` when a warm start failed and the curve was rebuilt from
    /// scratch.
    pub restarted: bool,
    /// Per-node record of the last pass (iterative engine).
    pub nodes: Vec<NodeDiagnostics>,
    /// Per-window record (local engine).
    pub windows: Vec<WindowDiagnostics>,
}

impl BootstrapReport {
    /// `true` if any node was settled by the fallback scan.
    pub fn degraded(&self) -> bool {
        self.nodes.iter().any(|n| n.degraded)
    }
}

/// How one node was solved.
#[derive(Debug, Clone, PartialEq)]
pub struct NodeDiagnostics {
    /// Node index (at least 1).
    pub node: usize,
    /// Pillar date of the node.
    pub pillar: Date,
    /// Every bracket tried, in order.
    pub brackets: Vec<(Real, Real)>,
    /// Solver attempts made.
    pub attempts: usize,
    /// `true` when no root was found and the value comes from a grid scan.
    pub degraded: bool,
    /// `(value, error)` samples of the grid scan.
    pub scan: Vec<(Real, Real)>,
    /// Settled node value.
    pub value: Real,
}

impl NodeDiagnostics {
    fn new(node: usize, pillar: Date) -> Self {
        Self {
            node,
            pillar,
            brackets: Vec::new(),
            attempts: 0,
            degraded: false,
            scan: Vec::new(),
            value: Real::NAN,
        }
    }
}

/// How one window of the local engine was fitted.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowDiagnostics {
    /// Last instrument of the window, counted from 1.
    pub window: usize,
    /// Minimizer termination.
    pub end_type: EndCriteriaType,
    /// Penalty at the optimum.
    pub value: Real,
    /// Minimizer iterations.
    pub iterations: usize,
}

/// Everything a bootstrapped curve owns: node state, strategy, instruments
/// and engine.
#[derive(Debug)]
pub(crate) struct Calibration {
    state: CurveState,
    traits: Box<dyn BootstrapTraits>,
    helpers: Vec<Arc<dyn BootstrapHelper>>,
    engine: Box<dyn Bootstrap>,
    report: BootstrapReport,
}

impl Calibration {
    /// Set up `engine` and run the first calculation.
    pub(crate) fn new(
        state: CurveState,
        traits: Box<dyn BootstrapTraits>,
        helpers: Vec<Arc<dyn BootstrapHelper>>,
        mut engine: Box<dyn Bootstrap>,
    ) -> BootstrapResult<Self> {
        engine.setup(&state, &helpers)?;
        let mut calibration = Self {
            state,
            traits,
            helpers,
            engine,
            report: BootstrapReport::default(),
        };
        calibration.recalculate()?;
        Ok(calibration)
    }

    pub(crate) fn state(&self) -> &CurveState {
        &self.state
    }

    pub(crate) fn helpers(&self) -> &[Arc<dyn BootstrapHelper>] {
        &self.helpers
    }

    pub(crate) fn report(&self) -> &BootstrapReport {
        &self.report
    }

    pub(crate) fn factor(&self, t: Time) -> Real {
        self.traits.factor(&self.state, t)
    }

    /// Market minus model for every instrument, in calibration order.
    pub(crate) fn quote_errors(&self) -> Vec<Real> {
        let view = BootstrapCurve::new(&self.state, &*self.traits);
        self.helpers.iter().map(|h| h.quote_error(&view)).collect()
    }

    /// Calibrate again, warm-starting from the current nodes when they are
    /// valid.
    pub(crate) fn recalculate(&mut self) -> BootstrapResult<&BootstrapReport> {
        match self
            .engine
            .calculate(&mut self.state, &*self.traits, &mut self.helpers)
        {
            Ok(report) => {
                self.report = report;
                Ok(&self.report)
            }
            Err(e) => {
                self.state.set_valid(false);
                Err(e)
            }
        }
    }

    /// Move the reference date and calibrate again.
    pub(crate) fn set_reference_date(&mut self, date: Date) -> BootstrapResult<&BootstrapReport> {
        self.state.set_reference_date(date);
        self.engine.reset_layout();
        self.recalculate()
    }
}
