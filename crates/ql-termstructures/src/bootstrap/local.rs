//! Sliding-window least-squares bootstrap (translates
//! `ql/termstructures/localbootstrap.hpp`).

use std::sync::Arc;

use ql_core::Real;
use ql_math::{
    Array, Constraint, CostFunction, EndCriteria, EndCriteriaType, LevenbergMarquardt,
    NoConstraint, OptimizationMethod, PositiveConstraint,
};
use tracing::{debug, info};

use super::curve_state::CurveState;
use super::error::{BootstrapError, BootstrapResult};
use super::helper::BootstrapHelper;
use super::penalty::PenaltyFunction;
use super::traits::BootstrapTraits;
use super::{Bootstrap, BootstrapReport, WindowDiagnostics};

/// Settings of [`LocalBootstrap`].
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct LocalBootstrapConfig {
    /// Instruments (and free nodes) per window.
    pub localisation: usize,
    /// Keep node values strictly positive.
    pub force_positive: bool,
    /// Fit accuracy; the curve accuracy when `None`.
    pub accuracy: Option<Real>,
    /// Minimizer; Levenberg–Marquardt at the fit accuracy when `None`.
    #[cfg_attr(feature = "serde", serde(skip))]
    pub optimizer: Option<Arc<dyn OptimizationMethod>>,
    /// Minimizer stopping rules; `EndCriteria(100, 10, 0, accuracy²/2, 0)`
    /// when `None`.
    pub end_criteria: Option<EndCriteria>,
}

impl Default for LocalBootstrapConfig {
    fn default() -> Self {
        Self {
            localisation: 2,
            force_positive: true,
            accuracy: None,
            optimizer: None,
            end_criteria: None,
        }
    }
}

impl LocalBootstrapConfig {
    /// Window size.
    pub fn with_localisation(mut self, localisation: usize) -> Self {
        self.localisation = localisation;
        self
    }

    /// Toggle the positivity constraint.
    pub fn with_force_positive(mut self, force_positive: bool) -> Self {
        self.force_positive = force_positive;
        self
    }

    /// Override the fit accuracy.
    pub fn with_accuracy(mut self, accuracy: Real) -> Self {
        self.accuracy = Some(accuracy);
        self
    }

    /// Use a different minimizer.
    pub fn with_optimizer(mut self, optimizer: Arc<dyn OptimizationMethod>) -> Self {
        self.optimizer = Some(optimizer);
        self
    }

    /// Override the minimizer stopping rules.
    pub fn with_end_criteria(mut self, end_criteria: EndCriteria) -> Self {
        self.end_criteria = Some(end_criteria);
        self
    }
}

/// Fits `localisation` nodes at a time to `localisation` instruments,
/// sliding the window forward one instrument per step.
///
/// Corresponds to `QuantLib::LocalBootstrap<Curve>`.
#[derive(Debug, Default)]
pub struct LocalBootstrap {
    config: LocalBootstrapConfig,
}

impl LocalBootstrap {
    /// Engine with the given settings.
    pub fn new(config: LocalBootstrapConfig) -> Self {
        Self { config }
    }

    /// Current settings.
    pub fn config(&self) -> &LocalBootstrapConfig {
        &self.config
    }

    fn layout(
        &self,
        curve: &mut CurveState,
        traits: &dyn BootstrapTraits,
        helpers: &mut [Arc<dyn BootstrapHelper>],
    ) -> BootstrapResult<bool> {
        helpers.sort_by_key(|h| h.latest_relevant_date());

        let reference_date = curve.reference_date();
        let mut dates = Vec::with_capacity(helpers.len() + 1);
        dates.push(reference_date);
        for (k, helper) in helpers.iter().enumerate() {
            let latest = helper.latest_relevant_date();
            if k > 0 && dates.last() == Some(&latest) {
                return Err(BootstrapError::validation(format!(
                    "more than one instrument with maturity {latest}"
                )));
            }
            if latest <= reference_date {
                return Err(BootstrapError::validation(format!(
                    "instrument {} has latest relevant date {latest} \
                     not after the reference date ({reference_date})",
                    k + 1
                )));
            }
            if !helper.quote_is_valid() {
                return Err(BootstrapError::validation(format!(
                    "instrument {} (maturity {latest}) has an invalid quote",
                    k + 1
                )));
            }
            dates.push(latest);
        }

        let warm = curve.is_valid() && curve.data().len() == dates.len();
        let max_date = dates[dates.len() - 1];
        curve.set_nodes(dates);
        curve.set_max_date(max_date);
        if !warm {
            let initial = traits.initial_value(curve);
            curve.reset_data(initial);
        }
        Ok(warm)
    }
}

impl Bootstrap for LocalBootstrap {
    fn setup(
        &mut self,
        curve: &CurveState,
        helpers: &[Arc<dyn BootstrapHelper>],
    ) -> BootstrapResult<()> {
        let n = helpers.len();
        let localisation = self.config.localisation;
        if localisation < 1 {
            return Err(BootstrapError::validation("localisation must be at least 1"));
        }
        let required = curve.interpolator().required_points();
        if n < required {
            return Err(BootstrapError::validation(format!(
                "not enough instruments: {n} provided, {required} required"
            )));
        }
        if n <= localisation {
            return Err(BootstrapError::validation(format!(
                "not enough instruments: {n} provided, localisation {localisation} needs more"
            )));
        }
        Ok(())
    }

    fn calculate(
        &mut self,
        curve: &mut CurveState,
        traits: &dyn BootstrapTraits,
        helpers: &mut [Arc<dyn BootstrapHelper>],
    ) -> BootstrapResult<BootstrapReport> {
        let warm = self.layout(curve, traits, helpers)?;

        let n = helpers.len();
        let localisation = self.config.localisation;
        let accuracy = self.config.accuracy.unwrap_or(curve.accuracy());
        let optimizer: Arc<dyn OptimizationMethod> = match &self.config.optimizer {
            Some(optimizer) => Arc::clone(optimizer),
            None => Arc::new(LevenbergMarquardt::new(accuracy, accuracy, accuracy)),
        };
        let end_criteria = self
            .config
            .end_criteria
            .clone()
            .unwrap_or_else(|| EndCriteria::new(100, 10, 0.0, 0.5 * accuracy * accuracy, 0.0));
        let constraint: &dyn Constraint = if self.config.force_positive {
            &PositiveConstraint
        } else {
            &NoConstraint
        };

        let mut report = BootstrapReport::default();
        for w in (localisation - 1)..n {
            let window = w + 1;
            let first_instrument = w + 1 - localisation;
            let first_node = first_instrument + 1;
            let last_node = w + 1;

            if !warm {
                // A cold window's newest node starts from its predecessor.
                let data = curve.data_mut();
                data[last_node] = data[last_node - 1];
            }
            curve
                .extend_interpolation(last_node)
                .map_err(|e| BootstrapError::MinimizerFailure {
                    window,
                    end_type: EndCriteriaType::None,
                    value: Real::NAN,
                    source: Some(e),
                })?;

            let initial = Array::from_slice(&curve.data()[first_node..=last_node]);
            let mut penalty =
                PenaltyFunction::new(curve, traits, &helpers[first_instrument..=w], first_node);
            let result = optimizer
                .minimize(&mut penalty, constraint, &initial, &end_criteria)
                .map_err(|e| BootstrapError::MinimizerFailure {
                    window,
                    end_type: EndCriteriaType::Unknown,
                    value: Real::NAN,
                    source: Some(e),
                })?;
            match result.end_type {
                EndCriteriaType::StationaryFunctionValue
                | EndCriteriaType::StationaryFunctionAccuracy => {}
                end_type => {
                    return Err(BootstrapError::MinimizerFailure {
                        window,
                        end_type,
                        value: result.value,
                        source: None,
                    })
                }
            }
            // The minimizer's last trial is not necessarily its optimum.
            penalty.values(&result.x);

            debug!(
                window,
                end_type = %result.end_type,
                value = result.value,
                iterations = result.iterations,
                "window fitted"
            );
            report.windows.push(WindowDiagnostics {
                window,
                end_type: result.end_type,
                value: result.value,
                iterations: result.iterations,
            });
        }

        curve.interpolate_all().map_err(|e| BootstrapError::MinimizerFailure {
            window: n,
            end_type: EndCriteriaType::None,
            value: Real::NAN,
            source: Some(e),
        })?;
        curve.set_valid(true);
        report.iterations = 1;
        info!(instruments = n, localisation, "curve bootstrapped");
        Ok(report)
    }

    fn reset_layout(&mut self) {}
}
