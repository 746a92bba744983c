//! Calibration failures.

use ql_core::Real;
use ql_math::EndCriteriaType;
use ql_time::Date;
use thiserror::Error;

/// Result alias for curve calibration.
pub type BootstrapResult<T> = std::result::Result<T, BootstrapError>;

/// Why a curve could not be calibrated.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BootstrapError {
    /// The instrument set or the curve setup is unusable; raised before any
    /// solve is attempted.
    #[error("invalid bootstrap input: {0}")]
    Validation(String),

    /// The root search for one node failed after every retry.
    #[error(
        "iteration {iteration}: failed at instrument {instrument} (node {node}), \
         pillar {pillar}, latest relevant date {latest_relevant_date}, \
         reference date {reference_date}: {source}"
    )]
    SolveFailure {
        /// Outer pass, counted from 1.
        iteration: usize,
        /// Alive instrument ordinal, counted from 1.
        instrument: usize,
        /// Node being solved.
        node: usize,
        /// Pillar date of the instrument.
        pillar: Date,
        /// Latest relevant date of the instrument.
        latest_relevant_date: Date,
        /// Curve reference date.
        reference_date: Date,
        /// Underlying solver or interpolation error.
        #[source]
        source: ql_core::Error,
    },

    /// The outer loop ran out of passes before the node values settled.
    #[error(
        "convergence not reached after {iterations} iterations; \
         last improvement {change:e}, required accuracy {accuracy:e}"
    )]
    ConvergenceFailure {
        /// Passes performed.
        iterations: usize,
        /// Largest node change in the last pass.
        change: Real,
        /// Required accuracy.
        accuracy: Real,
    },

    /// A window minimisation ended in an unaccepted state.
    #[error(
        "window ending at instrument {window}: minimizer stopped with {end_type} (penalty {value}){}",
        .source.as_ref().map_or_else(String::new, |e| format!(": {e}"))
    )]
    MinimizerFailure {
        /// Last instrument of the window, counted from 1.
        window: usize,
        /// How the minimizer terminated.
        end_type: EndCriteriaType,
        /// Penalty value at termination.
        value: Real,
        /// Interpolation or minimizer error, when one caused the stop.
        #[source]
        source: Option<ql_core::Error>,
    },
}

/// Discriminant of [`BootstrapError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BootstrapErrorKind {
    /// See [`BootstrapError::Validation`].
    Validation,
    /// See [`BootstrapError::SolveFailure`].
    SolveFailure,
    /// See [`BootstrapError::ConvergenceFailure`].
    ConvergenceFailure,
    /// See [`BootstrapError::MinimizerFailure`].
    MinimizerFailure,
}

impl BootstrapError {
    /// The failure kind.
    pub fn kind(&self) -> BootstrapErrorKind {
        match self {
            Self::Validation(_) => BootstrapErrorKind::Validation,
            Self::SolveFailure { .. } => BootstrapErrorKind::SolveFailure,
            Self::ConvergenceFailure { .. } => BootstrapErrorKind::ConvergenceFailure,
            Self::MinimizerFailure { .. } => BootstrapErrorKind::MinimizerFailure,
        }
    }

    pub(crate) fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ql_time::DateExt;

    #[test]
    fn solve_failure_message_names_the_instrument() {
        let d = Date::try_ymd(2025, 1, 2).unwrap();
        let err = BootstrapError::SolveFailure {
            iteration: 1,
            instrument: 3,
            node: 3,
            pillar: d,
            latest_relevant_date: d,
            reference_date: d,
            source: ql_core::Error::MaxEvaluations(100),
        };
        assert_eq!(err.kind(), BootstrapErrorKind::SolveFailure);
        let msg = err.to_string();
        assert!(msg.contains("instrument 3"), "{msg}");
        assert!(msg.contains("2025-01-02"), "{msg}");
    }

    #[test]
    fn convergence_failure_reports_accuracy() {
        let err = BootstrapError::ConvergenceFailure {
            iterations: 100,
            change: 1e-6,
            accuracy: 1e-12,
        };
        assert_eq!(err.kind(), BootstrapErrorKind::ConvergenceFailure);
        assert!(err.to_string().contains("1e-12"));
    }

    #[test]
    fn minimizer_failure_appends_its_cause() {
        use std::error::Error as _;

        let bare = BootstrapError::MinimizerFailure {
            window: 3,
            end_type: EndCriteriaType::MaxIterations,
            value: 0.5,
            source: None,
        };
        assert_eq!(bare.kind(), BootstrapErrorKind::MinimizerFailure);
        assert!(bare.to_string().ends_with("(penalty 0.5)"), "{bare}");
        assert!(bare.source().is_none());

        let caused = BootstrapError::MinimizerFailure {
            window: 3,
            end_type: EndCriteriaType::Unknown,
            value: Real::NAN,
            source: Some(ql_core::Error::NonFinite(0.25)),
        };
        let msg = caused.to_string();
        assert!(msg.ends_with("(penalty NaN): function is not finite at x = 0.25"), "{msg}");
        assert!(caused.source().is_some());
    }
}
