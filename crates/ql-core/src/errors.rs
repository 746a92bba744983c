//! Error types for quantlib-rs.
//!
//! QuantLib's exception hierarchy collapses into a single
//! `thiserror`-derived enum.  The C++ macros `QL_REQUIRE`, `QL_ENSURE`, and
//! `QL_FAIL` map to the `ensure!`, `ensure_post!` and `fail!` macros defined
//! here.  Root finders add two variants of their own so callers can tell a
//! missing bracket from an exhausted evaluation budget.

use thiserror::Error;

/// The low-level error type used throughout quantlib-rs.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum Error {
    /// General runtime error (maps to `QL_FAIL`).
    #[error("{0}")]
    Runtime(String),

    /// Precondition violated (maps to `QL_REQUIRE`).
    #[error("precondition not satisfied: {0}")]
    Precondition(String),

    /// Postcondition violated (maps to `QL_ENSURE`).
    #[error("postcondition not satisfied: {0}")]
    Postcondition(String),

    /// Invalid argument.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A root finder could not bracket a sign change.
    #[error(
        "root not bracketed: f[{x_min},{x_max}] -> [{f_min:e},{f_max:e}]"
    )]
    NotBracketed {
        /// Lower end of the search interval.
        x_min: f64,
        /// Upper end of the search interval.
        x_max: f64,
        /// Function value at the lower end.
        f_min: f64,
        /// Function value at the upper end.
        f_max: f64,
    },

    /// A root finder ran out of function evaluations.
    #[error("maximum number of function evaluations ({0}) exceeded")]
    MaxEvaluations(usize),

    /// The objective returned a non-finite value.
    #[error("function is not finite at x = {0}")]
    NonFinite(f64),
}

/// Shorthand `Result` type used throughout quantlib-rs.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Equivalent to C++ `QL_REQUIRE(condition, message)`.
///
/// Returns `Err(Error::Precondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure, errors::Error};
/// fn positive(x: f64) -> ql_core::errors::Result<f64> {
///     ensure!(x > 0.0, "x must be positive, got {x}");
///     Ok(x)
/// }
/// assert!(positive(1.0).is_ok());
/// assert!(positive(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Precondition(
                format!($($msg)*)
            ).into());
        }
    };
}

/// Equivalent to C++ `QL_ENSURE(condition, message)`.
///
/// Returns `Err(Error::Postcondition(...))` if `$cond` is false.
///
/// # Example
/// ```
/// use ql_core::{ensure_post, errors::Error};
/// fn compute(x: f64) -> ql_core::errors::Result<f64> {
///     let result = x * 2.0;
///     ensure_post!(result > 0.0, "result must be positive, got {result}");
///     Ok(result)
/// }
/// assert!(compute(1.0).is_ok());
/// assert!(compute(-1.0).is_err());
/// ```
#[macro_export]
macro_rules! ensure_post {
    ($cond:expr, $($msg:tt)*) => {
        if !$cond {
            return Err($crate::errors::Error::Postcondition(
                format!($($msg)*)
            ).into());
        }
    };
}

/// Equivalent to C++ `QL_FAIL(message)`.
///
/// Returns `Err(Error::Runtime(...))` immediately.
///
/// # Example
/// ```
/// use ql_core::{fail, errors::Error};
/// fn always_err() -> ql_core::errors::Result<()> {
///     fail!("something went wrong");
/// }
/// assert!(always_err().is_err());
/// ```
#[macro_export]
macro_rules! fail {
    ($($msg:tt)*) => {
        return Err($crate::errors::Error::Runtime(format!($($msg)*)).into())
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    fn checked_sqrt(x: f64) -> Result<f64> {
        ensure!(x >= 0.0, "negative argument {x}");
        Ok(x.sqrt())
    }

    #[test]
    fn ensure_maps_to_precondition() {
        assert_eq!(checked_sqrt(4.0), Ok(2.0));
        match checked_sqrt(-1.0) {
            Err(Error::Precondition(msg)) => assert!(msg.contains("-1")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn not_bracketed_message_names_interval() {
        let err = Error::NotBracketed {
            x_min: 0.5,
            x_max: 1.0,
            f_min: 0.1,
            f_max: 0.2,
        };
        let msg = err.to_string();
        assert!(msg.contains("[0.5,1]"), "{msg}");
    }
}
