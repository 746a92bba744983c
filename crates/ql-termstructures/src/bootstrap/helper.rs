//! Calibrating instruments (translates `ql/termstructures/bootstraphelper.hpp`).

use ql_core::{errors::Result, Real};
use ql_time::Date;

use super::curve_state::BootstrapCurve;

/// A market instrument the curve must reprice.
///
/// Corresponds to `QuantLib::BootstrapHelper<TS>`.
pub trait BootstrapHelper: std::fmt::Debug + Send + Sync {
    /// Date of the curve node this instrument determines.
    fn pillar_date(&self) -> Date;

    /// Last date at which the instrument reads the curve.
    fn latest_relevant_date(&self) -> Date;

    /// Current market quote, if any.
    fn quote(&self) -> Option<Real>;

    /// `true` when a finite quote is available.
    fn quote_is_valid(&self) -> bool {
        self.quote().is_some_and(Real::is_finite)
    }

    /// Quote implied by `curve`.
    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Real;

    /// Market minus model; `NaN` without a quote.
    fn quote_error(&self, curve: &BootstrapCurve<'_>) -> Real {
        match self.quote() {
            Some(q) => q - self.implied_quote(curve),
            None => Real::NAN,
        }
    }
}

/// Where an instrument places its curve node.
///
/// Corresponds to `QuantLib::Pillar::Choice`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Pillar {
    /// The instrument's maturity.
    #[default]
    MaturityDate,
    /// The last date the instrument depends on.
    LastRelevantDate,
    /// An explicit date.
    Custom(Date),
}

impl Pillar {
    /// Pillar date for an instrument maturing at `maturity` whose cash flows
    /// span `[earliest, latest]`.
    ///
    /// # Errors
    /// A custom date outside `[earliest, latest]`.
    pub fn resolve(self, earliest: Date, maturity: Date, latest: Date) -> Result<Date> {
        match self {
            Self::MaturityDate => Ok(maturity),
            Self::LastRelevantDate => Ok(latest),
            Self::Custom(d) => {
                ql_core::ensure!(
                    d >= earliest,
                    "pillar date ({d}) must be later than or equal to the instrument's earliest date ({earliest})"
                );
                ql_core::ensure!(
                    d <= latest,
                    "pillar date ({d}) must be before or equal to the instrument's latest relevant date ({latest})"
                );
                Ok(d)
            }
        }
    }
}
