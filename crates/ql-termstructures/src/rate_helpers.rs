//! Rate helpers for yield-curve bootstrapping
//! (translates `ql/termstructures/yield/ratehelpers.hpp`).
//!
//! A *rate helper* pairs a market quote (deposit rate, FRA rate, par swap
//! rate) with the conventions needed to reprice it off a curve.  Quotes are
//! shared [`Quote`] handles, so a curve built on them can be recalculated
//! after the market moves.

use std::sync::Arc;

use ql_core::{errors::Result, Real};
use ql_quotes::Quote;
use ql_time::{Date, DateExt, DayCounter, Schedule, Tenor};

use crate::bootstrap::{BootstrapCurve, BootstrapHelper, Pillar};

/// Simple forward rate between two dates read off `curve`.
fn simple_forward(curve: &BootstrapCurve<'_>, start: Date, end: Date, tau: Real) -> Real {
    let df_start = curve.discount_date(start);
    let df_end = curve.discount_date(end);
    (df_start / df_end - 1.0) / tau
}

// ── DepositRateHelper ─────────────────────────────────────────────────────────

/// A deposit (money-market) rate helper.
///
/// The implied quote is the simple rate over `[settlement, maturity]`.
///
/// Corresponds to `QuantLib::DepositRateHelper`.
#[derive(Debug)]
pub struct DepositRateHelper {
    quote: Arc<dyn Quote>,
    settlement_date: Date,
    maturity_date: Date,
    pillar_date: Date,
    day_counter: Box<dyn DayCounter>,
}

impl DepositRateHelper {
    /// Deposit between explicit dates.
    pub fn new(
        quote: Arc<dyn Quote>,
        settlement_date: Date,
        maturity_date: Date,
        day_counter: impl DayCounter + 'static,
    ) -> Self {
        Self {
            quote,
            settlement_date,
            maturity_date,
            pillar_date: maturity_date,
            day_counter: Box::new(day_counter),
        }
    }

    /// Deposit settling `settlement_days` after `reference_date` and running
    /// for `tenor`.
    pub fn from_tenor(
        quote: Arc<dyn Quote>,
        reference_date: Date,
        settlement_days: u32,
        tenor: Tenor,
        day_counter: impl DayCounter + 'static,
    ) -> Result<Self> {
        let settlement = reference_date.advance(Tenor::Days(settlement_days))?;
        let maturity = settlement.advance(tenor)?;
        ql_core::ensure!(maturity > settlement, "deposit tenor {tenor:?} is empty");
        Ok(Self::new(quote, settlement, maturity, day_counter))
    }

    /// Move the curve node of this deposit.
    pub fn with_pillar(mut self, pillar: Pillar) -> Result<Self> {
        self.pillar_date =
            pillar.resolve(self.settlement_date, self.maturity_date, self.maturity_date)?;
        Ok(self)
    }

    /// The settlement date of the deposit.
    pub fn settlement_date(&self) -> Date {
        self.settlement_date
    }

    /// The maturity date of the deposit.
    pub fn maturity_date(&self) -> Date {
        self.maturity_date
    }
}

impl BootstrapHelper for DepositRateHelper {
    fn pillar_date(&self) -> Date {
        self.pillar_date
    }

    fn latest_relevant_date(&self) -> Date {
        self.maturity_date
    }

    fn quote(&self) -> Option<Real> {
        self.quote.value()
    }

    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Real {
        let tau = self
            .day_counter
            .year_fraction(self.settlement_date, self.maturity_date);
        simple_forward(curve, self.settlement_date, self.maturity_date, tau)
    }
}

// ── FraRateHelper ─────────────────────────────────────────────────────────────

/// A forward-rate-agreement (FRA) rate helper.
///
/// The implied quote is the simple forward rate between the FRA's value
/// date and maturity.
///
/// Corresponds to `QuantLib::FraRateHelper`.
#[derive(Debug)]
pub struct FraRateHelper {
    quote: Arc<dyn Quote>,
    value_date: Date,
    maturity_date: Date,
    pillar_date: Date,
    day_counter: Box<dyn DayCounter>,
}

impl FraRateHelper {
    /// FRA between explicit dates.
    pub fn new(
        quote: Arc<dyn Quote>,
        value_date: Date,
        maturity_date: Date,
        day_counter: impl DayCounter + 'static,
    ) -> Self {
        Self {
            quote,
            value_date,
            maturity_date,
            pillar_date: maturity_date,
            day_counter: Box::new(day_counter),
        }
    }

    /// An `m1 x m2` FRA counted in months from `reference_date`.
    pub fn from_months(
        quote: Arc<dyn Quote>,
        reference_date: Date,
        months_to_start: u32,
        months_to_end: u32,
        day_counter: impl DayCounter + 'static,
    ) -> Result<Self> {
        ql_core::ensure!(
            months_to_end > months_to_start,
            "FRA end ({months_to_end}M) must follow its start ({months_to_start}M)"
        );
        let value_date = reference_date.advance(Tenor::Months(months_to_start))?;
        let maturity_date = reference_date.advance(Tenor::Months(months_to_end))?;
        Ok(Self::new(quote, value_date, maturity_date, day_counter))
    }

    /// Move the curve node of this FRA.
    pub fn with_pillar(mut self, pillar: Pillar) -> Result<Self> {
        self.pillar_date = pillar.resolve(self.value_date, self.maturity_date, self.maturity_date)?;
        Ok(self)
    }

    /// The FRA value (start) date.
    pub fn value_date(&self) -> Date {
        self.value_date
    }

    /// The FRA maturity (end) date.
    pub fn maturity_date(&self) -> Date {
        self.maturity_date
    }
}

impl BootstrapHelper for FraRateHelper {
    fn pillar_date(&self) -> Date {
        self.pillar_date
    }

    fn latest_relevant_date(&self) -> Date {
        self.maturity_date
    }

    fn quote(&self) -> Option<Real> {
        self.quote.value()
    }

    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Real {
        let tau = self
            .day_counter
            .year_fraction(self.value_date, self.maturity_date);
        simple_forward(curve, self.value_date, self.maturity_date, tau)
    }
}

// ── SwapRateHelper ────────────────────────────────────────────────────────────

/// A par-swap rate helper.
///
/// The floating leg is valued at par, so the implied quote is
/// `(P(start) - P(end)) / Σ τᵢ P(tᵢ)` over the fixed-leg schedule.
///
/// Corresponds to `QuantLib::SwapRateHelper`.
#[derive(Debug)]
pub struct SwapRateHelper {
    quote: Arc<dyn Quote>,
    fixed_schedule: Schedule,
    pillar_date: Date,
    fixed_day_counter: Box<dyn DayCounter>,
}

impl SwapRateHelper {
    /// Swap on an already-built fixed-leg schedule.
    pub fn new(
        quote: Arc<dyn Quote>,
        fixed_schedule: Schedule,
        fixed_day_counter: impl DayCounter + 'static,
    ) -> Self {
        let pillar_date = fixed_schedule.end_date();
        Self {
            quote,
            fixed_schedule,
            pillar_date,
            fixed_day_counter: Box::new(fixed_day_counter),
        }
    }

    /// Swap starting at `start`, running for `tenor`, paying fixed every
    /// `fixed_tenor`.
    pub fn from_tenor(
        quote: Arc<dyn Quote>,
        start: Date,
        tenor: Tenor,
        fixed_tenor: Tenor,
        fixed_day_counter: impl DayCounter + 'static,
    ) -> Result<Self> {
        let maturity = start.advance(tenor)?;
        let schedule = Schedule::forward(start, maturity, fixed_tenor)?;
        Ok(Self::new(quote, schedule, fixed_day_counter))
    }

    /// Move the curve node of this swap.
    pub fn with_pillar(mut self, pillar: Pillar) -> Result<Self> {
        let (start, end) = (self.fixed_schedule.start_date(), self.fixed_schedule.end_date());
        self.pillar_date = pillar.resolve(start, end, end)?;
        Ok(self)
    }

    /// The fixed-leg payment schedule.
    pub fn fixed_schedule(&self) -> &Schedule {
        &self.fixed_schedule
    }
}

impl BootstrapHelper for SwapRateHelper {
    fn pillar_date(&self) -> Date {
        self.pillar_date
    }

    fn latest_relevant_date(&self) -> Date {
        self.fixed_schedule.end_date()
    }

    fn quote(&self) -> Option<Real> {
        self.quote.value()
    }

    fn implied_quote(&self, curve: &BootstrapCurve<'_>) -> Real {
        let dates = self.fixed_schedule.dates();
        let annuity: Real = dates
            .windows(2)
            .map(|w| self.fixed_day_counter.year_fraction(w[0], w[1]) * curve.discount_date(w[1]))
            .sum();
        let df_start = curve.discount_date(self.fixed_schedule.start_date());
        let df_end = curve.discount_date(self.fixed_schedule.end_date());
        (df_start - df_end) / annuity
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bootstrap::{CurveState, ZeroYield};
    use approx::assert_abs_diff_eq;
    use ql_math::Linear;
    use ql_quotes::SimpleQuote;
    use ql_time::{Actual360, Actual365Fixed};

    fn d(y: i32, m: u32, day: u32) -> Date {
        Date::try_ymd(y, m, day).unwrap()
    }

    /// Flat continuously-compounded zero curve.
    fn flat_state(rate: Real) -> CurveState {
        let today = d(2025, 1, 2);
        let mut state = CurveState::new(today, Arc::new(Actual365Fixed), Arc::new(Linear));
        state.set_nodes(vec![today, d(2035, 1, 2)]);
        state.reset_data(rate);
        state.extend_interpolation(1).unwrap();
        state
    }

    #[test]
    fn deposit_implied_rate_on_flat_curve() {
        let state = flat_state(0.05);
        let curve = BootstrapCurve::new(&state, &ZeroYield);
        let (settle, mat) = (d(2025, 1, 2), d(2025, 4, 2));
        let helper = DepositRateHelper::new(SimpleQuote::shared(0.0), settle, mat, Actual360);

        let tau = Actual360.year_fraction(settle, mat);
        let t = Actual365Fixed.year_fraction(settle, mat);
        let expected = ((0.05 * t).exp() - 1.0) / tau;
        assert_abs_diff_eq!(helper.implied_quote(&curve), expected, epsilon = 1e-12);
        assert_abs_diff_eq!(helper.quote_error(&curve), -expected, epsilon = 1e-12);
    }

    #[test]
    fn fra_implied_rate_on_flat_curve() {
        let state = flat_state(0.03);
        let curve = BootstrapCurve::new(&state, &ZeroYield);
        let helper =
            FraRateHelper::from_months(SimpleQuote::shared(0.03), d(2025, 1, 2), 3, 6, Actual360)
                .unwrap();
        assert_eq!(helper.value_date(), d(2025, 4, 2));
        assert_eq!(helper.maturity_date(), d(2025, 7, 2));

        let tau = Actual360.year_fraction(helper.value_date(), helper.maturity_date());
        let dt = Actual365Fixed.year_fraction(helper.value_date(), helper.maturity_date());
        let expected = ((0.03 * dt).exp() - 1.0) / tau;
        assert_abs_diff_eq!(helper.implied_quote(&curve), expected, epsilon = 1e-12);
    }

    #[test]
    fn swap_par_rate_on_flat_curve() {
        let state = flat_state(0.04);
        let curve = BootstrapCurve::new(&state, &ZeroYield);
        let helper = SwapRateHelper::from_tenor(
            SimpleQuote::shared(0.04),
            d(2025, 1, 2),
            Tenor::Years(5),
            Tenor::Years(1),
            Actual365Fixed,
        )
        .unwrap();
        assert_eq!(helper.fixed_schedule().size(), 6);
        // Annual compounding equivalent of 4% continuous, up to leap days.
        let implied = helper.implied_quote(&curve);
        assert_abs_diff_eq!(implied, 0.04_f64.exp() - 1.0, epsilon = 1e-4);
    }

    #[test]
    fn quote_changes_flow_through() {
        let quote = SimpleQuote::shared(0.02);
        let helper = DepositRateHelper::new(quote.clone(), d(2025, 1, 2), d(2025, 7, 2), Actual360);
        assert_eq!(helper.quote(), Some(0.02));
        quote.set_value(0.025);
        assert_eq!(helper.quote(), Some(0.025));
        quote.reset();
        assert!(!helper.quote_is_valid());
    }

    #[test]
    fn pillar_can_move_inside_the_instrument() {
        let helper = SwapRateHelper::from_tenor(
            SimpleQuote::shared(0.04),
            d(2025, 1, 2),
            Tenor::Years(2),
            Tenor::Years(1),
            Actual365Fixed,
        )
        .unwrap();
        let custom = helper.with_pillar(Pillar::Custom(d(2026, 12, 1))).unwrap();
        assert_eq!(custom.pillar_date(), d(2026, 12, 1));
        assert_eq!(custom.latest_relevant_date(), d(2027, 1, 2));

        let deposit = DepositRateHelper::new(SimpleQuote::shared(0.02), d(2025, 1, 2), d(2025, 7, 2), Actual360);
        assert!(deposit.with_pillar(Pillar::Custom(d(2025, 8, 1))).is_err());
    }
}
