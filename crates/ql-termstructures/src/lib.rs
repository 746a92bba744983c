//! # ql-termstructures
//!
//! Yield and default-probability term structures, and the bootstrapping
//! engines that calibrate piecewise curves to market instruments.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// ── Modules ───────────────────────────────────────────────────────────────────

/// `TermStructure`: base trait for all term structures.
pub mod term_structure;

/// `YieldTermStructure`: yield / interest-rate term structures.
pub mod yield_term_structure;

/// `FlatForward`: constant forward-rate yield curve.
pub mod flat_forward;

/// `DefaultProbabilityTermStructure`: credit default-probability curves.
pub mod default_probability_term_structure;

/// Bootstrapping engines, curve state, strategies and the helper interface.
pub mod bootstrap;

/// Deposit, FRA and swap helpers for yield-curve bootstrapping.
pub mod rate_helpers;

/// CDS helpers for default-curve bootstrapping.
pub mod default_helpers;

/// `PiecewiseYieldCurve`: bootstrapped yield curve.
pub mod piecewise_yield_curve;

/// `PiecewiseDefaultCurve`: bootstrapped default-probability curve.
pub mod piecewise_default_curve;

// ── Convenience re-exports ────────────────────────────────────────────────────

pub use bootstrap::{
    Bootstrap, BootstrapError, BootstrapErrorKind, BootstrapHelper, BootstrapReport,
    BootstrapResult, BootstrapTraits, Discount, HazardRate, IterativeBootstrap,
    IterativeBootstrapConfig, LocalBootstrap, LocalBootstrapConfig, Pillar, SurvivalProbability,
    ZeroYield,
};
pub use default_helpers::SpreadCdsHelper;
pub use default_probability_term_structure::{DefaultProbabilityTermStructure, FlatHazardRate};
pub use flat_forward::FlatForward;
pub use piecewise_default_curve::PiecewiseDefaultCurve;
pub use piecewise_yield_curve::PiecewiseYieldCurve;
pub use rate_helpers::{DepositRateHelper, FraRateHelper, SwapRateHelper};
pub use term_structure::TermStructure;
pub use yield_term_structure::{YieldTermStructure, YieldTermStructureData};
