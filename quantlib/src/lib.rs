//! # quantlib
//!
//! Piecewise term-structure bootstrapping in the style of
//! [QuantLib](https://www.quantlib.org/).
//!
//! This crate is a **façade** that re-exports all public items from the
//! underlying workspace crates. Application code should depend on this
//! crate rather than the individual `ql-*` crates.
//!
//! ## Quick start
//!
//! ```toml
//! [dependencies]
//! quantlib-bootstrap = "0.1"
//! ```
//!
//! ```rust
//! use std::sync::Arc;
//! use quantlib::math::LogLinear;
//! use quantlib::quotes::SimpleQuote;
//! use quantlib::termstructures::{
//!     BootstrapHelper, Discount, PiecewiseYieldCurve, SwapRateHelper, YieldTermStructure,
//! };
//! use quantlib::time::{Actual365Fixed, Date, DateExt, Tenor, Thirty360};
//!
//! let today = Date::try_ymd(2025, 1, 2).unwrap();
//! let helpers: Vec<Arc<dyn BootstrapHelper>> = [(1, 0.03), (2, 0.032), (5, 0.035)]
//!     .iter()
//!     .map(|&(years, rate)| {
//!         let swap = SwapRateHelper::from_tenor(
//!             SimpleQuote::shared(rate),
//!             today,
//!             Tenor::Years(years),
//!             Tenor::Years(1),
//!             Thirty360,
//!         )
//!         .unwrap();
//!         Arc::new(swap) as Arc<dyn BootstrapHelper>
//!     })
//!     .collect();
//!
//! let curve = PiecewiseYieldCurve::new(today, helpers, Actual365Fixed, Discount, LogLinear).unwrap();
//! assert!(curve.quote_errors().iter().all(|e| e.abs() < 1e-10));
//! assert!(curve.discount(5.0) < curve.discount(1.0));
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// Core types, aliases, and error definitions.
pub use ql_core as core;

/// Date, day counter, tenor, and schedule types.
pub use ql_time as time;

/// Mathematical utilities: interpolation, 1D solvers, optimisation.
pub use ql_math as math;

/// Market quotes.
pub use ql_quotes as quotes;

/// Term structures, bootstrap helpers and bootstrapping engines.
pub use ql_termstructures as termstructures;
