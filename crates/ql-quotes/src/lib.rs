//! # ql-quotes
//!
//! Market quotes observed by rate helpers.  Quotes are shared between the
//! caller and the instruments as `Arc<dyn Quote>`; a [`SimpleQuote`] can be
//! bumped in place and the next curve recalculation picks the new value up.

#![warn(missing_docs)]
#![forbid(unsafe_code)]

/// `Quote` trait and concrete implementations.
pub mod quote;

pub use quote::{Quote, SimpleQuote};
