//! `Quote` trait and `SimpleQuote` implementation.
//!
//! Translates `ql/quote.hpp` and `ql/quotes/simplequote.hpp`.

use std::sync::{Arc, RwLock};

use ql_core::Real;

/// A market-observable value.
///
/// Corresponds to `QuantLib::Quote`.
pub trait Quote: std::fmt::Debug + Send + Sync {
    /// Return the current value.
    ///
    /// Returns `None` if the quote is not currently valid / set.
    fn value(&self) -> Option<Real>;

    /// Return `true` if the quote is currently valid.
    fn is_valid(&self) -> bool {
        self.value().is_some()
    }
}

/// A simple, mutable market quote.
///
/// The value sits behind a lock so that a quote shared through an `Arc`
/// can still be updated by its owner.
///
/// Corresponds to `QuantLib::SimpleQuote`.
#[derive(Debug, Default)]
pub struct SimpleQuote {
    value: RwLock<Option<Real>>,
}

impl SimpleQuote {
    /// Create a new quote with the given value.
    pub fn new(value: Real) -> Self {
        Self {
            value: RwLock::new(Some(value)),
        }
    }

    /// Create a new quote already wrapped for sharing.
    pub fn shared(value: Real) -> Arc<Self> {
        Arc::new(Self::new(value))
    }

    /// Create an empty (invalid) quote.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Set a new value, returning the change from the previous one
    /// (zero if the quote was empty).
    pub fn set_value(&self, value: Real) -> Real {
        let mut slot = self.value.write().unwrap_or_else(|e| e.into_inner());
        let diff = slot.map_or(0.0, |old| value - old);
        *slot = Some(value);
        diff
    }

    /// Clear the value, making the quote invalid.
    pub fn reset(&self) {
        *self.value.write().unwrap_or_else(|e| e.into_inner()) = None;
    }
}

impl Quote for SimpleQuote {
    fn value(&self) -> Option<Real> {
        *self.value.read().unwrap_or_else(|e| e.into_inner())
    }
}
