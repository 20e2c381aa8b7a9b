//! Rate Domain Types
//!
//! A [`Quote`] is the best ask/bid for a [`Symbol`] as reported by the
//! exchange at `quote_time`. A [`RateRecord`] is a quote that has been
//! read back from storage, carrying its store-assigned id and the local
//! time it was recorded.
//!
//! No ordering is enforced between ask and bid: a crossed book from the
//! exchange passes through unchanged.

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Symbol
// =============================================================================

/// Error returned when constructing an invalid [`Symbol`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("symbol is required")]
pub struct EmptySymbol;

/// Exchange trading pair identifier (e.g. `BTC-USDT`).
///
/// Always non-empty. The exchange is the authority on which pairs exist,
/// so no further format validation is applied.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Symbol(String);

impl Symbol {
    /// Create a symbol, rejecting the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`EmptySymbol`] if `value` is empty.
    pub fn new(value: impl Into<String>) -> Result<Self, EmptySymbol> {
        let value = value.into();
        if value.is_empty() {
            return Err(EmptySymbol);
        }
        Ok(Self(value))
    }

    /// The symbol as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Symbol {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for Symbol {
    type Error = EmptySymbol;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Symbol> for String {
    fn from(symbol: Symbol) -> Self {
        symbol.0
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Top of book for a symbol, as fetched from the exchange.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    /// Trading pair.
    pub symbol: Symbol,
    /// Best ask price.
    pub ask: Decimal,
    /// Best bid price.
    pub bid: Decimal,
    /// Exchange-assigned snapshot time.
    pub quote_time: DateTime<Utc>,
}

impl Quote {
    /// Create a new quote.
    #[must_use]
    pub const fn new(symbol: Symbol, ask: Decimal, bid: Decimal, quote_time: DateTime<Utc>) -> Self {
        Self {
            symbol,
            ask,
            bid,
            quote_time,
        }
    }

    /// Ask minus bid. Negative when the book is crossed.
    #[must_use]
    pub fn spread(&self) -> Decimal {
        self.ask - self.bid
    }
}

// =============================================================================
// Rate Record
// =============================================================================

/// A quote read back from the rate store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateRecord {
    /// Store-assigned identity, increasing with insertion order.
    pub id: i64,
    /// Trading pair.
    pub symbol: Symbol,
    /// Best ask price.
    pub ask: Decimal,
    /// Best bid price.
    pub bid: Decimal,
    /// Exchange-assigned snapshot time.
    pub quote_time: DateTime<Utc>,
    /// Local time the row was written.
    pub recorded_time: DateTime<Utc>,
}
