//! Quote Source Port (Driven Port)
//!
//! Interface for fetching the current top of book from an exchange.
//! Every call is exactly one upstream request: no retry, no caching.

use std::fmt;

use async_trait::async_trait;

use crate::domain::rate::{Quote, Symbol};

/// Side of the order book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookSide {
    /// Sell orders.
    Ask,
    /// Buy orders.
    Bid,
}

impl fmt::Display for BookSide {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ask => f.write_str("ask"),
            Self::Bid => f.write_str("bid"),
        }
    }
}

/// Errors from fetching a quote, in the order they are checked.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QuoteError {
    /// The request could not be constructed (malformed base URL).
    #[error("failed to build request: {message}")]
    RequestBuild {
        /// Error details.
        message: String,
    },

    /// Network failure: DNS, connect, or timeout.
    #[error("request failed: {message}")]
    Transport {
        /// Error details.
        message: String,
    },

    /// The exchange answered with a status other than 200.
    #[error("unexpected status code: {status}")]
    UpstreamStatus {
        /// HTTP status code.
        status: u16,
    },

    /// Body was not JSON matching the order book envelope.
    #[error("failed to decode response: {message}")]
    Decode {
        /// Error details.
        message: String,
    },

    /// Ask or bid list was empty.
    #[error("empty order book ({asks} asks, {bids} bids)")]
    EmptyBook {
        /// Number of ask levels received.
        asks: usize,
        /// Number of bid levels received.
        bids: usize,
    },

    /// Top-of-book price was not a decimal number.
    #[error("failed to parse {side} price: {raw:?}")]
    PriceParse {
        /// Which side failed.
        side: BookSide,
        /// The raw price field.
        raw: String,
    },

    /// Snapshot time is outside the representable range.
    #[error("invalid order book time: {millis}")]
    InvalidTimestamp {
        /// Milliseconds since the Unix epoch, as received.
        millis: i64,
    },
}

impl QuoteError {
    /// Short stable label for logs and metrics.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::RequestBuild { .. } => "request_build",
            Self::Transport { .. } => "transport",
            Self::UpstreamStatus { .. } => "upstream_status",
            Self::Decode { .. } => "decode",
            Self::EmptyBook { .. } => "empty_book",
            Self::PriceParse { .. } => "price_parse",
            Self::InvalidTimestamp { .. } => "invalid_timestamp",
        }
    }
}

/// Port for fetching top-of-book quotes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait QuoteSourcePort: Send + Sync {
    /// Fetch the best ask and bid for `symbol`, timestamped by the exchange.
    async fn fetch_top_of_book(&self, symbol: &Symbol) -> Result<Quote, QuoteError>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(QuoteError::RequestBuild { message: "x".into() }, "request_build")]
    #[test_case(QuoteError::Transport { message: "x".into() }, "transport")]
    #[test_case(QuoteError::UpstreamStatus { status: 503 }, "upstream_status")]
    #[test_case(QuoteError::Decode { message: "x".into() }, "decode")]
    #[test_case(QuoteError::EmptyBook { asks: 0, bids: 1 }, "empty_book")]
    #[test_case(QuoteError::PriceParse { side: BookSide::Bid, raw: "abc".into() }, "price_parse")]
    #[test_case(QuoteError::InvalidTimestamp { millis: i64::MAX }, "invalid_timestamp")]
    fn kind_labels(err: QuoteError, kind: &str) {
        assert_eq!(err.kind(), kind);
    }

    #[test]
    fn messages_carry_details() {
        let err = QuoteError::UpstreamStatus { status: 429 };
        assert_eq!(err.to_string(), "unexpected status code: 429");

        let err = QuoteError::PriceParse {
            side: BookSide::Ask,
            raw: "NaN?".into(),
        };
        assert_eq!(err.to_string(), "failed to parse ask price: \"NaN?\"");
    }
}
