//! KuCoin order book client.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{StatusCode, Url};
use rust_decimal::Decimal;
use tracing::{debug, instrument};

use super::messages::OrderBookEnvelope;
use crate::application::ports::{BookSide, QuoteError, QuoteSourcePort};
use crate::domain::rate::{Quote, Symbol};
use crate::infrastructure::config::KucoinSettings;

/// Level-2 top-20 order book endpoint.
pub const ORDER_BOOK_PATH: &str = "/api/v1/market/orderbook/level2_20";

/// KuCoin quote source.
///
/// One `reqwest::Client` is shared across requests so connections are
/// pooled. The configured timeout bounds each call on its own; a shorter
/// caller deadline wins by dropping the future.
#[derive(Debug, Clone)]
pub struct KucoinClient {
    http: reqwest::Client,
    base_url: String,
}

impl KucoinClient {
    /// Create a client for `base_url` with a per-request `timeout`.
    ///
    /// # Errors
    ///
    /// Returns [`QuoteError::RequestBuild`] if the HTTP client cannot be
    /// initialised (TLS backend failure).
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, QuoteError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| QuoteError::RequestBuild {
                message: e.to_string(),
            })?;

        Ok(Self {
            http,
            base_url: base_url.into(),
        })
    }

    /// Create a client from settings.
    ///
    /// # Errors
    ///
    /// See [`KucoinClient::new`].
    pub fn from_settings(settings: &KucoinSettings) -> Result<Self, QuoteError> {
        Self::new(settings.base_url.clone(), settings.timeout)
    }

    fn order_book_url(&self, symbol: &Symbol) -> Result<Url, QuoteError> {
        let endpoint = format!("{}{ORDER_BOOK_PATH}", self.base_url.trim_end_matches('/'));
        let mut url = Url::parse(&endpoint).map_err(|e| QuoteError::RequestBuild {
            message: format!("{endpoint}: {e}"),
        })?;
        url.query_pairs_mut().append_pair("symbol", symbol.as_str());
        Ok(url)
    }
}

#[async_trait]
impl QuoteSourcePort for KucoinClient {
    #[instrument(skip(self, symbol), fields(symbol = %symbol))]
    async fn fetch_top_of_book(&self, symbol: &Symbol) -> Result<Quote, QuoteError> {
        let url = self.order_book_url(symbol)?;

        let response = self
            .http
            .get(url)
            .send()
            .await
            .map_err(|e| QuoteError::Transport {
                message: e.to_string(),
            })?;

        let status = response.status();
        debug!(http.status_code = status.as_u16(), "Order book response");
        if status != StatusCode::OK {
            return Err(QuoteError::UpstreamStatus {
                status: status.as_u16(),
            });
        }

        let body = response.text().await.map_err(|e| QuoteError::Transport {
            message: e.to_string(),
        })?;
        let envelope: OrderBookEnvelope =
            serde_json::from_str(&body).map_err(|e| QuoteError::Decode {
                message: e.to_string(),
            })?;

        top_of_book(symbol.clone(), &envelope)
    }
}

// =============================================================================
// Parsing
// =============================================================================

/// Extract the best ask/bid and snapshot time from an envelope.
///
/// # Errors
///
/// Checks run in order: empty book, ask price, bid price, timestamp.
pub fn top_of_book(symbol: Symbol, envelope: &OrderBookEnvelope) -> Result<Quote, QuoteError> {
    let book = &envelope.data;
    let (Some(ask), Some(bid)) = (book.best_ask(), book.best_bid()) else {
        return Err(QuoteError::EmptyBook {
            asks: book.asks.len(),
            bids: book.bids.len(),
        });
    };

    let ask = parse_price(BookSide::Ask, ask)?;
    let bid = parse_price(BookSide::Bid, bid)?;
    let quote_time = parse_time(book.time)?;

    Ok(Quote::new(symbol, ask, bid, quote_time))
}

/// Parse a decimal price string, accepting scientific notation.
///
/// Only ASCII digits, signs, `.` and `e`/`E` are allowed; `Decimal` on its
/// own would skip `_` separators.
///
/// # Errors
///
/// Returns [`QuoteError::PriceParse`] for anything that is not a finite
/// decimal number within the `Decimal` range.
pub fn parse_price(side: BookSide, raw: &str) -> Result<Decimal, QuoteError> {
    if !raw.bytes().all(is_price_byte) {
        return Err(QuoteError::PriceParse {
            side,
            raw: raw.to_string(),
        });
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .map_err(|_| QuoteError::PriceParse {
            side,
            raw: raw.to_string(),
        })
}

const fn is_price_byte(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'+' | b'-' | b'.' | b'e' | b'E')
}

/// Convert exchange milliseconds since the epoch to UTC.
///
/// # Errors
///
/// Returns [`QuoteError::InvalidTimestamp`] when out of range.
pub fn parse_time(millis: i64) -> Result<DateTime<Utc>, QuoteError> {
    DateTime::<Utc>::from_timestamp_millis(millis).ok_or(QuoteError::InvalidTimestamp { millis })
}
