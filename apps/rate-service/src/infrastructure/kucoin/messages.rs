//! KuCoin Order Book Message Types
//!
//! Wire format for `GET /api/v1/market/orderbook/level2_20`:
//!
//! ```json
//! {
//!   "code": "200000",
//!   "data": {
//!     "sequence": "3262786978",
//!     "time": 1617267321123,
//!     "bids": [["40000.0", "1.0"]],
//!     "asks": [["40001.0", "0.8"]]
//!   }
//! }
//! ```
//!
//! Each level is `[price, size]` as decimal strings, best level first.
//!
//! # References
//!
//! - [Get Part Order Book](https://www.kucoin.com/docs/rest/spot-trading/market-data/get-part-order-book-aggregated-)

use serde::Deserialize;

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderBookEnvelope {
    /// Exchange result code (`"200000"` on success).
    #[serde(default)]
    pub code: Option<String>,
    /// Order book snapshot.
    pub data: OrderBookData,
}

/// Order book snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OrderBookData {
    /// Book sequence number.
    #[serde(default)]
    pub sequence: Option<String>,
    /// Snapshot time, milliseconds since the Unix epoch.
    pub time: i64,
    /// Bid levels, best first.
    #[serde(default)]
    pub bids: Vec<Vec<String>>,
    /// Ask levels, best first.
    #[serde(default)]
    pub asks: Vec<Vec<String>>,
}

impl OrderBookData {
    /// Price field of the best ask, if any level exists.
    #[must_use]
    pub fn best_ask(&self) -> Option<&str> {
        best_price(&self.asks)
    }

    /// Price field of the best bid, if any level exists.
    #[must_use]
    pub fn best_bid(&self) -> Option<&str> {
        best_price(&self.bids)
    }
}

/// An empty first level yields an empty price.
fn best_price(levels: &[Vec<String>]) -> Option<&str> {
    levels
        .first()
        .map(|level| level.first().map_or("", String::as_str))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_full_envelope() {
        let json = r#"{
            "code": "200000",
            "data": {
                "sequence": "3262786978",
                "time": 1617267321123,
                "bids": [["40000.0", "1.0", "1"], ["39999.9", "2.0"]],
                "asks": [["40001.0", "0.8", "1"]]
            }
        }"#;

        let envelope: OrderBookEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.code.as_deref(), Some("200000"));
        assert_eq!(envelope.data.time, 1_617_267_321_123);
        assert_eq!(envelope.data.best_ask(), Some("40001.0"));
        assert_eq!(envelope.data.best_bid(), Some("40000.0"));
    }

    #[test]
    fn missing_sides_default_to_empty() {
        let json = r#"{"data":{"time":1}}"#;
        let envelope: OrderBookEnvelope = serde_json::from_str(json).unwrap();
        assert!(envelope.data.asks.is_empty());
        assert!(envelope.data.best_bid().is_none());
    }

    #[test]
    fn empty_level_has_empty_price() {
        let json = r#"{"data":{"time":1,"asks":[[]],"bids":[["1"]]}}"#;
        let envelope: OrderBookEnvelope = serde_json::from_str(json).unwrap();
        assert_eq!(envelope.data.best_ask(), Some(""));
    }

    #[test]
    fn missing_data_or_time_is_rejected() {
        assert!(serde_json::from_str::<OrderBookEnvelope>(r#"{"code":"200000"}"#).is_err());
        assert!(serde_json::from_str::<OrderBookEnvelope>(r#"{"data":{"asks":[]}}"#).is_err());
    }
}
