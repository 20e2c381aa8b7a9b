//! KuCoin REST Adapter
//!
//! Implements [`QuoteSourcePort`](crate::application::ports::QuoteSourcePort)
//! against KuCoin's public level-2 order book snapshot.
//!
//! - **messages**: Wire format of the order book envelope
//! - **client**: HTTP client and top-of-book extraction

pub mod client;
pub mod messages;

pub use client::{KucoinClient, ORDER_BOOK_PATH};
pub use messages::{OrderBookData, OrderBookEnvelope};
