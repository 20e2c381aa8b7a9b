//! Rate Service
//!
//! Orchestrates the quote source and the rate store. A fetched quote is
//! returned to the caller even when recording it fails.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, error, info, instrument, warn};

use crate::application::ports::{
    QuoteSourcePort, RateError, RateProviderPort, RateRepositoryPort, StoreError,
};
use crate::domain::rate::{Quote, Symbol};
use crate::infrastructure::metrics::{FetchStatus, RateMetrics};

/// Rate lookups and the aggregate health check.
pub struct RateService {
    quotes: Arc<dyn QuoteSourcePort>,
    store: Arc<dyn RateRepositoryPort>,
    metrics: Arc<RateMetrics>,
    health_symbol: Symbol,
}

impl std::fmt::Debug for RateService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateService")
            .field("health_symbol", &self.health_symbol)
            .finish_non_exhaustive()
    }
}

impl RateService {
    /// Create a new rate service.
    ///
    /// `health_symbol` is the pair used by [`RateProviderPort::is_healthy`]
    /// to exercise both the store and the exchange.
    #[must_use]
    pub fn new(
        quotes: Arc<dyn QuoteSourcePort>,
        store: Arc<dyn RateRepositoryPort>,
        metrics: Arc<RateMetrics>,
        health_symbol: Symbol,
    ) -> Self {
        Self {
            quotes,
            store,
            metrics,
            health_symbol,
        }
    }

    /// The health check symbol.
    #[must_use]
    pub const fn health_symbol(&self) -> &Symbol {
        &self.health_symbol
    }
}

#[async_trait]
impl RateProviderPort for RateService {
    #[instrument(skip(self, symbol), fields(symbol = %symbol))]
    async fn get_rate(&self, symbol: &Symbol) -> Result<Quote, RateError> {
        let quote = match self.quotes.fetch_top_of_book(symbol).await {
            Ok(quote) => quote,
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Failed to fetch rate from exchange");
                self.metrics
                    .record_rate_fetch(symbol.as_str(), FetchStatus::Error);
                return Err(e.into());
            }
        };
        self.metrics
            .record_rate_fetch(symbol.as_str(), FetchStatus::Success);

        if let Err(e) = self.store.save(&quote).await {
            warn!(error = %e, "Failed to save rate, returning fetched quote");
        } else {
            debug!("Rate saved");
        }

        info!(
            ask = %quote.ask,
            bid = %quote.bid,
            spread = %quote.spread(),
            quote_time = %quote.quote_time,
            "Rate fetched"
        );
        Ok(quote)
    }

    #[instrument(skip(self), fields(symbol = %self.health_symbol))]
    async fn is_healthy(&self) -> bool {
        match self.store.latest(&self.health_symbol).await {
            Ok(_) | Err(StoreError::NotFound { .. }) => {}
            Err(e) => {
                warn!(error = %e, "Health check failed: rate store unreachable");
                return false;
            }
        }

        if let Err(e) = self.quotes.fetch_top_of_book(&self.health_symbol).await {
            warn!(error = %e, "Health check failed: exchange unreachable");
            return false;
        }

        debug!("Health check passed");
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        BookSide, MockQuoteSourcePort, MockRateRepositoryPort, QuoteError,
    };
    use crate::domain::rate::RateRecord;
    use chrono::{TimeZone, Utc};
    use rust_decimal::Decimal;
    use test_case::test_case;

    fn btc() -> Symbol {
        Symbol::new("BTC-USDT").unwrap()
    }

    fn sample_quote() -> Quote {
        Quote::new(
            btc(),
            Decimal::new(400_010, 1),
            Decimal::new(400_000, 1),
            Utc.timestamp_millis_opt(1_617_267_321_123).unwrap(),
        )
    }

    fn sample_record() -> RateRecord {
        let quote = sample_quote();
        RateRecord {
            id: 1,
            symbol: quote.symbol,
            ask: quote.ask,
            bid: quote.bid,
            quote_time: quote.quote_time,
            recorded_time: quote.quote_time,
        }
    }

    fn service(
        quotes: MockQuoteSourcePort,
        store: MockRateRepositoryPort,
        metrics: Arc<RateMetrics>,
    ) -> RateService {
        RateService::new(Arc::new(quotes), Arc::new(store), metrics, btc())
    }

    #[tokio::test]
    async fn get_rate_saves_and_returns_quote() {
        let mut quotes = MockQuoteSourcePort::new();
        quotes
            .expect_fetch_top_of_book()
            .withf(|s| s.as_str() == "BTC-USDT")
            .times(1)
            .returning(|_| Ok(sample_quote()));
        let mut store = MockRateRepositoryPort::new();
        store
            .expect_save()
            .withf(|q| *q == sample_quote())
            .times(1)
            .returning(|_| Ok(()));
        let metrics = Arc::new(RateMetrics::prometheus().unwrap());

        let svc = service(quotes, store, Arc::clone(&metrics));
        let quote = svc.get_rate(&btc()).await.unwrap();

        assert_eq!(quote, sample_quote());
        let text = metrics.render().unwrap();
        assert!(text.contains(r#"rate_fetch_total{symbol="BTC-USDT",status="success"} 1"#));
    }

    #[tokio::test]
    async fn get_rate_swallows_save_failure() {
        let mut quotes = MockQuoteSourcePort::new();
        quotes
            .expect_fetch_top_of_book()
            .returning(|_| Ok(sample_quote()));
        let mut store = MockRateRepositoryPort::new();
        store
            .expect_save()
            .times(1)
            .returning(|_| Err(StoreError::persistence("disk full")));

        let svc = service(quotes, store, Arc::new(RateMetrics::noop()));
        let quote = svc.get_rate(&btc()).await.unwrap();

        assert_eq!(quote, sample_quote());
    }

    #[test_case(QuoteError::UpstreamStatus { status: 502 } ; "upstream status")]
    #[test_case(QuoteError::Decode { message: "expected value".into() } ; "malformed body")]
    #[test_case(QuoteError::EmptyBook { asks: 0, bids: 3 } ; "empty book")]
    #[test_case(QuoteError::PriceParse { side: BookSide::Ask, raw: "abc".into() } ; "non-numeric price")]
    #[test_case(QuoteError::Transport { message: "connection refused".into() } ; "transport")]
    #[tokio::test]
    async fn get_rate_propagates_fetch_error_without_saving(fetch_error: QuoteError) {
        let returned = fetch_error.clone();
        let mut quotes = MockQuoteSourcePort::new();
        quotes
            .expect_fetch_top_of_book()
            .times(1)
            .returning(move |_| Err(returned.clone()));
        let mut store = MockRateRepositoryPort::new();
        store.expect_save().never();
        let metrics = Arc::new(RateMetrics::prometheus().unwrap());

        let svc = service(quotes, store, Arc::clone(&metrics));
        let err = svc.get_rate(&btc()).await.unwrap_err();

        assert_eq!(err, RateError::Quote(fetch_error));
        let text = metrics.render().unwrap();
        assert!(text.contains(r#"rate_fetch_total{symbol="BTC-USDT",status="error"} 1"#));
    }

    #[tokio::test]
    async fn healthy_when_store_has_rows_and_exchange_answers() {
        let mut quotes = MockQuoteSourcePort::new();
        quotes
            .expect_fetch_top_of_book()
            .times(1)
            .returning(|_| Ok(sample_quote()));
        let mut store = MockRateRepositoryPort::new();
        store
            .expect_latest()
            .times(1)
            .returning(|_| Ok(sample_record()));

        assert!(service(quotes, store, Arc::new(RateMetrics::noop())).is_healthy().await);
    }

    #[tokio::test]
    async fn empty_store_counts_as_reachable() {
        let mut quotes = MockQuoteSourcePort::new();
        quotes
            .expect_fetch_top_of_book()
            .times(1)
            .returning(|_| Ok(sample_quote()));
        let mut store = MockRateRepositoryPort::new();
        store
            .expect_latest()
            .returning(|s| Err(StoreError::NotFound { symbol: s.clone() }));

        assert!(service(quotes, store, Arc::new(RateMetrics::noop())).is_healthy().await);
    }

    #[tokio::test]
    async fn store_failure_skips_exchange_check() {
        let mut quotes = MockQuoteSourcePort::new();
        quotes.expect_fetch_top_of_book().never();
        let mut store = MockRateRepositoryPort::new();
        store
            .expect_latest()
            .returning(|_| Err(StoreError::persistence("connection refused")));

        assert!(!service(quotes, store, Arc::new(RateMetrics::noop())).is_healthy().await);
    }

    #[tokio::test]
    async fn exchange_failure_is_unhealthy() {
        let mut quotes = MockQuoteSourcePort::new();
        quotes.expect_fetch_top_of_book().returning(|_| {
            Err(QuoteError::Transport {
                message: "timed out".into(),
            })
        });
        let mut store = MockRateRepositoryPort::new();
        store
            .expect_latest()
            .returning(|s| Err(StoreError::NotFound { symbol: s.clone() }));

        assert!(!service(quotes, store, Arc::new(RateMetrics::noop())).is_healthy().await);
    }

    #[tokio::test]
    async fn health_check_uses_configured_symbol() {
        let eth = Symbol::new("ETH-USDT").unwrap();
        let mut quotes = MockQuoteSourcePort::new();
        quotes
            .expect_fetch_top_of_book()
            .withf(|s| s.as_str() == "ETH-USDT")
            .returning(|_| Ok(sample_quote()));
        let mut store = MockRateRepositoryPort::new();
        store
            .expect_latest()
            .withf(|s| s.as_str() == "ETH-USDT")
            .returning(|s| Err(StoreError::NotFound { symbol: s.clone() }));

        let svc = RateService::new(
            Arc::new(quotes),
            Arc::new(store),
            Arc::new(RateMetrics::noop()),
            eth.clone(),
        );
        assert_eq!(svc.health_symbol(), &eth);
        assert!(svc.is_healthy().await);
    }
}
