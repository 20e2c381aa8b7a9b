//! Rate Repository Port (Driven Port)
//!
//! Interface for the append-only rate history.

use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;

use crate::domain::rate::{Quote, RateRecord, Symbol};

/// Boxed driver error carried by [`StoreError::Persistence`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Rate store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No row exists for the symbol. The store itself is reachable.
    #[error("no rate found for {symbol}")]
    NotFound {
        /// The requested symbol.
        symbol: Symbol,
    },

    /// Connectivity or query failure from the storage driver.
    #[error("persistence error: {0}")]
    Persistence(#[source] BoxError),
}

impl StoreError {
    /// Wrap a driver error.
    pub fn persistence(err: impl Into<BoxError>) -> Self {
        Self::Persistence(err.into())
    }

    /// Whether this is the empty-result signal rather than a failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}

/// Port for rate persistence.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateRepositoryPort: Send + Sync {
    /// Insert one row for `quote`, stamped with the current local time.
    async fn save(&self, quote: &Quote) -> Result<(), StoreError>;

    /// The most recent row for `symbol` by quote time.
    async fn latest(&self, symbol: &Symbol) -> Result<RateRecord, StoreError>;

    /// Release the underlying resources.
    async fn close(&self) -> Result<(), StoreError>;
}

/// In-memory implementation for testing.
#[derive(Debug, Default)]
pub struct InMemoryRateRepository {
    rows: RwLock<Vec<RateRecord>>,
}

impl InMemoryRateRepository {
    /// Create an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every stored row in insertion order.
    #[must_use]
    pub fn records(&self) -> Vec<RateRecord> {
        self.rows.read().map(|rows| rows.clone()).unwrap_or_default()
    }
}

#[async_trait]
impl RateRepositoryPort for InMemoryRateRepository {
    async fn save(&self, quote: &Quote) -> Result<(), StoreError> {
        let mut rows = self
            .rows
            .write()
            .map_err(|e| StoreError::persistence(e.to_string()))?;
        let id = i64::try_from(rows.len()).unwrap_or(i64::MAX).saturating_add(1);
        rows.push(RateRecord {
            id,
            symbol: quote.symbol.clone(),
            ask: quote.ask,
            bid: quote.bid,
            quote_time: quote.quote_time,
            recorded_time: Utc::now(),
        });
        drop(rows);
        Ok(())
    }

    async fn latest(&self, symbol: &Symbol) -> Result<RateRecord, StoreError> {
        let rows = self
            .rows
            .read()
            .map_err(|e| StoreError::persistence(e.to_string()))?;
        rows.iter()
            .filter(|r| &r.symbol == symbol)
            .max_by_key(|r| (r.quote_time, r.id))
            .cloned()
            .ok_or_else(|| StoreError::NotFound {
                symbol: symbol.clone(),
            })
    }

    async fn close(&self) -> Result<(), StoreError> {
        Ok(())
    }
}
