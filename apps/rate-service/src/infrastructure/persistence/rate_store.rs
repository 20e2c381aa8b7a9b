//! Rate store backed by PostgreSQL via `SQLx`.
//!
//! One pool is shared across all requests; no transaction spans a fetch and
//! its save.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{Connection, PgPool, Row};
use tracing::{debug, info, instrument};

use crate::application::ports::{RateRepositoryPort, StoreError};
use crate::domain::rate::{Quote, RateRecord, Symbol};
use crate::infrastructure::config::DatabaseSettings;

/// How long to wait for a pooled connection.
const ACQUIRE_TIMEOUT: Duration = Duration::from_secs(5);

/// PostgreSQL rate store.
#[derive(Debug, Clone)]
pub struct PgRateStore {
    pool: PgPool,
}

impl PgRateStore {
    /// Connect and ping, so bad settings fail at startup instead of first use.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if the pool cannot be created or
    /// the ping fails.
    pub async fn connect(settings: &DatabaseSettings) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(settings.max_connections)
            .acquire_timeout(ACQUIRE_TIMEOUT)
            .connect_with(settings.connect_options())
            .await
            .map_err(StoreError::persistence)?;

        let store = Self::with_pool(pool);
        store.ping().await?;

        info!(
            host = %settings.host,
            database = %settings.name,
            max_connections = settings.max_connections,
            "PostgreSQL connection pool initialized"
        );
        Ok(store)
    }

    /// Create a store with an existing pool (for testing).
    #[must_use]
    pub const fn with_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying connection pool.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Round-trip a ping on a pooled connection.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Persistence`] if no connection is usable.
    pub async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.pool.acquire().await.map_err(StoreError::persistence)?;
        conn.ping().await.map_err(StoreError::persistence)
    }
}

#[async_trait]
impl RateRepositoryPort for PgRateStore {
    #[instrument(skip(self, quote), fields(symbol = %quote.symbol))]
    async fn save(&self, quote: &Quote) -> Result<(), StoreError> {
        let recorded_time = Utc::now();

        sqlx::query(
            r"
            INSERT INTO rates (symbol, ask, bid, quote_time, recorded_time)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(quote.symbol.as_str())
        .bind(quote.ask)
        .bind(quote.bid)
        .bind(quote.quote_time)
        .bind(recorded_time)
        .execute(&self.pool)
        .await
        .map_err(StoreError::persistence)?;

        debug!("Rate saved to database");
        Ok(())
    }

    #[instrument(skip(self, symbol), fields(symbol = %symbol))]
    async fn latest(&self, symbol: &Symbol) -> Result<RateRecord, StoreError> {
        let row = sqlx::query(
            r"
            SELECT id, symbol, ask, bid, quote_time, recorded_time
            FROM rates
            WHERE symbol = $1
            ORDER BY quote_time DESC
            LIMIT 1
            ",
        )
        .bind(symbol.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(StoreError::persistence)?;

        match row {
            Some(row) => row_to_record(&row),
            None => Err(StoreError::NotFound {
                symbol: symbol.clone(),
            }),
        }
    }

    async fn close(&self) -> Result<(), StoreError> {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
        Ok(())
    }
}

fn row_to_record(row: &PgRow) -> Result<RateRecord, StoreError> {
    let symbol: String = row.try_get("symbol").map_err(StoreError::persistence)?;
    let symbol = Symbol::new(symbol).map_err(StoreError::persistence)?;
    let ask: Decimal = row.try_get("ask").map_err(StoreError::persistence)?;
    let bid: Decimal = row.try_get("bid").map_err(StoreError::persistence)?;
    let quote_time: DateTime<Utc> = row.try_get("quote_time").map_err(StoreError::persistence)?;
    let recorded_time: DateTime<Utc> =
        row.try_get("recorded_time").map_err(StoreError::persistence)?;

    Ok(RateRecord {
        id: row.try_get("id").map_err(StoreError::persistence)?,
        symbol,
        ask,
        bid,
        quote_time,
        recorded_time,
    })
}
