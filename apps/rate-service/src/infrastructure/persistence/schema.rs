//! Rate table bootstrap.

use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

/// Schema bootstrap errors.
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Statement failed.
    #[error("Database error: {0}")]
    DatabaseError(#[from] sqlx::Error),
}

/// Create the `rates` table and its indexes if they do not exist.
///
/// # Errors
///
/// Returns an error if any DDL statement fails.
pub async fn initialize_schema(pool: &PgPool) -> Result<(), SchemaError> {
    sqlx::query(
        r"
        CREATE TABLE IF NOT EXISTS rates (
            id            BIGSERIAL PRIMARY KEY,
            symbol        VARCHAR(32)    NOT NULL,
            ask           NUMERIC(20, 8) NOT NULL,
            bid           NUMERIC(20, 8) NOT NULL,
            quote_time    TIMESTAMPTZ    NOT NULL,
            recorded_time TIMESTAMPTZ    NOT NULL DEFAULT NOW()
        )
        ",
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_rates_symbol ON rates(symbol)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_rates_quote_time ON rates(quote_time)")
        .execute(pool)
        .await?;

    info!("Rate schema initialized");
    Ok(())
}
