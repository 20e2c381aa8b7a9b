//! PostgreSQL Persistence
//!
//! Implements [`RateRepositoryPort`](crate::application::ports::RateRepositoryPort)
//! on a shared `sqlx` connection pool.

mod rate_store;
mod schema;

pub use rate_store::PgRateStore;
pub use schema::{SchemaError, initialize_schema};
