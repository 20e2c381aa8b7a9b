//! Rate Provider Port (Driver Port)
//!
//! The narrow capability the RPC surface depends on.

use async_trait::async_trait;

use crate::domain::rate::{Quote, Symbol};

use super::QuoteError;

/// Failure of a rate lookup.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RateError {
    /// The exchange could not supply a quote.
    #[error(transparent)]
    Quote(#[from] QuoteError),
}

/// Port consumed by the gRPC handler and readiness check.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RateProviderPort: Send + Sync {
    /// Fetch the current quote for `symbol`.
    async fn get_rate(&self, symbol: &Symbol) -> Result<Quote, RateError>;

    /// Whether both the store and the exchange are reachable.
    async fn is_healthy(&self) -> bool;
}
