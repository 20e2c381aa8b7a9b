//! Application Ports (Driver and Driven)
//!
//! Ports define interfaces for interacting with external systems.
//! - **Driver Ports** (Primary/Inbound): `RateProviderPort`, consumed by the
//!   gRPC handler and the readiness check
//! - **Driven Ports** (Secondary/Outbound): `QuoteSourcePort` for the exchange,
//!   `RateRepositoryPort` for the rate store

mod quote_source_port;
mod rate_provider_port;
mod rate_repository_port;

pub use quote_source_port::{BookSide, QuoteError, QuoteSourcePort};
pub use rate_provider_port::{RateError, RateProviderPort};
pub use rate_repository_port::{BoxError, InMemoryRateRepository, RateRepositoryPort, StoreError};

#[cfg(test)]
pub use quote_source_port::MockQuoteSourcePort;
#[cfg(test)]
pub use rate_provider_port::MockRateProviderPort;
#[cfg(test)]
pub use rate_repository_port::MockRateRepositoryPort;
