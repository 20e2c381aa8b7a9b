#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::significant_drop_tightening,
        clippy::too_many_lines,
        clippy::match_same_arms,
        clippy::needless_pass_by_value,
        clippy::needless_collect,
        clippy::option_if_let_else,
        clippy::default_trait_access,
        clippy::items_after_statements,
        clippy::or_fun_call
    )
)]

//! Rate Service - Exchange Rate gRPC Service
//!
//! Serves the current best ask and bid for a trading pair over gRPC. Each
//! request pulls the top of the KuCoin order book, records the quote in
//! PostgreSQL, and returns it to the caller.
//!
//! # Layers (inside -> outside)
//!
//! - **Domain**: Core rate types
//!   - `rate`: Symbols, quotes, stored rate records
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Interfaces for the quote source, rate store, rate provider
//!   - `services`: Rate fetching and health evaluation
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `kucoin`: HTTP client for the level-2 order book
//!   - `persistence`: PostgreSQL rate store
//!   - `grpc`: gRPC server implementation
//!   - `config`: Environment configuration
//!   - `health`: Health check and metrics HTTP endpoint
//!
//! # Data Flow
//!
//! ```text
//!                 +-------------+     +-------------+
//! gRPC client --->|    gRPC     |---->|    Rate     |---> KuCoin REST
//!             <---|   Server    |<----|   Service   |
//!                 +-------------+     +------+------+
//!                                            |
//!                                            v
//!                                       PostgreSQL
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core rate types with no infrastructure dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::rate::{EmptySymbol, Quote, RateRecord, Symbol};

// Ports and services
pub use application::ports::{
    BookSide, InMemoryRateRepository, QuoteError, QuoteSourcePort, RateError, RateProviderPort,
    RateRepositoryPort, StoreError,
};
pub use application::services::RateService;

// Infrastructure config
pub use infrastructure::config::{
    CliArgs, ConfigError, DatabaseSettings, Environment, KucoinSettings, RateServiceConfig,
    ServerSettings,
};

// Health server
pub use infrastructure::health::{HealthServer, HealthServerError, HealthServerState};

// Adapters
pub use infrastructure::kucoin::KucoinClient;
pub use infrastructure::persistence::{PgRateStore, initialize_schema};

// gRPC server (for integration tests)
pub use infrastructure::grpc::{RateGrpcServer, proto::rate_service::v1 as proto};

// Metrics
pub use infrastructure::metrics::{FetchStatus, RateMetrics};

// Telemetry
pub use infrastructure::telemetry::{
    TelemetryConfig, TelemetryGuard, init_with_config as init_telemetry,
};
