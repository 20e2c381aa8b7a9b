//! Infrastructure Layer - Adapters and external integrations.
//!
//! This layer contains the concrete implementations of the port interfaces
//! defined in the application layer.

/// KuCoin REST client (quote source).
pub mod kucoin;

/// PostgreSQL rate store and schema bootstrap.
pub mod persistence;

/// gRPC rate server implementation.
pub mod grpc;

/// Configuration loading.
pub mod config;

/// Health check and metrics HTTP endpoint.
pub mod health;

/// Prometheus metrics instrumentation.
pub mod metrics;

/// OpenTelemetry tracing integration.
pub mod telemetry;
