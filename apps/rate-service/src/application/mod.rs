//! Application Layer - Use cases and port definitions.
//!
//! This layer contains the rate service and the port interfaces
//! that define how the domain interacts with external systems.

/// Port interfaces for external systems (exchange, storage, RPC surface).
pub mod ports;

/// Application services for rate retrieval and health probing.
pub mod services;
