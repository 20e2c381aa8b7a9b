//! gRPC Rate Server
//!
//! Implements the `rate_service.v1.RateService` gRPC service on top of
//! [`RateProviderPort`](crate::application::ports::RateProviderPort).
//!
//! # Methods
//!
//! - `GetRates`: validates the symbol, fetches the current quote, and maps
//!   any failure to an opaque `INTERNAL` status
//! - `HealthCheck`: reports readiness as a plain boolean, never an error
//!
//! gRPC server reflection (`grpc.reflection.v1`) is served beside it, so
//! `grpcurl` and similar tools can list and describe the service.

pub mod server;

// Allow clippy warnings and missing docs in generated code
#[allow(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]
pub mod proto {
    pub mod rate_service {
        pub mod v1 {
            include!("../../../../../packages/schema-gen/rust/rate/v1/rate_service.v1.rs");
            include!("../../../../../packages/schema-gen/rust/rate/v1/rate_service.v1.tonic.rs");

            /// Encoded `FileDescriptorSet` for `rate/v1/rate.proto` and its imports.
            pub const FILE_DESCRIPTOR_SET: &[u8] = include_bytes!(
                "../../../../../packages/schema-gen/rust/rate/v1/rate_service_descriptor.bin"
            );
        }
    }
}

pub use server::{GET_RATES_METHOD, HEALTH_CHECK_METHOD, RateGrpcServer};
