//! Application Services
//!
//! Use cases composed from the driven ports.

mod rate_service;

pub use rate_service::RateService;
