//! Domain Layer - Core rate types.
//!
//! This layer contains the quote and persisted rate types with no
//! infrastructure dependencies beyond decimal and time arithmetic.

/// Trading symbols, fresh quotes and stored rate records.
pub mod rate;
