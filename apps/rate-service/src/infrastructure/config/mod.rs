//! Configuration Module
//!
//! Configuration loading for the rate service: command-line flags layered
//! over environment variables.

mod cli;
mod settings;

pub use cli::CliArgs;
pub use settings::{
    ConfigError, DEFAULT_HEALTH_CHECK_SYMBOL, DEFAULT_KUCOIN_BASE_URL, DatabaseSettings,
    Environment, KucoinSettings, RateServiceConfig, ServerSettings,
};
