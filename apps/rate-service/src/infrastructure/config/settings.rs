//! Rate Service Configuration Settings
//!
//! Configuration types for the rate service, loaded from environment variables.
//! Only the database credentials are required; everything else has a default.

use std::str::FromStr;
use std::time::Duration;

use sqlx::postgres::{PgConnectOptions, PgSslMode};

use super::cli::CliArgs;
use crate::domain::rate::Symbol;
use crate::infrastructure::telemetry::TelemetryConfig;

/// Default exchange REST endpoint.
pub const DEFAULT_KUCOIN_BASE_URL: &str = "https://api.kucoin.com";

/// Default pair used by the health check.
pub const DEFAULT_HEALTH_CHECK_SYMBOL: &str = "BTC-USDT";

/// Deployment environment label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    /// Local development.
    #[default]
    Development,
    /// Pre-production.
    Staging,
    /// Production.
    Production,
}

impl Environment {
    /// Parse environment from string.
    #[must_use]
    pub fn from_str_case_insensitive(s: &str) -> Self {
        match s.to_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "staging" | "stage" => Self::Staging,
            _ => Self::Development,
        }
    }

    /// Get the environment name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Staging => "staging",
            Self::Production => "production",
        }
    }
}

/// Server port settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// gRPC server port.
    pub grpc_port: u16,
    /// Ops HTTP port serving `/healthz`, `/readyz` and `/metrics`.
    pub metrics_port: u16,
    /// Whether Prometheus metrics are collected.
    pub metrics_enabled: bool,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            grpc_port: 50051,
            metrics_port: 9090,
            metrics_enabled: true,
        }
    }
}

/// Exchange client settings.
#[derive(Debug, Clone)]
pub struct KucoinSettings {
    /// REST base URL.
    pub base_url: String,
    /// Per-request timeout.
    pub timeout: Duration,
}

impl Default for KucoinSettings {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_KUCOIN_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
        }
    }
}

/// PostgreSQL connection settings.
#[derive(Clone)]
pub struct DatabaseSettings {
    /// Server host.
    pub host: String,
    /// Server port.
    pub port: u16,
    /// Login role.
    pub user: String,
    password: String,
    /// Database name.
    pub name: String,
    /// TLS negotiation mode.
    pub ssl_mode: PgSslMode,
    /// Connection pool size.
    pub max_connections: u32,
}

impl DatabaseSettings {
    /// Create settings with the default host, port, TLS mode and pool size.
    #[must_use]
    pub fn new(user: String, password: String, name: String) -> Self {
        Self {
            host: "localhost".to_string(),
            port: 5432,
            user,
            password,
            name,
            ssl_mode: PgSslMode::Disable,
            max_connections: 10,
        }
    }

    /// Get the password.
    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Build driver connect options.
    #[must_use]
    pub fn connect_options(&self) -> PgConnectOptions {
        PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user)
            .password(&self.password)
            .database(&self.name)
            .ssl_mode(self.ssl_mode)
    }
}

impl std::fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"[REDACTED]")
            .field("name", &self.name)
            .field("ssl_mode", &self.ssl_mode)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

/// Complete service configuration.
#[derive(Debug, Clone)]
pub struct RateServiceConfig {
    /// Server port settings.
    pub server: ServerSettings,
    /// Exchange client settings.
    pub kucoin: KucoinSettings,
    /// Database settings.
    pub database: DatabaseSettings,
    /// Logging and tracing settings.
    pub telemetry: TelemetryConfig,
    /// Pair used by the health check.
    pub health_check_symbol: Symbol,
}

impl RateServiceConfig {
    /// Create configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if database credentials are missing or a value
    /// cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Create configuration from command-line flags, falling back to
    /// environment variables for anything not given as a flag.
    ///
    /// # Errors
    ///
    /// See [`RateServiceConfig::from_env`].
    pub fn from_args(args: &CliArgs) -> Result<Self, ConfigError> {
        Self::from_args_with(args, |key| std::env::var(key).ok())
    }

    /// Create configuration from command-line flags layered over `lookup`.
    ///
    /// # Errors
    ///
    /// See [`RateServiceConfig::from_env`].
    pub fn from_args_with<F>(args: &CliArgs, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        Self::from_lookup(|key| args.value_for(key).or_else(|| lookup(key)))
    }

    /// Create configuration from an arbitrary key lookup.
    ///
    /// # Errors
    ///
    /// See [`RateServiceConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = Env(lookup);

        let user = env.required_non_empty("DB_USER")?;
        let password = env.required("DB_PASSWORD")?;
        let name = env.required_non_empty("DB_NAME")?;

        let mut database = DatabaseSettings::new(user, password, name);
        database.host = env.string("DB_HOST", &database.host);
        database.port = env.parse("DB_PORT", database.port);
        database.max_connections = env.parse("DB_MAX_CONNECTIONS", database.max_connections);
        if let Some(mode) = env.get("DB_SSL_MODE") {
            database.ssl_mode = PgSslMode::from_str(&mode).map_err(|_| ConfigError::InvalidValue {
                key: "DB_SSL_MODE".to_string(),
                value: mode.clone(),
            })?;
        }

        let server = ServerSettings {
            grpc_port: env.parse("GRPC_PORT", ServerSettings::default().grpc_port),
            metrics_port: env.parse("METRICS_PORT", ServerSettings::default().metrics_port),
            metrics_enabled: env.bool("ENABLE_METRICS", true),
        };

        let kucoin = KucoinSettings {
            base_url: env.string("KUCOIN_BASE_URL", DEFAULT_KUCOIN_BASE_URL),
            timeout: env
                .get("UPSTREAM_TIMEOUT_SECS")
                .and_then(|v| v.parse::<u64>().ok())
                .map_or(KucoinSettings::default().timeout, Duration::from_secs),
        };

        let defaults = TelemetryConfig::default();
        let telemetry = TelemetryConfig {
            enabled: env.bool("ENABLE_TRACING", defaults.enabled),
            otlp_endpoint: normalize_endpoint(&env.string("OTLP_ENDPOINT", &defaults.otlp_endpoint)),
            service_name: env.string("SERVICE_NAME", &defaults.service_name),
            service_version: env.string("SERVICE_VERSION", &defaults.service_version),
            environment: env
                .get("ENVIRONMENT")
                .map(|s| Environment::from_str_case_insensitive(&s))
                .unwrap_or_default(),
            log_level: env.string("LOG_LEVEL", &defaults.log_level).to_lowercase(),
        };

        let health_check_symbol = Symbol::new(
            env.get("HEALTH_CHECK_SYMBOL")
                .unwrap_or_else(|| DEFAULT_HEALTH_CHECK_SYMBOL.to_string()),
        )
        .map_err(|_| ConfigError::EmptyValue("HEALTH_CHECK_SYMBOL".to_string()))?;

        Ok(Self {
            server,
            kucoin,
            database,
            telemetry,
            health_check_symbol,
        })
    }
}

/// Configuration error.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Required environment variable is missing.
    #[error("missing required setting: {0} (environment variable or flag)")]
    MissingEnvVar(String),
    /// Environment variable has empty value.
    #[error("environment variable {0} cannot be empty")]
    EmptyValue(String),
    /// Environment variable could not be parsed.
    #[error("invalid value for {key}: {value:?}")]
    InvalidValue {
        /// Variable name.
        key: String,
        /// Rejected value.
        value: String,
    },
}

/// Prepend `http://` when the endpoint carries no scheme.
fn normalize_endpoint(endpoint: &str) -> String {
    if endpoint.contains("://") {
        endpoint.to_string()
    } else {
        format!("http://{endpoint}")
    }
}

struct Env<F>(F);

impl<F> Env<F>
where
    F: Fn(&str) -> Option<String>,
{
    fn get(&self, key: &str) -> Option<String> {
        (self.0)(key)
    }

    fn required(&self, key: &str) -> Result<String, ConfigError> {
        self.get(key)
            .ok_or_else(|| ConfigError::MissingEnvVar(key.to_string()))
    }

    fn required_non_empty(&self, key: &str) -> Result<String, ConfigError> {
        let value = self.required(key)?;
        if value.is_empty() {
            return Err(ConfigError::EmptyValue(key.to_string()));
        }
        Ok(value)
    }

    fn string(&self, key: &str, default: &str) -> String {
        self.get(key)
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| default.to_string())
    }

    fn parse<T: FromStr>(&self, key: &str, default: T) -> T {
        self.get(key)
            .and_then(|v| v.parse().ok())
            .unwrap_or(default)
    }

    fn bool(&self, key: &str, default: bool) -> bool {
        self.get(key)
            .map_or(default, |v| match v.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" => true,
                "false" | "0" | "no" | "off" => false,
                _ => default,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<RateServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RateServiceConfig::from_lookup(|key| map.get(key).cloned())
    }

    const CREDS: &[(&str, &str)] = &[
        ("DB_USER", "rates"),
        ("DB_PASSWORD", "hunter2"),
        ("DB_NAME", "rates_db"),
    ];

    #[test]
    fn defaults_apply_with_only_credentials() {
        let config = config(CREDS).unwrap();

        assert_eq!(config.server.grpc_port, 50051);
        assert_eq!(config.server.metrics_port, 9090);
        assert!(config.server.metrics_enabled);
        assert_eq!(config.kucoin.base_url, DEFAULT_KUCOIN_BASE_URL);
        assert_eq!(config.kucoin.timeout, Duration::from_secs(10));
        assert_eq!(config.database.host, "localhost");
        assert_eq!(config.database.port, 5432);
        assert!(matches!(config.database.ssl_mode, PgSslMode::Disable));
        assert_eq!(config.database.max_connections, 10);
        assert_eq!(config.telemetry.service_name, "rate-service");
        assert_eq!(config.telemetry.environment, Environment::Development);
        assert_eq!(config.telemetry.log_level, "debug");
        assert_eq!(config.telemetry.otlp_endpoint, "http://localhost:4317");
        assert_eq!(config.health_check_symbol.as_str(), "BTC-USDT");
    }

    #[test]
    fn missing_credentials_fail() {
        let err = config(&[("DB_PASSWORD", "x"), ("DB_NAME", "y")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "DB_USER"));

        let err = config(&[("DB_USER", "x"), ("DB_NAME", "y")]).unwrap_err();
        assert!(matches!(err, ConfigError::MissingEnvVar(ref k) if k == "DB_PASSWORD"));

        let err = config(&[("DB_USER", ""), ("DB_PASSWORD", "x"), ("DB_NAME", "y")]).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(ref k) if k == "DB_USER"));
    }

    #[test]
    fn empty_password_is_allowed() {
        let config = config(&[("DB_USER", "u"), ("DB_PASSWORD", ""), ("DB_NAME", "n")]).unwrap();
        assert_eq!(config.database.password(), "");
    }

    #[test]
    fn overrides_are_read() {
        let mut vars = CREDS.to_vec();
        vars.extend_from_slice(&[
            ("GRPC_PORT", "6000"),
            ("METRICS_PORT", "6001"),
            ("ENABLE_METRICS", "false"),
            ("ENABLE_TRACING", "FALSE"),
            ("KUCOIN_BASE_URL", "http://127.0.0.1:8080"),
            ("UPSTREAM_TIMEOUT_SECS", "3"),
            ("DB_HOST", "db"),
            ("DB_PORT", "6543"),
            ("DB_SSL_MODE", "require"),
            ("DB_MAX_CONNECTIONS", "4"),
            ("LOG_LEVEL", "INFO"),
            ("ENVIRONMENT", "production"),
            ("OTLP_ENDPOINT", "otel:4317"),
            ("HEALTH_CHECK_SYMBOL", "ETH-USDT"),
        ]);
        let config = config(&vars).unwrap();

        assert_eq!(config.server.grpc_port, 6000);
        assert_eq!(config.server.metrics_port, 6001);
        assert!(!config.server.metrics_enabled);
        assert!(!config.telemetry.enabled);
        assert_eq!(config.kucoin.base_url, "http://127.0.0.1:8080");
        assert_eq!(config.kucoin.timeout, Duration::from_secs(3));
        assert_eq!(config.database.host, "db");
        assert_eq!(config.database.port, 6543);
        assert!(matches!(config.database.ssl_mode, PgSslMode::Require));
        assert_eq!(config.database.max_connections, 4);
        assert_eq!(config.telemetry.log_level, "info");
        assert_eq!(config.telemetry.environment, Environment::Production);
        assert_eq!(config.telemetry.otlp_endpoint, "http://otel:4317");
        assert_eq!(config.health_check_symbol.as_str(), "ETH-USDT");
    }

    #[test]
    fn unparsable_numbers_fall_back_to_defaults() {
        let mut vars = CREDS.to_vec();
        vars.extend_from_slice(&[("GRPC_PORT", "not-a-port"), ("DB_PORT", "99999")]);
        let config = config(&vars).unwrap();
        assert_eq!(config.server.grpc_port, 50051);
        assert_eq!(config.database.port, 5432);
    }

    #[test]
    fn invalid_ssl_mode_is_rejected() {
        let mut vars = CREDS.to_vec();
        vars.push(("DB_SSL_MODE", "sometimes"));
        let err = config(&vars).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref key, .. } if key == "DB_SSL_MODE"));
    }

    #[test]
    fn empty_health_symbol_is_rejected() {
        let mut vars = CREDS.to_vec();
        vars.push(("HEALTH_CHECK_SYMBOL", ""));
        assert!(matches!(
            config(&vars).unwrap_err(),
            ConfigError::EmptyValue(ref k) if k == "HEALTH_CHECK_SYMBOL"
        ));
    }

    fn args(flags: &[&str]) -> CliArgs {
        CliArgs::try_parse_from(std::iter::once("rate-service").chain(flags.iter().copied()))
            .unwrap()
    }

    fn config_with_args(
        flags: &[&str],
        vars: &[(&str, &str)],
    ) -> Result<RateServiceConfig, ConfigError> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        RateServiceConfig::from_args_with(&args(flags), |key| map.get(key).cloned())
    }

    #[test]
    fn flags_override_environment() {
        let mut vars = CREDS.to_vec();
        vars.extend_from_slice(&[
            ("GRPC_PORT", "6000"),
            ("DB_HOST", "env-db"),
            ("ENABLE_METRICS", "true"),
            ("KUCOIN_BASE_URL", "http://env-exchange"),
        ]);
        let config = config_with_args(
            &[
                "--grpc-port",
                "7000",
                "--db-host",
                "flag-db",
                "--enable-metrics=false",
                "--db-sslmode",
                "verify-full",
            ],
            &vars,
        )
        .unwrap();

        assert_eq!(config.server.grpc_port, 7000);
        assert_eq!(config.database.host, "flag-db");
        assert!(!config.server.metrics_enabled);
        assert!(matches!(config.database.ssl_mode, PgSslMode::VerifyFull));
        // Not given as a flag, so the environment still applies.
        assert_eq!(config.kucoin.base_url, "http://env-exchange");
        assert_eq!(config.database.user, "rates");
    }

    #[test]
    fn credentials_can_come_from_flags_alone() {
        let config = config_with_args(
            &["--db-user", "u", "--db-password", "", "--db-name", "n"],
            &[],
        )
        .unwrap();
        assert_eq!(config.database.user, "u");
        assert_eq!(config.database.password(), "");
        assert_eq!(config.database.name, "n");
    }

    #[test]
    fn empty_user_flag_is_rejected() {
        let err = config_with_args(&["--db-user", ""], CREDS).unwrap_err();
        assert!(matches!(err, ConfigError::EmptyValue(ref k) if k == "DB_USER"));
    }

    #[test]
    fn database_password_redacted_debug() {
        let settings = DatabaseSettings::new("u".into(), "secret456".into(), "n".into());
        let debug = format!("{settings:?}");
        assert!(!debug.contains("secret456"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn environment_parsing() {
        assert_eq!(
            Environment::from_str_case_insensitive("PROD"),
            Environment::Production
        );
        assert_eq!(
            Environment::from_str_case_insensitive("staging"),
            Environment::Staging
        );
        assert_eq!(
            Environment::from_str_case_insensitive("anything"),
            Environment::Development
        );
    }

    #[test]
    fn endpoint_scheme_is_added_once() {
        assert_eq!(normalize_endpoint("localhost:4317"), "http://localhost:4317");
        assert_eq!(normalize_endpoint("https://otel:4317"), "https://otel:4317");
    }
}
