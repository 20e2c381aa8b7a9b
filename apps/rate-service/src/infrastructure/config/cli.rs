//! Command-line arguments.
//!
//! Every flag overrides the environment variable named in its help text;
//! anything not given on the command line falls through to the environment.

use clap::Parser;

/// Parsed command-line arguments.
#[derive(Clone, Default, Parser)]
#[command(name = "rate-service", version, about, long_about = None)]
pub struct CliArgs {
    /// gRPC server port [env: GRPC_PORT]
    #[arg(long)]
    pub grpc_port: Option<u16>,

    /// Database host [env: DB_HOST]
    #[arg(long)]
    pub db_host: Option<String>,

    /// Database port [env: DB_PORT]
    #[arg(long)]
    pub db_port: Option<u16>,

    /// Database user [env: DB_USER]
    #[arg(long)]
    pub db_user: Option<String>,

    /// Database password [env: DB_PASSWORD]
    #[arg(long)]
    pub db_password: Option<String>,

    /// Database name [env: DB_NAME]
    #[arg(long)]
    pub db_name: Option<String>,

    /// Database SSL mode [env: DB_SSL_MODE]
    #[arg(long)]
    pub db_sslmode: Option<String>,

    /// KuCoin API base URL [env: KUCOIN_BASE_URL]
    #[arg(long)]
    pub kucoin_base_url: Option<String>,

    /// Enable OpenTelemetry tracing [env: ENABLE_TRACING]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub enable_tracing: Option<bool>,

    /// OpenTelemetry collector endpoint [env: OTLP_ENDPOINT]
    #[arg(long)]
    pub otlp_endpoint: Option<String>,

    /// Enable Prometheus metrics [env: ENABLE_METRICS]
    #[arg(long, num_args = 0..=1, default_missing_value = "true")]
    pub enable_metrics: Option<bool>,

    /// Health and metrics HTTP port [env: METRICS_PORT]
    #[arg(long)]
    pub metrics_port: Option<u16>,
}

impl CliArgs {
    /// Value given on the command line for environment key `key`.
    #[must_use]
    pub fn value_for(&self, key: &str) -> Option<String> {
        match key {
            "GRPC_PORT" => self.grpc_port.map(|v| v.to_string()),
            "DB_HOST" => self.db_host.clone(),
            "DB_PORT" => self.db_port.map(|v| v.to_string()),
            "DB_USER" => self.db_user.clone(),
            "DB_PASSWORD" => self.db_password.clone(),
            "DB_NAME" => self.db_name.clone(),
            "DB_SSL_MODE" => self.db_sslmode.clone(),
            "KUCOIN_BASE_URL" => self.kucoin_base_url.clone(),
            "ENABLE_TRACING" => self.enable_tracing.map(|v| v.to_string()),
            "OTLP_ENDPOINT" => self.otlp_endpoint.clone(),
            "ENABLE_METRICS" => self.enable_metrics.map(|v| v.to_string()),
            "METRICS_PORT" => self.metrics_port.map(|v| v.to_string()),
            _ => None,
        }
    }
}

impl std::fmt::Debug for CliArgs {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CliArgs")
            .field("grpc_port", &self.grpc_port)
            .field("db_host", &self.db_host)
            .field("db_port", &self.db_port)
            .field("db_user", &self.db_user)
            .field("db_password", &self.db_password.as_ref().map(|_| "[REDACTED]"))
            .field("db_name", &self.db_name)
            .field("db_sslmode", &self.db_sslmode)
            .field("kucoin_base_url", &self.kucoin_base_url)
            .field("enable_tracing", &self.enable_tracing)
            .field("otlp_endpoint", &self.otlp_endpoint)
            .field("enable_metrics", &self.enable_metrics)
            .field("metrics_port", &self.metrics_port)
            .finish()
    }
}
