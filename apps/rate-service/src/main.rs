//! Rate Service Binary
//!
//! Starts the exchange rate gRPC service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin rate-service -- --grpc-port 50051 --db-host localhost
//! ```
//!
//! Run with `--help` for the full flag list. Each flag overrides the
//! environment variable of the same meaning.
//!
//! # Environment Variables
//!
//! ## Required
//! - `DB_USER`: PostgreSQL user
//! - `DB_PASSWORD`: PostgreSQL password (may be empty)
//! - `DB_NAME`: PostgreSQL database
//!
//! ## Optional
//! - `GRPC_PORT`: gRPC server port (default: 50051)
//! - `KUCOIN_BASE_URL`: Exchange REST base URL (default: <https://api.kucoin.com>)
//! - `UPSTREAM_TIMEOUT_SECS`: Exchange request timeout (default: 10)
//! - `DB_HOST` / `DB_PORT`: PostgreSQL address (default: localhost:5432)
//! - `DB_SSL_MODE`: disable | allow | prefer | require | verify-ca | verify-full (default: disable)
//! - `DB_MAX_CONNECTIONS`: Pool size (default: 10)
//! - `ENABLE_METRICS`: Collect Prometheus metrics (default: true)
//! - `METRICS_PORT`: Health and metrics HTTP port (default: 9090)
//! - `ENABLE_TRACING`: Export spans over OTLP (default: true)
//! - `OTLP_ENDPOINT`: OTLP gRPC endpoint (default: <http://localhost:4317>)
//! - `SERVICE_NAME` / `SERVICE_VERSION` / `ENVIRONMENT`: Trace resource attributes
//! - `HEALTH_CHECK_SYMBOL`: Pair used by health checks (default: BTC-USDT)
//! - `LOG_LEVEL`: Default log level (default: debug); `RUST_LOG` overrides

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use rate_service::application::ports::{RateProviderPort, RateRepositoryPort};
use rate_service::application::services::RateService;
use clap::Parser;
use rate_service::infrastructure::config::{CliArgs, RateServiceConfig};
use rate_service::infrastructure::grpc::RateGrpcServer;
use rate_service::infrastructure::health::{HealthServer, HealthServerState};
use rate_service::infrastructure::kucoin::KucoinClient;
use rate_service::infrastructure::metrics::RateMetrics;
use rate_service::infrastructure::persistence::{PgRateStore, initialize_schema};
use rate_service::infrastructure::telemetry;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tonic::transport::Server;

/// Graceful shutdown timeout.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    load_dotenv();

    let args = CliArgs::parse();
    let config = RateServiceConfig::from_args(&args).context("invalid configuration")?;

    // Initialize telemetry (OpenTelemetry + tracing)
    let telemetry_guard =
        telemetry::init_with_config(&config.telemetry).context("failed to initialize tracing")?;

    tracing::info!(
        exporting = telemetry_guard.is_exporting(),
        "Starting Rate Service"
    );
    log_config(&config);

    let metrics = Arc::new(if config.server.metrics_enabled {
        RateMetrics::prometheus().context("failed to initialize metrics")?
    } else {
        RateMetrics::noop()
    });

    let store = Arc::new(
        PgRateStore::connect(&config.database)
            .await
            .context("failed to connect to PostgreSQL")?,
    );
    initialize_schema(store.pool())
        .await
        .context("failed to initialize schema")?;

    let quotes = Arc::new(
        KucoinClient::from_settings(&config.kucoin).context("failed to build exchange client")?,
    );

    let provider: Arc<dyn RateProviderPort> = Arc::new(RateService::new(
        quotes,
        Arc::clone(&store) as Arc<dyn RateRepositoryPort>,
        Arc::clone(&metrics),
        config.health_check_symbol.clone(),
    ));

    let shutdown_token = CancellationToken::new();

    // Spawn health server
    let health_state = Arc::new(HealthServerState::new(
        config.telemetry.service_name.clone(),
        config.telemetry.service_version.clone(),
        config.telemetry.environment,
        Arc::clone(&provider),
        Arc::clone(&metrics),
    ));
    let health_server = HealthServer::new(
        config.server.metrics_port,
        health_state,
        shutdown_token.clone(),
    );
    tokio::spawn(async move {
        if let Err(e) = health_server.run().await {
            tracing::error!(error = %e, "Health server error");
        }
    });

    // Spawn gRPC server
    let grpc_addr = SocketAddr::from(([0, 0, 0, 0], config.server.grpc_port));
    let grpc_routes = RateGrpcServer::new(Arc::clone(&provider), Arc::clone(&metrics))
        .into_routes()
        .context("failed to build gRPC reflection service")?;
    let grpc_shutdown = shutdown_token.clone();

    let mut grpc_handle = tokio::spawn(async move {
        tracing::info!(addr = %grpc_addr, "gRPC server listening");
        if let Err(e) = Server::builder()
            .add_routes(grpc_routes)
            .serve_with_shutdown(grpc_addr, grpc_shutdown.cancelled())
            .await
        {
            tracing::error!(error = %e, "gRPC server error");
        }
        tracing::info!("gRPC server stopped");
    });

    tracing::info!("Rate service ready");

    tokio::select! {
        () = await_shutdown(shutdown_token.clone()) => {
            if tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut grpc_handle).await.is_err() {
                tracing::warn!(
                    timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
                    "gRPC server did not stop in time"
                );
            }
        }
        _ = &mut grpc_handle => {
            tracing::error!("gRPC server exited, shutting down");
            shutdown_token.cancel();
        }
    }

    store.close().await.context("failed to close rate store")?;

    tracing::info!("Rate service stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &RateServiceConfig) {
    tracing::info!(
        environment = config.telemetry.environment.as_str(),
        version = %config.telemetry.service_version,
        grpc_port = config.server.grpc_port,
        metrics_port = config.server.metrics_port,
        metrics_enabled = config.server.metrics_enabled,
        tracing_enabled = config.telemetry.enabled,
        health_symbol = %config.health_check_symbol,
        "Configuration loaded"
    );
    tracing::debug!(
        kucoin_base_url = %config.kucoin.base_url,
        timeout_secs = config.kucoin.timeout.as_secs(),
        database = ?config.database,
        "Upstream endpoints"
    );
}

/// Load .env file from any ancestor directory.
fn load_dotenv_from_ancestors() {
    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM or SIGINT).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!(
        timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
        "Graceful shutdown started"
    );
}
