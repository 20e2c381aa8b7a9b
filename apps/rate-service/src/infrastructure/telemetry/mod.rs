//! OpenTelemetry Tracing Integration
//!
//! Structured logging through `tracing-subscriber`, with optional span export
//! to any OTLP-compatible collector over gRPC.
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Full filter directives; overrides `LOG_LEVEL` when set
//! - `LOG_LEVEL`: Default level (default: debug)
//! - `ENABLE_TRACING`: Set to "false" to disable span export (default: true)
//! - `OTLP_ENDPOINT`: OTLP gRPC endpoint (default: http://localhost:4317)
//! - `SERVICE_NAME`: Service name for traces (default: rate-service)
//!
//! # Usage
//!
//! ```ignore
//! use rate_service::infrastructure::telemetry;
//!
//! // Initialize at startup (returns guard that must be kept alive)
//! let _guard = telemetry::init_with_config(&config.telemetry)?;
//! ```

use opentelemetry::KeyValue;
use opentelemetry::trace::TracerProvider as _;
use opentelemetry_otlp::{ExporterBuildError, WithExportConfig};
use opentelemetry_sdk::trace::SdkTracerProvider;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use crate::infrastructure::config::Environment;

/// Service name for OpenTelemetry traces.
const DEFAULT_SERVICE_NAME: &str = "rate-service";

/// Default OTLP endpoint.
const DEFAULT_OTLP_ENDPOINT: &str = "http://localhost:4317";

/// Default log level when neither `RUST_LOG` nor `LOG_LEVEL` is set.
const DEFAULT_LOG_LEVEL: &str = "debug";

/// Guard that shuts down OpenTelemetry when dropped.
pub struct TelemetryGuard {
    tracer_provider: Option<SdkTracerProvider>,
}

impl TelemetryGuard {
    /// Whether spans are being exported.
    #[must_use]
    pub const fn is_exporting(&self) -> bool {
        self.tracer_provider.is_some()
    }
}

impl Drop for TelemetryGuard {
    fn drop(&mut self) {
        if let Some(provider) = self.tracer_provider.take()
            && let Err(e) = provider.shutdown()
        {
            eprintln!("Failed to shutdown OpenTelemetry tracer provider: {e}");
        }
    }
}

/// Telemetry configuration.
#[derive(Debug, Clone)]
pub struct TelemetryConfig {
    /// Whether OpenTelemetry export is enabled.
    pub enabled: bool,
    /// OTLP exporter endpoint.
    pub otlp_endpoint: String,
    /// Service name for traces.
    pub service_name: String,
    /// Service version resource attribute.
    pub service_version: String,
    /// Deployment environment resource attribute.
    pub environment: Environment,
    /// Default filter level.
    pub log_level: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            otlp_endpoint: DEFAULT_OTLP_ENDPOINT.to_string(),
            service_name: DEFAULT_SERVICE_NAME.to_string(),
            service_version: env!("CARGO_PKG_VERSION").to_string(),
            environment: Environment::default(),
            log_level: DEFAULT_LOG_LEVEL.to_string(),
        }
    }
}

impl TelemetryConfig {
    fn env_filter(&self) -> EnvFilter {
        build_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&self.log_level)),
        )
    }
}

/// Quiet the transport crates regardless of the default level.
#[allow(clippy::expect_used)]
fn build_env_filter(filter: EnvFilter) -> EnvFilter {
    filter
        .add_directive(
            "h2=warn"
                .parse()
                .expect("static directive 'h2=warn' is valid"),
        )
        .add_directive(
            "hyper=warn"
                .parse()
                .expect("static directive 'hyper=warn' is valid"),
        )
        .add_directive(
            "tower=warn"
                .parse()
                .expect("static directive 'tower=warn' is valid"),
        )
        .add_directive(
            "sqlx=warn"
                .parse()
                .expect("static directive 'sqlx=warn' is valid"),
        )
}

/// Initialize telemetry with the given configuration.
///
/// Returns a guard that must be kept alive for the duration of the program.
/// When the guard is dropped, OpenTelemetry will be properly shut down.
///
/// # Errors
///
/// Returns an error if the OTLP exporter cannot be built.
pub fn init_with_config(config: &TelemetryConfig) -> Result<TelemetryGuard, ExporterBuildError> {
    let env_filter = config.env_filter();

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if !config.enabled {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer)
            .init();

        return Ok(TelemetryGuard {
            tracer_provider: None,
        });
    }

    let otlp_exporter = opentelemetry_otlp::SpanExporter::builder()
        .with_tonic()
        .with_endpoint(&config.otlp_endpoint)
        .build()?;

    let tracer_provider = SdkTracerProvider::builder()
        .with_batch_exporter(otlp_exporter)
        .with_resource(
            opentelemetry_sdk::Resource::builder()
                .with_service_name(config.service_name.clone())
                .with_attributes([
                    KeyValue::new("service.version", config.service_version.clone()),
                    KeyValue::new("deployment.environment", config.environment.as_str()),
                ])
                .build(),
        )
        .build();

    let tracer = tracer_provider.tracer(config.service_name.clone());
    let otel_layer = tracing_opentelemetry::layer().with_tracer(tracer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .with(otel_layer)
        .init();

    Ok(TelemetryGuard {
        tracer_provider: Some(tracer_provider),
    })
}

// =============================================================================
// Tests
// =============================================================================
