//! Health Check and Metrics Endpoint
//!
//! HTTP endpoint for health checks and Prometheus metrics, served beside the
//! gRPC port. Used by container orchestrators and monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /health` - Returns JSON health status
//! - `GET /healthz` - Kubernetes liveness check (simple OK)
//! - `GET /readyz` - Kubernetes readiness check (store and exchange reachable)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::ports::RateProviderPort;
use crate::infrastructure::config::Environment;
use crate::infrastructure::metrics::RateMetrics;

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status.
    pub status: HealthStatus,
    /// Service name.
    pub service: String,
    /// Service version.
    pub version: String,
    /// Deployment environment.
    pub environment: &'static str,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Store and exchange reachable.
    Healthy,
    /// Store or exchange unreachable.
    Unhealthy,
}

impl From<bool> for HealthStatus {
    fn from(healthy: bool) -> Self {
        if healthy {
            Self::Healthy
        } else {
            Self::Unhealthy
        }
    }
}

// =============================================================================
// Health Server State
// =============================================================================

/// Shared state for the health server.
pub struct HealthServerState {
    service: String,
    version: String,
    environment: Environment,
    started_at: Instant,
    provider: Arc<dyn RateProviderPort>,
    metrics: Arc<RateMetrics>,
}

impl HealthServerState {
    /// Create new health server state.
    #[must_use]
    pub fn new(
        service: String,
        version: String,
        environment: Environment,
        provider: Arc<dyn RateProviderPort>,
        metrics: Arc<RateMetrics>,
    ) -> Self {
        Self {
            service,
            version,
            environment,
            started_at: Instant::now(),
            provider,
            metrics,
        }
    }
}

// =============================================================================
// Health Server
// =============================================================================

/// Health check HTTP server.
pub struct HealthServer {
    port: u16,
    state: Arc<HealthServerState>,
    cancel: CancellationToken,
}

impl HealthServer {
    /// Create a new health server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<HealthServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the health server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `HealthServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), HealthServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| HealthServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "Health server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| HealthServerError::ServerFailed(e.to_string()))?;

        tracing::info!("Health server stopped");
        Ok(())
    }
}

/// Build the health and metrics routes.
#[must_use]
pub fn router(state: Arc<HealthServerState>) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn health_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    let status = HealthStatus::from(state.provider.is_healthy().await);
    let response = HealthResponse {
        status,
        service: state.service.clone(),
        version: state.version.clone(),
        environment: state.environment.as_str(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
    };
    let status_code = match status {
        HealthStatus::Healthy => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    if state.provider.is_healthy().await {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler(State(state): State<Arc<HealthServerState>>) -> impl IntoResponse {
    state.metrics.render().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not enabled".to_string(),
            )
        },
        |body| {
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

// =============================================================================
// Errors
// =============================================================================

/// Health server errors.
#[derive(Debug, thiserror::Error)]
pub enum HealthServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockRateProviderPort;
    use crate::infrastructure::metrics::FetchStatus;
    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tower::ServiceExt;

    fn state(healthy: bool, metrics: RateMetrics) -> Arc<HealthServerState> {
        let mut provider = MockRateProviderPort::new();
        provider.expect_is_healthy().returning(move || healthy);
        Arc::new(HealthServerState::new(
            "rate-service".to_string(),
            "0.1.0".to_string(),
            Environment::Development,
            Arc::new(provider),
            Arc::new(metrics),
        ))
    }

    async fn fetch(state: Arc<HealthServerState>, uri: &str) -> (StatusCode, String) {
        let response = router(state)
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    #[tokio::test]
    async fn liveness_is_always_ok() {
        let (status, body) = fetch(state(false, RateMetrics::noop()), "/healthz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "OK");
    }

    #[tokio::test]
    async fn readiness_follows_provider() {
        let (status, body) = fetch(state(true, RateMetrics::noop()), "/readyz").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "READY");

        let (status, body) = fetch(state(false, RateMetrics::noop()), "/readyz").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body, "NOT READY");
    }

    #[tokio::test]
    async fn health_reports_json() {
        let (status, body) = fetch(state(false, RateMetrics::noop()), "/health").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

        let json: serde_json::Value = serde_json::from_str(&body).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["service"], "rate-service");
        assert_eq!(json["environment"], "development");
    }

    #[tokio::test]
    async fn metrics_disabled_is_unavailable() {
        let (status, _) = fetch(state(true, RateMetrics::noop()), "/metrics").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn metrics_renders_prometheus_text() {
        let metrics = RateMetrics::prometheus().unwrap();
        metrics.record_rate_fetch("BTC-USDT", FetchStatus::Success);

        let (status, body) = fetch(state(true, metrics), "/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert!(body.contains("rate_fetch_total"));
    }
}
