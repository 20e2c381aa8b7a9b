//! Prometheus Metrics Module
//!
//! Request and fetch metrics, recorded through an explicitly constructed
//! [`RateMetrics`] handle that is passed to each component. No recorder is
//! installed process-wide, so independent instances (one per test, say)
//! never observe each other's samples.
//!
//! # Series
//!
//! - `grpc_requests_total{method, status}`: RPCs served, `status` is `ok` or
//!   the gRPC code name
//! - `grpc_request_duration_seconds{method}`: RPC latency
//! - `rate_fetch_total{symbol, status}`: exchange fetches, `success`/`error`
//!
//! # Integration
//!
//! Metrics are exposed at `/metrics` on the ops server port.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use metrics::{
    NoopRecorder, Recorder, Unit, counter, describe_counter, describe_histogram, histogram,
    with_local_recorder,
};
use metrics_exporter_prometheus::{BuildError, Matcher, PrometheusBuilder, PrometheusHandle};

/// Counter of RPCs served.
pub const GRPC_REQUESTS_TOTAL: &str = "grpc_requests_total";
/// Histogram of RPC latency in seconds.
pub const GRPC_REQUEST_DURATION_SECONDS: &str = "grpc_request_duration_seconds";
/// Counter of exchange fetches.
pub const RATE_FETCH_TOTAL: &str = "rate_fetch_total";

/// Latency buckets in seconds, matching the Prometheus client defaults.
const DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

// =============================================================================
// Labels
// =============================================================================

/// Outcome label for `rate_fetch_total`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchStatus {
    /// Quote fetched.
    Success,
    /// Exchange call failed.
    Error,
}

impl FetchStatus {
    const fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
        }
    }
}

// =============================================================================
// Rate Metrics
// =============================================================================

/// Metrics handle shared by the service and the gRPC handler.
#[derive(Clone)]
pub struct RateMetrics {
    recorder: Arc<dyn Recorder + Send + Sync>,
    handle: Option<PrometheusHandle>,
}

impl fmt::Debug for RateMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RateMetrics")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

impl RateMetrics {
    /// Create a Prometheus-backed instance and describe its series.
    ///
    /// # Errors
    ///
    /// Returns an error if the histogram bucket configuration is rejected.
    pub fn prometheus() -> Result<Self, BuildError> {
        let recorder = PrometheusBuilder::new()
            .set_buckets_for_metric(
                Matcher::Full(GRPC_REQUEST_DURATION_SECONDS.to_string()),
                DURATION_BUCKETS,
            )?
            .build_recorder();
        let handle = recorder.handle();
        let metrics = Self {
            recorder: Arc::new(recorder),
            handle: Some(handle),
        };
        metrics.describe();
        Ok(metrics)
    }

    /// Create an instance that discards every sample.
    #[must_use]
    pub fn noop() -> Self {
        Self {
            recorder: Arc::new(NoopRecorder),
            handle: None,
        }
    }

    /// Whether samples are being kept.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.handle.is_some()
    }

    /// Render all series in Prometheus text format, or `None` when disabled.
    #[must_use]
    pub fn render(&self) -> Option<String> {
        self.handle.as_ref().map(PrometheusHandle::render)
    }

    fn describe(&self) {
        with_local_recorder(self.recorder.as_ref(), || {
            describe_counter!(GRPC_REQUESTS_TOTAL, "Total number of gRPC requests");
            describe_histogram!(
                GRPC_REQUEST_DURATION_SECONDS,
                Unit::Seconds,
                "Duration of gRPC requests in seconds"
            );
            describe_counter!(
                RATE_FETCH_TOTAL,
                "Total number of currency rate fetch requests"
            );
        });
    }

    /// Record one served RPC.
    pub fn record_grpc_request(&self, method: &'static str, status: &str, elapsed: Duration) {
        let status = status.to_string();
        with_local_recorder(self.recorder.as_ref(), || {
            counter!(GRPC_REQUESTS_TOTAL, "method" => method, "status" => status).increment(1);
            histogram!(GRPC_REQUEST_DURATION_SECONDS, "method" => method)
                .record(elapsed.as_secs_f64());
        });
    }

    /// Record one exchange fetch for `symbol`.
    pub fn record_rate_fetch(&self, symbol: &str, status: FetchStatus) {
        let symbol = symbol.to_string();
        with_local_recorder(self.recorder.as_ref(), || {
            counter!(RATE_FETCH_TOTAL, "symbol" => symbol, "status" => status.as_str())
                .increment(1);
        });
    }
}

impl Default for RateMetrics {
    fn default() -> Self {
        Self::noop()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_status_as_str() {
        assert_eq!(FetchStatus::Success.as_str(), "success");
        assert_eq!(FetchStatus::Error.as_str(), "error");
    }

    #[test]
    fn noop_renders_nothing() {
        let metrics = RateMetrics::noop();
        metrics.record_rate_fetch("BTC-USDT", FetchStatus::Success);
        assert!(!metrics.is_enabled());
        assert!(metrics.render().is_none());
    }

    #[test]
    fn prometheus_renders_recorded_series() {
        let metrics = RateMetrics::prometheus().unwrap();
        metrics.record_rate_fetch("BTC-USDT", FetchStatus::Success);
        metrics.record_rate_fetch("BTC-USDT", FetchStatus::Error);
        metrics.record_rate_fetch("BTC-USDT", FetchStatus::Error);
        metrics.record_grpc_request(
            "/rate_service.v1.RateService/GetRates",
            "ok",
            Duration::from_millis(12),
        );

        let text = metrics.render().unwrap();
        assert!(text.contains(r#"rate_fetch_total{symbol="BTC-USDT",status="success"} 1"#));
        assert!(text.contains(r#"rate_fetch_total{symbol="BTC-USDT",status="error"} 2"#));
        assert!(text.contains(
            r#"grpc_requests_total{method="/rate_service.v1.RateService/GetRates",status="ok"} 1"#
        ));
        assert!(text.contains("grpc_request_duration_seconds_bucket"));
    }

    #[test]
    fn instances_are_isolated() {
        let a = RateMetrics::prometheus().unwrap();
        let b = RateMetrics::prometheus().unwrap();
        a.record_rate_fetch("ETH-USDT", FetchStatus::Success);

        assert!(a.render().unwrap().contains("ETH-USDT"));
        assert!(!b.render().unwrap().contains("ETH-USDT"));
    }
}
