//! gRPC Rate Server Implementation
//!
//! Translates `RateService` RPCs into [`RateProviderPort`] calls. Internal
//! error detail is logged, never sent over the wire.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use prost_types::Timestamp;
use rust_decimal::Decimal;
use tonic::service::Routes;
use tonic::{Request, Response, Status};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::proto::rate_service::v1::{
    FILE_DESCRIPTOR_SET, GetRatesRequest, GetRatesResponse, HealthCheckRequest, HealthCheckResponse,
    rate_service_server::{RateService, RateServiceServer},
};
use crate::application::ports::RateProviderPort;
use crate::domain::rate::{Quote, Symbol};
use crate::infrastructure::metrics::RateMetrics;

// =============================================================================
// Type Aliases
// =============================================================================

type GrpcResult<T> = Result<Response<T>, Status>;

/// Full method name of `GetRates`, used as the metrics label.
pub const GET_RATES_METHOD: &str = "/rate_service.v1.RateService/GetRates";

/// Full method name of `HealthCheck`, used as the metrics label.
pub const HEALTH_CHECK_METHOD: &str = "/rate_service.v1.RateService/HealthCheck";

/// Status message for every `GetRates` failure past validation.
const GET_RATES_FAILED: &str = "failed to get rates";

// =============================================================================
// Server
// =============================================================================

/// gRPC handler for the rate service.
#[derive(Clone)]
pub struct RateGrpcServer {
    provider: Arc<dyn RateProviderPort>,
    metrics: Arc<RateMetrics>,
}

impl std::fmt::Debug for RateGrpcServer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateGrpcServer")
            .field("metrics", &self.metrics)
            .finish_non_exhaustive()
    }
}

impl RateGrpcServer {
    /// Create a new handler.
    #[must_use]
    pub fn new(provider: Arc<dyn RateProviderPort>, metrics: Arc<RateMetrics>) -> Self {
        Self { provider, metrics }
    }

    /// Wrap in the generated tonic service.
    #[must_use]
    pub fn into_service(self) -> RateServiceServer<Self> {
        RateServiceServer::new(self)
    }

    /// Wrap in the generated tonic service plus server reflection.
    ///
    /// # Errors
    ///
    /// Returns an error if the embedded file descriptor set does not decode.
    pub fn into_routes(self) -> Result<Routes, tonic_reflection::server::Error> {
        let reflection = tonic_reflection::server::Builder::configure()
            .register_encoded_file_descriptor_set(FILE_DESCRIPTOR_SET)
            .build_v1()?;
        Ok(Routes::new(self.into_service()).add_service(reflection))
    }

    async fn get_rates_inner(&self, request: GetRatesRequest) -> Result<GetRatesResponse, Status> {
        let Ok(symbol) = Symbol::new(request.symbol) else {
            warn!("GetRates rejected: empty symbol");
            return Err(Status::invalid_argument("symbol is required"));
        };

        match self.provider.get_rate(&symbol).await {
            Ok(quote) => {
                info!(symbol = %symbol, "GetRates served");
                Ok(quote_to_proto(&quote))
            }
            Err(e) => {
                error!(symbol = %symbol, error = %e, "GetRates failed");
                Err(Status::internal(GET_RATES_FAILED))
            }
        }
    }

    fn record<T>(&self, method: &'static str, result: &Result<T, Status>, started: Instant) {
        self.metrics
            .record_grpc_request(method, &status_label(result), started.elapsed());
    }
}

#[tonic::async_trait]
impl RateService for RateGrpcServer {
    #[instrument(skip(self, request), fields(request_id = %Uuid::new_v4()))]
    async fn get_rates(&self, request: Request<GetRatesRequest>) -> GrpcResult<GetRatesResponse> {
        let started = Instant::now();
        let result = self.get_rates_inner(request.into_inner()).await;
        self.record(GET_RATES_METHOD, &result, started);
        result.map(Response::new)
    }

    #[instrument(skip(self, _request), fields(request_id = %Uuid::new_v4()))]
    async fn health_check(
        &self,
        _request: Request<HealthCheckRequest>,
    ) -> GrpcResult<HealthCheckResponse> {
        let started = Instant::now();
        let healthy = self.provider.is_healthy().await;
        info!(healthy, "HealthCheck served");

        let result = Ok(HealthCheckResponse { healthy });
        self.record(HEALTH_CHECK_METHOD, &result, started);
        result.map(Response::new)
    }
}

// =============================================================================
// Conversion Functions
// =============================================================================

fn status_label<T>(result: &Result<T, Status>) -> String {
    match result {
        Ok(_) => "ok".to_string(),
        Err(status) => format!("{:?}", status.code()),
    }
}

fn quote_to_proto(quote: &Quote) -> GetRatesResponse {
    GetRatesResponse {
        ask: decimal_to_f64(quote.ask),
        bid: decimal_to_f64(quote.bid),
        timestamp: Some(datetime_to_timestamp(quote.quote_time)),
    }
}

fn datetime_to_timestamp(dt: DateTime<Utc>) -> Timestamp {
    Timestamp {
        seconds: dt.timestamp(),
        nanos: i32::try_from(dt.timestamp_subsec_nanos()).unwrap_or(i32::MAX),
    }
}

fn decimal_to_f64(d: Decimal) -> f64 {
    use std::str::FromStr;
    f64::from_str(&d.to_string()).unwrap_or(0.0)
}

// =============================================================================
// Tests
// =============================================================================
