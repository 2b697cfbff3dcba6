//! # Metrics
//!
//! Gateway metrics recorded through the `metrics` facade and exported in Prometheus
//! text format by `metrics-exporter-prometheus`:
//!
//! - `gateway_http_requests_total{method, status}`
//! - `gateway_backend_calls_total{operation, outcome}`
//! - `gateway_backend_call_duration_seconds{operation}`
//!
//! Recording is a no-op until a recorder is installed, so handlers record
//! unconditionally and `metrics.enabled: false` simply skips the installation.

use axum::http::{Method, StatusCode};
use metrics_exporter_prometheus::{Matcher, PrometheusBuilder, PrometheusHandle};
use std::time::Duration;
use tonic::Code;
use tracing::info;

use crate::core::config::MetricsConfig;
use crate::core::error::{GatewayError, GatewayResult};

pub const HTTP_REQUESTS_TOTAL: &str = "gateway_http_requests_total";
pub const BACKEND_CALLS_TOTAL: &str = "gateway_backend_calls_total";
pub const BACKEND_CALL_DURATION_SECONDS: &str = "gateway_backend_call_duration_seconds";

/// Histogram buckets for backend call latency, in seconds
pub const BACKEND_LATENCY_BUCKETS: &[f64] = &[
    0.001, 0.01, 0.1, 0.3, 0.6, 1.0, 3.0, 6.0, 9.0, 20.0, 30.0, 60.0, 90.0, 120.0,
];

/// Configure the Prometheus recorder without installing it
pub fn prometheus_builder() -> GatewayResult<PrometheusBuilder> {
    PrometheusBuilder::new()
        .set_buckets_for_metric(
            Matcher::Full(BACKEND_CALL_DURATION_SECONDS.to_string()),
            BACKEND_LATENCY_BUCKETS,
        )
        .map_err(|e| GatewayError::config(format!("Failed to set histogram buckets: {}", e)))
}

/// Install the global recorder when metrics are enabled
///
/// The returned handle renders the scrape output served on the metrics endpoint.
pub fn install_prometheus(config: &MetricsConfig) -> GatewayResult<Option<PrometheusHandle>> {
    if !config.enabled {
        info!("Metrics disabled");
        return Ok(None);
    }

    let handle = prometheus_builder()?
        .install_recorder()
        .map_err(|e| GatewayError::config(format!("Failed to install metrics recorder: {}", e)))?;

    info!(endpoint = %config.endpoint, "Prometheus metrics recorder installed");
    Ok(Some(handle))
}

pub fn record_http_request(method: &Method, status: StatusCode) {
    metrics::counter!(
        HTTP_REQUESTS_TOTAL,
        "method" => method_label(method),
        "status" => status.as_u16().to_string()
    )
    .increment(1);
}

pub fn record_backend_call(operation: &'static str, outcome: Result<(), Code>, elapsed: Duration) {
    let outcome = match outcome {
        Ok(()) => "ok",
        Err(code) => code_label(code),
    };

    metrics::counter!(BACKEND_CALLS_TOTAL, "operation" => operation, "outcome" => outcome).increment(1);
    metrics::histogram!(BACKEND_CALL_DURATION_SECONDS, "operation" => operation)
        .record(elapsed.as_secs_f64());
}

/// Bounded label for a client-chosen method; extension methods collapse into `other`
pub fn method_label(method: &Method) -> &'static str {
    match *method {
        Method::GET => "GET",
        Method::POST => "POST",
        Method::PUT => "PUT",
        Method::PATCH => "PATCH",
        Method::DELETE => "DELETE",
        Method::HEAD => "HEAD",
        Method::OPTIONS => "OPTIONS",
        _ => "other",
    }
}

/// Stable snake_case label for a failure code
pub fn code_label(code: Code) -> &'static str {
    match code {
        Code::Ok => "ok",
        Code::Cancelled => "cancelled",
        Code::Unknown => "unknown",
        Code::InvalidArgument => "invalid_argument",
        Code::DeadlineExceeded => "deadline_exceeded",
        Code::NotFound => "not_found",
        Code::AlreadyExists => "already_exists",
        Code::PermissionDenied => "permission_denied",
        Code::ResourceExhausted => "resource_exhausted",
        Code::FailedPrecondition => "failed_precondition",
        Code::Aborted => "aborted",
        Code::OutOfRange => "out_of_range",
        Code::Unimplemented => "unimplemented",
        Code::Internal => "internal",
        Code::Unavailable => "unavailable",
        Code::DataLoss => "data_loss",
        Code::Unauthenticated => "unauthenticated",
    }
}
