//! Metrics collection and Prometheus export module.
//!
//! This module provides:
//! - Prometheus recorder setup
//! - Request size checks for the HTTP layer
//! - Metrics recording functions

use anyhow::Result;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::observability_config::ObservabilityConfig;

/// Largest accepted request body
pub const MAX_REQUEST_SIZE: u64 = 1024 * 1024;

/// Check request size limit from the `content-length` header
pub fn check_request_size<B>(req: &hyper::Request<B>) -> bool {
    if let Some(content_length) = req.headers().get(hyper::header::CONTENT_LENGTH) {
        if let Ok(size_str) = content_length.to_str() {
            if let Ok(size) = size_str.parse::<u64>() {
                return size <= MAX_REQUEST_SIZE;
            }
        }
        return false; // Invalid content-length header
    }

    true // Chunked or empty body, enforced while reading
}

/// Install the Prometheus recorder, unless metrics export is disabled
pub fn init_metrics_with_config(config: &ObservabilityConfig) -> Result<Option<PrometheusHandle>> {
    if !config.enable_metrics_export {
        tracing::info!("Metrics export disabled");
        return Ok(None);
    }

    let handle = PrometheusBuilder::new().install_recorder()?;

    tracing::info!("Metrics collection initialized");
    Ok(Some(handle))
}

/// Record HTTP request metrics.
///
/// `route` must come from a fixed set of labels, never the raw request path.
pub fn record_request_metrics(
    method: &str,
    route: &'static str,
    status: u16,
    duration: std::time::Duration,
) {
    let method = method.to_string();
    let status = status.to_string();
    metrics::counter!("http_requests_total", "method" => method, "route" => route, "status" => status)
        .increment(1);
    metrics::histogram!("http_request_duration_seconds").record(duration.as_secs_f64());
}

/// Record the outcome of one emission calculation
pub fn record_calculation_metrics(
    strategy: &str,
    success: bool,
    item_count: usize,
    total_emission: f64,
    duration: std::time::Duration,
) {
    let strategy = strategy.to_string();
    metrics::counter!(
        "calculate_requests_total",
        "strategy" => strategy.clone(),
        "result" => if success { "success" } else { "failure" }
    )
    .increment(1);
    metrics::histogram!("calculate_duration_seconds", "strategy" => strategy.clone())
        .record(duration.as_secs_f64());

    if success {
        metrics::histogram!("calculate_items_per_request", "strategy" => strategy.clone())
            .record(item_count as f64);
        metrics::histogram!("calculate_total_emission_kg", "strategy" => strategy)
            .record(total_emission);
    }
}

/// Record error metrics
pub fn record_error_metrics(error_type: &str, component: &str) {
    let error_type = error_type.to_string();
    let component = component.to_string();
    metrics::counter!("errors_total", "type" => error_type, "component" => component).increment(1);
}
