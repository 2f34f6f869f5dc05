//! Observability module for centralized metrics, tracing, and logging setup.
//!
//! This module provides:
//! - Metrics collection and Prometheus export
//! - Distributed tracing with OpenTelemetry
//! - Structured logging with configurable levels
//! - Environment-specific configuration support

mod metrics;
mod tracing_mod;

use anyhow::Result;
use metrics_exporter_prometheus::PrometheusHandle;
use opentelemetry_sdk::trace::SdkTracerProvider;

use crate::observability_config::ObservabilityConfig;

pub use self::metrics::{
    check_request_size, init_metrics_with_config, record_calculation_metrics,
    record_error_metrics, record_request_metrics, MAX_REQUEST_SIZE,
};
pub use self::tracing_mod::{
    calculation_span, http_span, init_opentelemetry_tracing_with_config, init_tracing_with_config,
};

/// Handles kept alive for the lifetime of the process
#[derive(Default)]
pub struct ObservabilityHandles {
    /// Prometheus handle rendered by `/metrics`
    pub metrics: Option<PrometheusHandle>,
    tracer_provider: Option<SdkTracerProvider>,
}

impl ObservabilityHandles {
    /// Flush pending spans to the OTLP collector
    pub fn shutdown(&self) {
        if let Some(provider) = &self.tracer_provider {
            if let Err(e) = provider.shutdown() {
                tracing::warn!(error = %e, "Failed to shut down tracer provider");
            }
        }
    }
}

/// Initialize the complete observability stack with custom configuration
pub async fn init_observability_with_config(
    config: &ObservabilityConfig,
) -> Result<ObservabilityHandles> {
    config
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid observability configuration: {}", e))?;

    // Initialize tracing first
    init_tracing_with_config(config)?;

    let metrics = init_metrics_with_config(config)?;
    let tracer_provider = init_opentelemetry_tracing_with_config(config).await?;

    tracing::info!(
        environment = %config.environment,
        otlp_endpoint = ?config.otlp_endpoint,
        metrics_enabled = %metrics.is_some(),
        "Observability stack initialized successfully"
    );

    Ok(ObservabilityHandles {
        metrics,
        tracer_provider,
    })
}
