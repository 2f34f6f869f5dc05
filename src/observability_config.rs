//! # Observability Configuration
//!
//! Environment-specific configuration for logging, metrics and trace export.

use std::env;

/// Observability configuration for different environments
#[derive(Debug, Clone, PartialEq)]
pub struct ObservabilityConfig {
    /// Environment name (development, staging, production)
    pub environment: String,
    /// OTLP endpoint for trace export
    pub otlp_endpoint: Option<String>,
    /// Log level for the service's own targets
    pub log_level: String,
    /// Log output format outside development: `json` or `pretty`
    pub log_format: String,
    /// Trace sampling ratio (0.0-1.0)
    pub trace_sampling_ratio: f64,
    /// Whether to install the Prometheus recorder and serve `/metrics`
    pub enable_metrics_export: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            environment: "development".to_string(),
            otlp_endpoint: None,
            log_level: "info".to_string(),
            log_format: "json".to_string(),
            trace_sampling_ratio: 1.0,
            enable_metrics_export: true,
        }
    }
}

impl ObservabilityConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Self {
            environment: lookup("ENVIRONMENT").unwrap_or(defaults.environment),
            otlp_endpoint: lookup("OTLP_ENDPOINT").filter(|endpoint| !endpoint.trim().is_empty()),
            log_level: lookup("OBSERVABILITY_LOG_LEVEL").unwrap_or(defaults.log_level),
            log_format: lookup("LOG_FORMAT")
                .map(|format| format.trim().to_lowercase())
                .unwrap_or(defaults.log_format),
            trace_sampling_ratio: lookup("TRACE_SAMPLING_RATIO")
                .and_then(|ratio| ratio.parse().ok())
                .unwrap_or(defaults.trace_sampling_ratio),
            enable_metrics_export: lookup("ENABLE_METRICS_EXPORT")
                .and_then(|flag| flag.parse().ok())
                .unwrap_or(defaults.enable_metrics_export),
        }
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// Check if running in development environment
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        // Validate OTLP endpoint format if provided
        if let Some(endpoint) = &self.otlp_endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid OTLP endpoint format: {}", endpoint));
            }
        }

        if !(0.0..=1.0).contains(&self.trace_sampling_ratio) {
            return Err(format!(
                "Invalid trace sampling ratio: {}",
                self.trace_sampling_ratio
            ));
        }

        if self.log_level.parse::<tracing::Level>().is_err() {
            return Err(format!("Invalid log level: {}", self.log_level));
        }

        if !matches!(self.log_format.as_str(), "json" | "pretty") {
            return Err(format!("Invalid log format: {}", self.log_format));
        }

        Ok(())
    }
}
