//! # Application Error Types
//!
//! This module defines common error types used throughout the receipt carbon service.
//! It provides structured error handling for configuration, request and server failures.

use std::fmt;

/// General application error type for consistent error handling
#[derive(Debug, Clone, PartialEq)]
pub enum AppError {
    /// Configuration validation errors
    Config(String),
    /// Request body did not carry a non-empty `text` field
    MissingInput,
    /// Network/communication errors
    Network(String),
}

impl AppError {
    /// Short label used for the `type` field on error metrics
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Config(_) => "config",
            AppError::MissingInput => "missing_input",
            AppError::Network(_) => "network",
        }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(msg) => write!(f, "[CONFIG] {}", msg),
            AppError::MissingInput => write!(f, "[INPUT] No text provided"),
            AppError::Network(msg) => write!(f, "[NETWORK] {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Network(err.to_string())
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;

/// Standardized error logging utilities for consistent error reporting across the application
pub mod error_logging {
    use tracing::error;

    /// Log network/communication errors with connection context
    pub fn log_network_error(
        error: &impl std::fmt::Display,
        operation: &str,
        peer: Option<&str>,
    ) {
        error!(
            error = %error,
            operation = %operation,
            peer = ?peer,
            "Network operation failed"
        );
    }

    /// Log configuration errors during startup/initialization
    pub fn log_config_error(error: &impl std::fmt::Display, config_key: &str, operation: &str) {
        error!(
            error = %error,
            config_key = %config_key,
            operation = %operation,
            "Configuration error"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display_prefixes() {
        assert_eq!(
            AppError::Config("bad port".to_string()).to_string(),
            "[CONFIG] bad port"
        );
        assert_eq!(AppError::MissingInput.to_string(), "[INPUT] No text provided");
        assert_eq!(
            AppError::Network("reset".to_string()).to_string(),
            "[NETWORK] reset"
        );
    }

    #[test]
    fn test_error_kinds() {
        assert_eq!(AppError::MissingInput.kind(), "missing_input");
        assert_eq!(AppError::Network("x".to_string()).kind(), "network");
    }

    #[test]
    fn test_from_io_error() {
        let io = std::io::Error::new(std::io::ErrorKind::AddrInUse, "port taken");
        let err: AppError = io.into();
        assert!(matches!(err, AppError::Network(ref msg) if msg.contains("port taken")));
    }
}
