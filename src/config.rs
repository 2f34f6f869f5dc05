//! # Unified Application Configuration
//!
//! Consolidates all service settings into a single configuration object
//! loaded from environment variables (and `.env` via `dotenvy` in `main`).
//! The emission factor table itself is compiled in and not configurable.

use crate::errors::{AppError, AppResult};
use crate::estimator::StrategyKind;
use crate::fuzzy::{FuzzyMatcher, DEFAULT_SIMILARITY_CUTOFF};
use crate::observability_config::ObservabilityConfig;
use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};

/// HTTP listener settings
#[derive(Debug, Clone, PartialEq)]
pub struct ServerConfig {
    /// Address to bind
    pub bind_address: IpAddr,
    /// Listening port
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            port: 5000,
        }
    }
}

impl ServerConfig {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.bind_address, self.port)
    }

    /// Validate server configuration
    pub fn validate(&self) -> AppResult<()> {
        if self.port == 0 {
            return Err(AppError::Config("PORT cannot be 0".to_string()));
        }
        Ok(())
    }
}

/// Emission estimation settings
#[derive(Debug, Clone, PartialEq)]
pub struct EstimatorConfig {
    /// Which strategy serves `/calculate`
    pub strategy: StrategyKind,
    /// Minimum similarity for fuzzy item matching
    pub fuzzy_cutoff: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            strategy: StrategyKind::default(),
            fuzzy_cutoff: DEFAULT_SIMILARITY_CUTOFF,
        }
    }
}

impl EstimatorConfig {
    /// Build the fuzzy matcher, validating the cutoff
    pub fn matcher(&self) -> AppResult<FuzzyMatcher> {
        FuzzyMatcher::with_cutoff(self.fuzzy_cutoff)
    }
}

/// Unified application configuration
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AppConfig {
    /// Server configuration
    pub server: ServerConfig,
    /// Estimator configuration
    pub estimator: EstimatorConfig,
    /// Observability configuration
    pub observability: ObservabilityConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> AppResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> AppResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(port) = lookup("PORT") {
            config.server.port = port.trim().parse().map_err(|_| {
                AppError::Config(format!("PORT must be a valid port number, got '{}'", port))
            })?;
        }
        if let Some(address) = lookup("BIND_ADDRESS") {
            config.server.bind_address = address.trim().parse().map_err(|_| {
                AppError::Config(format!(
                    "BIND_ADDRESS must be a valid IP address, got '{}'",
                    address
                ))
            })?;
        }

        if let Some(strategy) = lookup("EMISSION_STRATEGY") {
            config.estimator.strategy = strategy.parse()?;
        }
        if let Some(cutoff) = lookup("FUZZY_CUTOFF") {
            config.estimator.fuzzy_cutoff = cutoff.trim().parse().map_err(|_| {
                AppError::Config(format!("FUZZY_CUTOFF must be a number, got '{}'", cutoff))
            })?;
        }

        config.observability = ObservabilityConfig::from_lookup(&lookup);

        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> AppResult<()> {
        self.server.validate()?;
        self.estimator.matcher()?;
        self.observability
            .validate()
            .map_err(|e| AppError::Config(format!("Observability configuration: {}", e)))?;
        Ok(())
    }
}
