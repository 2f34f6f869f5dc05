use std::sync::Arc;

use anyhow::Result;
use receipt_carbon::config::AppConfig;
use receipt_carbon::errors::error_logging;
use receipt_carbon::observability;
use receipt_carbon::server::{self, AppState};
use tracing::info;

/// Load and validate configuration at startup
fn load_configuration() -> Result<AppConfig> {
    let config = AppConfig::from_env().map_err(|e| {
        error_logging::log_config_error(&e, "environment", "load_configuration");
        anyhow::anyhow!("{}. Please check your environment variables.", e)
    })?;

    config.validate().map_err(|e| {
        error_logging::log_config_error(&e, "environment", "validate_configuration");
        anyhow::anyhow!("Configuration validation failed: {}", e)
    })?;

    Ok(config)
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    let config = load_configuration()?;

    // Initialize observability stack (logging, metrics, tracing)
    let handles = observability::init_observability_with_config(&config.observability).await?;

    let matcher = config.estimator.matcher()?;
    let strategy = config.estimator.strategy.build(matcher);
    info!(
        strategy = %config.estimator.strategy,
        fuzzy_cutoff = %config.estimator.fuzzy_cutoff,
        "Emission estimator initialized"
    );

    let state = Arc::new(AppState::new(strategy, handles.metrics.clone()));
    let listener = server::bind(config.server.socket_addr()).await?;

    tokio::select! {
        result = server::serve(listener, state) => result?,
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, stopping server");
        }
    }

    handles.shutdown();
    Ok(())
}
