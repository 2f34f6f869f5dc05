//! # Calculate Endpoint
//!
//! Request and response bodies for `POST /calculate`, and the transport
//! independent handler that turns a raw JSON body into a status and payload.

use std::collections::BTreeMap;
use std::time::Instant;

use hyper::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{AppError, AppResult};
use crate::estimator::{EmissionReport, EmissionStrategy, ItemEmission};
use crate::observability::{calculation_span, record_calculation_metrics, record_error_metrics};

/// Message returned for the Missing Input error
pub const NO_TEXT_PROVIDED: &str = "No text provided";

/// Body of `POST /calculate`
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CalculateRequest {
    #[serde(default)]
    pub text: Option<String>,
}

impl CalculateRequest {
    /// Parse a raw body; anything without a non-empty string `text` is missing input.
    pub fn from_body(body: &[u8]) -> AppResult<String> {
        let request: CalculateRequest = serde_json::from_slice(body).map_err(|e| {
            debug!(error = %e, "Request body is not a valid calculate request");
            AppError::MissingInput
        })?;

        match request.text {
            Some(text) if !text.is_empty() => Ok(text),
            _ => Err(AppError::MissingInput),
        }
    }
}

/// Successful calculation response
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct CalculateResponse {
    pub status: String,
    pub extracted_text: String,
    pub carbon_emission_total: f64,
    pub item_breakdown: BTreeMap<String, ItemBreakdown>,
}

/// One entry of `item_breakdown`
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ItemBreakdown {
    pub count: u64,
    pub factor: f64,
    pub emission: f64,
}

impl From<&ItemEmission> for ItemBreakdown {
    fn from(item: &ItemEmission) -> Self {
        Self {
            count: item.count,
            factor: item.factor,
            emission: item.emission,
        }
    }
}

impl CalculateResponse {
    pub fn from_report(extracted_text: String, report: &EmissionReport) -> Self {
        Self {
            status: "success".to_string(),
            extracted_text,
            carbon_emission_total: report.total_emission(),
            item_breakdown: report
                .items()
                .iter()
                .map(|(name, item)| (name.clone(), ItemBreakdown::from(item)))
                .collect(),
        }
    }
}

/// Error response body
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ErrorResponse {
    pub status: String,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            message: message.into(),
        }
    }
}

/// Run the strategy over a raw request body.
pub fn calculate(body: &[u8], strategy: &dyn EmissionStrategy) -> AppResult<CalculateResponse> {
    let _span = calculation_span(strategy.name()).entered();
    let started = Instant::now();

    let text = match CalculateRequest::from_body(body) {
        Ok(text) => text,
        Err(e) => {
            warn!(error = %e, "Rejecting calculate request");
            record_error_metrics(e.kind(), "api");
            record_calculation_metrics(strategy.name(), false, 0, 0.0, started.elapsed());
            return Err(e);
        }
    };
    debug!(raw_text = %text, "Raw text received");

    let report = strategy.estimate(&text);
    let response = CalculateResponse::from_report(text, &report);

    info!(
        strategy = %strategy.name(),
        items = %report.len(),
        total_emission_kg = %response.carbon_emission_total,
        "Emission calculated"
    );
    record_calculation_metrics(
        strategy.name(),
        true,
        report.len(),
        response.carbon_emission_total,
        started.elapsed(),
    );

    Ok(response)
}

/// Map a calculation result onto an HTTP status and JSON body.
pub fn respond(body: &[u8], strategy: &dyn EmissionStrategy) -> (StatusCode, String) {
    let (status, payload) = match calculate(body, strategy) {
        Ok(response) => (StatusCode::OK, serde_json::to_string(&response)),
        // Missing input is the only error a calculation can produce
        Err(_) => (
            StatusCode::BAD_REQUEST,
            serde_json::to_string(&ErrorResponse::new(NO_TEXT_PROVIDED)),
        ),
    };

    match payload {
        Ok(payload) => (status, payload),
        Err(e) => {
            record_error_metrics("serialization", "api");
            tracing::error!(error = %e, "Failed to serialize response");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                r#"{"status":"error","message":"Internal error"}"#.to_string(),
            )
        }
    }
}
