//! # Receipt Carbon
//!
//! An HTTP service that estimates the carbon footprint of food items found in
//! receipt text (already extracted by OCR upstream), using a static table of
//! per-serving emission factors.

pub mod api;
pub mod config;
pub mod emission_factors;
pub mod errors;
pub mod estimator;
pub mod fuzzy;
pub mod observability;
pub mod observability_config;
pub mod server;
pub mod text_processing;

// Re-export types for easier access
pub use estimator::{EmissionReport, EmissionStrategy, StrategyKind};
