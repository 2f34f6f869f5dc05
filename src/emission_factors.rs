//! # Emission Factor Table
//!
//! Static kg CO2e per serving for the food items the service recognizes.
//! The table is ordered; strategies walk it in this order, and the fuzzy
//! matcher resolves ties in favour of the earlier entry.

use lazy_static::lazy_static;
use std::collections::HashMap;

/// Canonical item name to kg CO2e per serving/unit.
pub const EMISSION_FACTORS: &[(&str, f64)] = &[
    ("ghee", 9.0),
    ("milk", 3.2),
    ("rice", 4.5),
    ("chicken", 6.9),
    ("beef", 27.0),
    ("apple", 0.4),
    ("banana", 0.5),
    ("bread", 1.1),
    // rice and ghee mix, approximate
    ("pongal", 4.0),
    ("vada", 1.5),
    ("roast", 2.0),
    ("poori", 3.0),
    // fish, bread and condiments
    ("fish burger", 8.0),
    // fried fish and potato fries
    ("fish chips", 7.5),
    // per 330ml can
    ("soft drink", 0.3),
];

lazy_static! {
    static ref FACTOR_INDEX: HashMap<&'static str, f64> =
        EMISSION_FACTORS.iter().copied().collect();
}

/// Look up the factor for a canonical item name.
pub fn factor_for(name: &str) -> Option<f64> {
    FACTOR_INDEX.get(name).copied()
}

/// Canonical item names in table order.
pub fn canonical_names() -> impl Iterator<Item = &'static str> {
    EMISSION_FACTORS.iter().map(|(name, _)| *name)
}
