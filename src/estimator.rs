//! # Emission Estimation
//!
//! Two interchangeable strategies turn receipt text into an [`EmissionReport`]:
//!
//! - [`SubstringMatchStrategy`] normalizes the whole text and counts every
//!   canonical item name that appears in it.
//! - [`LineParseFuzzyStrategy`] reads `<item> - <quantity>` lines and maps each
//!   item onto the table with a [`FuzzyMatcher`].
//!
//! Both aggregate through [`EmissionReport::record`], which accumulates repeated
//! items instead of overwriting them.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use tracing::{debug, trace};

use crate::emission_factors::{canonical_names, factor_for, EMISSION_FACTORS};
use crate::errors::AppError;
use crate::fuzzy::FuzzyMatcher;
use crate::text_processing::{count_occurrences, normalize_text, parse_item_lines};

/// Round to two decimal places for presentation.
pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Emission contribution of one canonical item
#[derive(Debug, Clone, PartialEq)]
pub struct ItemEmission {
    pub count: u64,
    pub factor: f64,
    pub emission: f64,
}

/// Per-request aggregation of matched items
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmissionReport {
    items: BTreeMap<String, ItemEmission>,
}

impl EmissionReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `count` servings of a canonical item.
    ///
    /// Repeated names accumulate. Names missing from the emission table and
    /// zero counts are ignored; returns whether the report changed.
    pub fn record(&mut self, name: &str, count: u64) -> bool {
        let Some(factor) = factor_for(name) else {
            trace!(item = %name, "Ignoring item outside the emission table");
            return false;
        };
        if count == 0 {
            return false;
        }

        let entry = self
            .items
            .entry(name.to_string())
            .or_insert(ItemEmission {
                count: 0,
                factor,
                emission: 0.0,
            });
        // Counts cap at u64::MAX
        entry.count = entry.count.saturating_add(count);
        entry.emission = entry.count as f64 * factor;

        debug!(
            item = %name,
            count = %entry.count,
            factor = %factor,
            emission = %entry.emission,
            "Recorded item"
        );
        true
    }

    pub fn items(&self) -> &BTreeMap<String, ItemEmission> {
        &self.items
    }

    pub fn get(&self, name: &str) -> Option<&ItemEmission> {
        self.items.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Sum of all item emissions, rounded to two decimals.
    pub fn total_emission(&self) -> f64 {
        round_to_cents(self.items.values().map(|item| item.emission).sum())
    }
}

/// A way of turning receipt text into an emission report
pub trait EmissionStrategy: Send + Sync {
    /// Stable name used in logs and metric labels
    fn name(&self) -> &'static str;

    fn estimate(&self, text: &str) -> EmissionReport;
}

/// Counts canonical names appearing anywhere in the normalized text
#[derive(Debug, Clone, Default)]
pub struct SubstringMatchStrategy;

impl EmissionStrategy for SubstringMatchStrategy {
    fn name(&self) -> &'static str {
        "substring"
    }

    fn estimate(&self, text: &str) -> EmissionReport {
        let cleaned = normalize_text(text);
        debug!(cleaned_text = %cleaned, "Normalized text for substring matching");

        let mut report = EmissionReport::new();
        // Overlapping names ("rice" within "fried rice") are counted independently
        for (name, _) in EMISSION_FACTORS {
            let count = count_occurrences(&cleaned, name);
            if count > 0 {
                report.record(name, count as u64);
            }
        }

        metrics::counter!("items_matched_total", "strategy" => self.name())
            .increment(report.len() as u64);
        report
    }
}

/// Parses `<item> - <quantity>` lines and fuzzy-maps item names to the table
#[derive(Debug, Clone, Default)]
pub struct LineParseFuzzyStrategy {
    matcher: FuzzyMatcher,
}

impl LineParseFuzzyStrategy {
    pub fn new(matcher: FuzzyMatcher) -> Self {
        Self { matcher }
    }
}

impl EmissionStrategy for LineParseFuzzyStrategy {
    fn name(&self) -> &'static str {
        "line-fuzzy"
    }

    fn estimate(&self, text: &str) -> EmissionReport {
        let mut report = EmissionReport::new();
        let mut unrecognized = 0u64;

        for entry in parse_item_lines(text) {
            if entry.quantity == 0 {
                trace!(item = %entry.name, "Skipping zero quantity line");
                continue;
            }

            match self.matcher.best_match(&entry.name, canonical_names()) {
                Some(canonical) => {
                    report.record(canonical, entry.quantity);
                }
                None => {
                    debug!(item = %entry.name, quantity = %entry.quantity, "Unrecognized item");
                    unrecognized += 1;
                }
            }
        }

        metrics::counter!("items_matched_total", "strategy" => self.name())
            .increment(report.len() as u64);
        metrics::counter!("unrecognized_items_total").increment(unrecognized);
        report
    }
}

/// Strategy selection, read from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrategyKind {
    Substring,
    #[default]
    LineParseFuzzy,
}

impl StrategyKind {
    /// Build the strategy; the matcher is only used by the line parser.
    pub fn build(self, matcher: FuzzyMatcher) -> Box<dyn EmissionStrategy> {
        match self {
            StrategyKind::Substring => Box::new(SubstringMatchStrategy),
            StrategyKind::LineParseFuzzy => Box::new(LineParseFuzzyStrategy::new(matcher)),
        }
    }
}

impl FromStr for StrategyKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "substring" => Ok(StrategyKind::Substring),
            "line-fuzzy" | "line_fuzzy" | "fuzzy" => Ok(StrategyKind::LineParseFuzzy),
            other => Err(AppError::Config(format!(
                "unknown emission strategy '{}', expected 'substring' or 'line-fuzzy'",
                other
            ))),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StrategyKind::Substring => write!(f, "substring"),
            StrategyKind::LineParseFuzzy => write!(f, "line-fuzzy"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_consistent(report: &EmissionReport) {
        let raw_sum: f64 = report.items().values().map(|i| i.emission).sum();
        assert_eq!(report.total_emission(), round_to_cents(raw_sum));

        for (name, item) in report.items() {
            assert_eq!(Some(item.factor), factor_for(name));
            assert_eq!(item.emission, item.count as f64 * item.factor);
        }
    }

    #[test]
    fn test_round_to_cents() {
        assert_eq!(round_to_cents(15.9), 15.9);
        assert_eq!(round_to_cents(1.234), 1.23);
        assert_eq!(round_to_cents(1.236), 1.24);
        assert_eq!(round_to_cents(0.0), 0.0);
    }

    #[test]
    fn test_record_accumulates() {
        let mut report = EmissionReport::new();
        assert!(report.record("rice", 2));
        assert!(report.record("rice", 3));

        let rice = report.get("rice").unwrap();
        assert_eq!(rice.count, 5);
        assert_eq!(rice.emission, 5.0 * 4.5);
        assert_consistent(&report);
    }

    #[test]
    fn test_record_counts_beyond_u32() {
        let mut report = EmissionReport::new();
        assert!(report.record("rice", 5_000_000_000));
        assert!(report.record("rice", 5_000_000_000));

        let rice = report.get("rice").unwrap();
        assert_eq!(rice.count, 10_000_000_000);
        assert_eq!(rice.emission, 10_000_000_000.0 * 4.5);
    }

    #[test]
    fn test_line_strategy_keeps_large_quantities() {
        let strategy = LineParseFuzzyStrategy::new(FuzzyMatcher::default());
        let report = strategy.estimate("rice - 5000000000\nrice - 1");
        assert_eq!(report.get("rice").unwrap().count, 5_000_000_001);
    }

    #[test]
    fn test_record_ignores_unknown_and_zero() {
        let mut report = EmissionReport::new();
        assert!(!report.record("pizza", 2));
        assert!(!report.record("rice", 0));
        assert!(report.is_empty());
        assert_eq!(report.total_emission(), 0.0);
    }

    #[test]
    fn test_substring_strategy_counts_items() {
        let report = SubstringMatchStrategy.estimate("I had rice and chicken and rice again");

        assert_eq!(report.len(), 2);
        assert_eq!(report.get("rice").unwrap().count, 2);
        assert_eq!(report.get("chicken").unwrap().count, 1);
        assert_eq!(report.total_emission(), 15.9);
        assert_consistent(&report);
    }

    #[test]
    fn test_substring_strategy_normalizes_punctuation() {
        let report = SubstringMatchStrategy.estimate("FISH-CHIPS x1, Soft.Drink x2");

        assert_eq!(report.get("fish chips").unwrap().count, 1);
        assert_eq!(report.get("soft drink").unwrap().count, 1);
        assert_consistent(&report);
    }

    #[test]
    fn test_substring_strategy_keeps_overlaps() {
        // "fried rice" still counts as rice
        let report = SubstringMatchStrategy.estimate("fried rice, pongal");
        assert_eq!(report.get("rice").unwrap().count, 1);
        assert_eq!(report.get("pongal").unwrap().count, 1);
    }

    #[test]
    fn test_substring_strategy_empty_report() {
        let report = SubstringMatchStrategy.estimate("nothing to see here");
        assert!(report.is_empty());
        assert_eq!(report.total_emission(), 0.0);
    }

    #[test]
    fn test_line_strategy_parses_and_matches() {
        let strategy = LineParseFuzzyStrategy::default();
        let text = "* Fish Chips - 2\n* Soft Drink - 3\n* xyz unrelated - 4\nno dash here\n";
        let report = strategy.estimate(text);

        assert_eq!(report.len(), 2);
        assert_eq!(report.get("fish chips").unwrap().count, 2);
        assert_eq!(report.get("soft drink").unwrap().count, 3);
        assert_eq!(report.total_emission(), round_to_cents(2.0 * 7.5 + 3.0 * 0.3));
        assert_consistent(&report);
    }

    #[test]
    fn test_line_strategy_fuzzy_and_accumulate() {
        let strategy = LineParseFuzzyStrategy::default();
        let report = strategy.estimate("rian chips - 1\nfish chips - 2\nrice - 0");

        assert_eq!(report.len(), 1);
        assert_eq!(report.get("fish chips").unwrap().count, 3);
        assert_eq!(report.get("fish chips").unwrap().emission, 22.5);
        assert_eq!(report.get("rice"), None);
    }

    #[test]
    fn test_strategies_are_stateless() {
        let strategy = StrategyKind::LineParseFuzzy.build(FuzzyMatcher::default());
        let first = strategy.estimate("rice - 2\nbeef - 1");
        let second = strategy.estimate("rice - 2\nbeef - 1");
        assert_eq!(first, second);
    }

    #[test]
    fn test_strategy_kind_parsing() {
        assert_eq!("substring".parse::<StrategyKind>(), Ok(StrategyKind::Substring));
        assert_eq!(
            " Line-Fuzzy ".parse::<StrategyKind>(),
            Ok(StrategyKind::LineParseFuzzy)
        );
        assert_eq!("fuzzy".parse::<StrategyKind>(), Ok(StrategyKind::LineParseFuzzy));
        assert!("regex".parse::<StrategyKind>().is_err());
        assert_eq!(StrategyKind::default(), StrategyKind::LineParseFuzzy);
    }

    #[test]
    fn test_strategy_kind_builds_named_strategy() {
        let matcher = FuzzyMatcher::default();
        assert_eq!(StrategyKind::Substring.build(matcher.clone()).name(), "substring");
        assert_eq!(StrategyKind::LineParseFuzzy.build(matcher).name(), "line-fuzzy");
    }
}
