//! # Text Processing Module
//!
//! This module provides the text utilities used by the emission strategies:
//!
//! - Normalization of OCR text for substring search (lowercase, alphanumerics only)
//! - Non-overlapping occurrence counting
//! - Line-by-line parsing of `<item name> - <quantity>` entries, optionally
//!   prefixed by list bullets (`*`, `-`, `•`, `·`, `+`)

use lazy_static::lazy_static;
use regex::Regex;
use tracing::trace;

lazy_static! {
    static ref NON_ALPHANUMERIC: Regex =
        Regex::new(r"[^a-z0-9\s]").expect("Normalization pattern should be valid");

    /// Optional bullets, the item name, a dash, then the quantity.
    static ref ITEM_LINE: Regex = Regex::new(
        r"^[\s*•·+\-]*(?P<name>[\w ]+?)\s*-\s*(?P<quantity>\d+)\s*$"
    )
    .expect("Item line pattern should be valid");
}

/// One `<item name> - <quantity>` entry parsed from a line of text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedLineEntry {
    /// Trimmed, lowercase item name as written (not yet mapped to the table)
    pub name: String,
    /// Parsed quantity
    pub quantity: u64,
}

/// Lowercase the text and replace every character outside `[a-z0-9\s]` with a space.
pub fn normalize_text(raw: &str) -> String {
    let lowered = raw.to_lowercase();
    NON_ALPHANUMERIC.replace_all(&lowered, " ").into_owned()
}

/// Count non-overlapping occurrences of `needle` in `haystack`.
pub fn count_occurrences(haystack: &str, needle: &str) -> usize {
    if needle.is_empty() {
        return 0;
    }
    haystack.matches(needle).count()
}

/// Parse a single line into an item entry.
///
/// Returns `None` when the line has no `- <digits>` suffix, when the quantity
/// does not fit a `u64`, or when the name is blank. Such lines count as
/// quantity 0 and contribute nothing.
pub fn parse_item_line(line: &str) -> Option<ParsedLineEntry> {
    let caps = ITEM_LINE.captures(line)?;

    let name = caps.name("name")?.as_str().trim().to_lowercase();
    if name.is_empty() {
        trace!(line = %line, "Item line has a blank name");
        return None;
    }

    let quantity = match caps.name("quantity")?.as_str().parse::<u64>() {
        Ok(quantity) => quantity,
        Err(e) => {
            trace!(line = %line, error = %e, "Item quantity out of range");
            return None;
        }
    };

    Some(ParsedLineEntry { name, quantity })
}

/// Parse every line of `text` independently, skipping lines that do not parse.
pub fn parse_item_lines(text: &str) -> Vec<ParsedLineEntry> {
    text.lines()
        .filter_map(|line| {
            let parsed = parse_item_line(line);
            if parsed.is_none() && !line.trim().is_empty() {
                trace!(line = %line, "Line skipped, no item - quantity pattern");
            }
            parsed
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("Fish-Chips x2!"), "fish chips x2 ");
        assert_eq!(normalize_text("RICE\n(1)"), "rice\n 1 ");
        assert_eq!(normalize_text(""), "");
    }

    #[test]
    fn test_normalize_replaces_non_ascii_letters() {
        assert_eq!(normalize_text("Café"), "caf ");
    }

    #[test]
    fn test_count_occurrences() {
        assert_eq!(count_occurrences("rice and rice", "rice"), 2);
        assert_eq!(count_occurrences("fried rice", "rice"), 1);
        assert_eq!(count_occurrences("aaaa", "aa"), 2);
        assert_eq!(count_occurrences("bread", "milk"), 0);
        assert_eq!(count_occurrences("bread", ""), 0);
    }

    #[test]
    fn test_parse_bulleted_line() {
        assert_eq!(
            parse_item_line("* fish chips - 2"),
            Some(ParsedLineEntry {
                name: "fish chips".to_string(),
                quantity: 2
            })
        );
    }

    #[test]
    fn test_parse_line_variants() {
        let cases = [
            ("Rice - 3", "rice", 3),
            ("  • Chicken -1", "chicken", 1),
            ("- soft drink - 12  ", "soft drink", 12),
            ("bread-4", "bread", 4),
            ("+ Fish Burger  -  0", "fish burger", 0),
        ];

        for (line, name, quantity) in cases {
            let parsed = parse_item_line(line).unwrap_or_else(|| panic!("{} should parse", line));
            assert_eq!(parsed.name, name, "name for {}", line);
            assert_eq!(parsed.quantity, quantity, "quantity for {}", line);
        }
    }

    #[test]
    fn test_parse_large_quantity() {
        let parsed = parse_item_line("rice - 5000000000").unwrap();
        assert_eq!(parsed.quantity, 5_000_000_000);
    }

    #[test]
    fn test_parse_line_failures() {
        assert_eq!(parse_item_line("no dash here"), None);
        assert_eq!(parse_item_line("rice - two"), None);
        assert_eq!(parse_item_line("rice - 2 plates"), None);
        assert_eq!(parse_item_line("rice - 2.5"), None);
        assert_eq!(parse_item_line(""), None);
        assert_eq!(parse_item_line("  - 2"), None);
        assert_eq!(parse_item_line("rice - 99999999999999999999999"), None);
    }

    #[test]
    fn test_parse_item_lines_skips_bad_lines() {
        let text = "Here are your items:\n* rice - 2\nTotal: 450\n* chicken - 1\n";
        let entries = parse_item_lines(text);

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "rice");
        assert_eq!(entries[1].name, "chicken");
        assert_eq!(entries[1].quantity, 1);
    }
}
