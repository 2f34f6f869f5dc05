//! # Fuzzy Item Matching
//!
//! Maps free-form item names (as written on a receipt) onto canonical
//! emission table names using a normalized Levenshtein similarity ratio.

use crate::errors::{AppError, AppResult};
use tracing::debug;

/// Minimum similarity a candidate needs to be accepted
pub const DEFAULT_SIMILARITY_CUTOFF: f64 = 0.6;

/// Calculate Levenshtein distance between two strings, keeping two rows
fn levenshtein_distance(s1: &[char], s2: &[char]) -> usize {
    let mut previous: Vec<usize> = (0..=s2.len()).collect();
    let mut current = vec![0; s2.len() + 1];

    for (i, c1) in s1.iter().enumerate() {
        current[0] = i + 1;
        for (j, c2) in s2.iter().enumerate() {
            let cost = if c1 == c2 { 0 } else { 1 };

            current[j + 1] = (previous[j + 1] + 1)
                .min(current[j] + 1)
                .min(previous[j] + cost);
        }
        std::mem::swap(&mut previous, &mut current);
    }

    previous[s2.len()]
}

fn lowercase_chars(s: &str) -> Vec<char> {
    s.to_lowercase().chars().collect()
}

/// Ratio for already lowercased character sequences
fn ratio_of_chars(a: &[char], b: &[char]) -> f64 {
    let max_len = a.len().max(b.len());
    if max_len == 0 {
        return 1.0;
    }

    1.0 - levenshtein_distance(a, b) as f64 / max_len as f64
}

/// Highest ratio two sequences of these lengths can reach.
///
/// The distance is at least the length difference.
fn ratio_upper_bound(len_a: usize, len_b: usize) -> f64 {
    let max_len = len_a.max(len_b);
    if max_len == 0 {
        return 1.0;
    }

    1.0 - len_a.abs_diff(len_b) as f64 / max_len as f64
}

/// Similarity of two strings on a 0.0-1.0 scale, case-insensitive.
///
/// Defined as `1 - distance / max(len)`; two empty strings are identical.
pub fn similarity_ratio(a: &str, b: &str) -> f64 {
    ratio_of_chars(&lowercase_chars(a), &lowercase_chars(b))
}

/// Fuzzy string matching for receipt item names
#[derive(Debug, Clone)]
pub struct FuzzyMatcher {
    cutoff: f64,
}

impl Default for FuzzyMatcher {
    fn default() -> Self {
        Self {
            cutoff: DEFAULT_SIMILARITY_CUTOFF,
        }
    }
}

impl FuzzyMatcher {
    /// Create a matcher with a custom cutoff in `[0.0, 1.0]`
    pub fn with_cutoff(cutoff: f64) -> AppResult<Self> {
        if !(0.0..=1.0).contains(&cutoff) {
            return Err(AppError::Config(format!(
                "similarity cutoff must be between 0.0 and 1.0, got {}",
                cutoff
            )));
        }
        Ok(Self { cutoff })
    }

    pub fn cutoff(&self) -> f64 {
        self.cutoff
    }

    /// Find the best candidate scoring at least the cutoff.
    ///
    /// Ties keep the earliest candidate.
    pub fn best_match<'a, I>(&self, name: &str, candidates: I) -> Option<&'a str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let name_chars = lowercase_chars(name);
        let mut best: Option<(&'a str, f64)> = None;

        for candidate in candidates {
            let candidate_chars = lowercase_chars(candidate);
            if ratio_upper_bound(name_chars.len(), candidate_chars.len()) < self.cutoff {
                continue;
            }

            let score = ratio_of_chars(&name_chars, &candidate_chars);
            if score < self.cutoff {
                continue;
            }
            match best {
                Some((_, best_score)) if score <= best_score => {}
                _ => best = Some((candidate, score)),
            }
        }

        match best {
            Some((candidate, score)) => {
                debug!(name = %name, matched = %candidate, score = %score, "Fuzzy match found");
                Some(candidate)
            }
            None => {
                debug!(name = %name, cutoff = %self.cutoff, "No fuzzy match above cutoff");
                None
            }
        }
    }
}
