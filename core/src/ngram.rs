use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::ops::RangeInclusive;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NgramError {
    #[error("invalid n-gram range: min {min} must be >= 1 and <= max {max}")]
    InvalidRange { min: usize, max: usize },
}

/// Inclusive range of n-gram lengths an index is built with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GramRange {
    min: usize,
    max: usize,
}

impl GramRange {
    pub fn new(min: usize, max: usize) -> Result<Self, NgramError> {
        if min == 0 || min > max {
            return Err(NgramError::InvalidRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> usize { self.min }
    pub fn max(&self) -> usize { self.max }

    pub fn contains(&self, n: usize) -> bool {
        (self.min..=self.max).contains(&n)
    }

    pub fn lengths(&self) -> RangeInclusive<usize> {
        self.min..=self.max
    }
}

impl Default for GramRange {
    fn default() -> Self {
        Self { min: 4, max: 10 }
    }
}

/// All windows of `n` characters over `text`, step 1, in order and with duplicates.
///
/// Lengths are counted in Unicode scalar values, so every returned slice lies on
/// char boundaries. Returns an empty vector when `text` has fewer than `n` chars
/// or when `n` is zero.
pub fn ngrams(text: &str, n: usize) -> Vec<&str> {
    if n == 0 {
        return Vec::new();
    }
    let bounds: Vec<usize> = text
        .char_indices()
        .map(|(i, _)| i)
        .chain(std::iter::once(text.len()))
        .collect();
    if n >= bounds.len() {
        return Vec::new();
    }
    bounds.windows(n + 1).map(|w| &text[w[0]..w[n]]).collect()
}

/// Concatenation of `ngrams(text, n)` for every n in `min..=max`.
pub fn ngram_range(text: &str, min: usize, max: usize) -> Result<Vec<&str>, NgramError> {
    let range = GramRange::new(min, max)?;
    Ok(range.lengths().flat_map(|n| ngrams(text, n)).collect())
}

/// Distinct n-grams of `text` across `range`; repeated windows collapse.
pub fn unique_ngrams(text: &str, range: GramRange) -> HashSet<&str> {
    range.lengths().flat_map(|n| ngrams(text, n)).collect()
}
