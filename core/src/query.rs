use crate::index::{Decoder, DocId, InvertedIndex, PostingSet};
use crate::ngram::{ngrams, GramRange};
use crate::read::read_lenient;
use serde::Serialize;
use std::fmt;
use std::path::PathBuf;

/// Query gram length that can never hit a key of an index built over `range`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GramLenMismatch {
    pub gram_len: usize,
    pub range: GramRange,
}

impl fmt::Display for GramLenMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "query gram length {} is outside the indexed range [{}, {}]; every query will return no results",
            self.gram_len,
            self.range.min(),
            self.range.max()
        )
    }
}

pub fn check_gram_len(gram_len: usize, range: GramRange) -> Option<GramLenMismatch> {
    if range.contains(gram_len) {
        None
    } else {
        Some(GramLenMismatch { gram_len, range })
    }
}

/// Documents that contain every query gram found in the index.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    /// Number of grams the query produced.
    pub grams: usize,
    /// How many of them are keys in the index.
    pub matched_grams: usize,
    pub ids: PostingSet,
}

#[derive(Debug, Clone, Serialize)]
pub struct VerifyFailure {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchOutcome {
    /// Ids surviving intersection, before the substring check.
    pub candidates: Vec<DocId>,
    pub matches: Vec<PathBuf>,
    pub failures: Vec<VerifyFailure>,
}

/// Read-only state for answering queries, loaded once at startup.
pub struct SearchContext {
    decoder: Decoder,
    index: InvertedIndex,
    gram_len: usize,
}

impl SearchContext {
    pub fn new(decoder: Decoder, index: InvertedIndex, gram_len: usize) -> Self {
        Self { decoder, index, gram_len }
    }

    /// Context for an index built over `range`. The gram length defaults to
    /// `range.min()`; an explicit length outside the range is kept but logged.
    pub fn for_range(decoder: Decoder, index: InvertedIndex, range: GramRange, gram_len: Option<usize>) -> Self {
        let gram_len = gram_len.unwrap_or(range.min());
        if let Some(mismatch) = check_gram_len(gram_len, range) {
            tracing::warn!(gram_len, min = range.min(), max = range.max(), "{mismatch}");
        }
        Self::new(decoder, index, gram_len)
    }

    pub fn gram_len(&self) -> usize { self.gram_len }

    pub fn candidates(&self, query: &str) -> Candidates {
        candidates(query, &self.index, self.gram_len)
    }

    pub fn search(&self, query: &str) -> SearchOutcome {
        let candidates = self.candidates(query);
        if candidates.ids.is_empty() {
            tracing::debug!(query, grams = candidates.grams, matched = candidates.matched_grams, "no candidates");
            return SearchOutcome::default();
        }
        let (matches, failures) = verify(query, &self.decoder, &candidates.ids);
        SearchOutcome { candidates: candidates.ids.into_iter().collect(), matches, failures }
    }
}

/// Intersect the posting sets of the query's `gram_len`-grams. Grams absent
/// from the index are ignored; if none are present the result is empty.
pub fn candidates(query: &str, index: &InvertedIndex, gram_len: usize) -> Candidates {
    let grams = ngrams(query, gram_len);
    let sets: Vec<&PostingSet> = grams.iter().filter_map(|g| index.postings(g)).collect();

    let ids = match sets.split_first() {
        None => PostingSet::new(),
        Some((first, rest)) => {
            let mut acc = (*first).clone();
            for set in rest {
                acc.retain(|id| set.contains(id));
                if acc.is_empty() {
                    break;
                }
            }
            acc
        }
    };
    Candidates { grams: grams.len(), matched_grams: sets.len(), ids }
}

/// Keep the candidates whose current file content contains `query` literally.
pub fn verify(query: &str, decoder: &Decoder, ids: &PostingSet) -> (Vec<PathBuf>, Vec<VerifyFailure>) {
    let mut matches = Vec::new();
    let mut failures = Vec::new();
    for &id in ids {
        let Some(path) = decoder.get(id) else {
            tracing::warn!(doc_id = id, "candidate id missing from decoder");
            continue;
        };
        match read_lenient(path) {
            Ok(content) if content.contains(query) => matches.push(path.to_path_buf()),
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not verify candidate");
                failures.push(VerifyFailure { path: path.to_path_buf(), reason: err.to_string() });
            }
        }
    }
    (matches, failures)
}

/// Verified paths containing `text`, using `gram_len`-grams against the index.
pub fn query(text: &str, decoder: &Decoder, index: &InvertedIndex, gram_len: usize) -> Vec<PathBuf> {
    let found = candidates(text, index, gram_len);
    if found.ids.is_empty() {
        return Vec::new();
    }
    verify(text, decoder, &found.ids).0
}
