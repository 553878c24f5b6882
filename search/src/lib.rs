use anyhow::{Context, Result};
use ngram_core::persist::{load_index_bundle, source_key, IndexPaths};
use ngram_core::{SearchContext, SearchOutcome};
use serde::Serialize;
use std::path::PathBuf;

pub struct SearchArgs {
    /// Directory that was indexed; selects which blobs to load.
    pub source: PathBuf,
    pub index_dir: PathBuf,
    /// Overrides the gram length recorded in the index.
    pub gram_len: Option<usize>,
}

#[derive(Serialize)]
pub struct SearchReport<'a> {
    pub query: &'a str,
    pub gram_len: usize,
    pub candidates: usize,
    pub matches: &'a [PathBuf],
}

/// Load the persisted index for `args.source` once; the context is read-only afterwards.
pub fn load_context(args: &SearchArgs) -> Result<SearchContext> {
    let paths = IndexPaths::for_source(&args.index_dir, source_key(&args.source));
    let (decoder, index, meta) = load_index_bundle(&paths)
        .with_context(|| format!("loading index for {} from {}", args.source.display(), args.index_dir.display()))?;
    let range = meta.range()?;
    tracing::info!(num_docs = decoder.len(), num_grams = index.len(), min_gram = range.min(), max_gram = range.max(), "index loaded");
    Ok(SearchContext::for_range(decoder, index, range, args.gram_len))
}

pub fn run_search(ctx: &SearchContext, query: &str) -> SearchOutcome {
    let outcome = ctx.search(query);
    tracing::debug!(query, candidates = outcome.candidates.len(), matches = outcome.matches.len(), "search finished");
    outcome
}

pub fn report<'a>(ctx: &SearchContext, query: &'a str, outcome: &'a SearchOutcome) -> SearchReport<'a> {
    SearchReport {
        query,
        gram_len: ctx.gram_len(),
        candidates: outcome.candidates.len(),
        matches: &outcome.matches,
    }
}
