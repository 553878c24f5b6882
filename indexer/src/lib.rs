use anyhow::{Context, Result};
use ngram_core::discover::{discover, has_marker_file, DiscoveryOptions, DEFAULT_IGNORE_DIRS};
use ngram_core::persist::{save_index_bundle, source_key, IndexPaths, MetaFile};
use ngram_core::{build, GramRange, SkippedFile};
use std::collections::HashSet;
use std::path::PathBuf;

pub struct BuildArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub max_size_mib: u64,
    pub min_gram: usize,
    pub max_gram: usize,
    /// Dotted suffixes; empty indexes every extension.
    pub extensions: Vec<String>,
}

#[derive(Debug)]
pub struct BuildSummary {
    pub files: usize,
    pub num_grams: usize,
    pub skipped: Vec<SkippedFile>,
    /// None when nothing was found and nothing was written.
    pub paths: Option<IndexPaths>,
}

fn normalize_extension(ext: &str) -> String {
    let ext = ext.trim().to_lowercase();
    if ext.starts_with('.') { ext } else { format!(".{ext}") }
}

pub fn run_build(args: &BuildArgs) -> Result<BuildSummary> {
    let range = GramRange::new(args.min_gram, args.max_gram)?;
    let max_file_size = args.max_size_mib * 1024 * 1024;
    let opts = DiscoveryOptions {
        max_file_size,
        extensions: args.extensions.iter().map(|e| normalize_extension(e)).collect::<HashSet<_>>(),
        ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect(),
        prune: Some(has_marker_file("pyvenv.cfg")),
    };
    tracing::info!(
        input = %args.input.display(),
        max_file_size,
        min_gram = range.min(),
        max_gram = range.max(),
        extensions = ?args.extensions,
        "searching for files"
    );

    let files = discover(&args.input, &opts)?;
    if files.is_empty() {
        tracing::info!("no files found matching criteria");
        return Ok(BuildSummary { files: 0, num_grams: 0, skipped: Vec::new(), paths: None });
    }
    tracing::info!(files = files.len(), "found files to index");

    let built = build(&files, range);
    let source = source_key(&args.input);
    let paths = IndexPaths::for_source(&args.output, &source);
    let meta = MetaFile::new(&source, &built.decoder, &built.index, range);
    save_index_bundle(&paths, &built.decoder, &built.index, &meta)
        .with_context(|| format!("saving index for {}", source.display()))?;
    tracing::info!(decoder = %paths.decoder().display(), index = %paths.index().display(), "index saved");

    Ok(BuildSummary {
        files: files.len(),
        num_grams: built.index.len(),
        skipped: built.report.skipped,
        paths: Some(paths),
    })
}
