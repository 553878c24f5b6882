use globset::{Glob, GlobSet, GlobSetBuilder};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_EXTENSIONS: &[&str] = &[".txt", ".py", ".md", ".json", ".yml", ".yaml"];

pub const DEFAULT_IGNORE_DIRS: &[&str] = &[
    ".git", ".svn", ".hg",
    "__pycache__", ".pytest_cache", ".mypy_cache", ".tox", ".ruff_cache",
    "venv", ".venv", "env", ".env", "virtualenv", ".virtualenv",
    "node_modules", "bower_components",
    "build", "dist", "target", "out", ".next",
    "*.egg-info", "site-packages", "lib", "Lib",
];

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("directory not found: {0}")]
    RootNotFound(PathBuf),
    #[error("invalid ignore pattern {pattern:?}: {source}")]
    BadPattern { pattern: String, source: globset::Error },
}

pub type PrunePredicate = Box<dyn Fn(&Path) -> bool>;

pub struct DiscoveryOptions {
    /// Files larger than this many bytes are skipped.
    pub max_file_size: u64,
    /// Lowercase dotted suffixes, e.g. ".md". Empty allows everything.
    pub extensions: HashSet<String>,
    /// Glob patterns matched against directory names.
    pub ignore_dirs: Vec<String>,
    /// Extra directory filter; returning true prunes the directory.
    pub prune: Option<PrunePredicate>,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            max_file_size: 1024 * 1024,
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            ignore_dirs: DEFAULT_IGNORE_DIRS.iter().map(|s| s.to_string()).collect(),
            prune: None,
        }
    }
}

/// Prune predicate matching directories that directly contain `marker`,
/// e.g. `pyvenv.cfg` for Python virtual environments.
pub fn has_marker_file(marker: &'static str) -> PrunePredicate {
    Box::new(move |dir: &Path| dir.join(marker).exists())
}

fn compile_ignores(patterns: &[String]) -> Result<GlobSet, DiscoveryError> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        let glob = Glob::new(pattern)
            .map_err(|source| DiscoveryError::BadPattern { pattern: pattern.clone(), source })?;
        builder.add(glob);
    }
    builder
        .build()
        .map_err(|source| DiscoveryError::BadPattern { pattern: patterns.join(","), source })
}

fn extension_allowed(path: &Path, extensions: &HashSet<String>) -> bool {
    if extensions.is_empty() {
        return true;
    }
    match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => extensions.contains(&format!(".{}", ext.to_lowercase())),
        None => false,
    }
}

/// Eligible regular files under `root`, sorted. Symlinks are never followed or returned.
pub fn discover(root: &Path, opts: &DiscoveryOptions) -> Result<Vec<PathBuf>, DiscoveryError> {
    if !root.is_dir() {
        return Err(DiscoveryError::RootNotFound(root.to_path_buf()));
    }
    let ignores = compile_ignores(&opts.ignore_dirs)?;

    let keep_dir = |entry: &DirEntry| {
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return true;
        }
        if ignores.is_match(entry.file_name()) {
            return false;
        }
        !opts.prune.as_ref().is_some_and(|prune| prune(entry.path()))
    };

    let mut files = Vec::new();
    for entry in WalkDir::new(root).follow_links(false).into_iter().filter_entry(keep_dir) {
        let entry = match entry {
            Ok(entry) => entry,
            Err(err) => {
                tracing::warn!(error = %err, "could not access path, skipping");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let path = entry.path();
        if !extension_allowed(path, &opts.extensions) {
            continue;
        }
        let size = match entry.metadata() {
            Ok(meta) => meta.len(),
            Err(err) => {
                tracing::warn!(path = %path.display(), error = %err, "could not stat file, skipping");
                continue;
            }
        };
        if size > opts.max_file_size {
            continue;
        }
        files.push(path.to_path_buf());
    }
    files.sort();
    Ok(files)
}
