use crate::index::{Decoder, InvertedIndex};
use crate::ngram::GramRange;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fs::{self, create_dir_all, File};
use std::io::{ErrorKind, Read, Write};
use std::path::{Path, PathBuf};

pub const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaFile {
    pub version: u32,
    pub source: PathBuf,
    pub num_docs: u32,
    pub num_grams: u64,
    pub min_gram: usize,
    pub max_gram: usize,
    pub created_at: String,
}

impl MetaFile {
    pub fn new(source: &Path, decoder: &Decoder, index: &InvertedIndex, range: GramRange) -> Self {
        Self {
            version: FORMAT_VERSION,
            source: source.to_path_buf(),
            num_docs: decoder.len() as u32,
            num_grams: index.len() as u64,
            min_gram: range.min(),
            max_gram: range.max(),
            created_at: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_default(),
        }
    }

    pub fn range(&self) -> Result<GramRange> {
        Ok(GramRange::new(self.min_gram, self.max_gram)?)
    }
}

/// File names for the blobs of one indexed source directory.
#[derive(Debug, Clone)]
pub struct IndexPaths {
    pub root: PathBuf,
    pub stem: String,
}

impl IndexPaths {
    pub fn for_source<P: AsRef<Path>, S: AsRef<Path>>(root: P, source: S) -> Self {
        Self { root: root.as_ref().to_path_buf(), stem: blob_stem(source.as_ref()) }
    }
    pub fn decoder(&self) -> PathBuf { self.root.join(format!("{}_decoder.bin", self.stem)) }
    pub fn index(&self) -> PathBuf { self.root.join(format!("{}_index.bin", self.stem)) }
    pub fn meta(&self) -> PathBuf { self.root.join(format!("{}_meta.json", self.stem)) }
}

/// The directory a set of blobs is named after. Canonical when possible so
/// `./notes` and `notes` share an index.
pub fn source_key(source: &Path) -> PathBuf {
    source.canonicalize().unwrap_or_else(|_| source.to_path_buf())
}

/// Source path with separators replaced so it can be used as a file name.
pub fn blob_stem(source: &Path) -> String {
    source
        .to_string_lossy()
        .chars()
        .map(|c| if matches!(c, '/' | '\\' | ':') { '_' } else { c })
        .collect()
}

/// Write via a sibling temp file and rename, so a failed write never leaves a
/// complete-looking blob behind.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<()> {
    let tmp = path.with_extension("tmp");
    {
        let mut f = File::create(&tmp).with_context(|| format!("creating {}", tmp.display()))?;
        f.write_all(bytes).with_context(|| format!("writing {}", tmp.display()))?;
        f.sync_all()?;
    }
    fs::rename(&tmp, path).with_context(|| format!("renaming {} to {}", tmp.display(), path.display()))?;
    Ok(())
}

fn read_bincode<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let mut f = File::open(path).with_context(|| format!("opening {}", path.display()))?;
    let mut buf = Vec::new();
    f.read_to_end(&mut buf)?;
    bincode::deserialize(&buf).with_context(|| format!("decoding {}", path.display()))
}

pub fn save_decoder(paths: &IndexPaths, decoder: &Decoder) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(decoder).context("encoding decoder")?;
    write_atomic(&paths.decoder(), &bytes)
}

pub fn load_decoder(paths: &IndexPaths) -> Result<Decoder> {
    read_bincode(&paths.decoder())
}

pub fn save_index(paths: &IndexPaths, index: &InvertedIndex) -> Result<()> {
    create_dir_all(&paths.root)?;
    let bytes = bincode::serialize(index).context("encoding index")?;
    write_atomic(&paths.index(), &bytes)
}

pub fn load_index(paths: &IndexPaths) -> Result<InvertedIndex> {
    read_bincode(&paths.index())
}

pub fn save_meta(paths: &IndexPaths, meta: &MetaFile) -> Result<()> {
    create_dir_all(&paths.root)?;
    let json = serde_json::to_string_pretty(meta)?;
    write_atomic(&paths.meta(), json.as_bytes())
}

pub fn load_meta(paths: &IndexPaths) -> Result<MetaFile> {
    let mut f = File::open(paths.meta()).with_context(|| format!("opening {}", paths.meta().display()))?;
    let mut buf = String::new();
    f.read_to_string(&mut buf)?;
    let meta: MetaFile = serde_json::from_str(&buf)?;
    Ok(meta)
}

/// Persist all three blobs. Any previous meta is removed first and the new
/// one is written last, so only a fully written set is loadable.
pub fn save_index_bundle(paths: &IndexPaths, decoder: &Decoder, index: &InvertedIndex, meta: &MetaFile) -> Result<()> {
    match fs::remove_file(paths.meta()) {
        Ok(()) => {}
        Err(err) if err.kind() == ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("removing stale {}", paths.meta().display()));
        }
    }
    save_decoder(paths, decoder)?;
    save_index(paths, index)?;
    save_meta(paths, meta)?;
    Ok(())
}

/// Load everything needed to search.
pub fn load_index_bundle(paths: &IndexPaths) -> Result<(Decoder, InvertedIndex, MetaFile)> {
    let meta = load_meta(paths)?;
    anyhow::ensure!(
        meta.version == FORMAT_VERSION,
        "unsupported index version {} in {}",
        meta.version,
        paths.meta().display()
    );
    let decoder = load_decoder(paths)?;
    let index = load_index(paths)?;
    anyhow::ensure!(
        meta.num_docs as usize == decoder.len() && meta.num_grams as usize == index.len(),
        "index files for {} are inconsistent: meta has {} docs and {} grams, found {} and {}",
        meta.source.display(),
        meta.num_docs,
        meta.num_grams,
        decoder.len(),
        index.len()
    );
    Ok((decoder, index, meta))
}
