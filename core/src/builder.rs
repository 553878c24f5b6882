use crate::index::{Decoder, DocId, InvertedIndex};
use crate::ngram::{unique_ngrams, GramRange};
use crate::read::read_lenient;
use std::path::{Path, PathBuf};

/// A document that kept its id but contributed nothing to the index.
#[derive(Debug, Clone)]
pub struct SkippedFile {
    pub id: DocId,
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug, Clone, Default)]
pub struct BuildReport {
    pub indexed: usize,
    pub skipped: Vec<SkippedFile>,
}

pub struct BuiltIndex {
    pub decoder: Decoder,
    pub index: InvertedIndex,
    pub report: BuildReport,
}

/// Build the decoder and inverted index for `paths`, in input order.
///
/// Each path gets id = its position, whether or not it can be read. Read
/// failures are recorded in the report and the build carries on.
pub fn build<P: AsRef<Path>>(paths: &[P], range: GramRange) -> BuiltIndex {
    let mut decoder = Decoder::new();
    let mut index = InvertedIndex::new();
    let mut report = BuildReport::default();

    for path in paths {
        let path = path.as_ref();
        let doc_id = decoder.push(path.to_path_buf());
        let text = match read_lenient(path) {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(doc_id, path = %path.display(), error = %err, "could not read file, skipping");
                report.skipped.push(SkippedFile { id: doc_id, path: path.to_path_buf(), reason: err.to_string() });
                continue;
            }
        };
        for gram in unique_ngrams(&text, range) {
            index.insert_posting(gram, doc_id);
        }
        report.indexed += 1;
    }

    tracing::info!(
        num_docs = decoder.len(),
        indexed = report.indexed,
        skipped = report.skipped.len(),
        num_grams = index.len(),
        "built n-gram index"
    );
    BuiltIndex { decoder, index, report }
}
