use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};

pub type DocId = u32;
pub type PostingSet = BTreeSet<DocId>;

/// Document id to path. Ids are positions in the vector, so they are dense from 0.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decoder {
    paths: Vec<PathBuf>,
}

impl Decoder {
    pub fn new() -> Self { Self::default() }

    /// Reserve the next id for `path`.
    pub(crate) fn push(&mut self, path: PathBuf) -> DocId {
        let id = self.paths.len() as DocId;
        self.paths.push(path);
        id
    }

    pub fn get(&self, id: DocId) -> Option<&Path> {
        self.paths.get(id as usize).map(PathBuf::as_path)
    }

    pub fn contains(&self, id: DocId) -> bool {
        (id as usize) < self.paths.len()
    }

    pub fn len(&self) -> usize { self.paths.len() }
    pub fn is_empty(&self) -> bool { self.paths.is_empty() }
}

/// N-gram to the set of documents containing it. Only grown during a build;
/// keys never map to an empty set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvertedIndex {
    postings: HashMap<String, PostingSet>,
}

impl InvertedIndex {
    pub fn new() -> Self { Self::default() }

    /// Get the posting set for `gram`, creating it if absent, then add `doc_id`.
    pub(crate) fn insert_posting(&mut self, gram: &str, doc_id: DocId) {
        match self.postings.get_mut(gram) {
            Some(set) => {
                set.insert(doc_id);
            }
            None => {
                let mut set = PostingSet::new();
                set.insert(doc_id);
                self.postings.insert(gram.to_owned(), set);
            }
        }
    }

    pub fn postings(&self, gram: &str) -> Option<&PostingSet> {
        self.postings.get(gram)
    }

    pub fn len(&self) -> usize { self.postings.len() }
    pub fn is_empty(&self) -> bool { self.postings.is_empty() }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &PostingSet)> {
        self.postings.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Every document id referenced by any posting set.
    pub fn doc_ids(&self) -> BTreeSet<DocId> {
        self.postings.values().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decoder_ids_are_dense() {
        let mut d = Decoder::new();
        assert!(d.is_empty());
        assert_eq!(d.push("a.txt".into()), 0);
        assert_eq!(d.push("b.txt".into()), 1);
        assert_eq!(d.get(1), Some(Path::new("b.txt")));
        assert!(d.get(2).is_none());
        assert!(!d.contains(2));
    }

    #[test]
    fn insert_posting_creates_then_extends() {
        let mut idx = InvertedIndex::new();
        idx.insert_posting("worl", 0);
        idx.insert_posting("worl", 1);
        idx.insert_posting("worl", 1);
        let set = idx.postings("worl").unwrap();
        assert_eq!(set.iter().copied().collect::<Vec<_>>(), vec![0, 1]);
        assert!(idx.postings("hell").is_none());
    }
}
