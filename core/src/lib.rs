pub mod builder;
pub mod discover;
pub mod index;
pub mod ngram;
pub mod persist;
pub mod query;
pub mod read;

pub use builder::{build, BuildReport, BuiltIndex, SkippedFile};
pub use index::{Decoder, DocId, InvertedIndex, PostingSet};
pub use ngram::{ngram_range, ngrams, GramRange, NgramError};
pub use query::{query, SearchContext, SearchOutcome};
