//! In-memory search core: BM25 keyword ranking over an inverted term index and
//! typo-tolerant prefix search over a q-gram index.

pub mod config;
pub mod corpus;
pub mod engine;
pub mod error;
pub mod index;
pub mod ped;
pub mod postings;
pub mod qgram;
pub mod tokenizer;

/// Record ids are assigned in corpus order starting at 1.
pub type RecordId = u32;

pub use config::{Bm25Params, DisplayColumn, LineFormat, SearchConfig};
pub use corpus::Record;
pub use engine::{FuzzyHit, Hit, SearchIndex, SharedIndex};
pub use error::{Result, SearchError};
pub use index::TermIndex;
pub use qgram::{Match, MatchStrategy, QgramIndex};
