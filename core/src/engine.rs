use crate::config::SearchConfig;
use crate::corpus::{read_records, Record};
use crate::error::{Result, SearchError};
use crate::index::TermIndex;
use crate::qgram::{default_max_distance, MatchStrategy, QgramIndex};
use crate::RecordId;
use parking_lot::RwLock;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::sync::Arc;

/// A ranked keyword hit with the record's display data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Hit {
    pub record_id: RecordId,
    pub score: f64,
    pub title: String,
    pub fields: BTreeMap<String, String>,
}

/// A fuzzy prefix hit with the record's display data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FuzzyHit {
    pub record_id: RecordId,
    pub distance: usize,
    pub title: String,
    pub fields: BTreeMap<String, String>,
}

/// Both indexes over one corpus. Immutable once built, so it can be shared
/// between query threads without locking.
#[derive(Debug)]
pub struct SearchIndex {
    config: SearchConfig,
    records: Vec<Record>,
    terms: TermIndex,
    qgrams: QgramIndex,
}

impl SearchIndex {
    /// Read the whole corpus from `reader` and build both indexes. Any error
    /// aborts the build.
    pub fn build<R: BufRead>(reader: R, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let records = read_records(reader, &config.format)?;
        Self::from_records(records, config)
    }

    pub fn from_path<P: AsRef<Path>>(path: P, config: SearchConfig) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        tracing::info!(path = %path.as_ref().display(), "loading corpus");
        Self::build(BufReader::new(file), config)
    }

    /// Build from already parsed records, whose ids must run 1, 2, 3, ...
    pub fn from_records(records: Vec<Record>, config: SearchConfig) -> Result<Self> {
        config.validate()?;
        let misplaced = records.iter().enumerate().find(|(pos, r)| r.id as usize != pos + 1);
        if let Some((pos, r)) = misplaced {
            return Err(SearchError::invalid(format!(
                "record at position {} has id {}, expected {}",
                pos,
                r.id,
                pos + 1
            )));
        }
        let terms = TermIndex::build(&records);
        let qgrams = QgramIndex::build(&records, config.q)?;
        Ok(Self { config, records, terms, qgrams })
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn term_index(&self) -> &TermIndex {
        &self.terms
    }

    pub fn qgram_index(&self) -> &QgramIndex {
        &self.qgrams
    }

    pub fn record(&self, record_id: RecordId) -> Option<&Record> {
        let slot = (record_id as usize).checked_sub(1)?;
        self.records.get(slot)
    }

    /// Every record containing a query term, by descending BM25 score.
    pub fn score(&self, query: &str) -> Vec<(RecordId, f64)> {
        self.terms.score(query, &self.config.bm25)
    }

    /// Only records containing all query terms, by descending BM25 score.
    pub fn score_all(&self, query: &str) -> Vec<(RecordId, f64)> {
        self.terms.score_all(query, &self.config.bm25)
    }

    /// The best `top_k` keyword hits with their display fields.
    pub fn search(&self, query: &str, top_k: usize) -> Result<Vec<Hit>> {
        if top_k == 0 {
            return Err(SearchError::invalid("top_k must be at least 1"));
        }
        let hits = self
            .score(query)
            .into_iter()
            .take(top_k)
            .filter_map(|(record_id, score)| {
                let r = self.record(record_id)?;
                Some(Hit { record_id, score, title: r.title.clone(), fields: r.fields.clone() })
            })
            .collect();
        Ok(hits)
    }

    pub fn find_matches(
        &self,
        prefix: &str,
        max_distance: usize,
        top_k: usize,
    ) -> Result<Vec<FuzzyHit>> {
        self.find_matches_with(prefix, max_distance, top_k, self.config.match_strategy)
    }

    pub fn find_matches_with(
        &self,
        prefix: &str,
        max_distance: usize,
        top_k: usize,
        strategy: MatchStrategy,
    ) -> Result<Vec<FuzzyHit>> {
        let matches = self.qgrams.find_matches(prefix, max_distance, top_k, strategy)?;
        Ok(matches
            .into_iter()
            .filter_map(|m| {
                let r = self.record(m.record_id)?;
                Some(FuzzyHit {
                    record_id: m.record_id,
                    distance: m.distance,
                    title: r.title.clone(),
                    fields: r.fields.clone(),
                })
            })
            .collect())
    }

    /// `find_matches` with one allowed edit per four prefix characters.
    pub fn find_matches_auto(&self, prefix: &str, top_k: usize) -> Result<Vec<FuzzyHit>> {
        self.find_matches(prefix, default_max_distance(prefix), top_k)
    }
}

/// The index currently served to readers. A rebuild happens off to the side
/// and is swapped in whole; readers holding the previous `Arc` keep using it.
pub struct SharedIndex {
    current: RwLock<Arc<SearchIndex>>,
}

impl SharedIndex {
    pub fn new(index: SearchIndex) -> Self {
        Self { current: RwLock::new(Arc::new(index)) }
    }

    pub fn current(&self) -> Arc<SearchIndex> {
        self.current.read().clone()
    }

    /// Install `index`, returning the one it replaces.
    pub fn replace(&self, index: SearchIndex) -> Arc<SearchIndex> {
        std::mem::replace(&mut *self.current.write(), Arc::new(index))
    }

    /// Build a fresh index from `reader`. On error the current index stays.
    pub fn rebuild<R: BufRead>(&self, reader: R, config: SearchConfig) -> Result<()> {
        let index = SearchIndex::build(reader, config)?;
        let num_docs = index.len();
        self.replace(index);
        tracing::info!(num_docs, "swapped in rebuilt index");
        Ok(())
    }
}
