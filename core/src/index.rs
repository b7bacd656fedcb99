use crate::config::Bm25Params;
use crate::corpus::Record;
use crate::postings::{intersect_all, merge_all, CountList, ScoreList};
use crate::tokenizer::tokenize;
use crate::RecordId;
use std::collections::{HashMap, HashSet};

/// Inverted index from normalized term to per-record term frequencies.
///
/// Built once from the full corpus and read-only afterwards. Queries score a
/// private copy of each postings list, so repeated queries always see the raw
/// counts.
#[derive(Debug, Default)]
pub struct TermIndex {
    postings: HashMap<String, CountList>,
    /// Token count per record; slot `id - 1`.
    record_lengths: Vec<u32>,
    num_docs: u32,
    avdl: f64,
}

impl TermIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Index the `text` of every record. Records must be in id order starting at 1.
    pub fn build(records: &[Record]) -> Self {
        let mut postings: HashMap<String, CountList> = HashMap::new();
        let mut record_lengths = Vec::with_capacity(records.len());
        for record in records {
            debug_assert_eq!(record.id as usize, record_lengths.len() + 1);
            let tokens = tokenize(&record.text);
            record_lengths.push(tokens.len() as u32);
            for term in tokens {
                postings.entry(term).or_default().add_occurrence(record.id);
            }
        }

        let num_docs = record_lengths.len() as u32;
        let avdl = if num_docs > 0 {
            record_lengths.iter().map(|&l| l as f64).sum::<f64>() / num_docs as f64
        } else {
            0.0
        };
        tracing::info!(num_docs, num_terms = postings.len(), avdl, "built term index");
        Self { postings, record_lengths, num_docs, avdl }
    }

    pub fn num_docs(&self) -> u32 {
        self.num_docs
    }

    pub fn num_terms(&self) -> usize {
        self.postings.len()
    }

    pub fn avdl(&self) -> f64 {
        self.avdl
    }

    pub fn postings(&self, term: &str) -> Option<&CountList> {
        self.postings.get(term)
    }

    /// Number of records containing `term`.
    pub fn df(&self, term: &str) -> usize {
        self.postings.get(term).map_or(0, |l| l.len())
    }

    pub fn record_length(&self, record_id: RecordId) -> Option<u32> {
        let slot = (record_id as usize).checked_sub(1)?;
        self.record_lengths.get(slot).copied()
    }

    /// BM25-weighted copy of `term`'s postings, or `None` for an unknown term.
    pub fn scored_postings(&self, term: &str, params: &Bm25Params) -> Option<ScoreList> {
        let counts = self.postings.get(term)?;
        let df = counts.len();
        Some(counts.map_weights(|p| {
            let dl = self.record_length(p.record_id).unwrap_or(0);
            bm25(p.weight, df, self.num_docs, self.avdl, dl, params)
        }))
    }

    /// Records containing at least one query term, ranked by summed BM25.
    pub fn score(&self, query: &str, params: &Bm25Params) -> Vec<(RecordId, f64)> {
        let terms = distinct_terms(query);
        let lists: Vec<ScoreList> =
            terms.iter().filter_map(|t| self.scored_postings(t, params)).collect();
        tracing::debug!(query_terms = terms.len(), known_terms = lists.len(), "scoring query");
        rank(merge_all(&lists))
    }

    /// Records containing every query term, ranked by summed BM25. A term
    /// missing from the index empties the result.
    pub fn score_all(&self, query: &str, params: &Bm25Params) -> Vec<(RecordId, f64)> {
        let terms = distinct_terms(query);
        let mut lists: Vec<ScoreList> = Vec::with_capacity(terms.len());
        for term in &terms {
            match self.scored_postings(term, params) {
                Some(list) => lists.push(list),
                None => return Vec::new(),
            }
        }
        let refs: Vec<&ScoreList> = lists.iter().collect();
        rank(intersect_all(&refs))
    }
}

/// `tf * (k1 + 1) / (k1 * (1 - b + b * dl / avdl) + tf) * log2(n / df)`.
///
/// When `avdl` is 0 (every record empty) the length factor is taken as 1.
pub fn bm25(tf: u32, df: usize, n: u32, avdl: f64, dl: u32, params: &Bm25Params) -> f64 {
    let tf = tf as f64;
    let Bm25Params { k1, b } = *params;
    let length_norm = if avdl > 0.0 { 1.0 - b + b * dl as f64 / avdl } else { 1.0 };
    let idf = (n as f64 / df as f64).log2();
    tf * (k1 + 1.0) / (k1 * length_norm + tf) * idf
}

fn distinct_terms(query: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    tokenize(query).into_iter().filter(|t| seen.insert(t.clone())).collect()
}

/// Score descending, ties by ascending record id.
fn rank(list: ScoreList) -> Vec<(RecordId, f64)> {
    let mut scored = list.to_pairs();
    scored.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
    scored
}
