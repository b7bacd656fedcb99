//! Q-gram index over normalized record titles for typo-tolerant prefix search.
//!
//! A title within `delta` edits of the prefix keeps at least
//! `|prefix| - q * delta` of the prefix's q-gram positions untouched, because
//! one edit touches at most `q` of them. Each distinct prefix q-gram `g`
//! contributes `min(count of g in the title, count of g in the prefix)` to a
//! candidate's merged weight, which never undercounts the untouched positions
//! and never exceeds `|prefix|`. That bound only prunes; every survivor is
//! checked with the exact prefix edit distance.

use crate::corpus::Record;
use crate::error::{Result, SearchError};
use crate::ped::ped_bounded;
use crate::postings::{merge_all, CountList, PostingList};
use crate::tokenizer::{normalize, qgrams};
use crate::RecordId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStrategy {
    /// Verify only records that survive q-gram candidate pruning.
    #[default]
    Indexed,
    /// Verify every record. Slow; kept as the reference result.
    Baseline,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub record_id: RecordId,
    pub distance: usize,
}

/// Which records the indexed strategy has to verify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CandidatePlan {
    Candidates(Vec<RecordId>),
    /// The pruning bound excludes nothing, not even records sharing no q-gram.
    ScanAll,
}

#[derive(Debug)]
pub struct QgramIndex {
    q: usize,
    postings: HashMap<String, CountList>,
    /// Normalized title per record; slot `id - 1`.
    normalized: Vec<String>,
}

impl QgramIndex {
    pub fn build(records: &[Record], q: usize) -> Result<Self> {
        if q == 0 {
            return Err(SearchError::invalid("q must be at least 1"));
        }
        let mut postings: HashMap<String, CountList> = HashMap::new();
        let mut normalized = Vec::with_capacity(records.len());
        for record in records {
            debug_assert_eq!(record.id as usize, normalized.len() + 1);
            let title = normalize(&record.title);
            for gram in qgrams(&title, q) {
                postings.entry(gram).or_default().add_occurrence(record.id);
            }
            normalized.push(title);
        }
        tracing::info!(
            num_docs = normalized.len(),
            num_qgrams = postings.len(),
            q,
            "built q-gram index"
        );
        Ok(Self { q, postings, normalized })
    }

    pub fn q(&self) -> usize {
        self.q
    }

    pub fn len(&self) -> usize {
        self.normalized.len()
    }

    pub fn is_empty(&self) -> bool {
        self.normalized.is_empty()
    }

    pub fn postings(&self, gram: &str) -> Option<&CountList> {
        self.postings.get(gram)
    }

    pub fn normalized_title(&self, record_id: RecordId) -> Option<&str> {
        let slot = (record_id as usize).checked_sub(1)?;
        self.normalized.get(slot).map(String::as_str)
    }

    /// Candidate records for an already normalized prefix.
    pub fn candidates(&self, prefix: &str, delta: usize) -> CandidatePlan {
        let len = prefix.chars().count();
        let lost = self.q.saturating_mul(delta);
        if len <= lost {
            return CandidatePlan::ScanAll;
        }
        let threshold = (len - lost) as u64;

        let grams = qgrams(prefix, self.q);
        let mut multiplicity: BTreeMap<&str, u64> = BTreeMap::new();
        for gram in &grams {
            *multiplicity.entry(gram.as_str()).or_insert(0) += 1;
        }
        let lists: Vec<PostingList<u64>> = multiplicity
            .iter()
            .filter_map(|(&gram, &in_prefix)| {
                let list = self.postings.get(gram)?;
                Some(list.map_weights(|p| u64::from(p.weight).min(in_prefix)))
            })
            .collect();
        let merged = merge_all(&lists);

        let ids: Vec<RecordId> = merged
            .iter()
            .filter(|p| p.weight >= threshold)
            .map(|p| p.record_id)
            .collect();
        tracing::debug!(
            qgrams = grams.len(),
            distinct = multiplicity.len(),
            merged = merged.len(),
            kept = ids.len(),
            threshold,
            "q-gram candidates"
        );
        CandidatePlan::Candidates(ids)
    }

    /// Records whose normalized title has `normalize(prefix)` as a prefix within
    /// `max_distance` edits, closest first (ties by record id), at most `top_k`.
    pub fn find_matches(
        &self,
        prefix: &str,
        max_distance: usize,
        top_k: usize,
        strategy: MatchStrategy,
    ) -> Result<Vec<Match>> {
        if top_k == 0 {
            return Err(SearchError::invalid("top_k must be at least 1"));
        }
        let prefix = normalize(prefix);
        let all = 1..=self.len() as RecordId;
        let mut matches: Vec<Match> = match strategy {
            MatchStrategy::Baseline => self.verify(&prefix, max_distance, all),
            MatchStrategy::Indexed => match self.candidates(&prefix, max_distance) {
                CandidatePlan::ScanAll => self.verify(&prefix, max_distance, all),
                CandidatePlan::Candidates(ids) => self.verify(&prefix, max_distance, ids),
            },
        };
        matches.sort_by(|a, b| a.distance.cmp(&b.distance).then(a.record_id.cmp(&b.record_id)));
        matches.truncate(top_k);
        Ok(matches)
    }

    fn verify<I>(&self, prefix: &str, delta: usize, ids: I) -> Vec<Match>
    where
        I: IntoIterator<Item = RecordId>,
    {
        ids.into_iter()
            .filter_map(|record_id| {
                let title = self.normalized_title(record_id)?;
                ped_bounded(prefix, title, delta).map(|distance| Match { record_id, distance })
            })
            .collect()
    }
}

/// Edit budget the interactive front end allows: one edit per four characters.
pub fn default_max_distance(prefix: &str) -> usize {
    normalize(prefix).chars().count() / 4
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LineFormat;
    use crate::corpus::read_records;
    use std::io::Cursor;

    fn index(corpus: &str, q: usize) -> QgramIndex {
        let records = read_records(Cursor::new(corpus), &LineFormat::cities()).unwrap();
        QgramIndex::build(&records, q).unwrap()
    }

    fn ids(matches: Vec<Match>) -> Vec<RecordId> {
        matches.into_iter().map(|m| m.record_id).collect()
    }

    #[test]
    fn build_indexes_left_padded_grams() {
        let qi = index("Zurich\tCH\nMunchen\tDE\nLondon\tGB\n", 3);
        assert_eq!(qi.postings("$$z").unwrap().to_pairs(), vec![(1, 1)]);
        assert_eq!(qi.postings("ich").unwrap().to_pairs(), vec![(1, 1)]);
        assert_eq!(qi.postings("hen").unwrap().to_pairs(), vec![(2, 1)]);
        assert!(qi.postings("en$").is_none());
        assert_eq!(qi.normalized_title(2), Some("munchen"));
    }

    #[test]
    fn repeated_gram_is_counted() {
        let qi = index("banana\n", 2);
        assert_eq!(qi.postings("an").unwrap().to_pairs(), vec![(1, 2)]);
    }

    #[test]
    fn exact_prefix() {
        let qi = index("Zurich\tCH\nMunchen\tDE\nLondon\tGB\n", 3);
        let m = qi.find_matches("zur", 0, 5, MatchStrategy::Indexed).unwrap();
        assert_eq!(m, vec![Match { record_id: 1, distance: 0 }]);
    }

    #[test]
    fn typo_within_budget() {
        let qi = index("Zurich\tCH\nMunchen\tDE\nLondon\tGB\n", 3);
        let m = qi.find_matches("Lodnon", 2, 5, MatchStrategy::Indexed).unwrap();
        assert_eq!(m, vec![Match { record_id: 3, distance: 2 }]);
        assert!(qi.find_matches("Lodnon", 1, 5, MatchStrategy::Indexed).unwrap().is_empty());
    }

    #[test]
    fn small_prefix_scans_everything() {
        let qi = index("Zurich\nMunchen\nLondon\n", 3);
        assert_eq!(qi.candidates("xy", 1), CandidatePlan::ScanAll);
        let m = qi.find_matches("xy", 2, 10, MatchStrategy::Indexed).unwrap();
        assert_eq!(ids(m), vec![1, 2, 3]);
    }

    #[test]
    fn candidates_drop_records_below_the_bound() {
        let qi = index("Zurich\nZug\nLondon\n", 3);
        // "zuric" needs all 5 of its q-grams at delta 0; Zug shares "$$z" and "$zu".
        assert_eq!(qi.postings("$zu").unwrap().to_pairs(), vec![(1, 1), (2, 1)]);
        assert_eq!(qi.candidates("zuric", 0), CandidatePlan::Candidates(vec![1]));
        // "zugxx" at delta 1 needs 2 shared q-grams: both Zurich and Zug qualify.
        assert_eq!(qi.candidates("zugxx", 1), CandidatePlan::Candidates(vec![1, 2]));
    }

    #[test]
    fn long_repetitive_prefix_does_not_overflow_counts() {
        let title = "a".repeat(70_000);
        let qi = index(&format!("{}\nbanana\n", title), 3);
        assert_eq!(qi.postings("aaa").unwrap().to_pairs(), vec![(1, 69_998)]);
        assert_eq!(qi.candidates(&title, 0), CandidatePlan::Candidates(vec![1]));

        let prefix = "a".repeat(2_000);
        let m = qi.find_matches(&prefix, 0, 1, MatchStrategy::Indexed).unwrap();
        assert_eq!(m, vec![Match { record_id: 1, distance: 0 }]);
    }

    #[test]
    fn repeated_prefix_grams_count_up_to_the_title() {
        // "aaaa" has "aaa" twice; "aaab" has it once, so at delta 0 it must not
        // collect credit for the second occurrence.
        let qi = index("aaab\naaaa\n", 3);
        assert_eq!(qi.candidates("aaaa", 0), CandidatePlan::Candidates(vec![2]));
    }

    #[test]
    fn sorted_by_distance_then_id_and_truncated() {
        let qi = index("Bern\nBerlin\nBergen\nBremen\n", 3);
        let m = qi.find_matches("berl", 1, 2, MatchStrategy::Baseline).unwrap();
        let expected = vec![
            Match { record_id: 2, distance: 0 },
            Match { record_id: 1, distance: 1 },
        ];
        assert_eq!(m, expected);
    }

    #[test]
    fn rejects_bad_parameters() {
        let records = read_records(Cursor::new("a\n"), &LineFormat::default()).unwrap();
        let built = QgramIndex::build(&records, 0);
        assert!(matches!(built, Err(SearchError::InvalidParameter(_))));
        let qi = index("a\n", 3);
        let found = qi.find_matches("a", 0, 0, MatchStrategy::Indexed);
        assert!(matches!(found, Err(SearchError::InvalidParameter(_))));
    }

    #[test]
    fn default_budget_is_a_quarter_of_the_length() {
        assert_eq!(default_max_distance("frei"), 1);
        assert_eq!(default_max_distance("Frankfurt!"), 2);
        assert_eq!(default_max_distance("ab"), 0);
    }
}
