//! Postings lists and the sorted-list operations both indexes are built on.
//!
//! A `PostingList<W>` is strictly increasing by record id with no duplicates.
//! The weight type says what the list holds: `CountList` carries raw
//! occurrence counts straight out of the corpus scan, `ScoreList` carries
//! per-query BM25 contributions. Merging only combines lists of the same
//! weight type, so counts and scores cannot be mixed by accident.

use crate::error::{Result, SearchError};
use crate::RecordId;
use std::ops::Add;

/// Intersections switch to galloping once the longer list is this many times
/// the size of the shorter one.
const GALLOP_RATIO: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Posting<W> {
    pub record_id: RecordId,
    pub weight: W,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PostingList<W> {
    entries: Vec<Posting<W>>,
}

pub type CountList = PostingList<u32>;
pub type ScoreList = PostingList<f64>;

impl<W> Default for PostingList<W> {
    fn default() -> Self {
        Self { entries: Vec::new() }
    }
}

impl<W: Copy> PostingList<W> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(record_id, weight)` pairs, rejecting input that is not
    /// strictly increasing by id.
    pub fn from_pairs<I: IntoIterator<Item = (RecordId, W)>>(pairs: I) -> Result<Self> {
        let mut entries: Vec<Posting<W>> = Vec::new();
        for (record_id, weight) in pairs {
            if let Some(last) = entries.last() {
                if last.record_id >= record_id {
                    return Err(SearchError::invalid(format!(
                        "postings must be strictly increasing by id: {} follows {}",
                        record_id, last.record_id
                    )));
                }
            }
            entries.push(Posting { record_id, weight });
        }
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn as_slice(&self) -> &[Posting<W>] {
        &self.entries
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Posting<W>> {
        self.entries.iter()
    }

    pub fn to_pairs(&self) -> Vec<(RecordId, W)> {
        self.entries.iter().map(|p| (p.record_id, p.weight)).collect()
    }

    pub fn get(&self, record_id: RecordId) -> Option<W> {
        self.entries
            .binary_search_by_key(&record_id, |p| p.record_id)
            .ok()
            .map(|i| self.entries[i].weight)
    }

    /// A new list with the same ids and transformed weights. `self` is left
    /// untouched, which is what keeps shared index lists read-only at query time.
    pub fn map_weights<U, F: Fn(&Posting<W>) -> U>(&self, f: F) -> PostingList<U> {
        let entries = self
            .entries
            .iter()
            .map(|p| Posting { record_id: p.record_id, weight: f(p) })
            .collect();
        PostingList { entries }
    }

    fn from_sorted_vec(entries: Vec<Posting<W>>) -> Self {
        debug_assert!(entries.windows(2).all(|w| w[0].record_id < w[1].record_id));
        Self { entries }
    }
}

impl CountList {
    /// Count one more occurrence in `record_id`. Records are scanned in id
    /// order, so the id is either the current tail or a new one past it.
    pub(crate) fn add_occurrence(&mut self, record_id: RecordId) {
        match self.entries.last_mut() {
            Some(last) if last.record_id == record_id => last.weight += 1,
            _ => {
                debug_assert!(self.entries.last().map_or(true, |last| last.record_id < record_id));
                self.entries.push(Posting { record_id, weight: 1 });
            }
        }
    }
}

/// Two-pointer union. Ids present in both lists get their weights added.
pub fn merge<W: Copy + Add<Output = W>>(
    l1: &PostingList<W>,
    l2: &PostingList<W>,
) -> PostingList<W> {
    let (a, b) = (l1.as_slice(), l2.as_slice());
    let mut out = Vec::with_capacity(a.len() + b.len());
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].record_id < b[j].record_id {
            out.push(a[i]);
            i += 1;
        } else if a[i].record_id == b[j].record_id {
            out.push(Posting { record_id: a[i].record_id, weight: a[i].weight + b[j].weight });
            i += 1;
            j += 1;
        } else {
            out.push(b[j]);
            j += 1;
        }
    }
    out.extend_from_slice(&a[i..]);
    out.extend_from_slice(&b[j..]);
    PostingList::from_sorted_vec(out)
}

/// Left fold of `merge` over `lists`; zero lists merge to the empty list.
pub fn merge_all<'a, W, I>(lists: I) -> PostingList<W>
where
    W: Copy + Add<Output = W> + 'a,
    I: IntoIterator<Item = &'a PostingList<W>>,
{
    lists.into_iter().fold(PostingList::new(), |acc, l| merge(&acc, l))
}

/// Linear intersection: only ids present in both lists, weights added.
pub fn intersect<W: Copy + Add<Output = W>>(
    l1: &PostingList<W>,
    l2: &PostingList<W>,
) -> PostingList<W> {
    let (a, b) = (l1.as_slice(), l2.as_slice());
    let mut out = Vec::with_capacity(a.len().min(b.len()));
    let (mut i, mut j) = (0, 0);
    while i < a.len() && j < b.len() {
        if a[i].record_id < b[j].record_id {
            i += 1;
        } else if a[i].record_id > b[j].record_id {
            j += 1;
        } else {
            out.push(Posting { record_id: a[i].record_id, weight: a[i].weight + b[j].weight });
            i += 1;
            j += 1;
        }
    }
    PostingList::from_sorted_vec(out)
}

/// Same result as `intersect`, but looks up each id of `short` in `long` with
/// an exponential search followed by a binary search. Pays off when `long` is
/// much longer than `short`.
pub fn intersect_galloping<W: Copy + Add<Output = W>>(
    short: &PostingList<W>,
    long: &PostingList<W>,
) -> PostingList<W> {
    let long = long.as_slice();
    let mut out = Vec::with_capacity(short.len());
    let mut lo = 0;
    for p in short.iter() {
        if lo >= long.len() {
            break;
        }
        let mut step = 1;
        while lo + step < long.len() && long[lo + step].record_id < p.record_id {
            step *= 2;
        }
        let start = lo + step / 2;
        let end = (lo + step + 1).min(long.len());
        let pos = start + long[start..end].partition_point(|x| x.record_id < p.record_id);
        if pos < long.len() && long[pos].record_id == p.record_id {
            out.push(Posting { record_id: p.record_id, weight: p.weight + long[pos].weight });
            lo = pos + 1;
        } else {
            lo = pos;
        }
    }
    PostingList::from_sorted_vec(out)
}

/// Intersect every list, starting from the shortest. Zero lists intersect to
/// the empty list.
pub fn intersect_all<W: Copy + Add<Output = W>>(lists: &[&PostingList<W>]) -> PostingList<W> {
    let mut sorted: Vec<&PostingList<W>> = lists.to_vec();
    sorted.sort_by_key(|l| l.len());
    let mut iter = sorted.into_iter();
    let mut acc = match iter.next() {
        Some(first) => first.clone(),
        None => return PostingList::new(),
    };
    for next in iter {
        if acc.is_empty() {
            break;
        }
        acc = if next.len() >= GALLOP_RATIO * acc.len() {
            intersect_galloping(&acc, next)
        } else {
            intersect(&acc, next)
        };
    }
    acc
}
