//! Prefix edit distance: the fewest insertions, deletions and substitutions
//! turning `p` into some prefix of `s`.
//!
//! Classic edit-distance DP kept one row at a time. The answer is the minimum of
//! the last row rather than its last cell, since `p` may stop matching anywhere
//! in `s`.

/// PED(p, s), counted in characters.
pub fn ped(p: &str, s: &str) -> usize {
    let p: Vec<char> = p.chars().collect();
    let s: Vec<char> = s.chars().collect();
    let last = fill_rows(&p, &s, s.len() + 1, None);
    last.map_or(0, |row| row.into_iter().min().unwrap_or(0))
}

/// `Some(ped(p, s))` when it is at most `delta`, otherwise `None`.
///
/// Only the first `|p| + delta` characters of `s` can take part in a match
/// within `delta` edits, so columns past that are never computed, and the scan
/// stops as soon as a whole row exceeds `delta` (row minima never decrease).
pub fn ped_bounded(p: &str, s: &str, delta: usize) -> Option<usize> {
    let p: Vec<char> = p.chars().collect();
    let s: Vec<char> = s.chars().collect();
    let bound = s.len().min(p.len() + delta) + 1;
    let row = fill_rows(&p, &s, bound, Some(delta))?;
    let best = row.into_iter().min().unwrap_or(0);
    (best <= delta).then_some(best)
}

/// Runs the DP over the first `bound` columns and returns the final row, or
/// `None` if `cutoff` is set and some row's minimum went past it.
fn fill_rows(p: &[char], s: &[char], bound: usize, cutoff: Option<usize>) -> Option<Vec<usize>> {
    let mut prev: Vec<usize> = (0..bound).collect();
    let mut curr: Vec<usize> = vec![0; bound];
    for (i, &pc) in p.iter().enumerate() {
        curr[0] = i + 1;
        let mut row_min = curr[0];
        for j in 1..bound {
            let insert = prev[j] + 1;
            let delete = curr[j - 1] + 1;
            let replace = prev[j - 1] + usize::from(s[j - 1] != pc);
            curr[j] = insert.min(delete).min(replace);
            row_min = row_min.min(curr[j]);
        }
        if cutoff.map_or(false, |d| row_min > d) {
            return None;
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    Some(prev)
}
