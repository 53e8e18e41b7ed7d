//! Levenshtein edit distance over an explicit dynamic-programming table.
//!
//! Distances count Unicode scalar values, not bytes. The subproblem table is
//! built fresh for every call and dropped on return, so concurrent callers
//! never share state.

use std::convert::Infallible;

use crate::instrument::Instrumenter;

/// Outcome of one edit-distance computation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditDistanceResult {
    /// Minimum number of single-character insertions, deletions, and
    /// substitutions transforming one input into the other.
    pub distance: usize,
    /// One-line human-readable description of the result.
    pub summary: String,
}

/// Compute the edit distance between `s1` and `s2`.
pub fn edit_distance(s1: &str, s2: &str) -> EditDistanceResult {
    edit_distance_with(s1, s2, false)
}

/// Like [`edit_distance`], optionally noting the computation method in the
/// summary line.
pub fn edit_distance_with(s1: &str, s2: &str, verbose: bool) -> EditDistanceResult {
    let distance = levenshtein(s1, s2);
    let mut summary = format!("Edit distance between {s1:?} and {s2:?} is {distance}");
    if verbose {
        summary.push_str(" (computed with a memoized dynamic-programming table)");
    }
    EditDistanceResult { distance, summary }
}

/// Standard Levenshtein recurrence over a (|s1|+1) x (|s2|+1) table.
///
/// Base cases `d(i,0) = i` and `d(0,j) = j` cost out inserting or deleting a
/// whole prefix. Matching characters carry the diagonal; otherwise a cell is
/// one plus the cheapest of deletion, insertion, and substitution. Filling
/// bottom-up computes every cell exactly once, after the three cells it
/// depends on.
fn levenshtein(s1: &str, s2: &str) -> usize {
    let a: Vec<char> = s1.chars().collect();
    let b: Vec<char> = s2.chars().collect();
    let mut table = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in table.iter_mut().enumerate() {
        row[0] = i;
    }
    for (j, cell) in table[0].iter_mut().enumerate() {
        *cell = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            table[i][j] = if a[i - 1] == b[j - 1] {
                table[i - 1][j - 1]
            } else {
                1 + table[i - 1][j]
                    .min(table[i][j - 1])
                    .min(table[i - 1][j - 1])
            };
        }
    }
    table[a.len()][b.len()]
}

/// Distance computations routed through the instrumentation wrapper.
///
/// Every `compute` call logs a benchmark record under the `edit_distance`
/// counter. `None` is the wrapper's suppressed-failure sentinel; since the
/// computation cannot fail, it only surfaces if a caller rewires the wrapper
/// around a fallible operation.
pub struct DistanceEngine {
    instrumenter: Instrumenter,
}

impl DistanceEngine {
    /// Build an engine around an instrumenter.
    pub fn new(instrumenter: Instrumenter) -> Self {
        Self { instrumenter }
    }

    /// Compute the distance under measurement.
    pub fn compute(&mut self, s1: &str, s2: &str, verbose: bool) -> Option<EditDistanceResult> {
        self.instrumenter
            .run("edit_distance", || {
                Ok::<_, Infallible>(edit_distance_with(s1, s2, verbose))
            })
            .unwrap_or(None)
    }
}
