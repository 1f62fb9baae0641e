//! Out-of-order match reconciliation.
//!
//! When LCSS mode is on, the scan records for each pattern the latest byte
//! index at which every word position was observed, regardless of order.
//! After the scan this refiner decides which of those patterns to admit:
//! order the observed positions by where they appeared in the input, take
//! the longest increasing subsequence, and accept when it covers all word
//! positions, or all must-have positions when the pattern declares them.

use std::collections::{HashMap, HashSet};

/// Longest strictly increasing subsequence, patience sort with binary
/// search, O(n log n).
pub fn longest_increasing_subsequence(input: &[u32]) -> Vec<u32> {
    if input.is_empty() {
        return Vec::new();
    }

    let n = input.len();
    // tails[j] = index of the smallest ending element of an increasing
    // subsequence of length j.
    let mut tails = vec![0usize; n + 1];
    let mut predecessor = vec![usize::MAX; n];
    let mut longest = 0;

    for i in 0..n {
        let mut lo = 1;
        let mut hi = longest + 1;
        while lo < hi {
            let mid = lo + (hi - lo) / 2;
            if input[tails[mid]] < input[i] {
                lo = mid + 1;
            } else {
                hi = mid;
            }
        }

        predecessor[i] = if lo > 1 { tails[lo - 1] } else { usize::MAX };
        tails[lo] = i;
        if lo > longest {
            longest = lo;
        }
    }

    let mut result = vec![0u32; longest];
    let mut k = tails[longest];
    for slot in result.iter_mut().rev() {
        *slot = input[k];
        k = predecessor[k];
    }
    result
}

/// How an out-of-order pattern was admitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LcssVerdict {
    /// The in-order subsequence covers every word position.
    Strict,
    /// The in-order subsequence covers every must-have position.
    Relaxed,
}

/// Decide whether a pattern's observed word positions admit a match.
///
/// `observed` maps word position to the byte index of that word's final
/// byte. Returns the verdict plus the byte span (last byte of the earliest
/// and latest observed words in the accepted subsequence).
pub fn refine(
    observed: &HashMap<u8, usize>,
    word_count: u8,
    must_have: Option<&HashSet<u8>>,
) -> Option<(LcssVerdict, usize, usize)> {
    if observed.is_empty() {
        return None;
    }

    // Word positions in input order.
    let mut sightings: Vec<(usize, u8)> =
        observed.iter().map(|(&pos, &at)| (at, pos)).collect();
    sightings.sort_unstable();
    let positions: Vec<u32> = sightings.iter().map(|&(_, pos)| pos as u32).collect();

    let lis = longest_increasing_subsequence(&positions);
    let covered: HashSet<u8> = lis.iter().map(|&p| p as u8).collect();

    let verdict = if lis.len() == word_count as usize {
        LcssVerdict::Strict
    } else {
        let must = must_have?;
        if !must.is_empty() && must.iter().all(|p| covered.contains(p)) {
            LcssVerdict::Relaxed
        } else {
            return None;
        }
    };

    let span: Vec<usize> = sightings
        .iter()
        .filter(|&&(_, pos)| covered.contains(&pos))
        .map(|&(at, _)| at)
        .collect();
    let first = *span.iter().min()?;
    let last = *span.iter().max()?;
    Some((verdict, first, last))
}
