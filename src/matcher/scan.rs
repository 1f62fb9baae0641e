//! The streaming scan.
//!
//! One pass over the input bytes. A delimiter resets the trie cursor; the
//! first letter of each word takes the root transition without an
//! end-of-word probe (one-letter words cannot exist after normalization);
//! every later letter probes the end-of-word bucket for the edge it is
//! about to traverse, then advances the cursor. Falling out of the trie
//! mid-word skips bytes until the next delimiter.

use crate::classify::{class_of, word_boundary, DELIMITER};
use crate::config::EngineOptions;
use crate::index::PhraseIndex;
use crate::matcher::context::MatchContext;
use crate::matcher::lcss;
use crate::matcher::types::MatchResult;
use crate::trie::PatternId;
use std::collections::{HashMap, HashSet};

/// Byte-offset substring extraction.
///
/// Offsets derived from recorded word lengths may disagree with the bytes
/// actually consumed (marker and hyphen bytes count toward the length but
/// never reach the trie), so slicing must tolerate landing inside a
/// multi-byte sequence.
fn substring(bytes: &[u8], start: usize, end: usize) -> String {
    String::from_utf8_lossy(&bytes[start..end]).into_owned()
}

impl PhraseIndex {
    /// Scan one input string, reporting every pattern whose words appear in
    /// order at word boundaries.
    ///
    /// Results come back in scan order (position of the final word's
    /// completion). The matcher cannot fail: any byte sequence is
    /// acceptable and absent patterns yield an empty list.
    ///
    /// `ctx` is caller-owned scratch; reuse one context per worker thread.
    pub fn match_str(
        &self,
        input: &str,
        options: &EngineOptions,
        ctx: &mut MatchContext,
    ) -> Vec<MatchResult> {
        let mut results = Vec::new();

        let trimmed = input.trim();
        if trimmed.is_empty() {
            return results;
        }
        let bytes = trimmed.as_bytes();

        let do_substring = options.matching_substring;
        let do_lcss = options.lcss_match;

        ctx.clear();
        if do_substring {
            ctx.ensure_capacity(self.pattern_count());
        }

        // LCSS bookkeeping lives outside the context: it is only paid for
        // when the mode is on.
        let mut lcss_observed: HashMap<PatternId, HashMap<u8, usize>> = HashMap::new();
        let mut strict_found: HashSet<PatternId> = HashSet::new();

        let mut cursor: u32 = 0;
        let mut at_word_start = true;

        for (i, &byte) in bytes.iter().enumerate() {
            let class = class_of(byte);

            if class == DELIMITER {
                cursor = 0;
                at_word_start = true;
                continue;
            }

            if at_word_start {
                at_word_start = false;
                cursor = self.trie.child(0, class);
                continue;
            }

            // Dead end earlier in this word: skip until the next delimiter.
            if cursor == 0 {
                continue;
            }

            if let Some(bucket) = self.trie.bucket(cursor, class) {
                for (position, ids) in bucket.iter() {
                    if do_lcss {
                        for &id in ids {
                            lcss_observed.entry(id).or_default().insert(position, i);
                        }
                    }

                    if position == 1 {
                        ctx.touch(1);
                        for &id in ids {
                            ctx.active[1].insert(id);
                            if do_substring {
                                let first_len =
                                    self.catalog.word_lengths(id).first().copied().unwrap_or(0);
                                ctx.substring_start[id as usize] =
                                    (i + 1).saturating_sub(first_len as usize);
                            }
                        }
                    } else {
                        let (lower, upper) = ctx.active.split_at_mut(position as usize);
                        let previous = &mut lower[position as usize - 1];
                        if previous.is_empty() {
                            continue;
                        }
                        let current = &mut upper[0];
                        ctx.max_active_pos = ctx.max_active_pos.max(position);

                        for &id in ids {
                            if !previous.remove(&id) {
                                continue;
                            }

                            if self.catalog.word_count(id) == position {
                                if do_lcss {
                                    strict_found.insert(id);
                                }
                                let (start, end, matched) = if do_substring {
                                    let start = ctx.substring_start[id as usize];
                                    let end = word_boundary(bytes, i + 1);
                                    (start, end, substring(bytes, start, end))
                                } else {
                                    (0, 0, String::new())
                                };
                                results.push(MatchResult {
                                    pattern_id: id,
                                    xref: self.catalog.xref(id).to_string(),
                                    text: self.catalog.text(id).to_string(),
                                    matched,
                                    start,
                                    end,
                                });
                            } else {
                                current.insert(id);
                            }
                        }
                    }
                }
            }

            cursor = self.trie.child(cursor, class);
        }

        if do_lcss {
            self.refine_lcss(bytes, &lcss_observed, &strict_found, do_substring, &mut results);
        }

        results
    }

    /// Post-scan reconciliation for out-of-order tolerant matching.
    fn refine_lcss(
        &self,
        bytes: &[u8],
        observed: &HashMap<PatternId, HashMap<u8, usize>>,
        strict_found: &HashSet<PatternId>,
        do_substring: bool,
        results: &mut Vec<MatchResult>,
    ) {
        let mut candidates: Vec<PatternId> = observed
            .keys()
            .copied()
            .filter(|id| !strict_found.contains(id))
            .collect();
        candidates.sort_unstable();

        for id in candidates {
            let sightings = &observed[&id];
            let verdict = lcss::refine(
                sightings,
                self.catalog.word_count(id),
                self.catalog.must_have(id),
            );
            let Some((_, first_end, last_end)) = verdict else {
                continue;
            };

            let (start, end, matched) = if do_substring {
                // first_end is the final byte of the earliest covered word;
                // back up over that word to its start.
                let first_position = sightings
                    .iter()
                    .filter(|&(_, &at)| at == first_end)
                    .map(|(&pos, _)| pos)
                    .next()
                    .unwrap_or(1);
                let word_len = self
                    .catalog
                    .word_lengths(id)
                    .get(first_position as usize - 1)
                    .copied()
                    .unwrap_or(0);
                let start = (first_end + 1).saturating_sub(word_len as usize);
                let end = word_boundary(bytes, last_end + 1);
                (start, end, substring(bytes, start, end))
            } else {
                (0, 0, String::new())
            };

            results.push(MatchResult {
                pattern_id: id,
                xref: self.catalog.xref(id).to_string(),
                text: self.catalog.text(id).to_string(),
                matched,
                start,
                end,
            });
        }
    }
}
