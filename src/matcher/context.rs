//! Caller-owned scratch state for the matcher.

use crate::normalize::MAX_WORD_POSITIONS;
use crate::trie::PatternId;
use std::collections::HashSet;

const POSITION_SLOTS: usize = MAX_WORD_POSITIONS + 1;

/// Reusable per-call scratch for [`match_str`](crate::PhraseIndex::match_str).
///
/// Holds the per-word-position active sets plus the substring-start table.
/// One context per worker thread; a context must never be shared between
/// concurrent matcher calls. Buffers grow monotonically across calls and
/// clearing is bounded by the highest position actually touched.
#[derive(Debug, Default)]
pub struct MatchContext {
    /// `active[p]`: pattern ids whose first `p` words have been observed in
    /// order. Slot 0 is unused.
    pub(crate) active: [HashSet<PatternId>; POSITION_SLOTS],
    /// Highest position touched since the last clear.
    pub(crate) max_active_pos: u8,
    /// Byte offset at which each in-flight pattern's first word began.
    /// Indexed by pattern id; sized lazily, only when substring extraction
    /// is on.
    pub(crate) substring_start: Vec<usize>,
}

impl MatchContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset the active sets for a new scan.
    pub fn clear(&mut self) {
        for position in 1..=self.max_active_pos as usize {
            self.active[position].clear();
        }
        self.max_active_pos = 0;
    }

    /// Grow the substring table to cover `pattern_count` ids.
    pub fn ensure_capacity(&mut self, pattern_count: usize) {
        if self.substring_start.len() <= pattern_count {
            self.substring_start.resize(pattern_count + 1, 0);
        }
    }

    #[inline]
    pub(crate) fn touch(&mut self, position: u8) {
        if position > self.max_active_pos {
            self.max_active_pos = position;
        }
    }
}
