//! Index builder: feeds normalized patterns into the trie and catalog.
//!
//! A [`PhraseIndex`] is built single-threaded at startup, then frozen with
//! [`PhraseIndex::prepare_for_matching`]. After the freeze the trie,
//! end-of-word index, and catalog are read-only; matchers on any number of
//! threads may share the index without locks.

use crate::catalog::PatternCatalog;
use crate::config::EngineOptions;
use crate::error::{PhraseError, Result};
use crate::normalize;
use crate::reader;
use crate::trie::TokenTrie;
use std::collections::HashSet;
use std::path::Path;
use std::time::Instant;
use tracing::{debug, info};

/// Counters from a pattern-file load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadStats {
    /// Lines read from the file.
    pub read: usize,
    /// Patterns accepted into the index.
    pub accepted: usize,
}

/// The frozen pattern index: trie, end-of-word buckets, and catalog.
#[derive(Debug, Clone)]
pub struct PhraseIndex {
    pub(crate) trie: TokenTrie,
    pub(crate) catalog: PatternCatalog,
    stopwords: HashSet<String>,
    frozen: bool,
}

impl PhraseIndex {
    pub fn new() -> Self {
        Self {
            trie: TokenTrie::new(),
            catalog: PatternCatalog::new(),
            stopwords: HashSet::new(),
            frozen: false,
        }
    }

    /// Load a comma-delimited stopword file.
    ///
    /// Must run before the patterns that should be filtered are added.
    pub fn read_stopwords(&mut self, path: &Path) -> Result<usize> {
        if self.frozen {
            return Err(PhraseError::IndexFrozen);
        }
        debug!("Reading stopwords: {}", path.display());
        let content = std::fs::read_to_string(path)
            .map_err(|e| PhraseError::StopwordFile(format!("{}: {e}", path.display())))?;
        self.stopwords = normalize::parse_stopwords(&content);
        debug!("Loaded {} stopwords", self.stopwords.len());
        Ok(self.stopwords.len())
    }

    /// Feed one raw pattern line through normalization into the index.
    ///
    /// Returns `Ok(true)` when the pattern was accepted, `Ok(false)` when
    /// normalization rejected it. Rejection details are logged, never
    /// surfaced as errors.
    pub fn add_pattern(&mut self, line: &str, options: &EngineOptions) -> Result<bool> {
        if self.frozen {
            return Err(PhraseError::IndexFrozen);
        }
        match normalize::normalize_line(line, options, &self.stopwords) {
            Ok(pattern) => {
                self.insert(pattern.words, pattern.xref);
                Ok(true)
            }
            Err(rejection) => {
                if !rejection.is_silent() {
                    debug!("Pattern not processed '{}': {}", line.trim(), rejection.reason());
                }
                Ok(false)
            }
        }
    }

    fn insert(&mut self, words: Vec<String>, xref: String) {
        let text = words.join(" ");
        let mut must_have: HashSet<u8> = HashSet::new();
        let mut word_lengths = Vec::with_capacity(words.len());
        let mut trie_words = Vec::with_capacity(words.len());

        for (i, word) in words.iter().enumerate() {
            let position = i as u8 + 1;
            let word = if word.starts_with('*') || word.starts_with('^') {
                must_have.insert(position);
                &word[1..]
            } else {
                word.as_str()
            };
            word_lengths.push(word.len() as u8);
            trie_words.push(word);
        }

        let id = self.catalog.push(xref, text, word_lengths, must_have);
        for (i, word) in trie_words.iter().enumerate() {
            self.trie.insert_word(id, word, i as u8 + 1);
        }
    }

    /// Load a pattern file (gzip-aware), one pattern per line.
    ///
    /// An unopenable file is fatal; individual bad lines are logged and
    /// skipped.
    pub fn load_pattern_file(&mut self, path: &Path, options: &EngineOptions) -> Result<LoadStats> {
        let start = Instant::now();
        let lines = reader::read_all_lines(path)
            .map_err(|e| PhraseError::PatternFile(format!("{}: {e}", path.display())))?;

        let mut stats = LoadStats::default();
        for line in &lines {
            stats.read += 1;
            if self.add_pattern(line, options)? {
                stats.accepted += 1;
            }
        }

        info!(
            "Loaded {} patterns from {} in {}ms",
            stats.accepted,
            path.display(),
            start.elapsed().as_millis()
        );
        info!("Total blocks: {}", self.trie.block_count());
        Ok(stats)
    }

    /// Verify index invariants and freeze the index for matching.
    ///
    /// Any violation is a programmer error in the build pipeline; it is
    /// surfaced as [`PhraseError::IndexCorrupted`] so the process can abort
    /// instead of returning silently wrong matches.
    pub fn prepare_for_matching(&mut self) -> Result<()> {
        self.validate()?;
        self.frozen = true;
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        for (key, positions) in self.trie.buckets() {
            if self.trie.child(key.block, key.class) == 0 {
                return Err(PhraseError::IndexCorrupted(format!(
                    "end-of-word edge ({}, {}) has no trie child",
                    key.block, key.class
                )));
            }
            for (position, ids) in positions.iter() {
                let mut previous = 0;
                for &id in ids {
                    if !self.catalog.contains(id) {
                        return Err(PhraseError::IndexCorrupted(format!(
                            "pattern id {id} in end-of-word bucket has no catalog row"
                        )));
                    }
                    if id <= previous {
                        return Err(PhraseError::IndexCorrupted(format!(
                            "bucket at position {position} is not strictly ascending"
                        )));
                    }
                    if position > self.catalog.word_count(id) {
                        return Err(PhraseError::IndexCorrupted(format!(
                            "pattern id {id} bucketed at position {position} beyond its word count"
                        )));
                    }
                    previous = id;
                }
            }
        }

        for id in 1..=self.catalog.len() as u32 {
            let words = self.catalog.text(id).split(' ').count();
            if words != self.catalog.word_count(id) as usize {
                return Err(PhraseError::IndexCorrupted(format!(
                    "pattern id {id}: canonical text disagrees with word count"
                )));
            }
        }
        Ok(())
    }

    /// Whether [`prepare_for_matching`](Self::prepare_for_matching) has run.
    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    /// Number of accepted patterns.
    pub fn pattern_count(&self) -> usize {
        self.catalog.len()
    }

    /// Number of allocated trie blocks.
    pub fn block_count(&self) -> u32 {
        self.trie.block_count()
    }

    /// Approximate heap footprint of the frozen structures, in bytes.
    pub fn memory_usage(&self) -> usize {
        self.trie.memory_usage() + self.catalog.memory_usage()
    }
}

impl Default for PhraseIndex {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build(lines: &[&str]) -> PhraseIndex {
        let options = EngineOptions::default();
        let mut index = PhraseIndex::new();
        for line in lines {
            index.add_pattern(line, &options).unwrap();
        }
        index.prepare_for_matching().unwrap();
        index
    }

    #[test]
    fn test_accepts_and_counts_patterns() {
        let options = EngineOptions::default();
        let mut index = PhraseIndex::new();

        assert!(index.add_pattern("hello world\tX1", &options).unwrap());
        assert!(!index.add_pattern("# comment", &options).unwrap());
        assert!(!index.add_pattern("hi\tX2", &options).unwrap());
        assert!(index.add_pattern("quick brown fox\tX3", &options).unwrap());

        assert_eq!(index.pattern_count(), 2);
    }

    #[test]
    fn test_rejected_patterns_consume_no_id() {
        let index = build(&["hello world\tX1", "hi\tX2", "alpha beta\tX3"]);

        // Ids are dense over accepted patterns only.
        assert_eq!(index.catalog.xref(1), "X1");
        assert_eq!(index.catalog.xref(2), "X3");
    }

    #[test]
    fn test_must_have_markers_stripped_for_trie() {
        let index = build(&["*alpha ^beta gamma\tX"]);

        let must = index.catalog.must_have(1).unwrap();
        assert!(must.contains(&1));
        assert!(must.contains(&2));
        assert!(!must.contains(&3));

        // Markers do not appear in the trie path.
        assert_ne!(index.trie.lookup_word("alpha"), 0);
        assert_ne!(index.trie.lookup_word("beta"), 0);

        // Lengths are post-strip byte lengths.
        assert_eq!(index.catalog.word_lengths(1), &[5, 4, 5]);
    }

    #[test]
    fn test_canonical_text_keeps_markers() {
        let index = build(&["*alpha beta\tX"]);
        assert_eq!(index.catalog.text(1), "*alpha beta");
    }

    #[test]
    fn test_frozen_index_rejects_mutation() {
        let options = EngineOptions::default();
        let mut index = build(&["hello world\tX1"]);

        assert_eq!(
            index.add_pattern("more words\tX2", &options).unwrap_err(),
            PhraseError::IndexFrozen
        );
        assert!(index.is_frozen());
    }

    #[test]
    fn test_validate_passes_on_clean_index() {
        let mut index = PhraseIndex::new();
        let options = EngineOptions::default();
        for i in 0..50 {
            index
                .add_pattern(&format!("alpha{i} beta{i} gamma{i}\tX{i}"), &options)
                .unwrap();
        }
        assert!(index.prepare_for_matching().is_ok());
    }

    #[test]
    fn test_memory_usage_nonzero() {
        let index = build(&["hello world\tX1"]);
        assert!(index.memory_usage() > 0);
    }

    #[test]
    fn test_stopwords_applied_when_enabled() {
        let mut index = PhraseIndex::new();
        index.stopwords = ["the".to_string()].into_iter().collect();

        let options = EngineOptions::new().with_remove_stopwords(true);
        index.add_pattern("the quick fox\tX", &options).unwrap();
        index.prepare_for_matching().unwrap();

        assert_eq!(index.catalog.text(1), "quick fox");
    }
}
