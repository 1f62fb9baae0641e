//! Pattern catalog: per-pattern-id side tables.
//!
//! Dense 1-based pattern ids index into parallel vectors; slot 0 is the
//! reserved "no id" row. The catalog is immutable once the index freezes,
//! and lookups are by id only.

use crate::trie::PatternId;
use std::collections::{HashMap, HashSet};

/// Side tables for every accepted pattern.
#[derive(Debug, Clone)]
pub struct PatternCatalog {
    xref: Vec<String>,
    text: Vec<String>,
    word_lengths: Vec<Vec<u8>>,
    word_count: Vec<u8>,
    must_have: HashMap<PatternId, HashSet<u8>>,
}

impl PatternCatalog {
    pub fn new() -> Self {
        // Slot 0 is reserved so ids index directly.
        Self {
            xref: vec![String::new()],
            text: vec![String::new()],
            word_lengths: vec![Vec::new()],
            word_count: vec![0],
            must_have: HashMap::new(),
        }
    }

    /// Append a pattern row, returning its assigned id.
    pub fn push(
        &mut self,
        xref: String,
        text: String,
        word_lengths: Vec<u8>,
        must_have: HashSet<u8>,
    ) -> PatternId {
        let id = self.xref.len() as PatternId;
        self.word_count.push(word_lengths.len() as u8);
        self.xref.push(xref);
        self.text.push(text);
        self.word_lengths.push(word_lengths);
        if !must_have.is_empty() {
            self.must_have.insert(id, must_have);
        }
        id
    }

    /// Number of accepted patterns (the reserved slot excluded).
    pub fn len(&self) -> usize {
        self.xref.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Whether `id` names a populated row.
    pub fn contains(&self, id: PatternId) -> bool {
        id != 0 && (id as usize) < self.xref.len()
    }

    /// Opaque cross-reference, carried verbatim into match output.
    #[inline]
    pub fn xref(&self, id: PatternId) -> &str {
        &self.xref[id as usize]
    }

    /// Space-joined canonical word sequence.
    #[inline]
    pub fn text(&self, id: PatternId) -> &str {
        &self.text[id as usize]
    }

    /// Byte length of each canonical word, markers stripped.
    #[inline]
    pub fn word_lengths(&self, id: PatternId) -> &[u8] {
        &self.word_lengths[id as usize]
    }

    /// Number of canonical words.
    #[inline]
    pub fn word_count(&self, id: PatternId) -> u8 {
        self.word_count[id as usize]
    }

    /// Word positions marked `*` or `^`, if any.
    pub fn must_have(&self, id: PatternId) -> Option<&HashSet<u8>> {
        self.must_have.get(&id)
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        let strings: usize = self
            .xref
            .iter()
            .chain(self.text.iter())
            .map(|s| s.capacity())
            .sum();
        let lengths: usize = self.word_lengths.iter().map(|v| v.capacity()).sum();
        strings
            + lengths
            + self.word_count.capacity()
            + self.must_have.len() * std::mem::size_of::<(PatternId, HashSet<u8>)>()
    }
}

impl Default for PatternCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_catalog() {
        let catalog = PatternCatalog::new();
        assert_eq!(catalog.len(), 0);
        assert!(catalog.is_empty());
        assert!(!catalog.contains(0));
        assert!(!catalog.contains(1));
    }

    #[test]
    fn test_push_assigns_dense_ids() {
        let mut catalog = PatternCatalog::new();
        let first = catalog.push("X1".into(), "hello world".into(), vec![5, 5], HashSet::new());
        let second = catalog.push("X2".into(), "quick fox".into(), vec![5, 3], HashSet::new());

        assert_eq!(first, 1);
        assert_eq!(second, 2);
        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(1));
        assert!(catalog.contains(2));
        assert!(!catalog.contains(3));
    }

    #[test]
    fn test_row_accessors() {
        let mut catalog = PatternCatalog::new();
        let id = catalog.push(
            "ref\tcat".into(),
            "new york city".into(),
            vec![3, 4, 4],
            HashSet::new(),
        );

        assert_eq!(catalog.xref(id), "ref\tcat");
        assert_eq!(catalog.text(id), "new york city");
        assert_eq!(catalog.word_lengths(id), &[3, 4, 4]);
        assert_eq!(catalog.word_count(id), 3);
        assert!(catalog.must_have(id).is_none());
    }

    #[test]
    fn test_must_have_positions() {
        let mut catalog = PatternCatalog::new();
        let id = catalog.push(
            "X".into(),
            "alpha beta".into(),
            vec![5, 4],
            [2u8].into_iter().collect(),
        );

        let must = catalog.must_have(id).unwrap();
        assert!(must.contains(&2));
        assert!(!must.contains(&1));
    }

    #[test]
    fn test_reserved_slot_zero() {
        let mut catalog = PatternCatalog::new();
        catalog.push("X".into(), "a b".into(), vec![1, 1], HashSet::new());

        assert_eq!(catalog.xref(0), "");
        assert_eq!(catalog.word_count(0), 0);
    }
}
