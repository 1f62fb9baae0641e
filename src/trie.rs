//! Tokenized trie over the 37-class alphabet.
//!
//! The trie is one flat array of 32-bit block ids: row `b` holds the 37
//! children of block `b`, cell `(b, c)` the child for class `c`, or 0 for
//! "no child". Block 0 is the root and doubles as that sentinel; a
//! first-character transition always lands outside block 0, so no real
//! child ever points back at it.
//!
//! Alongside the trie lives the end-of-word index: for each edge
//! `(parent_block, last_class)` that completes at least one pattern word, a
//! map from word position to the sorted pattern ids ending there. Keying by
//! the edge rather than the child block saves a trie lookup on the hot
//! path, because the matcher already holds the class byte when it probes
//! the bucket.

use crate::classify::{class_of, CLASS_COUNT, DELIMITER};
use crate::normalize::MAX_WORD_POSITIONS;
use std::collections::HashMap;

pub type PatternId = u32;
pub type BlockId = u32;

/// Slots for word positions 1..=31; slot 0 is unused.
const POSITION_SLOTS: usize = MAX_WORD_POSITIONS + 1;

/// The edge that completes a pattern word: the block the traversal was in
/// before consuming the word's final byte, plus that byte's class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EdgeKey {
    pub block: BlockId,
    pub class: u8,
}

/// Word-position buckets for one end-of-word edge.
///
/// Positions are 1-based; each bucket keeps its pattern ids strictly
/// ascending and unique. `max_pos` bounds iteration so sparse maps stay
/// cheap to walk.
#[derive(Debug, Clone)]
pub struct WordPositions {
    by_pos: [Vec<PatternId>; POSITION_SLOTS],
    max_pos: u8,
}

impl WordPositions {
    fn new() -> Self {
        Self {
            by_pos: std::array::from_fn(|_| Vec::new()),
            max_pos: 0,
        }
    }

    /// Insert a pattern id at a word position, preserving ascending order.
    fn insert(&mut self, position: u8, id: PatternId) {
        debug_assert!((1..POSITION_SLOTS as u8).contains(&position));
        if position > self.max_pos {
            self.max_pos = position;
        }
        let bucket = &mut self.by_pos[position as usize];
        match bucket.binary_search(&id) {
            Ok(_) => {}
            Err(at) => bucket.insert(at, id),
        }
    }

    /// Pattern ids ending at `position`, ascending.
    pub fn at(&self, position: u8) -> &[PatternId] {
        &self.by_pos[position as usize]
    }

    /// Iterate `(position, ids)` over non-empty buckets in ascending
    /// position order.
    pub fn iter(&self) -> impl Iterator<Item = (u8, &[PatternId])> {
        self.by_pos[1..=self.max_pos as usize]
            .iter()
            .enumerate()
            .filter(|(_, ids)| !ids.is_empty())
            .map(|(i, ids)| (i as u8 + 1, ids.as_slice()))
    }

    fn heap_bytes(&self) -> usize {
        self.by_pos
            .iter()
            .map(|v| v.capacity() * std::mem::size_of::<PatternId>())
            .sum()
    }
}

/// The compact trie shared by all pattern words, plus the end-of-word index.
#[derive(Debug, Clone)]
pub struct TokenTrie {
    blocks: Vec<BlockId>,
    block_count: u32,
    end_of_word: HashMap<EdgeKey, WordPositions>,
}

impl TokenTrie {
    pub fn new() -> Self {
        Self {
            blocks: vec![0; CLASS_COUNT],
            block_count: 1,
            end_of_word: HashMap::new(),
        }
    }

    /// Number of allocated blocks, root included.
    pub fn block_count(&self) -> u32 {
        self.block_count
    }

    /// Number of distinct end-of-word edges.
    pub fn edge_count(&self) -> usize {
        self.end_of_word.len()
    }

    /// Child of `block` under `class`, 0 when absent.
    #[inline(always)]
    pub fn child(&self, block: BlockId, class: u8) -> BlockId {
        self.blocks[block as usize * CLASS_COUNT + class as usize]
    }

    /// End-of-word buckets for an edge, if any word ends there.
    #[inline(always)]
    pub fn bucket(&self, block: BlockId, class: u8) -> Option<&WordPositions> {
        self.end_of_word.get(&EdgeKey { block, class })
    }

    /// Iterate all end-of-word entries.
    pub fn buckets(&self) -> impl Iterator<Item = (&EdgeKey, &WordPositions)> {
        self.end_of_word.iter()
    }

    fn allocate_block(&mut self) -> BlockId {
        let block = self.block_count;
        self.block_count += 1;
        self.blocks.resize(self.block_count as usize * CLASS_COUNT, 0);
        block
    }

    /// Insert one pattern word at a 1-based word position.
    ///
    /// The word must already be normalized; bytes that classify to the
    /// delimiter class are skipped defensively. Records the pattern id in
    /// the end-of-word bucket for the edge into the word's final byte.
    pub fn insert_word(&mut self, id: PatternId, word: &str, position: u8) {
        let mut current: BlockId = 0;
        let mut parent: BlockId = 0;
        let mut last_class: u8 = DELIMITER;

        for &byte in word.as_bytes() {
            let class = class_of(byte);
            if class == DELIMITER {
                continue;
            }

            parent = current;
            last_class = class;

            let cell = current as usize * CLASS_COUNT + class as usize;
            if self.blocks[cell] == 0 {
                self.blocks[cell] = self.allocate_block();
            }
            current = self.blocks[cell];
        }

        if current != 0 {
            self.end_of_word
                .entry(EdgeKey {
                    block: parent,
                    class: last_class,
                })
                .or_insert_with(WordPositions::new)
                .insert(position, id);
        }
    }

    /// Walk the trie over a single word's bytes, returning the final block
    /// (0 if the word is absent). Build-time helper; the matcher keeps its
    /// own cursor.
    pub fn lookup_word(&self, word: &str) -> BlockId {
        let mut current: BlockId = 0;
        let mut consumed = false;
        for &byte in word.as_bytes() {
            let class = class_of(byte);
            if class == DELIMITER {
                continue;
            }
            current = self.child(current, class);
            consumed = true;
            if current == 0 {
                return 0;
            }
        }
        if consumed {
            current
        } else {
            0
        }
    }

    /// Approximate heap footprint in bytes.
    pub fn memory_usage(&self) -> usize {
        let mut total = self.blocks.capacity() * std::mem::size_of::<BlockId>();
        total += self.end_of_word.len()
            * (std::mem::size_of::<EdgeKey>() + std::mem::size_of::<WordPositions>());
        for positions in self.end_of_word.values() {
            total += positions.heap_bytes();
        }
        total
    }
}

impl Default for TokenTrie {
    fn default() -> Self {
        Self::new()
    }
}
